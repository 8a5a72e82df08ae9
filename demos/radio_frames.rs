use clap::Parser;
use json::object;
use ssl_core::radio::framing::{COMMAND_PING_REPLY, COMMAND_REPLY_FROM_ROBOT};
use ssl_core::radio::{
    Extension, Generation, RadioCommand, RadioSystem, Response2014, RobotCommand, RobotResponse, RobotSpec,
    TransceiverEvent, Velocity,
};
use ssl_core::Config;
use std::fs;

#[derive(Parser, Debug)]
#[command(version, about = "Build transceiver frames for a team and decode simulated replies", long_about = None)]
struct CliArgs {
    /// YAML file with radio settings
    #[arg(short, long)]
    config: Option<String>,

    /// YAML file with a list of robot commands, overrides the built-in team
    #[arg(long)]
    commands: Option<String>,

    /// Number of transmission cycles to simulate
    #[arg(long, default_value_t = 3)]
    cycles: usize,

    /// Frame counters whose replies get lost
    #[arg(long, value_delimiter = ',')]
    drop: Vec<u8>,

    /// Optional file for a json summary of the decoded responses
    #[arg(short, long)]
    output: Option<String>,
}

fn default_commands() -> Vec<RadioCommand> {
    let drive = RobotCommand {
        output0: Velocity::new(0.0, 1.0, 0.5),
        output1: Velocity::new(0.0, 1.1, 0.5),
        output2: Velocity::new(0.0, 1.2, 0.5),
        dribbler: 0.3,
        ..Default::default()
    };
    let kick = RobotCommand {
        kick_power: 4.0,
        ..Default::default()
    };
    vec![
        RadioCommand {
            generation: Generation::Gen2018,
            id: 1,
            command: drive.clone(),
        },
        RadioCommand {
            generation: Generation::Gen2018,
            id: 4,
            command: kick,
        },
        RadioCommand {
            generation: Generation::Gen2014,
            id: 7,
            command: drive.clone(),
        },
        RadioCommand {
            generation: Generation::Gen2012,
            id: 2,
            command: drive,
        },
    ]
}

fn to_hex(buffer: &[u8]) -> String {
    buffer.iter().map(|b| format!("{:02x}", b)).collect::<Vec<_>>().join(" ")
}

/// Reply the transceiver would forward for a robot that received its command.
fn simulated_reply(command: &RadioCommand, counter: u8) -> Option<Vec<u8>> {
    let response = Response2014 {
        counter,
        id: command.id as u8,
        power_enabled: true,
        error_present: false,
        ball_detected: command.command.kick_power > 0.0,
        cap_charged: true,
        extension: Extension::BasicStatus {
            battery: 180,
            packet_loss: 0,
        },
        v_s: (command.command.output0.v_s * 1000.0) as i16,
        v_f: (command.command.output0.v_f * 1000.0) as i16,
        omega: (command.command.output0.omega * 1000.0) as i16,
    };
    let packet = match command.generation {
        Generation::Gen2014 => RobotResponse::Gen2014(response).to_packet(),
        Generation::Gen2018 => RobotResponse::Gen2018(response).to_packet(),
        // 2012 replies are not simulated
        Generation::Gen2012 => return None,
    };
    let mut frame = vec![packet.len() as u8, COMMAND_REPLY_FROM_ROBOT];
    frame.extend_from_slice(&packet);
    Some(frame)
}

fn main() {
    env_logger::init();
    let args: CliArgs = CliArgs::parse();

    let config = match &args.config {
        Some(file) => Config::from_file(file).unwrap(),
        None => Config::default(),
    };
    let commands: Vec<RadioCommand> = match &args.commands {
        Some(file) => serde_yaml::from_str(&fs::read_to_string(file).unwrap()).unwrap(),
        None => default_commands(),
    };

    let mut radio = RadioSystem::new(config.radio);
    let team: Vec<RobotSpec> = commands
        .iter()
        .map(|command| RobotSpec {
            generation: command.generation.id(),
            id: command.id,
            ir_param: 20,
        })
        .collect();
    radio.handle_team(&team);

    for frame in radio.handshake_frames() {
        println!("handshake:  {}", to_hex(&frame));
    }
    println!("frequency:  {}", to_hex(&radio.configuration_frame(None)));

    // host clock in nanoseconds, one cycle every 10 ms
    let mut now: i64 = 1_000_000_000;
    let mut responses_json = json::array![];
    for _ in 0..args.cycles {
        let frames = radio.build_frames(&commands, now - 400_000, now);
        let counter = radio.packet_counter();
        for frame in &frames {
            println!("cycle {:3} {:?}: {}", counter, frame.generation, to_hex(&frame.buffer));
        }

        let mut reply = vec![8, COMMAND_PING_REPLY];
        reply.extend_from_slice(&now.to_le_bytes());
        if !args.drop.contains(&counter) {
            for command in &commands {
                if let Some(frame) = simulated_reply(command, counter) {
                    reply.extend_from_slice(&frame);
                }
            }
        }

        now += 10_000_000;
        let output = radio.handle_transceiver_reply(&reply, now - 9_000_000);
        for event in &output.events {
            match event {
                TransceiverEvent::PingRtt(rtt) => println!("  ping rtt {:.3} ms", rtt * 1000.0),
                other => println!("  {:?}", other),
            }
        }
        for response in &output.responses {
            println!("  {:?}", response);
            responses_json
                .push(object! {
                    "counter" => counter,
                    "id" => response.id,
                    "generation" => response.generation.map(|g| g.id()),
                    "battery" => response.battery,
                    "packet_loss_rx" => response.packet_loss_rx,
                    "radio_rtt" => response.radio_rtt,
                })
                .expect("Failed to push response json.");
        }
    }

    if let Some(output) = &args.output {
        fs::write(output, object! { "responses" => responses_json }.pretty(2)).unwrap();
    }
}
