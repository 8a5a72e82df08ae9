use crate::config::RadioConfig;
use crate::radio::address::Address;
use crate::radio::command::{encode_command, RadioCommand, Sync2014, IR_PARAM_MAX};
use crate::radio::dropped_frames::DroppedFrameStatistics;
use crate::radio::framing::{self, FrameBuilder, TransceiverReply};
use crate::radio::generation::Generation;
use crate::radio::response::{RadioResponse, RobotResponse, RESPONSE_HEADER_SIZE};
use log::{debug, trace, warn};
use num_traits::clamp;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

const US_TO_NS: i64 = 1000;
const BITS_PER_BYTE: i64 = 8;
/// Expected response size of the sync packet. The resulting reply slot delays the
/// following command, which some receivers miss when it directly follows the sync.
const SYNC_RESPONSE_SIZE: u8 = 1;

/// Robot configuration relevant for the radio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotSpec {
    /// Protocol generation id, see [`Generation::id`].
    pub generation: u32,
    pub id: u32,
    pub ir_param: u32,
}

/// Transmission buffer for one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationFrame {
    pub generation: Generation,
    pub buffer: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransceiverEvent {
    Connected { protocol_version: u16 },
    ProtocolMismatch { expected: u16, actual: u16 },
    /// Round trip time of a ping in seconds.
    PingRtt(f32),
    DroppedUsbPackets(u32),
    Log(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransceiverOutput {
    pub events: Vec<TransceiverEvent>,
    pub responses: Vec<RadioResponse>,
}

/// Per-cycle command packing and response decoding for all robot generations.
///
/// Times are nanoseconds on a monotonic host clock.
#[derive(Debug, Clone)]
pub struct RadioSystem {
    config: RadioConfig,
    charge: bool,
    packet_counter: u8,
    ir_params: HashMap<(Generation, u32), u32>,
    frame_times: HashMap<u8, i64>,
    dropped_frames: DroppedFrameStatistics,
}

impl Default for RadioSystem {
    fn default() -> Self {
        Self::new(RadioConfig::default())
    }
}

impl RadioSystem {
    pub fn new(config: RadioConfig) -> Self {
        Self {
            config,
            charge: false,
            packet_counter: 0,
            ir_params: HashMap::new(),
            frame_times: HashMap::new(),
            dropped_frames: DroppedFrameStatistics::new(),
        }
    }

    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    pub fn set_charge(&mut self, charge: bool) {
        self.charge = charge;
    }

    pub fn charge(&self) -> bool {
        self.charge
    }

    /// Counter of the last built cycle.
    pub fn packet_counter(&self) -> u8 {
        self.packet_counter
    }

    pub fn dropped_frames(&self) -> &DroppedFrameStatistics {
        &self.dropped_frames
    }

    /// Stores the IR parameters of a team. Robots of unknown generations are skipped.
    pub fn handle_team(&mut self, robots: &[RobotSpec]) {
        for robot in robots {
            match Generation::from_id(robot.generation) {
                Ok(generation) => {
                    self.ir_params.insert((generation, robot.id), robot.ir_param);
                }
                Err(err) => warn!("Ignoring robot {}: {}", robot.id, err),
            }
        }
    }

    fn ir_param(&self, generation: Generation, id: u32) -> u8 {
        let param = self.ir_params.get(&(generation, id)).copied().unwrap_or(0);
        param.min(IR_PARAM_MAX as u32) as u8
    }

    /// Frames sent once after the transceiver was opened.
    pub fn handshake_frames(&self) -> Vec<Vec<u8>> {
        vec![framing::init_frame()]
    }

    pub fn configuration_frame(&self, channel: Option<u8>) -> Vec<u8> {
        framing::set_frequency_frame(channel.unwrap_or(self.config.default_channel))
    }

    /// Latency budget between the host timestamp and the robots receiving the sync packet.
    fn sync_delay(&self) -> i64 {
        let config = &self.config;
        let transmission_bits = config.nrf_header_bits + BITS_PER_BYTE * Sync2014::SIZE as i64;
        (config.usb_transfer_time_us
            + config.nrf_startup_time_us
            + transmission_bits * config.bit_transfer_time_us)
            * US_TO_NS
    }

    /// Sync `time_offset` in microseconds for the given processing delay in nanoseconds.
    pub fn time_offset(&self, processing_delay: i64) -> i16 {
        // processing usually takes a few hundred microseconds, longer delays are outliers
        let processing_delay = clamp(processing_delay, 0, self.config.max_processing_delay_us * US_TO_NS);
        let offset = (processing_delay + self.sync_delay()) / US_TO_NS;
        clamp(offset, i16::MIN as i64, i16::MAX as i64) as i16
    }

    /// Builds the transceiver buffers of one cycle.
    ///
    /// Parameters:
    /// - `commands`: Commands of all robots, in any generation order.
    /// - `processing_start`: Time the strategy started computing the commands.
    /// - `now`: Current time, stored as send time of this cycle's counter.
    ///
    /// Returns:
    /// - One buffer per generation present in `commands`, in ascending generation order.
    pub fn build_frames(&mut self, commands: &[RadioCommand], processing_start: i64, now: i64) -> Vec<GenerationFrame> {
        let mut generations: BTreeMap<Generation, Vec<&RadioCommand>> = BTreeMap::new();
        for command in commands {
            generations.entry(command.generation).or_default().push(command);
        }

        self.packet_counter = self.packet_counter.wrapping_add(1);
        let counter = self.packet_counter;
        self.frame_times.insert(counter, now);

        let time_offset = self.time_offset(now - processing_start);
        trace!("Radio cycle {} with sync offset {} us", counter, time_offset);

        generations
            .into_iter()
            .map(|(generation, robots)| {
                let mut builder = FrameBuilder::new(self.config.transfer_chunk_size);
                if generation.uses_sync() {
                    let sync = Sync2014 { counter, time_offset };
                    builder.add_send_command(&Address::broadcast(generation), SYNC_RESPONSE_SIZE, &sync.to_bytes());
                }
                for robot in robots {
                    let address = match Address::unicast(generation, robot.id) {
                        Ok(address) => address,
                        Err(err) => {
                            warn!("Dropping command: {}", err);
                            continue;
                        }
                    };
                    let payload = encode_command(
                        generation,
                        robot.id as u8,
                        &robot.command,
                        self.charge,
                        counter,
                        self.ir_param(generation, robot.id),
                    );
                    let response_size = (RESPONSE_HEADER_SIZE + generation.response_size()) as u8;
                    builder.add_send_command(&address, response_size, &payload);
                }
                builder.add_ping(now);
                if counter == 255 {
                    builder.add_status_request();
                }
                GenerationFrame {
                    generation,
                    buffer: builder.finish(now),
                }
            })
            .collect()
    }

    /// Decodes a single robot reply including its response header.
    ///
    /// Returns `None` for replies of unknown type or size.
    pub fn handle_response_packet(&mut self, packet: &[u8], time: i64) -> Option<RadioResponse> {
        let Some(response) = RobotResponse::parse(packet) else {
            debug!("Dropping malformed robot response of {} bytes", packet.len());
            return None;
        };
        let generation = response.generation();
        let id = response.id() as u32;
        let skipped_frames = match &response {
            RobotResponse::Gen2012(_) => Some(0),
            RobotResponse::Gen2014(status) | RobotResponse::Gen2018(status) => status.packet_loss(),
        };
        let ratio = self
            .dropped_frames
            .update(generation, id, response.counter(), skipped_frames);

        let mut decoded = RadioResponse::from_robot_response(&response, time, ratio);
        if let Some(frame_time) = self.frame_times.get(&response.counter()) {
            decoded.radio_rtt = Some((time - frame_time) as f32 * 1e-9);
        }
        Some(decoded)
    }

    /// Handles one transfer received from the transceiver.
    pub fn handle_transceiver_reply(&mut self, buffer: &[u8], receive_time: i64) -> TransceiverOutput {
        let mut output = TransceiverOutput::default();
        for reply in framing::parse_replies(buffer) {
            match reply {
                TransceiverReply::Init { protocol_version } => {
                    match framing::check_protocol_version(protocol_version) {
                        Ok(()) => output.events.push(TransceiverEvent::Connected { protocol_version }),
                        Err(err) => {
                            warn!("{}", err);
                            output.events.push(TransceiverEvent::ProtocolMismatch {
                                expected: framing::PROTOCOL_VERSION,
                                actual: protocol_version,
                            });
                        }
                    }
                }
                TransceiverReply::Ping { time } => {
                    output
                        .events
                        .push(TransceiverEvent::PingRtt((receive_time - time) as f32 * 1e-9));
                }
                TransceiverReply::Status { dropped_packets } => {
                    output.events.push(TransceiverEvent::DroppedUsbPackets(dropped_packets));
                }
                TransceiverReply::RobotResponse(packet) => {
                    if let Some(response) = self.handle_response_packet(&packet, receive_time) {
                        output.responses.push(response);
                    }
                }
                TransceiverReply::SendFailed => {}
                TransceiverReply::Datagram(text) => {
                    output
                        .events
                        .push(TransceiverEvent::Log(format!("[Length: {}] {}", text.len(), text)));
                }
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::command::{RobotCommand, Velocity};
    use crate::radio::response::{Extension, Response2014};

    fn command(generation: Generation, id: u32) -> RadioCommand {
        RadioCommand {
            generation,
            id,
            command: RobotCommand {
                output0: Velocity::new(0.5, 1.0, 0.0),
                ..Default::default()
            },
        }
    }

    #[test]
    fn time_offset_caps_processing_delay() {
        let radio = RadioSystem::default();
        // 250 + 130 + 65 + 24
        assert_eq!(radio.time_offset(0), 469);
        assert_eq!(radio.time_offset(300_000), 769);
        assert_eq!(radio.time_offset(50_000_000), 2469);
    }

    #[test]
    fn frames_are_grouped_by_generation() {
        let mut radio = RadioSystem::default();
        let commands = [
            command(Generation::Gen2018, 1),
            command(Generation::Gen2014, 3),
            command(Generation::Gen2018, 2),
        ];
        let frames = radio.build_frames(&commands, 0, 100_000);
        assert_eq!(radio.packet_counter(), 1);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].generation, Generation::Gen2014);
        assert_eq!(frames[1].generation, Generation::Gen2018);

        // sync, one command, ping
        let frame = &frames[0].buffer;
        assert_eq!(frame.len(), 11 + 31 + 10);
        assert_eq!(&frame[..8], &[0x11, 9, 0x3F, 0, 0, 0, 0, 1]);
        assert_eq!(frame[8], 1);
        assert_eq!(i16::from_le_bytes([frame[9], frame[10]]), 569);
        assert_eq!(&frame[11..19], &[0x11, 29, 0x43, 0xE8, 0xE4, 0xC7, 0, 11]);
        assert_eq!(frame[19], 1);
        assert_eq!(frame[42], framing::COMMAND_PING);

        assert_eq!(frames[1].buffer.len(), 11 + 2 * 31 + 10);
    }

    #[test]
    fn generation_2012_has_no_sync() {
        let mut radio = RadioSystem::default();
        let frames = radio.build_frames(&[command(Generation::Gen2012, 4)], 0, 0);
        let frame = &frames[0].buffer;
        assert_eq!(frame.len(), 2 + 6 + 10 + 10);
        assert_eq!(&frame[2..8], &[0xAA, 0xC0, 0xFF, 0xEE, 0x24, 12]);
    }

    #[test]
    fn invalid_ids_are_dropped() {
        let mut radio = RadioSystem::default();
        let frames = radio.build_frames(&[command(Generation::Gen2014, 16)], 0, 0);
        // sync and ping only
        assert_eq!(frames[0].buffer.len(), 11 + 10);
    }

    #[test]
    fn status_request_on_counter_255() {
        let mut radio = RadioSystem::default();
        for _ in 0..254 {
            radio.build_frames(&[], 0, 0);
        }
        let frames = radio.build_frames(&[command(Generation::Gen2014, 0)], 0, 0);
        assert_eq!(radio.packet_counter(), 255);
        let frame = &frames[0].buffer;
        assert_eq!(&frame[frame.len() - 2..], &[framing::COMMAND_STATUS, 0]);
        radio.build_frames(&[], 0, 0);
        assert_eq!(radio.packet_counter(), 0);
    }

    #[test]
    fn ir_params_are_clamped() {
        let mut radio = RadioSystem::default();
        radio.handle_team(&[
            RobotSpec {
                generation: 3,
                id: 1,
                ir_param: 200,
            },
            RobotSpec {
                generation: 9,
                id: 1,
                ir_param: 5,
            },
        ]);
        assert_eq!(radio.ir_param(Generation::Gen2014, 1), 63);
        assert_eq!(radio.ir_param(Generation::Gen2018, 1), 0);
    }

    #[test]
    fn responses_carry_rtt() {
        let mut radio = RadioSystem::default();
        radio.build_frames(&[command(Generation::Gen2014, 6)], 0, 1_000_000);
        let response = RobotResponse::Gen2014(Response2014 {
            counter: 1,
            id: 6,
            power_enabled: false,
            error_present: false,
            ball_detected: false,
            cap_charged: false,
            extension: Extension::BasicStatus {
                battery: 0,
                packet_loss: 0,
            },
            v_s: 0,
            v_f: 0,
            omega: 0,
        });
        let mut reply = vec![11, framing::COMMAND_REPLY_FROM_ROBOT];
        reply.extend_from_slice(&response.to_packet());
        reply.extend_from_slice(&[2, framing::COMMAND_INIT_REPLY, 4, 0]);

        let output = radio.handle_transceiver_reply(&reply, 3_000_000);
        assert_eq!(output.responses.len(), 1);
        let rtt = output.responses[0].radio_rtt.unwrap();
        assert!((rtt - 0.002).abs() < 1e-6);
        assert_eq!(
            output.events,
            vec![TransceiverEvent::ProtocolMismatch { expected: 5, actual: 4 }]
        );
        assert_eq!(radio.dropped_frames().ratio(Generation::Gen2014, 6), Some(0.0));
    }
}
