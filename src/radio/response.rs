//! Robot telemetry as it arrives from the transceiver.

use crate::radio::command::Velocity;
use crate::radio::generation::Generation;
use serde::{Deserialize, Serialize};

/// Response header byte plus the fixed-size body.
pub const RESPONSE_HEADER_SIZE: usize = 1;

const EXTENSION_BASIC_STATUS: u8 = 0;
const EXTENSION_EXTENDED_ERROR: u8 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedError {
    pub motor_1_error: bool,
    pub motor_2_error: bool,
    pub motor_3_error: bool,
    pub motor_4_error: bool,
    pub dribbler_error: bool,
    pub kicker_error: bool,
    pub kicker_break_beam_error: bool,
    pub motor_encoder_error: bool,
    pub main_sensor_error: bool,
    /// Degrees Celsius, 7 bits.
    pub temperature: u8,
}

impl ExtendedError {
    fn from_bytes(data: [u8; 2]) -> Self {
        let bit = |byte: u8, index: u8| byte & (1 << index) != 0;
        Self {
            motor_1_error: bit(data[0], 0),
            motor_2_error: bit(data[0], 1),
            motor_3_error: bit(data[0], 2),
            motor_4_error: bit(data[0], 3),
            dribbler_error: bit(data[0], 4),
            kicker_error: bit(data[0], 5),
            kicker_break_beam_error: bit(data[0], 6),
            motor_encoder_error: bit(data[0], 7),
            main_sensor_error: bit(data[1], 0),
            temperature: data[1] >> 1,
        }
    }

    fn to_bytes(self) -> [u8; 2] {
        let flags = [
            self.motor_1_error,
            self.motor_2_error,
            self.motor_3_error,
            self.motor_4_error,
            self.dribbler_error,
            self.kicker_error,
            self.kicker_break_beam_error,
            self.motor_encoder_error,
        ];
        let first = flags
            .iter()
            .enumerate()
            .fold(0u8, |byte, (index, &set)| byte | (set as u8) << index);
        [first, (self.main_sensor_error as u8) | (self.temperature & 0x7f) << 1]
    }
}

/// The two byte view selected by the 4 bit extension id. At most one view is valid per packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    BasicStatus { battery: u8, packet_loss: u8 },
    ExtendedError(ExtendedError),
    Unknown { id: u8, data: [u8; 2] },
}

impl Extension {
    fn id(&self) -> u8 {
        match self {
            Extension::BasicStatus { .. } => EXTENSION_BASIC_STATUS,
            Extension::ExtendedError(_) => EXTENSION_EXTENDED_ERROR,
            Extension::Unknown { id, .. } => *id & 0x0f,
        }
    }

    fn data(&self) -> [u8; 2] {
        match self {
            Extension::BasicStatus { battery, packet_loss } => [*battery, *packet_loss],
            Extension::ExtendedError(error) => error.to_bytes(),
            Extension::Unknown { data, .. } => *data,
        }
    }
}

/// Response layout of the 2012 robots (11 bytes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Response2012 {
    pub counter: u8,
    pub id: u8,
    pub main_active: bool,
    pub kicker_active: bool,
    pub ball_detected: bool,
    pub cap_charged: bool,
    pub battery: u8,
    pub packet_loss: u8,
    pub v_s: i16,
    pub v_f: i16,
    pub omega: i16,
    pub motor_in_power_limit: bool,
}

impl Response2012 {
    pub const SIZE: usize = 11;

    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() != Self::SIZE {
            return None;
        }
        Some(Self {
            counter: data[0],
            id: data[1] & 0x0f,
            main_active: data[1] & 0x10 != 0,
            kicker_active: data[1] & 0x20 != 0,
            ball_detected: data[1] & 0x40 != 0,
            cap_charged: data[1] & 0x80 != 0,
            battery: data[2],
            packet_loss: data[3],
            v_s: i16::from_le_bytes([data[4], data[5]]),
            v_f: i16::from_le_bytes([data[6], data[7]]),
            omega: i16::from_le_bytes([data[8], data[9]]),
            motor_in_power_limit: data[10] & 0x01 != 0,
        })
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut data = [0u8; Self::SIZE];
        data[0] = self.counter;
        data[1] = (self.id & 0x0f)
            | (self.main_active as u8) << 4
            | (self.kicker_active as u8) << 5
            | (self.ball_detected as u8) << 6
            | (self.cap_charged as u8) << 7;
        data[2] = self.battery;
        data[3] = self.packet_loss;
        data[4..6].copy_from_slice(&self.v_s.to_le_bytes());
        data[6..8].copy_from_slice(&self.v_f.to_le_bytes());
        data[8..10].copy_from_slice(&self.omega.to_le_bytes());
        data[10] = self.motor_in_power_limit as u8;
        data
    }
}

/// Response layout of the 2014 robots, reused unchanged by the 2018 robots (10 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response2014 {
    pub counter: u8,
    pub id: u8,
    pub power_enabled: bool,
    pub error_present: bool,
    pub ball_detected: bool,
    pub cap_charged: bool,
    pub extension: Extension,
    /// Only meaningful while `power_enabled` is set.
    pub v_s: i16,
    pub v_f: i16,
    pub omega: i16,
}

fn sign_extend_14(raw: u32) -> i16 {
    (((raw & 0x3fff) << 18) as i32 >> 18) as i16
}

impl Response2014 {
    pub const SIZE: usize = 10;

    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() != Self::SIZE {
            return None;
        }
        let packed = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        let extension_id = (packed & 0x0f) as u8;
        let extension = match extension_id {
            EXTENSION_BASIC_STATUS => Extension::BasicStatus {
                battery: data[2],
                packet_loss: data[3],
            },
            EXTENSION_EXTENDED_ERROR => Extension::ExtendedError(ExtendedError::from_bytes([data[2], data[3]])),
            id => Extension::Unknown {
                id,
                data: [data[2], data[3]],
            },
        };
        Some(Self {
            counter: data[0],
            id: data[1] & 0x0f,
            power_enabled: data[1] & 0x10 != 0,
            error_present: data[1] & 0x20 != 0,
            ball_detected: data[1] & 0x40 != 0,
            cap_charged: data[1] & 0x80 != 0,
            extension,
            v_s: sign_extend_14(packed >> 4),
            v_f: sign_extend_14(packed >> 18),
            omega: i16::from_le_bytes([data[8], data[9]]),
        })
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut data = [0u8; Self::SIZE];
        data[0] = self.counter;
        data[1] = (self.id & 0x0f)
            | (self.power_enabled as u8) << 4
            | (self.error_present as u8) << 5
            | (self.ball_detected as u8) << 6
            | (self.cap_charged as u8) << 7;
        data[2..4].copy_from_slice(&self.extension.data());
        let packed = self.extension.id() as u32
            | ((self.v_s as u32) & 0x3fff) << 4
            | ((self.v_f as u32) & 0x3fff) << 18;
        data[4..8].copy_from_slice(&packed.to_le_bytes());
        data[8..10].copy_from_slice(&self.omega.to_le_bytes());
        data
    }

    /// Packet loss reported by the robot, only present in basic status packets.
    pub fn packet_loss(&self) -> Option<u8> {
        match self.extension {
            Extension::BasicStatus { packet_loss, .. } => Some(packet_loss),
            _ => None,
        }
    }
}

/// A robot reply with its response header stripped and its size validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotResponse {
    Gen2012(Response2012),
    Gen2014(Response2014),
    Gen2018(Response2014),
}

impl RobotResponse {
    /// Parses a raw reply including the response header byte.
    ///
    /// Returns `None` for unknown headers and for bodies that do not match the
    /// expected size of the generation.
    pub fn parse(packet: &[u8]) -> Option<Self> {
        let (&header, body) = packet.split_first()?;
        match Generation::from_response_command(header)? {
            Generation::Gen2012 => Response2012::parse(body).map(RobotResponse::Gen2012),
            Generation::Gen2014 => Response2014::parse(body).map(RobotResponse::Gen2014),
            Generation::Gen2018 => Response2014::parse(body).map(RobotResponse::Gen2018),
        }
    }

    /// Serializes the reply including its header, as sent by the robot.
    pub fn to_packet(&self) -> Vec<u8> {
        let mut packet = vec![self.generation().response_command()];
        match self {
            RobotResponse::Gen2012(response) => packet.extend_from_slice(&response.to_bytes()),
            RobotResponse::Gen2014(response) | RobotResponse::Gen2018(response) => {
                packet.extend_from_slice(&response.to_bytes())
            }
        }
        packet
    }

    pub fn generation(&self) -> Generation {
        match self {
            RobotResponse::Gen2012(_) => Generation::Gen2012,
            RobotResponse::Gen2014(_) => Generation::Gen2014,
            RobotResponse::Gen2018(_) => Generation::Gen2018,
        }
    }

    pub fn id(&self) -> u8 {
        match self {
            RobotResponse::Gen2012(response) => response.id,
            RobotResponse::Gen2014(response) | RobotResponse::Gen2018(response) => response.id,
        }
    }

    pub fn counter(&self) -> u8 {
        match self {
            RobotResponse::Gen2012(response) => response.counter,
            RobotResponse::Gen2014(response) | RobotResponse::Gen2018(response) => response.counter,
        }
    }
}

/// Decoded telemetry of one robot reply.
///
/// Fields are `None` when the packet did not carry them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RadioResponse {
    /// Receive time in nanoseconds.
    pub time: i64,
    pub generation: Option<Generation>,
    pub id: u32,
    /// Battery level in `[0, 1]`.
    pub battery: Option<f32>,
    /// Ratio of commands lost on the way to the robot, as reported by the robot.
    pub packet_loss_rx: Option<f32>,
    /// Ratio of responses lost on the way back, estimated from the frame counter.
    pub packet_loss_tx: Option<f32>,
    pub extended_error: Option<ExtendedError>,
    pub estimated_speed: Option<Velocity>,
    pub error_present: Option<bool>,
    pub ball_detected: Option<bool>,
    pub cap_charged: Option<bool>,
    pub motor_in_power_limit: Option<bool>,
    /// Seconds between sending the command and receiving this reply.
    pub radio_rtt: Option<f32>,
}

fn speed(v_s: i16, v_f: i16, omega: i16) -> Velocity {
    Velocity::new(v_s as f32 / 1000.0, v_f as f32 / 1000.0, omega as f32 / 1000.0)
}

impl RadioResponse {
    /// Fills in the telemetry of a parsed reply.
    ///
    /// Parameters:
    /// - `dropped_frames_ratio`: The current estimate for the sending robot.
    pub fn from_robot_response(response: &RobotResponse, time: i64, dropped_frames_ratio: f32) -> Self {
        let mut decoded = RadioResponse {
            time,
            generation: Some(response.generation()),
            id: response.id() as u32,
            ..Default::default()
        };
        match response {
            RobotResponse::Gen2012(packet) => {
                decoded.battery = Some(packet.battery as f32 / 255.0);
                decoded.packet_loss_rx = Some(packet.packet_loss as f32 / 255.0);
                decoded.packet_loss_tx = Some(dropped_frames_ratio);
                if packet.main_active {
                    decoded.estimated_speed = Some(speed(packet.v_s, packet.v_f, packet.omega));
                    decoded.motor_in_power_limit = Some(packet.motor_in_power_limit);
                }
                if packet.kicker_active {
                    decoded.ball_detected = Some(packet.ball_detected);
                    decoded.cap_charged = Some(packet.cap_charged);
                }
            }
            RobotResponse::Gen2014(packet) | RobotResponse::Gen2018(packet) => {
                match packet.extension {
                    Extension::BasicStatus { battery, packet_loss } => {
                        decoded.battery = Some(battery as f32 / 255.0);
                        decoded.packet_loss_rx = Some(packet_loss as f32 / 256.0);
                        decoded.packet_loss_tx = Some(dropped_frames_ratio);
                    }
                    Extension::ExtendedError(error) => decoded.extended_error = Some(error),
                    Extension::Unknown { id, .. } => {
                        log::debug!("Robot {} sent unknown extension id {}", packet.id, id);
                    }
                }
                if packet.power_enabled {
                    decoded.estimated_speed = Some(speed(packet.v_s, packet.v_f, packet.omega));
                    decoded.error_present = Some(packet.error_present);
                    decoded.ball_detected = Some(packet.ball_detected);
                    decoded.cap_charged = Some(packet.cap_charged);
                }
            }
        }
        decoded
    }
}
