//! Packing of per-robot commands into the fixed-size radio structs.
//!
//! Every physical quantity is saturated to the range of its wire field, out of range
//! inputs are clamped and never reported. Velocities travel in mm/s and mrad/s.

use crate::radio::generation::Generation;
use num_traits::clamp;
use serde::{Deserialize, Serialize};

pub const V_MAX: i32 = 32767;
pub const OMEGA_MAX: i32 = 32767;
pub const DELTA_V_MAX: i32 = 127;
pub const DELTA_OMEGA_MAX: i32 = 127;
pub const KICK_MAX: f32 = 255.0;
pub const DRIBBLER_MAX: f32 = 100.0;
/// Kick power in m/s mapped to a full `shot_power` for linear kicks.
pub const LINEAR_MAX: f32 = 10.0;
/// Kick distance in m mapped to a full `shot_power` for chip kicks.
pub const CHIP_MAX: f32 = 5.0;
pub const IR_PARAM_MAX: u8 = 63;
/// Marks the `cur_*` fields when no velocity measurement is available.
pub const INVALID_SPEED: i16 = i16::MIN;

/// Delta fields for linear velocities count in steps of 2 mm/s.
pub const V_QUANTIZATION: f32 = 2.0;
/// Delta fields for angular velocities count in steps of 5 mrad/s.
pub const OMEGA_QUANTIZATION: f32 = 5.0;

/// Robot local velocity in m/s (sideways, forward) and rad/s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub v_s: f32,
    pub v_f: f32,
    pub omega: f32,
}

impl Velocity {
    pub fn new(v_s: f32, v_f: f32, omega: f32) -> Self {
        Self { v_s, v_f, omega }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KickStyle {
    #[default]
    Linear,
    Chip,
}

/// Controller output for one robot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotCommand {
    /// Target velocities for the current and the two following ticks.
    pub output0: Velocity,
    pub output1: Velocity,
    pub output2: Velocity,
    pub kick_style: KickStyle,
    /// m/s for linear kicks, m for chip kicks.
    pub kick_power: f32,
    /// Relative dribbler speed in `[-1, 1]`.
    pub dribbler: f32,
    pub standby: bool,
    pub force_kick: bool,
    pub eject_sdcard: bool,
    /// Velocity measured by the tracking, used by closed-loop controllers on the robot.
    pub current_velocity: Option<Velocity>,
}

/// A command addressed to a single robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioCommand {
    pub generation: Generation,
    pub id: u32,
    pub command: RobotCommand,
}

fn saturate(value: f32, scale: f32, max: i32) -> i32 {
    clamp((value * scale) as i32, -max, max)
}

fn velocity_field(value: f32) -> i16 {
    saturate(value, 1000.0, V_MAX) as i16
}

fn omega_field(value: f32) -> i16 {
    saturate(value, 1000.0, OMEGA_MAX) as i16
}

fn delta_v_field(delta: f32) -> i8 {
    saturate(delta, 1000.0 / V_QUANTIZATION, DELTA_V_MAX) as i8
}

fn delta_omega_field(delta: f32) -> i8 {
    saturate(delta, 1000.0 / OMEGA_QUANTIZATION, DELTA_OMEGA_MAX) as i8
}

fn dribbler_field(dribbler: f32) -> i8 {
    saturate(dribbler, DRIBBLER_MAX, DRIBBLER_MAX as i32) as i8
}

fn shot_power_field(power: f32, max_power: f32) -> u8 {
    (power / max_power * KICK_MAX).min(KICK_MAX) as u8
}

fn flag(value: bool, bit: u8) -> u8 {
    (value as u8) << bit
}

fn is_set(byte: u8, bit: u8) -> bool {
    byte & (1 << bit) != 0
}

/// Command layout of the 2012 robots (10 bytes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Command2012 {
    pub counter: u8,
    pub shot_power: u8,
    pub chip: bool,
    pub charge: bool,
    pub standby: bool,
    pub id: u8,
    pub dribbler: i8,
    pub v_x: i16,
    pub v_y: i16,
    pub omega: i16,
}

impl Command2012 {
    pub const SIZE: usize = 10;

    pub fn new(id: u8, command: &RobotCommand, charge: bool, counter: u8) -> Self {
        Self {
            counter,
            // 2012 robots take the kick power as a fraction of the maximum
            shot_power: shot_power_field(command.kick_power, 1.0),
            chip: command.kick_style == KickStyle::Chip,
            charge,
            standby: command.standby,
            id: id & 0x0f,
            dribbler: dribbler_field(command.dribbler),
            v_x: velocity_field(command.output0.v_s),
            v_y: velocity_field(command.output0.v_f),
            omega: omega_field(command.output0.omega),
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut data = [0u8; Self::SIZE];
        data[0] = self.counter;
        data[1] = self.shot_power;
        data[2] = flag(self.chip, 0) | flag(self.charge, 1) | flag(self.standby, 2) | (self.id & 0x0f) << 3;
        data[3] = self.dribbler as u8;
        data[4..6].copy_from_slice(&self.v_x.to_le_bytes());
        data[6..8].copy_from_slice(&self.v_y.to_le_bytes());
        data[8..10].copy_from_slice(&self.omega.to_le_bytes());
        data
    }

    /// Reads a command the way the robot firmware does.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() != Self::SIZE {
            return None;
        }
        Some(Self {
            counter: data[0],
            shot_power: data[1],
            chip: is_set(data[2], 0),
            charge: is_set(data[2], 1),
            standby: is_set(data[2], 2),
            id: (data[2] >> 3) & 0x0f,
            dribbler: data[3] as i8,
            v_x: i16::from_le_bytes([data[4], data[5]]),
            v_y: i16::from_le_bytes([data[6], data[7]]),
            omega: i16::from_le_bytes([data[8], data[9]]),
        })
    }
}

/// Command layout of the 2014 robots, reused unchanged by the 2018 robots (23 bytes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Command2014 {
    pub counter: u8,
    pub shot_power: u8,
    pub chip: bool,
    pub charge: bool,
    pub standby: bool,
    pub id: u8,
    pub force_kick: bool,
    pub dribbler: i8,
    pub v_s: i16,
    pub v_f: i16,
    pub omega: i16,
    pub ir_param: u8,
    pub eject_sdcard: bool,
    pub cur_v_s: i16,
    pub cur_v_f: i16,
    pub cur_omega: i16,
    pub delta1_v_s: i8,
    pub delta1_v_f: i8,
    pub delta1_omega: i8,
    pub delta2_v_s: i8,
    pub delta2_v_f: i8,
    pub delta2_omega: i8,
}

impl Command2014 {
    pub const SIZE: usize = 23;

    pub fn new(id: u8, command: &RobotCommand, charge: bool, counter: u8, ir_param: u8) -> Self {
        let chip = command.kick_style == KickStyle::Chip;
        let max_power = if chip { CHIP_MAX } else { LINEAR_MAX };
        let (out0, out1, out2) = (&command.output0, &command.output1, &command.output2);

        let delta1_omega = delta_omega_field(out1.omega - out0.omega);
        // The robot reconstructs the second tick from the quantized first delta,
        // so the second delta is taken relative to what it will actually see.
        let sent_delta1_omega = delta1_omega as f32 * (OMEGA_QUANTIZATION / 1000.0);
        let omega_with_delta1 = out0.omega + sent_delta1_omega;

        let (cur_v_s, cur_v_f, cur_omega) = match &command.current_velocity {
            Some(current) => (
                velocity_field(current.v_s),
                velocity_field(current.v_f),
                omega_field(current.omega),
            ),
            None => (INVALID_SPEED, INVALID_SPEED, INVALID_SPEED),
        };

        Self {
            counter,
            shot_power: shot_power_field(command.kick_power, max_power),
            chip,
            charge,
            standby: command.standby,
            id: id & 0x0f,
            force_kick: command.force_kick,
            dribbler: dribbler_field(command.dribbler),
            v_s: velocity_field(out0.v_s),
            v_f: velocity_field(out0.v_f),
            omega: omega_field(out0.omega),
            ir_param: ir_param.min(IR_PARAM_MAX),
            eject_sdcard: command.eject_sdcard,
            cur_v_s,
            cur_v_f,
            cur_omega,
            delta1_v_s: delta_v_field(out1.v_s - out0.v_s),
            delta1_v_f: delta_v_field(out1.v_f - out0.v_f),
            delta1_omega,
            delta2_v_s: delta_v_field(out2.v_s - out1.v_s),
            delta2_v_f: delta_v_field(out2.v_f - out1.v_f),
            delta2_omega: delta_omega_field(out2.omega - omega_with_delta1),
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut data = [0u8; Self::SIZE];
        data[0] = self.counter;
        data[1] = self.shot_power;
        data[2] = flag(self.chip, 0)
            | flag(self.charge, 1)
            | flag(self.standby, 2)
            | (self.id & 0x0f) << 3
            | flag(self.force_kick, 7);
        data[3] = self.dribbler as u8;
        data[4..6].copy_from_slice(&self.v_s.to_le_bytes());
        data[6..8].copy_from_slice(&self.v_f.to_le_bytes());
        data[8..10].copy_from_slice(&self.omega.to_le_bytes());
        data[10] = (self.ir_param & IR_PARAM_MAX) | flag(self.eject_sdcard, 6);
        data[11..13].copy_from_slice(&self.cur_v_s.to_le_bytes());
        data[13..15].copy_from_slice(&self.cur_v_f.to_le_bytes());
        data[15..17].copy_from_slice(&self.cur_omega.to_le_bytes());
        data[17] = self.delta1_v_s as u8;
        data[18] = self.delta1_v_f as u8;
        data[19] = self.delta1_omega as u8;
        data[20] = self.delta2_v_s as u8;
        data[21] = self.delta2_v_f as u8;
        data[22] = self.delta2_omega as u8;
        data
    }

    /// Reads a command the way the robot firmware does.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() != Self::SIZE {
            return None;
        }
        let i16_at = |index: usize| i16::from_le_bytes([data[index], data[index + 1]]);
        Some(Self {
            counter: data[0],
            shot_power: data[1],
            chip: is_set(data[2], 0),
            charge: is_set(data[2], 1),
            standby: is_set(data[2], 2),
            id: (data[2] >> 3) & 0x0f,
            force_kick: is_set(data[2], 7),
            dribbler: data[3] as i8,
            v_s: i16_at(4),
            v_f: i16_at(6),
            omega: i16_at(8),
            ir_param: data[10] & IR_PARAM_MAX,
            eject_sdcard: is_set(data[10], 6),
            cur_v_s: i16_at(11),
            cur_v_f: i16_at(13),
            cur_omega: i16_at(15),
            delta1_v_s: data[17] as i8,
            delta1_v_f: data[18] as i8,
            delta1_omega: data[19] as i8,
            delta2_v_s: data[20] as i8,
            delta2_v_f: data[21] as i8,
            delta2_omega: data[22] as i8,
        })
    }

    /// Velocities for the three ticks as reconstructed on the robot.
    pub fn decoded_outputs(&self) -> [Velocity; 3] {
        let v_step = V_QUANTIZATION / 1000.0;
        let omega_step = OMEGA_QUANTIZATION / 1000.0;
        let out0 = Velocity::new(
            self.v_s as f32 / 1000.0,
            self.v_f as f32 / 1000.0,
            self.omega as f32 / 1000.0,
        );
        let out1 = Velocity::new(
            out0.v_s + self.delta1_v_s as f32 * v_step,
            out0.v_f + self.delta1_v_f as f32 * v_step,
            out0.omega + self.delta1_omega as f32 * omega_step,
        );
        let out2 = Velocity::new(
            out1.v_s + self.delta2_v_s as f32 * v_step,
            out1.v_f + self.delta2_v_f as f32 * v_step,
            out1.omega + self.delta2_omega as f32 * omega_step,
        );
        [out0, out1, out2]
    }
}

/// Broadcast that aligns the robot control loops with the host cycle (3 bytes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sync2014 {
    pub counter: u8,
    /// Microseconds between the host timestamp and the packet reception.
    pub time_offset: i16,
}

impl Sync2014 {
    pub const SIZE: usize = 3;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let offset = self.time_offset.to_le_bytes();
        [self.counter, offset[0], offset[1]]
    }

    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() != Self::SIZE {
            return None;
        }
        Some(Self {
            counter: data[0],
            time_offset: i16::from_le_bytes([data[1], data[2]]),
        })
    }
}

/// Packs a command for the given generation.
pub fn encode_command(
    generation: Generation,
    id: u8,
    command: &RobotCommand,
    charge: bool,
    counter: u8,
    ir_param: u8,
) -> Vec<u8> {
    match generation {
        Generation::Gen2012 => Command2012::new(id, command, charge, counter).to_bytes().to_vec(),
        Generation::Gen2014 | Generation::Gen2018 => {
            Command2014::new(id, command, charge, counter, ir_param).to_bytes().to_vec()
        }
    }
}
