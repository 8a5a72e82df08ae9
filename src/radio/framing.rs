//! USB framing of the 2015 transceiver.
//!
//! Host to transceiver frames are `{command, size, payload}`, replies are
//! `{size, command, payload}`. All integers are little endian.

use crate::error::{Error, Result};
use crate::radio::address::{Address, NRF_ADDRESS_LENGTH};

pub const PROTOCOL_VERSION: u16 = 5;

pub const COMMAND_INIT: u8 = 0x00;
pub const COMMAND_PING: u8 = 0x01;
pub const COMMAND_STATUS: u8 = 0x02;
pub const COMMAND_SET_FREQUENCY: u8 = 0x10;
pub const COMMAND_SEND_NRF24: u8 = 0x11;

pub const COMMAND_INIT_REPLY: u8 = 0x80;
pub const COMMAND_PING_REPLY: u8 = 0x81;
pub const COMMAND_STATUS_REPLY: u8 = 0x82;
pub const COMMAND_REPLY_FROM_ROBOT: u8 = 0x90;
pub const COMMAND_SEND_NRF24_DATA_FAILED: u8 = 0x91;
pub const COMMAND_DATAGRAM_RECEIVED: u8 = 0x92;

const HEADER_SIZE: usize = 2;
const SEND_NRF24_HEADER_SIZE: usize = NRF_ADDRESS_LENGTH + 1;
const PING_SIZE: usize = 8;
const STATUS_SIZE: usize = 4;

/// Collects the frames of one transmission cycle.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    buffer: Vec<u8>,
    transfer_chunk_size: usize,
}

impl FrameBuilder {
    pub fn new(transfer_chunk_size: usize) -> Self {
        Self {
            buffer: Vec::new(),
            transfer_chunk_size,
        }
    }

    fn push_header(&mut self, command: u8, size: usize) {
        self.buffer.push(command);
        self.buffer.push(size as u8);
    }

    /// Queues a radio packet.
    ///
    /// Parameters:
    /// - `expected_response_size`: Bytes the transceiver waits for a reply, 0 for none.
    /// - `payload`: At most 249 bytes.
    pub fn add_send_command(&mut self, target: &Address, expected_response_size: u8, payload: &[u8]) {
        self.push_header(COMMAND_SEND_NRF24, SEND_NRF24_HEADER_SIZE + payload.len());
        self.buffer.extend_from_slice(&target.nrf_address());
        self.buffer.push(expected_response_size);
        self.buffer.extend_from_slice(payload);
    }

    /// Queues a ping carrying the host time in nanoseconds, echoed back by the transceiver.
    pub fn add_ping(&mut self, time: i64) {
        self.push_header(COMMAND_PING, PING_SIZE);
        self.buffer.extend_from_slice(&time.to_le_bytes());
    }

    /// Requests the count of dropped USB packets.
    pub fn add_status_request(&mut self) {
        self.push_header(COMMAND_STATUS, 0);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Finishes the cycle. A buffer filling whole transfer chunks gets an extra ping,
    /// the transceiver does not handle transfers of an exact multiple of the chunk size.
    pub fn finish(mut self, time: i64) -> Vec<u8> {
        if self.transfer_chunk_size > 0 && self.buffer.len() % self.transfer_chunk_size == 0 {
            self.add_ping(time);
        }
        self.buffer
    }
}

/// Handshake sent after opening the device.
pub fn init_frame() -> Vec<u8> {
    let mut frame = vec![COMMAND_INIT, 2];
    frame.extend_from_slice(&PROTOCOL_VERSION.to_le_bytes());
    frame
}

pub fn set_frequency_frame(channel: u8) -> Vec<u8> {
    vec![COMMAND_SET_FREQUENCY, 1, channel]
}

/// Fails with `Error::ProtocolVersion` unless the transceiver speaks exactly our version.
pub fn check_protocol_version(actual: u16) -> Result<()> {
    if actual != PROTOCOL_VERSION {
        return Err(Error::ProtocolVersion {
            expected: PROTOCOL_VERSION,
            actual,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransceiverReply {
    Init { protocol_version: u16 },
    /// Host time of the echoed ping in nanoseconds.
    Ping { time: i64 },
    Status { dropped_packets: u32 },
    /// Raw robot reply starting with the response header byte.
    RobotResponse(Vec<u8>),
    SendFailed,
    Datagram(String),
}

/// Splits a transceiver transfer into replies.
///
/// Parsing stops at the first incomplete frame. Unknown commands and replies too
/// short for their command are skipped.
pub fn parse_replies(buffer: &[u8]) -> Vec<TransceiverReply> {
    let mut replies = Vec::new();
    let mut pos = 0;
    while pos + HEADER_SIZE <= buffer.len() {
        let size = buffer[pos] as usize;
        let command = buffer[pos + 1];
        let start = pos + HEADER_SIZE;
        let Some(payload) = buffer.get(start..start + size) else {
            log::debug!("Incomplete transceiver reply, {} of {} bytes", buffer.len() - start, size);
            break;
        };
        pos = start + size;

        let reply = match command {
            COMMAND_INIT_REPLY if size >= 2 => Some(TransceiverReply::Init {
                protocol_version: u16::from_le_bytes([payload[0], payload[1]]),
            }),
            COMMAND_PING_REPLY if size >= PING_SIZE => {
                let mut time = [0u8; PING_SIZE];
                time.copy_from_slice(&payload[..PING_SIZE]);
                Some(TransceiverReply::Ping {
                    time: i64::from_le_bytes(time),
                })
            }
            COMMAND_STATUS_REPLY if size >= STATUS_SIZE => Some(TransceiverReply::Status {
                dropped_packets: u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]),
            }),
            COMMAND_REPLY_FROM_ROBOT => Some(TransceiverReply::RobotResponse(payload.to_vec())),
            COMMAND_SEND_NRF24_DATA_FAILED => Some(TransceiverReply::SendFailed),
            COMMAND_DATAGRAM_RECEIVED => Some(TransceiverReply::Datagram(
                String::from_utf8_lossy(payload).into_owned(),
            )),
            _ => None,
        };
        match reply {
            Some(reply) => replies.push(reply),
            None => log::debug!("Skipping transceiver reply 0x{:02x} of {} bytes", command, size),
        }
    }
    replies
}
