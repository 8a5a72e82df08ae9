use crate::error::{Error, Result};
use crate::radio::generation::Generation;

/// Length of the address field in a transceiver send command.
pub const NRF_ADDRESS_LENGTH: usize = 5;

pub const ROBOT_2012_ADDRESS: [u8; 5] = [0xAA, 0xC0, 0xFF, 0xEE, 0x20];
pub const ROBOT_2012_CONFIG_BROADCAST: [u8; 5] = [0x55, 0xC0, 0xFF, 0xEE, 0xD7];
pub const ROBOT_2014_ADDRESS: [u8; 4] = [0x40, 0xE8, 0xE4, 0xC7];
pub const ROBOT_2018_ADDRESS: [u8; 4] = [0x60, 0xE8, 0xE4, 0xC7];
/// Shared by the 2014 and 2018 broadcasts, the generation tag is ORed into the first byte.
pub const ROBOT_DATAGRAM: [u8; 4] = [0x00, 0x00, 0x00, 0x00];

const BROADCAST_ID: u8 = 0x1f;
const MAX_UNICAST_ID: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Unicast(u8),
    Broadcast,
}

/// Destination of a radio packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    generation: Generation,
    target: Target,
}

impl Address {
    /// Fails with `Error::InvalidRobotId` for ids above 15.
    pub fn unicast(generation: Generation, id: u32) -> Result<Self> {
        if id > MAX_UNICAST_ID {
            return Err(Error::InvalidRobotId(id));
        }
        Ok(Self {
            generation,
            target: Target::Unicast(id as u8),
        })
    }

    pub fn broadcast(generation: Generation) -> Self {
        Self {
            generation,
            target: Target::Broadcast,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn is_broadcast(&self) -> bool {
        self.target == Target::Broadcast
    }

    pub fn unicast_target(&self) -> Option<u8> {
        match self.target {
            Target::Unicast(id) => Some(id),
            Target::Broadcast => None,
        }
    }

    /// The five byte nRF24 address. Four byte templates leave the last byte zero.
    pub fn nrf_address(&self) -> [u8; NRF_ADDRESS_LENGTH] {
        match (self.generation, self.target) {
            (Generation::Gen2012, Target::Unicast(id)) => {
                let mut address = ROBOT_2012_ADDRESS;
                address[4] |= id;
                address
            }
            (Generation::Gen2012, Target::Broadcast) => ROBOT_2012_CONFIG_BROADCAST,
            (Generation::Gen2014, Target::Broadcast) => with_first_byte(&ROBOT_DATAGRAM, BROADCAST_ID | 0x20),
            (Generation::Gen2018, Target::Broadcast) => {
                with_first_byte(&ROBOT_DATAGRAM, BROADCAST_ID | ROBOT_2018_ADDRESS[0])
            }
            (Generation::Gen2014, Target::Unicast(id)) => with_first_byte(&ROBOT_2014_ADDRESS, id),
            (Generation::Gen2018, Target::Unicast(id)) => with_first_byte(&ROBOT_2018_ADDRESS, id),
        }
    }
}

fn with_first_byte(template: &[u8; 4], bits: u8) -> [u8; NRF_ADDRESS_LENGTH] {
    let mut address = [0u8; NRF_ADDRESS_LENGTH];
    address[..4].copy_from_slice(template);
    address[0] |= bits;
    address
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Generation::Gen2014, 0, [0x40, 0xE8, 0xE4, 0xC7, 0x00])]
    #[case(Generation::Gen2014, 5, [0x45, 0xE8, 0xE4, 0xC7, 0x00])]
    #[case(Generation::Gen2018, 15, [0x6F, 0xE8, 0xE4, 0xC7, 0x00])]
    #[case(Generation::Gen2012, 3, [0xAA, 0xC0, 0xFF, 0xEE, 0x23])]
    fn unicast_addresses(#[case] generation: Generation, #[case] id: u32, #[case] expected: [u8; 5]) {
        let address = Address::unicast(generation, id).unwrap();
        assert_eq!(address.nrf_address(), expected);
        assert_eq!(address.unicast_target(), Some(id as u8));
    }

    #[test]
    fn broadcast_addresses() {
        assert_eq!(
            Address::broadcast(Generation::Gen2014).nrf_address(),
            [0x3F, 0x00, 0x00, 0x00, 0x00]
        );
        assert_eq!(
            Address::broadcast(Generation::Gen2018).nrf_address(),
            [0x7F, 0x00, 0x00, 0x00, 0x00]
        );
        assert_eq!(
            Address::broadcast(Generation::Gen2012).nrf_address(),
            ROBOT_2012_CONFIG_BROADCAST
        );
        assert!(Address::broadcast(Generation::Gen2018).is_broadcast());
    }

    #[test]
    fn robot_id_out_of_range() {
        assert!(matches!(
            Address::unicast(Generation::Gen2014, 16),
            Err(Error::InvalidRobotId(16))
        ));
    }
}
