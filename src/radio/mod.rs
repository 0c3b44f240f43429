//! The ground-station radio link: ships and receives fixed 128-byte
//! packets. Modem framing, retries, and RSSI are out of scope - this
//! crate only needs to send and receive whole packets.

pub mod packet;

use crate::error::RadioError;
use packet::PACKET_LEN;

/// Transport-level contract for the radio modem.
pub trait RadioLink {
    /// Send one complete 128-byte packet.
    fn send(&mut self, frame: &[u8; PACKET_LEN]) -> Result<(), RadioError>;

    /// Poll for a received packet without blocking. `Err(NoFrame)` means
    /// nothing arrived this tick, not a transport fault.
    fn try_receive(&mut self) -> Result<[u8; PACKET_LEN], RadioError>;
}

/// A map from a board's coil index to the `ActuatorId` it drives,
/// so the Actuator Writer can turn a `ActuatorVector` diff into the
/// handful of `write_coil` calls the field bus actually needs - rather
/// than rewriting all sixteen coils every tick regardless of whether
/// they changed.
#[derive(Debug, Clone, Copy)]
pub struct CoilMap {
    entries: [(crate::actuators::ActuatorId, crate::bus::BoardAddress, u16); crate::actuators::ACTUATOR_COUNT],
}

impl CoilMap {
    pub const fn new(entries: [(crate::actuators::ActuatorId, crate::bus::BoardAddress, u16); crate::actuators::ACTUATOR_COUNT]) -> Self {
        Self { entries }
    }

    pub fn coil_for(&self, id: crate::actuators::ActuatorId) -> (crate::bus::BoardAddress, u16) {
        let (_, board, coil) = self.entries.iter().find(|(aid, _, _)| *aid == id).expect("CoilMap must cover every ActuatorId");
        (*board, *coil)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuators::ActuatorId;
    use crate::bus::BoardAddress;

    fn test_map() -> CoilMap {
        let board = BoardAddress::new(1);
        CoilMap::new(ActuatorId::ALL.map(|id| (id, board, id.bit() as u16)))
    }

    #[test]
    fn resolves_every_actuator() {
        let map = test_map();
        for id in ActuatorId::ALL {
            let (board, coil) = map.coil_for(id);
            assert_eq!(board.slave_id(), 1);
            assert_eq!(coil, id.bit() as u16);
        }
    }
}
