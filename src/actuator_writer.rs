//! Writes the HSM's actuator vector out to the field bus: diffs against
//! the last vector actually written and issues one `write_coil` per
//! changed bit, rather than eighteen coil writes every tick regardless
//! of whether anything moved.

use crate::actuators::{ActuatorId, ActuatorVector};
use crate::bus::BusClient;
use crate::error::BusError;
use crate::radio::CoilMap;

pub struct ActuatorWriter {
    coils: CoilMap,
    last_written: ActuatorVector,
}

impl ActuatorWriter {
    pub const fn new(coils: CoilMap) -> Self {
        Self {
            coils,
            last_written: ActuatorVector::empty(),
        }
    }

    /// Write every actuator bit that differs from the last call. The
    /// first call after construction always writes every bit that is
    /// set, since `last_written` starts empty.
    pub fn write_diff(&mut self, bus: &mut dyn BusClient, target: ActuatorVector) -> Result<u8, BusError> {
        let mut writes = 0u8;
        for id in ActuatorId::ALL {
            let was_on = self.last_written.is_set(id);
            let now_on = target.is_set(id);
            if was_on != now_on {
                let (board, coil) = self.coils.coil_for(id);
                bus.write_coil(board, coil, now_on)?;
                writes += 1;
            }
        }
        self.last_written = target;
        Ok(writes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::BoardAddress;

    struct RecordingBus {
        writes: heapless::Vec<(BoardAddress, u16, bool), 16>,
    }

    impl BusClient for RecordingBus {
        fn read_input_regs(&mut self, _board: BoardAddress, _start: u16, _out: &mut [u16]) -> Result<(), BusError> {
            unimplemented!()
        }

        fn read_coils(&mut self, _board: BoardAddress, _start: u16, _count: u16, _out: &mut [u8]) -> Result<(), BusError> {
            unimplemented!()
        }

        fn write_coil(&mut self, board: BoardAddress, coil: u16, value: bool) -> Result<(), BusError> {
            self.writes.push((board, coil, value)).unwrap();
            Ok(())
        }
    }

    fn test_map() -> CoilMap {
        let board = BoardAddress::new(1);
        CoilMap::new(ActuatorId::ALL.map(|id| (id, board, id.bit() as u16)))
    }

    #[test]
    fn first_write_emits_every_set_bit() {
        let mut writer = ActuatorWriter::new(test_map());
        let mut bus = RecordingBus { writes: heapless::Vec::new() };
        let target = ActuatorVector::from_open(&[ActuatorId::Abort, ActuatorId::Vent]);

        let writes = writer.write_diff(&mut bus, target).unwrap();
        assert_eq!(writes, 2);
    }

    #[test]
    fn unchanged_vector_writes_nothing() {
        let mut writer = ActuatorWriter::new(test_map());
        let mut bus = RecordingBus { writes: heapless::Vec::new() };
        let target = ActuatorVector::from_open(&[ActuatorId::Abort]);

        writer.write_diff(&mut bus, target).unwrap();
        let writes = writer.write_diff(&mut bus, target).unwrap();
        assert_eq!(writes, 0);
    }

    #[test]
    fn only_changed_bits_are_written() {
        let mut writer = ActuatorWriter::new(test_map());
        let mut bus = RecordingBus { writes: heapless::Vec::new() };

        writer.write_diff(&mut bus, ActuatorVector::from_open(&[ActuatorId::Abort, ActuatorId::Vent])).unwrap();
        let writes = writer
            .write_diff(&mut bus, ActuatorVector::from_open(&[ActuatorId::Abort, ActuatorId::Main]))
            .unwrap();
        // Vent turns off, Main turns on; Abort is unchanged.
        assert_eq!(writes, 2);
    }
}
