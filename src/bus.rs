//! The RS-485 field bus: a Modbus-style abstraction over the filling
//! station's distributed I/O boards. The wire protocol itself (framing,
//! CRC, function codes) is out of scope - this crate only needs the
//! three transactions the SensorSampler and Actuator Writer issue every
//! tick, exposed as a trait so the hardware implementation can live
//! behind the `mcu` feature while everything above it stays testable on
//! the host.

use crate::error::BusError;

/// A board's address on the bus. Boards never move once wired, so this
/// is validated once at boot rather than on every transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoardAddress(u8);

impl BoardAddress {
    pub const fn new(slave_id: u8) -> Self {
        Self(slave_id)
    }

    pub const fn slave_id(self) -> u8 {
        self.0
    }
}

/// Transport-level contract for the field bus. A real implementation
/// wraps a UART peripheral and a Modbus RTU codec; this crate only ever
/// sees the three operations below.
pub trait BusClient {
    /// Read `count` contiguous 16-bit input registers starting at
    /// `start` from `board`.
    fn read_input_regs(&mut self, board: BoardAddress, start: u16, out: &mut [u16]) -> Result<(), BusError>;

    /// Read `count` contiguous coils starting at `start` from `board`,
    /// packed one bit per coil, low bit first.
    fn read_coils(&mut self, board: BoardAddress, start: u16, count: u16, out: &mut [u8]) -> Result<(), BusError>;

    /// Write a single coil on `board`.
    fn write_coil(&mut self, board: BoardAddress, coil: u16, value: bool) -> Result<(), BusError>;
}

/// Validate the mission's configured board addresses at boot: no two
/// boards may share a slave id, and id 0 (the Modbus broadcast address)
/// is never a valid board. A violation here is a wiring-configuration
/// mistake, not a runtime condition to recover from, so it panics
/// rather than returning a `Result` nothing downstream could act on.
pub fn validate_board_addresses(boards: &[BoardAddress]) {
    for (i, a) in boards.iter().enumerate() {
        if a.slave_id() == 0 {
            panic!("board address 0 is reserved for broadcast");
        }
        for b in &boards[i + 1..] {
            if a == b {
                panic!("duplicate board address {}", a.slave_id());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_disjoint_addresses() {
        validate_board_addresses(&[BoardAddress::new(1), BoardAddress::new(2), BoardAddress::new(3)]);
    }

    #[test]
    #[should_panic(expected = "duplicate board address")]
    fn rejects_duplicate_addresses() {
        validate_board_addresses(&[BoardAddress::new(1), BoardAddress::new(1)]);
    }

    #[test]
    #[should_panic(expected = "reserved for broadcast")]
    fn rejects_broadcast_address() {
        validate_board_addresses(&[BoardAddress::new(0)]);
    }
}
