//! Periodic sensor sampling over the field bus. The Hydra sampler (N2O/N2
//! tank instrumentation) and the Lift sampler (load cells) are separate
//! instances of the same generic sampler, run from two independently
//! periodic tasks at their own configured rates - the Lift board's load
//! cells don't need polling anywhere near as often as the tank
//! thermocouples and pressures do, so there's no reason to share a
//! period between them.
//!
//! A board that stops answering doesn't halt the loop - its slots in
//! the published bundle are zeroed and the fault is counted, not
//! escalated, matching the per-board independence the field bus already
//! gives each slave address. A board flags its connection edge (lost or
//! regained) exactly once, not on every failed or successful poll after
//! the first.

#[cfg(feature = "mcu")]
use defmt::{println, Format};

use crate::bus::{BoardAddress, BusClient};
use crate::error::BusError;
use crate::sensors::{Loadcells, Pressures, SensorSnapshot, Thermocouples};

/// One field-bus board this sampler polls, and where its registers land
/// in the published bundle.
#[derive(Debug, Clone, Copy)]
pub struct SensorBoard {
    pub address: BoardAddress,
    pub thermocouple_base: Option<u16>,
    pub pressure_base: Option<u16>,
    pub loadcell_base: Option<u16>,
    /// Ground support equipment: stops being polled once the HSM
    /// reports any flight substate, since it's no longer reachable
    /// (or relevant) once the rocket has left the pad.
    pub is_fill_station: bool,
}

/// Per-tick outcome, kept for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "mcu", derive(Format))]
pub struct SampleOutcome {
    pub boards_read: u8,
    pub boards_faulted: u8,
    pub boards_skipped: u8,
}

/// One board's live connection state, tracked separately from its
/// static wiring so `SensorBoard` itself can stay `Copy`.
#[derive(Debug, Clone, Copy)]
struct BoardState {
    connected: bool,
}

pub struct SensorSampler<const N: usize> {
    boards: [SensorBoard; N],
    state: [BoardState; N],
}

impl<const N: usize> SensorSampler<N> {
    pub const fn new(boards: [SensorBoard; N]) -> Self {
        Self {
            boards,
            state: [BoardState { connected: true }; N],
        }
    }

    /// Poll every configured board once, publishing into `snapshot`
    /// whatever was read and zeroing a board's slots on failure.
    /// Fill-station boards are skipped entirely once
    /// `fill_station_disabled` is set.
    pub fn sample(&mut self, bus: &mut dyn BusClient, snapshot: &mut SensorSnapshot, fill_station_disabled: bool) -> SampleOutcome {
        let mut outcome = SampleOutcome {
            boards_read: 0,
            boards_faulted: 0,
            boards_skipped: 0,
        };

        for (board, state) in self.boards.iter().zip(self.state.iter_mut()) {
            if board.is_fill_station && fill_station_disabled {
                outcome.boards_skipped += 1;
                continue;
            }

            let mut ok = true;

            if let Some(base) = board.thermocouple_base {
                if read_thermocouples(bus, board.address, base, &mut snapshot.thermocouples).is_err() {
                    snapshot.thermocouples = Thermocouples::default();
                    ok = false;
                }
            }
            if let Some(base) = board.pressure_base {
                if read_pressures(bus, board.address, base, &mut snapshot.pressures).is_err() {
                    snapshot.pressures = Pressures::default();
                    ok = false;
                }
            }
            if let Some(base) = board.loadcell_base {
                if read_loadcells(bus, board.address, base, &mut snapshot.loadcells).is_err() {
                    snapshot.loadcells = Loadcells::default();
                    ok = false;
                }
            }

            if ok {
                outcome.boards_read += 1;
                if !state.connected {
                    state.connected = true;
                    #[cfg(feature = "mcu")]
                    println!("sensor sampler: board {} reconnected", board.address.slave_id());
                }
            } else {
                outcome.boards_faulted += 1;
                if state.connected {
                    state.connected = false;
                    #[cfg(feature = "mcu")]
                    println!("sensor sampler: board {} disconnected", board.address.slave_id());
                }
            }
        }

        outcome
    }
}

fn read_thermocouples(bus: &mut dyn BusClient, addr: BoardAddress, base: u16, dst: &mut Thermocouples) -> Result<(), BusError> {
    let mut regs = [0u16; 9];
    bus.read_input_regs(addr, base, &mut regs)?;
    *dst = Thermocouples {
        n2o_tank_uf_1: regs[0] as i16,
        n2o_tank_uf_2: regs[1] as i16,
        n2o_tank_uf_3: regs[2] as i16,
        n2o_tank_lf_1: regs[3] as i16,
        n2o_tank_lf_2: regs[4] as i16,
        chamber: regs[5] as i16,
        n2o_line_before_solenoid: regs[6] as i16,
        n2o_line_after_solenoid: regs[7] as i16,
        n2_line: regs[8] as i16,
    };
    Ok(())
}

fn read_pressures(bus: &mut dyn BusClient, addr: BoardAddress, base: u16, dst: &mut Pressures) -> Result<(), BusError> {
    let mut regs = [0u16; 5];
    bus.read_input_regs(addr, base, &mut regs)?;
    *dst = Pressures {
        n2o_tank: regs[0],
        chamber: regs[1],
        n2o_line: regs[2],
        n2_line: regs[3],
        quick_disconnect: regs[4],
    };
    Ok(())
}

fn read_loadcells(bus: &mut dyn BusClient, addr: BoardAddress, base: u16, dst: &mut Loadcells) -> Result<(), BusError> {
    let mut regs = [0u16; 5];
    bus.read_input_regs(addr, base, &mut regs)?;
    *dst = Loadcells {
        n2o_tank: regs[0],
        rail: regs[1],
        thrust_1: regs[2],
        thrust_2: regs[3],
        thrust_3: regs[4],
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeBus {
        fail_addr: Option<BoardAddress>,
        reads: u32,
    }

    impl BusClient for FakeBus {
        fn read_input_regs(&mut self, board: BoardAddress, _start: u16, out: &mut [u16]) -> Result<(), BusError> {
            self.reads += 1;
            if Some(board) == self.fail_addr {
                return Err(BusError::Timeout);
            }
            for (i, slot) in out.iter_mut().enumerate() {
                *slot = i as u16;
            }
            Ok(())
        }

        fn read_coils(&mut self, _board: BoardAddress, _start: u16, _count: u16, _out: &mut [u8]) -> Result<(), BusError> {
            unimplemented!("not exercised by this sampler")
        }

        fn write_coil(&mut self, _board: BoardAddress, _coil: u16, _value: bool) -> Result<(), BusError> {
            unimplemented!("not exercised by this sampler")
        }
    }

    fn board(address: BoardAddress, is_fill_station: bool) -> SensorBoard {
        SensorBoard {
            address,
            thermocouple_base: Some(0),
            pressure_base: None,
            loadcell_base: None,
            is_fill_station,
        }
    }

    #[test]
    fn reads_every_configured_board() {
        let mut sampler = SensorSampler::new([SensorBoard {
            address: BoardAddress::new(1),
            thermocouple_base: Some(0),
            pressure_base: Some(16),
            loadcell_base: None,
            is_fill_station: false,
        }]);
        let mut bus = FakeBus {
            fail_addr: None,
            reads: 0,
        };
        let mut snapshot = SensorSnapshot::default();

        let outcome = sampler.sample(&mut bus, &mut snapshot, false);
        assert_eq!(outcome.boards_read, 1);
        assert_eq!(outcome.boards_faulted, 0);
        assert_eq!(snapshot.thermocouples.chamber, 5);
    }

    #[test]
    fn a_faulted_board_does_not_block_others() {
        let faulted = BoardAddress::new(2);
        let mut sampler = SensorSampler::new([board(BoardAddress::new(1), false), board(faulted, false)]);
        let mut bus = FakeBus {
            fail_addr: Some(faulted),
            reads: 0,
        };
        let mut snapshot = SensorSnapshot::default();

        let outcome = sampler.sample(&mut bus, &mut snapshot, false);
        assert_eq!(outcome.boards_read, 1);
        assert_eq!(outcome.boards_faulted, 1);
    }

    #[test]
    fn a_failed_read_zeros_its_slot_instead_of_keeping_the_last_value() {
        let faulted = BoardAddress::new(2);
        let mut sampler = SensorSampler::new([board(faulted, false)]);
        let mut bus = FakeBus {
            fail_addr: Some(faulted),
            reads: 0,
        };
        let mut snapshot = SensorSnapshot::default();
        snapshot.thermocouples.n2_line = 999;

        sampler.sample(&mut bus, &mut snapshot, false);
        assert_eq!(snapshot.thermocouples.n2_line, 0);
    }

    #[test]
    fn fill_station_board_is_skipped_once_disabled() {
        let fill_station = BoardAddress::new(3);
        let mut sampler = SensorSampler::new([board(fill_station, true)]);
        let mut bus = FakeBus {
            fail_addr: None,
            reads: 0,
        };
        let mut snapshot = SensorSnapshot::default();

        let outcome = sampler.sample(&mut bus, &mut snapshot, true);
        assert_eq!(outcome.boards_skipped, 1);
        assert_eq!(outcome.boards_read, 0);
        assert_eq!(bus.reads, 0);
    }

    #[test]
    fn non_fill_station_board_keeps_reading_after_disable() {
        let addr = BoardAddress::new(4);
        let mut sampler = SensorSampler::new([board(addr, false)]);
        let mut bus = FakeBus {
            fail_addr: None,
            reads: 0,
        };
        let mut snapshot = SensorSnapshot::default();

        let outcome = sampler.sample(&mut bus, &mut snapshot, true);
        assert_eq!(outcome.boards_read, 1);
        assert_eq!(outcome.boards_skipped, 0);
    }
}
