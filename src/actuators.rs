//! Actuator bitmap.
//!
//! The original source writes to named union fields on a C bitfield; we
//! re-architect that as a set-style abstraction over `ActuatorId`, with a
//! single `const fn bit()` as the one place the id-to-bit-position
//! mapping is declared. Both the HSM (producer) and the Actuator Writer
//! (consumer, diffing against the last-written vector) go through this
//! mapping rather than duplicating it.

#[cfg(feature = "mcu")]
use defmt::Format;

/// The sixteen actuator slots the field bus exposes. Unused bits (13-15)
/// are reserved and always emitted as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "mcu", derive(Format))]
#[repr(u8)]
pub enum ActuatorId {
    Pressurizing = 0,
    Vent = 1,
    Abort = 2,
    Main = 3,
    N2oFill = 4,
    N2oPurge = 5,
    N2Fill = 6,
    N2Purge = 7,
    N2oQd = 8,
    N2Qd = 9,
    Ignition = 10,
    Drogue = 11,
    MainChute = 12,
}

/// Number of distinct actuator slots; the size of [`ActuatorId::ALL`].
pub const ACTUATOR_COUNT: usize = 13;

impl ActuatorId {
    pub const ALL: [ActuatorId; ACTUATOR_COUNT] = [
        ActuatorId::Pressurizing,
        ActuatorId::Vent,
        ActuatorId::Abort,
        ActuatorId::Main,
        ActuatorId::N2oFill,
        ActuatorId::N2oPurge,
        ActuatorId::N2Fill,
        ActuatorId::N2Purge,
        ActuatorId::N2oQd,
        ActuatorId::N2Qd,
        ActuatorId::Ignition,
        ActuatorId::Drogue,
        ActuatorId::MainChute,
    ];

    /// The single source of truth for actuator-id -> bit-position.
    pub const fn bit(self) -> u8 {
        self as u8
    }
}

/// The HSM's sole output: a 16-bit bitmap of commanded actuator states.
/// Reserved bits are always zero (enforced by construction - there is no
/// way to set a bit outside `ActuatorId`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "mcu", derive(Format))]
pub struct ActuatorVector(u16);

impl ActuatorVector {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub fn set(&mut self, id: ActuatorId) {
        self.0 |= 1 << id.bit();
    }

    pub fn clear(&mut self, id: ActuatorId) {
        self.0 &= !(1 << id.bit());
    }

    pub fn is_set(self, id: ActuatorId) -> bool {
        (self.0 >> id.bit()) & 1 == 1
    }

    pub fn clear_all(&mut self) {
        self.0 = 0;
    }

    /// Build a vector from a list of actuators that should be open/on;
    /// every other bit is zero. This is how every HSM state entry
    /// action sets the actuator vector: overwrite wholesale, never
    /// accumulate across transitions.
    pub fn from_open(ids: &[ActuatorId]) -> Self {
        let mut v = Self::empty();
        for &id in ids {
            v.set(id);
        }
        v
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_vector_is_zero() {
        assert_eq!(ActuatorVector::empty().raw(), 0);
        assert!(ActuatorVector::empty().is_empty());
    }

    #[test]
    fn set_and_clear_roundtrip() {
        let mut v = ActuatorVector::empty();
        v.set(ActuatorId::Abort);
        assert!(v.is_set(ActuatorId::Abort));
        assert!(!v.is_set(ActuatorId::Vent));
        v.clear(ActuatorId::Abort);
        assert!(!v.is_set(ActuatorId::Abort));
    }

    #[test]
    fn from_open_overwrites_wholesale() {
        let v = ActuatorVector::from_open(&[ActuatorId::Abort, ActuatorId::Pressurizing]);
        assert!(v.is_set(ActuatorId::Abort));
        assert!(v.is_set(ActuatorId::Pressurizing));
        assert!(!v.is_set(ActuatorId::Vent));
    }

    #[test]
    fn bit_positions_are_distinct() {
        for (i, a) in ActuatorId::ALL.iter().enumerate() {
            for (j, b) in ActuatorId::ALL.iter().enumerate() {
                if i != j {
                    assert_ne!(a.bit(), b.bit());
                }
            }
        }
    }

    #[test]
    fn reserved_bits_stay_clear() {
        let v = ActuatorVector::from_open(&ActuatorId::ALL);
        // Bits 13, 14, 15 are reserved; ALL only ever sets bits 0..=12.
        assert_eq!(v.raw() & 0xE000, 0);
    }
}
