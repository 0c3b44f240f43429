//! Mission status: the triple `(main, filling, flight)` published on the
//! `rocket_state` channel whenever the HSM transitions.

#[cfg(feature = "mcu")]
use defmt::Format;

use crate::hsm::{FillingSubstate, FlightSubstate, MissionState};

/// `flight` reads `None` whenever Mission is not in a flight substate;
/// the wire encoding maps `None` to 0, but in-memory we keep it an
/// `Option` so "no flight substate" can't be confused with a real
/// substate id 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "mcu", derive(Format))]
pub struct MissionStatus {
    pub main: MissionState,
    pub filling: Option<FillingSubstate>,
    pub flight: Option<FlightSubstate>,
}

impl MissionStatus {
    pub const fn initial() -> Self {
        Self {
            main: MissionState::Idle,
            filling: None,
            flight: None,
        }
    }
}

impl Default for MissionStatus {
    fn default() -> Self {
        Self::initial()
    }
}
