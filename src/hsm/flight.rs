//! The `FLIGHT` sub-machine: a linear progression from `IGNITION`
//! through `TOUCHDOWN`, driven by the navigator's Kalman output and,
//! for `BOOST`, a one-shot timer rather than a sensor threshold.

use crate::actuators::{ActuatorId, ActuatorVector};
use crate::config::FlightConfig;
use crate::sensors::KalmanData;

use super::context::MissionContext;
use super::State;

pub fn run(current: State, ctx: &MissionContext, config: &FlightConfig, kalman: Option<KalmanData>) -> Option<State> {
    match current {
        State::Ignition => Some(State::Boost),
        State::Boost => run_boost(ctx),
        State::Coast => run_coast(config, kalman),
        State::Apogee => run_apogee(ctx),
        State::DrogueChute => run_drogue_chute(config, kalman),
        State::MainChute => run_main_chute(config, kalman),
        State::Touchdown => None,
        _ => None,
    }
}

/// The boost timer is armed on entry by the Controller's monotonic
/// task; this only ever observes whether it has finished, one way or
/// the other - expiry and cancellation both move on to `COAST`.
fn run_boost(ctx: &MissionContext) -> Option<State> {
    if ctx.boost_timer.is_done() {
        Some(State::Coast)
    } else {
        None
    }
}

/// Whether the rocket was still accelerating upward when `BOOST`'s
/// timer fired; the caller logs a warning when this is true, since it
/// suggests `boost_time_ms` is tuned too short for this motor.
pub fn boost_still_climbing(config: &FlightConfig, kalman: Option<KalmanData>) -> bool {
    kalman.map(|k| k.vertical_speed >= config.boost_vertical_speed).unwrap_or(false)
}

fn run_coast(config: &FlightConfig, kalman: Option<KalmanData>) -> Option<State> {
    let k = kalman?;
    if k.vertical_speed < config.coast_vertical_speed {
        Some(State::Apogee)
    } else {
        None
    }
}

/// The drogue e-match is fired by the out-of-scope manual-override
/// path, not by any HSM entry action; this leaf only watches for the
/// actuator bit it sets.
fn run_apogee(ctx: &MissionContext) -> Option<State> {
    if ctx.actuators.is_set(ActuatorId::Drogue) {
        Some(State::DrogueChute)
    } else {
        None
    }
}

fn run_drogue_chute(config: &FlightConfig, kalman: Option<KalmanData>) -> Option<State> {
    let k = kalman?;
    if k.altitude < config.main_chute_deploy_altitude {
        Some(State::MainChute)
    } else {
        None
    }
}

fn run_main_chute(config: &FlightConfig, kalman: Option<KalmanData>) -> Option<State> {
    let k = kalman?;
    if k.altitude < config.touchdown_altitude {
        Some(State::Touchdown)
    } else {
        None
    }
}

pub fn on_entry(state: State, ctx: &mut MissionContext) {
    let open: &[ActuatorId] = match state {
        State::Ignition => &[ActuatorId::Ignition],
        State::Boost => {
            ctx.boost_timer.arm();
            &[]
        }
        State::Coast => &[],
        State::Apogee => &[],
        State::DrogueChute => &[ActuatorId::Drogue],
        State::MainChute => &[ActuatorId::MainChute],
        State::Touchdown => &[],
        State::Flight => return,
        _ => return,
    };
    ctx.actuators = ActuatorVector::from_open(open);
}

pub fn on_exit(state: State, ctx: &mut MissionContext) {
    if state == State::Boost && !ctx.boost_timer.is_done() {
        ctx.boost_timer.cancel();
    }
}
