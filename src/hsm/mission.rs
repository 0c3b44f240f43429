//! Mission-level leaves: `IDLE`, `READY`, `ARMED`, `ABORT`, plus the
//! entry/exit actions for the two composites (`FILL`, `FLIGHT`) that
//! never themselves hold the current leaf.

use crate::actuators::ActuatorId;
use crate::command::Command;
use crate::config::MissionConfig;
use crate::sensors::SensorSnapshot;

use super::context::MissionContext;
use super::filling;
use super::State;

/// Evaluate the currently active mission-level leaf. Filling and flight
/// leaves are handled by their own sub-machines; this only ever sees
/// `Idle`, `Ready`, `Armed` or `Abort`.
pub fn run(
    current: State,
    ctx: &mut MissionContext,
    config: &MissionConfig,
    sensors: &SensorSnapshot,
    command: Option<Command>,
    now_ms: u64,
) -> Option<State> {
    match current {
        State::Idle => run_idle(ctx, config, command),
        State::Ready => run_ready(command),
        State::Armed => run_armed(sensors, config, command),
        State::Abort => run_abort(ctx, config, command, now_ms),
        _ => None,
    }
}

fn run_idle(ctx: &mut MissionContext, config: &MissionConfig, command: Option<Command>) -> Option<State> {
    match command? {
        Command::Ready => Some(State::Ready),
        Command::FillExec { program, params } => Some(filling::select_program(ctx, config, program, params)),
        _ => None,
    }
}

fn run_ready(command: Option<Command>) -> Option<State> {
    match command? {
        Command::Arm => Some(State::Armed),
        _ => None,
    }
}

/// `ARMED -> FLIGHT` is guarded: the chamber must already be at or
/// above the configured launch temperature, or `Fire` is rejected
/// (debug-logged by the caller, not transitioned).
fn run_armed(sensors: &SensorSnapshot, config: &MissionConfig, command: Option<Command>) -> Option<State> {
    match command? {
        Command::Fire => {
            if sensors.thermocouples.chamber >= config.flight.min_chamber_launch_temp {
                Some(State::Ignition)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn run_abort(
    ctx: &mut MissionContext,
    config: &MissionConfig,
    command: Option<Command>,
    now_ms: u64,
) -> Option<State> {
    if let Some(entered_at) = ctx.abort_entered_at_ms {
        if !ctx.actuators.is_set(ActuatorId::Pressurizing)
            && now_ms.saturating_sub(entered_at) >= u64::from(config.abort.pressurizing_delay_ms)
        {
            ctx.actuators.set(ActuatorId::Pressurizing);
        }
    }

    match command? {
        Command::Ready => Some(State::Idle),
        _ => None,
    }
}

pub fn on_entry(state: State, ctx: &mut MissionContext) {
    match state {
        State::Idle => {
            ctx.actuators.clear_all();
            ctx.abort_entered_at_ms = None;
        }
        State::Ready => ctx.actuators.clear_all(),
        State::Armed => ctx.actuators.clear_all(),
        State::Abort => {
            ctx.actuators = crate::actuators::ActuatorVector::from_open(&[ActuatorId::Abort]);
            ctx.abort_entered_at_ms = Some(ctx.now_hint_ms);
        }
        State::Fill => {
            // No visible action of its own; the selected composite's
            // IDLE leaf sets the actuators.
        }
        State::Flight => ctx.fill_station_disabled = true,
        _ => {}
    }
}

pub fn on_exit(state: State, ctx: &mut MissionContext) {
    match state {
        State::Abort => ctx.abort_entered_at_ms = None,
        _ => {}
    }
}
