//! The `FILL` sub-machine: one of five composites (`SAFE_PAUSE`,
//! `FILL_N2`, `PRE_PRESS`, `FILL_N2O`, `POST_PRESS`), each cycling
//! through an `IDLE` / fill-leaf / `VENT` hysteresis loop while Mission
//! stays in `FILL`.
//!
//! `target` is the pressure at which a fill leaf stops and the vent
//! leaf begins; `trigger` is the lower bound both `IDLE` and `VENT`
//! compare against to resume filling.

use crate::actuators::{ActuatorId, ActuatorVector};
use crate::command::{FillExecParams, FillProgram};
use crate::config::{FillN2oConfig, MissionConfig, PressureHysteresis};
use crate::sensors::SensorSnapshot;

use super::context::MissionContext;
use super::State;

/// Resolve a command's override against the mission's static default:
/// a params value of `(0, 0)` means "use configuration", anything else
/// replaces it outright.
fn resolve(params: FillExecParams, default: PressureHysteresis) -> PressureHysteresis {
    if params.target == 0 && params.trigger == 0 {
        default
    } else {
        PressureHysteresis {
            target: params.target,
            trigger: params.trigger,
        }
    }
}

/// Record which program was selected and, for the three pressure-only
/// programs, the hysteresis it should run with; return that program's
/// initial (`IDLE`) leaf.
pub fn select_program(ctx: &mut MissionContext, config: &MissionConfig, program: FillProgram, params: FillExecParams) -> State {
    ctx.active_program = Some(program);
    ctx.active_hysteresis = match program {
        FillProgram::N2 => Some(resolve(params, config.fill_n2)),
        FillProgram::PrePress => Some(resolve(params, config.pre_press)),
        FillProgram::PostPress => Some(resolve(params, config.post_press)),
        FillProgram::N2O => None,
    };

    match program {
        FillProgram::N2 => State::FillN2Idle,
        FillProgram::PrePress => State::PrePressIdle,
        FillProgram::N2O => State::FillN2OIdle,
        FillProgram::PostPress => State::PostPressIdle,
    }
}

/// Evaluate the currently active filling leaf.
pub fn run(current: State, ctx: &MissionContext, config: &MissionConfig, sensors: &SensorSnapshot) -> Option<State> {
    match current {
        State::SafePauseIdle => pressure_idle(sensors, config.safe_pause, State::SafePauseVent),
        State::SafePauseVent => pressure_vent(sensors, config.safe_pause, State::SafePauseIdle),

        State::FillN2Idle => pressure_idle_or_fill(sensors, hysteresis(ctx, config.fill_n2), State::FillN2Fill),
        State::FillN2Fill => pressure_fill(sensors, hysteresis(ctx, config.fill_n2), State::FillN2Vent),
        State::FillN2Vent => pressure_vent(sensors, hysteresis(ctx, config.fill_n2), State::FillN2Idle),

        State::PrePressIdle => pressure_idle_or_fill(sensors, hysteresis(ctx, config.pre_press), State::PrePressFillN2),
        State::PrePressFillN2 => pressure_fill(sensors, hysteresis(ctx, config.pre_press), State::PrePressVent),
        State::PrePressVent => pressure_vent(sensors, hysteresis(ctx, config.pre_press), State::PrePressIdle),

        State::FillN2OIdle => n2o_idle(sensors, config.fill_n2o),
        State::FillN2OFill => n2o_fill(sensors, config.fill_n2o),
        State::FillN2OVent => n2o_vent(sensors, config.fill_n2o),

        State::PostPressIdle => pressure_idle_or_fill(sensors, hysteresis(ctx, config.post_press), State::PostPressFillN2),
        State::PostPressFillN2 => pressure_fill(sensors, hysteresis(ctx, config.post_press), State::PostPressVent),
        State::PostPressVent => pressure_vent(sensors, hysteresis(ctx, config.post_press), State::PostPressIdle),

        _ => None,
    }
}

/// `FILL_N2`, `PRE_PRESS` and `POST_PRESS` honor a command-time
/// override; `SAFE_PAUSE` always runs its static configuration since
/// it is entered only via `Pause`, never `FillExec`.
fn hysteresis(ctx: &MissionContext, default: PressureHysteresis) -> PressureHysteresis {
    ctx.active_hysteresis.unwrap_or(default)
}

fn pressure_idle_or_fill(sensors: &SensorSnapshot, h: PressureHysteresis, fill_leaf: State) -> Option<State> {
    if sensors.pressures.n2_line <= h.trigger {
        Some(fill_leaf)
    } else {
        None
    }
}

/// `SAFE_PAUSE` has no fill leaf of its own; it only idles or vents.
fn pressure_idle(sensors: &SensorSnapshot, h: PressureHysteresis, vent_leaf: State) -> Option<State> {
    if sensors.pressures.n2_line > h.target {
        Some(vent_leaf)
    } else {
        None
    }
}

fn pressure_fill(sensors: &SensorSnapshot, h: PressureHysteresis, vent_leaf: State) -> Option<State> {
    if sensors.pressures.n2_line >= h.target {
        Some(vent_leaf)
    } else {
        None
    }
}

fn pressure_vent(sensors: &SensorSnapshot, h: PressureHysteresis, idle_leaf: State) -> Option<State> {
    if sensors.pressures.n2_line <= h.trigger {
        Some(idle_leaf)
    } else {
        None
    }
}

fn n2o_idle(sensors: &SensorSnapshot, cfg: FillN2oConfig) -> Option<State> {
    if sensors.loadcells.n2o_tank < cfg.target_weight {
        Some(State::FillN2OFill)
    } else {
        None
    }
}

fn n2o_fill(sensors: &SensorSnapshot, cfg: FillN2oConfig) -> Option<State> {
    if sensors.loadcells.n2o_tank >= cfg.target_weight {
        Some(State::FillN2OVent)
    } else {
        None
    }
}

/// The vent leaf only has somewhere to go once pressure and
/// temperature both clear the interlock and the tank has settled back
/// under the trigger pressure.
fn n2o_vent(sensors: &SensorSnapshot, cfg: FillN2oConfig) -> Option<State> {
    let interlock_clear = sensors.pressures.n2o_tank >= cfg.trigger_pressure
        && sensors.thermocouples.n2o_tank_uf_1 >= cfg.trigger_temperature;
    if interlock_clear && sensors.pressures.n2o_tank <= cfg.trigger_pressure {
        Some(State::FillN2OIdle)
    } else {
        None
    }
}

pub fn on_entry(state: State, ctx: &mut MissionContext) {
    let open: &[ActuatorId] = match state {
        State::SafePauseIdle => &[],
        State::SafePauseVent => &[ActuatorId::Vent],
        State::FillN2Idle => &[],
        State::FillN2Fill => &[ActuatorId::N2Fill],
        State::FillN2Vent => &[ActuatorId::N2Fill, ActuatorId::Vent],
        State::PrePressIdle => &[],
        State::PrePressFillN2 => &[ActuatorId::N2Fill],
        State::PrePressVent => &[ActuatorId::Vent],
        State::FillN2OIdle => &[],
        State::FillN2OFill => &[ActuatorId::N2oFill],
        State::FillN2OVent => &[ActuatorId::N2oFill, ActuatorId::Vent],
        State::PostPressIdle => &[],
        State::PostPressFillN2 => &[ActuatorId::N2Fill],
        State::PostPressVent => &[ActuatorId::Vent],
        State::Fill => &[],
        _ => return,
    };
    ctx.actuators = ActuatorVector::from_open(open);
}

pub fn on_exit(state: State, ctx: &mut MissionContext) {
    if state == State::Fill {
        ctx.active_program = None;
        ctx.active_hysteresis = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_n2_line(psi: u16) -> SensorSnapshot {
        let mut s = SensorSnapshot::default();
        s.pressures.n2_line = psi;
        s
    }

    #[test]
    fn fill_n2_idle_moves_to_fill_once_below_trigger() {
        let h = PressureHysteresis { target: 600, trigger: 500 };
        let sensors = snapshot_with_n2_line(400);
        assert_eq!(pressure_idle_or_fill(&sensors, h, State::FillN2Fill), Some(State::FillN2Fill));
    }

    #[test]
    fn fill_n2_idle_stays_put_above_trigger() {
        let h = PressureHysteresis { target: 600, trigger: 500 };
        let sensors = snapshot_with_n2_line(550);
        assert_eq!(pressure_idle_or_fill(&sensors, h, State::FillN2Fill), None);
    }

    #[test]
    fn fill_n2_fill_vents_once_target_reached() {
        let h = PressureHysteresis { target: 600, trigger: 500 };
        let sensors = snapshot_with_n2_line(600);
        assert_eq!(pressure_fill(&sensors, h, State::FillN2Vent), Some(State::FillN2Vent));
    }

    #[test]
    fn entering_fill_n2_vent_keeps_the_fill_valve_open_while_venting() {
        let mut ctx = MissionContext::new();
        on_entry(State::FillN2Vent, &mut ctx);
        assert!(ctx.actuators.is_set(ActuatorId::N2Fill));
        assert!(ctx.actuators.is_set(ActuatorId::Vent));
        assert!(!ctx.actuators.is_set(ActuatorId::N2Purge));
    }

    #[test]
    fn entering_fill_n2o_vent_keeps_the_n2o_fill_valve_open_while_venting() {
        let mut ctx = MissionContext::new();
        on_entry(State::FillN2OVent, &mut ctx);
        assert!(ctx.actuators.is_set(ActuatorId::N2oFill));
        assert!(ctx.actuators.is_set(ActuatorId::Vent));
        assert!(!ctx.actuators.is_set(ActuatorId::N2oPurge));
    }

    #[test]
    fn n2_vent_returns_to_idle_once_back_under_trigger() {
        let h = PressureHysteresis { target: 600, trigger: 500 };
        let sensors = snapshot_with_n2_line(500);
        assert_eq!(pressure_vent(&sensors, h, State::FillN2Idle), Some(State::FillN2Idle));
    }

    #[test]
    fn n2o_fill_reaches_target_weight_and_moves_to_vent() {
        let cfg = FillN2oConfig {
            target_weight: 1000,
            target_pressure: 0,
            trigger_pressure: 600,
            trigger_temperature: -50,
        };
        let mut sensors = SensorSnapshot::default();
        sensors.loadcells.n2o_tank = 1000;
        assert_eq!(n2o_fill(&sensors, cfg), Some(State::FillN2OVent));
    }

    #[test]
    fn select_program_records_an_override_hysteresis() {
        let mut ctx = MissionContext::new();
        let config = MissionConfig::default();
        let params = FillExecParams { target: 700, trigger: 450 };
        let leaf = select_program(&mut ctx, &config, FillProgram::N2, params);
        assert_eq!(leaf, State::FillN2Idle);
        assert_eq!(ctx.active_hysteresis, Some(PressureHysteresis { target: 700, trigger: 450 }));
    }
}
