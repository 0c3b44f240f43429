//! The hierarchical state machine: `Mission` at the top, with `Filling`
//! and `Flight` as its two composite sub-machines.
//!
//! Rather than a tree of parent pointers, every state the machine can
//! ever be in - leaf or composite - is one variant of a single flat
//! [`State`] enum, and [`parent_of`] is the only place the hierarchy is
//! recorded. A transition walks both the old and new state's chains up
//! to their common ancestor, runs exit actions innermost-first down to
//! (not including) that ancestor, then entry actions outermost-first
//! back down to the new leaf. This mirrors the original's separate
//! `main_state_t` / `filling_state_t` / `flight_state_t` enums (each a
//! contiguous numeric range) without needing a real tree structure or
//! dynamic dispatch to walk it.

pub mod context;
mod filling;
mod flight;
mod mission;

#[cfg(feature = "mcu")]
use defmt::Format;

use crate::command::Command;
use crate::config::MissionConfig;
use crate::sensors::{KalmanData, NavigatorSensors, SensorSnapshot};
use crate::status::MissionStatus;

pub use context::MissionContext;

/// The six states `Mission` itself can be in - the same six markers
/// [`parent_of`]'s chains always bottom out at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "mcu", derive(Format))]
#[repr(u8)]
pub enum MissionState {
    Idle = 0,
    Fill = 1,
    Ready = 2,
    Armed = 3,
    Flight = 4,
    Abort = 5,
}

/// The leaf substates of the `FILL` composite, valid only while
/// `MissionState::Fill` is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "mcu", derive(Format))]
#[repr(u8)]
pub enum FillingSubstate {
    SafePauseIdle = 0,
    SafePauseVent = 1,
    FillN2Idle = 2,
    FillN2Fill = 3,
    FillN2Vent = 4,
    PrePressIdle = 5,
    PrePressVent = 6,
    PrePressFillN2 = 7,
    FillN2OIdle = 8,
    FillN2OFill = 9,
    FillN2OVent = 10,
    PostPressIdle = 11,
    PostPressVent = 12,
    PostPressFillN2 = 13,
}

/// The leaf substates of the `FLIGHT` composite, valid only while
/// `MissionState::Flight` is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "mcu", derive(Format))]
#[repr(u8)]
pub enum FlightSubstate {
    Ignition = 0,
    Boost = 1,
    Coast = 2,
    Apogee = 3,
    DrogueChute = 4,
    MainChute = 5,
    Touchdown = 6,
}

/// Every state the machine can occupy, leaves and composites alike.
/// Composite variants (`Fill`, `SafePause`, `FillN2`, `PrePress`,
/// `FillN2O`, `PostPress`, `Flight`) are never the active leaf - only
/// ancestors in a chain - and `Hsm::current` is a debug-asserted
/// invariant of that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Ready,
    Armed,
    Abort,

    Fill,
    SafePause,
    SafePauseIdle,
    SafePauseVent,
    FillN2,
    FillN2Idle,
    FillN2Fill,
    FillN2Vent,
    PrePress,
    PrePressIdle,
    PrePressVent,
    PrePressFillN2,
    FillN2O,
    FillN2OIdle,
    FillN2OFill,
    FillN2OVent,
    PostPress,
    PostPressIdle,
    PostPressVent,
    PostPressFillN2,

    Flight,
    Ignition,
    Boost,
    Coast,
    Apogee,
    DrogueChute,
    MainChute,
    Touchdown,
}

/// The one place the hierarchy is recorded. `None` means "direct child
/// of the implicit root" - the level at which global commands preempt
/// whatever the per-branch table would otherwise do.
pub const fn parent_of(state: State) -> Option<State> {
    use State::*;
    match state {
        Idle | Ready | Armed | Abort | Fill | Flight => None,

        SafePauseIdle | SafePauseVent => Some(SafePause),
        SafePause => Some(Fill),

        FillN2Idle | FillN2Fill | FillN2Vent => Some(FillN2),
        FillN2 => Some(Fill),

        PrePressIdle | PrePressVent | PrePressFillN2 => Some(PrePress),
        PrePress => Some(Fill),

        FillN2OIdle | FillN2OFill | FillN2OVent => Some(FillN2O),
        FillN2O => Some(Fill),

        PostPressIdle | PostPressVent | PostPressFillN2 => Some(PostPress),
        PostPress => Some(Fill),

        Ignition | Boost | Coast | Apogee | DrogueChute | MainChute | Touchdown => Some(Flight),
    }
}

fn is_leaf(state: State) -> bool {
    !matches!(
        state,
        State::Fill | State::SafePause | State::FillN2 | State::PrePress | State::FillN2O | State::PostPress | State::Flight
    )
}

/// Top of the chain that is a mission-level marker (`Idle`, `Ready`,
/// `Armed`, `Abort`, `Fill` or `Flight`), found by walking `parent_of`
/// until it bottoms out - every chain's final state is always one of
/// these six, by construction.
fn mission_marker(mut state: State) -> State {
    while let Some(parent) = parent_of(state) {
        state = parent;
    }
    state
}

fn to_mission_state(marker: State) -> MissionState {
    match marker {
        State::Idle => MissionState::Idle,
        State::Ready => MissionState::Ready,
        State::Armed => MissionState::Armed,
        State::Abort => MissionState::Abort,
        State::Fill => MissionState::Fill,
        State::Flight => MissionState::Flight,
        _ => unreachable!("mission_marker only ever returns a top-level state"),
    }
}

fn to_filling_substate(leaf: State) -> Option<FillingSubstate> {
    Some(match leaf {
        State::SafePauseIdle => FillingSubstate::SafePauseIdle,
        State::SafePauseVent => FillingSubstate::SafePauseVent,
        State::FillN2Idle => FillingSubstate::FillN2Idle,
        State::FillN2Fill => FillingSubstate::FillN2Fill,
        State::FillN2Vent => FillingSubstate::FillN2Vent,
        State::PrePressIdle => FillingSubstate::PrePressIdle,
        State::PrePressVent => FillingSubstate::PrePressVent,
        State::PrePressFillN2 => FillingSubstate::PrePressFillN2,
        State::FillN2OIdle => FillingSubstate::FillN2OIdle,
        State::FillN2OFill => FillingSubstate::FillN2OFill,
        State::FillN2OVent => FillingSubstate::FillN2OVent,
        State::PostPressIdle => FillingSubstate::PostPressIdle,
        State::PostPressVent => FillingSubstate::PostPressVent,
        State::PostPressFillN2 => FillingSubstate::PostPressFillN2,
        _ => return None,
    })
}

fn to_flight_substate(leaf: State) -> Option<FlightSubstate> {
    Some(match leaf {
        State::Ignition => FlightSubstate::Ignition,
        State::Boost => FlightSubstate::Boost,
        State::Coast => FlightSubstate::Coast,
        State::Apogee => FlightSubstate::Apogee,
        State::DrogueChute => FlightSubstate::DrogueChute,
        State::MainChute => FlightSubstate::MainChute,
        State::Touchdown => FlightSubstate::Touchdown,
        _ => return None,
    })
}

const MAX_CHAIN_DEPTH: usize = 4;

fn chain_to_root(state: State) -> [Option<State>; MAX_CHAIN_DEPTH] {
    let mut chain = [None; MAX_CHAIN_DEPTH];
    let mut cur = Some(state);
    let mut i = 0;
    while let Some(s) = cur {
        chain[i] = Some(s);
        cur = parent_of(s);
        i += 1;
    }
    chain
}

fn in_chain(chain: &[Option<State>; MAX_CHAIN_DEPTH], needle: State) -> bool {
    chain.iter().any(|s| *s == Some(needle))
}

/// The inputs a single tick evaluates against; bundled so the
/// Controller doesn't have to name every field at every call site.
pub struct TickInputs<'a> {
    pub config: &'a MissionConfig,
    pub sensors: &'a SensorSnapshot,
    pub navigator: Option<NavigatorSensors>,
    pub kalman: Option<KalmanData>,
    pub command: Option<Command>,
    pub now_ms: u64,
}

/// What happened on a tick, for the Controller's logging and for
/// publishing `MissionStatus` only when something actually changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub transitioned: bool,
    pub from: State,
    pub to: State,
}

pub struct Hsm {
    current: State,
}

impl Hsm {
    pub const fn new() -> Self {
        Self { current: State::Idle }
    }

    pub fn status(&self) -> MissionStatus {
        let marker = mission_marker(self.current);
        MissionStatus {
            main: to_mission_state(marker),
            filling: to_filling_substate(self.current),
            flight: to_flight_substate(self.current),
        }
    }

    pub fn current(&self) -> State {
        self.current
    }

    /// Evaluate one tick: global commands take precedence over the
    /// active branch's own table, skipping its condition evaluation
    /// entirely when a global transition is latched.
    pub fn tick(&mut self, ctx: &mut MissionContext, inputs: &TickInputs) -> TickOutcome {
        ctx.now_hint_ms = inputs.now_ms;

        let target = if let Some(cmd) = inputs.command.filter(|c| c.is_global()) {
            self.global_target(cmd)
        } else {
            self.branch_target(ctx, inputs)
        };

        let from = self.current;
        match target {
            Some(to) if to != from => {
                self.transition(ctx, to);
                TickOutcome { transitioned: true, from, to }
            }
            _ => TickOutcome {
                transitioned: false,
                from,
                to: from,
            },
        }
    }

    fn global_target(&self, command: Command) -> Option<State> {
        match command {
            Command::Stop => Some(State::Idle),
            Command::Abort => Some(State::Abort),
            Command::Pause => {
                if mission_marker(self.current) == State::Fill {
                    Some(State::SafePauseIdle)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn branch_target(&self, ctx: &mut MissionContext, inputs: &TickInputs) -> Option<State> {
        debug_assert!(is_leaf(self.current));
        match mission_marker(self.current) {
            State::Fill => filling::run(self.current, ctx, inputs.config, inputs.sensors),
            State::Flight => flight::run(self.current, ctx, &inputs.config.flight, inputs.kalman),
            _ => mission::run(self.current, ctx, inputs.config, inputs.sensors, inputs.command, inputs.now_ms),
        }
    }

    fn transition(&mut self, ctx: &mut MissionContext, to: State) {
        let from = self.current;
        let from_chain = chain_to_root(from);
        let to_chain = chain_to_root(to);

        let lca = from_chain.iter().flatten().copied().find(|s| in_chain(&to_chain, *s));

        for maybe in from_chain.iter() {
            let Some(s) = maybe else { break };
            if Some(*s) == lca {
                break;
            }
            on_exit(*s, ctx);
        }

        let mut entries: heapless::Vec<State, MAX_CHAIN_DEPTH> = heapless::Vec::new();
        for maybe in to_chain.iter() {
            let Some(s) = maybe else { break };
            if Some(*s) == lca {
                break;
            }
            let _ = entries.push(*s);
        }
        for s in entries.iter().rev() {
            on_entry(*s, ctx);
        }

        self.current = to;
        debug_assert!(is_leaf(self.current));
    }
}

impl Default for Hsm {
    fn default() -> Self {
        Self::new()
    }
}

fn on_entry(state: State, ctx: &mut MissionContext) {
    mission::on_entry(state, ctx);
    filling::on_entry(state, ctx);
    flight::on_entry(state, ctx);
}

fn on_exit(state: State, ctx: &mut MissionContext) {
    mission::on_exit(state, ctx);
    filling::on_exit(state, ctx);
    flight::on_exit(state, ctx);
}
