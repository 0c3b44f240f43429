//! State carried between ticks that isn't itself part of the state
//! topology: the actuator vector, the fill-station disable latch, and
//! the boost timer's pair of flags.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::actuators::ActuatorVector;
use crate::command::FillProgram;
use crate::config::PressureHysteresis;

/// The `BOOST` leaf owns a one-shot timer armed on entry. The timer
/// itself lives in the RTIC monotonic layer (out of scope here); this
/// type is just the two flags that layer reports back through.
/// `cancelled` is set only if the timer is torn down before it ever
/// expired (an early exit out of `BOOST`, e.g. via `Abort`); once
/// `expired` is latched, a later `cancel()` is a no-op.
#[derive(Debug, Default)]
pub struct BoostTimer {
    expired: AtomicBool,
    cancelled: AtomicBool,
}

impl BoostTimer {
    pub const fn new() -> Self {
        Self {
            expired: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Reset both flags on `BOOST` entry, before the real timer is armed.
    pub fn arm(&self) {
        self.expired.store(false, Ordering::Release);
        self.cancelled.store(false, Ordering::Release);
    }

    /// Called from the timer-expiry task.
    pub fn mark_expired(&self) {
        self.expired.store(true, Ordering::Release);
    }

    /// Called when `BOOST` is exited by something other than its own
    /// expiry condition.
    pub fn cancel(&self) {
        if !self.expired.load(Ordering::Acquire) {
            self.cancelled.store(true, Ordering::Release);
        }
    }

    pub fn expired(&self) -> bool {
        self.expired.load(Ordering::Acquire)
    }

    pub fn cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn is_done(&self) -> bool {
        self.expired() || self.cancelled()
    }
}

/// Everything the HSM mutates or reads outside of its own state
/// topology. Owned by the Controller, passed by mutable reference into
/// each tick.
#[derive(Debug, Default)]
pub struct MissionContext {
    pub actuators: ActuatorVector,
    /// Latched true once the HSM reports any flight substate; the
    /// field station's boards stop being polled for the remainder of
    /// the mission rather than sharing bus bandwidth with flight
    /// telemetry after liftoff.
    pub fill_station_disabled: bool,
    pub boost_timer: BoostTimer,
    /// When `ABORT` was entered, so its delayed pressurizing step can
    /// measure elapsed time without owning its own clock.
    pub abort_entered_at_ms: Option<u64>,
    /// The timestamp the current tick was evaluated at, set once by the
    /// Controller before dispatch so entry actions that need "now"
    /// don't require a wider signature change just for `ABORT`.
    pub now_hint_ms: u64,
    /// The program selected by the most recent `FillExec`, kept for
    /// status reporting and so the active filling leaf knows which
    /// hysteresis rule applies.
    pub active_program: Option<FillProgram>,
    /// The resolved target/trigger for the active pressure-only
    /// program; `None` while `FILL_N2O` is active, since its hysteresis
    /// comes entirely from configuration.
    pub active_hysteresis: Option<PressureHysteresis>,
}

impl MissionContext {
    pub const fn new() -> Self {
        Self {
            actuators: ActuatorVector::empty(),
            fill_station_disabled: false,
            boost_timer: BoostTimer::new(),
            abort_entered_at_ms: None,
            now_hint_ms: 0,
            active_program: None,
            active_hysteresis: None,
        }
    }

    /// The manual-override path (out of scope beyond forwarding) writes
    /// actuator bits directly rather than through an HSM entry action -
    /// used, for instance, to fire the drogue e-match from the ground
    /// while `APOGEE` is still waiting on it.
    pub fn external_set_actuator(&mut self, id: crate::actuators::ActuatorId, on: bool) {
        if on {
            self.actuators.set(id);
        } else {
            self.actuators.clear(id);
        }
    }
}
