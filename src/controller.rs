//! The Controller: orchestrates one tick of the control loop. Reads the
//! latest sensor and navigator snapshots off the EventBus, evaluates
//! the HSM, publishes whatever changed, and drains the small queue of
//! deferred work that a tick's transitions can enqueue (a status
//! broadcast, say) - real side effects a Listener itself must not
//! perform inline, since `EventBus::publish` runs synchronously inside
//! whichever task calls it.

use heapless::spsc::Queue;

use crate::command::{Command, CommandInput};
use crate::config::MissionConfig;
use crate::event_bus::EventBus;
use crate::hsm::{Hsm, MissionContext, TickInputs, TickOutcome};

/// Work a tick can defer rather than perform inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkItem {
    /// Broadcast a `STATUS_REP` packet; raised whenever the HSM
    /// transitions, so ground sees every state change promptly instead
    /// of waiting for the next periodic status tick.
    SendStatusRep,
}

const WORK_QUEUE_CAPACITY: usize = 8;

pub struct Controller {
    hsm: Hsm,
    ctx: MissionContext,
    config: MissionConfig,
    command: CommandInput,
    work: Queue<WorkItem, WORK_QUEUE_CAPACITY>,
    tick_count: u64,
}

impl Controller {
    pub fn new(config: MissionConfig) -> Self {
        Self {
            hsm: Hsm::new(),
            ctx: MissionContext::new(),
            config,
            command: CommandInput::empty(),
            work: Queue::new(),
            tick_count: 0,
        }
    }

    /// Ticks run since boot; exposed for the `print-status` diagnostic
    /// dump, not consulted by any control logic.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Latch a newly arrived command; overwrites whatever was latched
    /// but not yet evaluated; the latest command standing when the
    /// next tick runs wins.
    pub fn accept_command(&mut self, command: Command, arrived_at_ms: u64) {
        self.command = CommandInput::new(command, arrived_at_ms);
    }

    pub fn context(&self) -> &MissionContext {
        &self.ctx
    }

    pub fn hsm(&self) -> &Hsm {
        &self.hsm
    }

    pub fn config(&self) -> &MissionConfig {
        &self.config
    }

    /// Run one full tick:
    /// 1. Read the latest sensor snapshot and navigator data off the bus.
    /// 2. Evaluate the HSM.
    /// 3. Publish the actuator vector, and the mission status if it changed.
    /// 4. Drain any work the transition enqueued.
    pub fn tick(&mut self, bus: &mut EventBus, now_ms: u64) -> TickOutcome {
        self.tick_count += 1;
        #[cfg(all(feature = "mcu", feature = "print-status"))]
        if self.tick_count % 50 == 0 {
            defmt::println!("controller: tick {} state {:?}", self.tick_count, defmt::Debug2Format(&self.hsm.current()));
        }

        let snapshot = crate::sensors::SensorSnapshot {
            thermocouples: bus.thermo_sensors.get().unwrap_or_default(),
            pressures: bus.pressure_sensors.get().unwrap_or_default(),
            loadcells: bus.weight_sensors.get().unwrap_or_default(),
        };
        let navigator = bus.navigator_sensors.get();
        let kalman = bus.kalman_data.get();

        let inputs = TickInputs {
            config: &self.config,
            sensors: &snapshot,
            navigator,
            kalman,
            command: self.command.take(),
            now_ms,
        };

        let outcome = self.hsm.tick(&mut self.ctx, &inputs);

        let _ = bus.actuators.publish(self.ctx.actuators, &mut []);

        if outcome.transitioned {
            let _ = bus.rocket_state.publish(self.hsm.status(), &mut []);
            let _ = self.work.enqueue(WorkItem::SendStatusRep);
        }

        outcome
    }

    /// Drain the deferred-work queue. Called by the Controller's own
    /// idle-priority task, never from inside `tick`.
    pub fn drain_work(&mut self) -> Option<WorkItem> {
        self.work.dequeue()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::sensors::Thermocouples;

    #[test]
    fn tick_with_no_command_does_not_transition() {
        let mut controller = Controller::new(MissionConfig::default());
        let mut bus = EventBus::new();
        let outcome = controller.tick(&mut bus, 0);
        assert!(!outcome.transitioned);
    }

    #[test]
    fn a_transition_publishes_status_and_enqueues_work() {
        let mut controller = Controller::new(MissionConfig::default());
        let mut bus = EventBus::new();

        controller.accept_command(Command::Ready, 0);
        let outcome = controller.tick(&mut bus, 1);

        assert!(outcome.transitioned);
        assert!(bus.rocket_state.get().is_some());
        assert_eq!(controller.drain_work(), Some(WorkItem::SendStatusRep));
        assert_eq!(controller.drain_work(), None);
    }

    #[test]
    fn command_is_consumed_after_one_tick() {
        let mut controller = Controller::new(MissionConfig::default());
        let mut bus = EventBus::new();

        controller.accept_command(Command::Ready, 0);
        controller.tick(&mut bus, 1);
        let second = controller.tick(&mut bus, 2);
        assert!(!second.transitioned);
    }

    #[test]
    fn sensor_snapshot_is_read_from_the_bus() {
        let mut controller = Controller::new(MissionConfig::default());
        let mut bus = EventBus::new();
        let mut thermos = Thermocouples::default();
        thermos.chamber = 77;
        bus.thermo_sensors.publish(thermos, &mut []).unwrap();

        controller.tick(&mut bus, 0);
        // No direct getter for the last snapshot; this test only
        // confirms the tick doesn't panic pulling from a partially
        // published bus (pressures/loadcells never published).
    }
}
