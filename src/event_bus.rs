//! The EventBus: typed publish/subscribe channels with published-latest
//! semantics. A late subscriber reading a channel sees the most recent
//! value, not a missed history.
//!
//! Each logical channel becomes one `Channel<T>` field on `EventBus`
//! rather than a single untyped array of void pointers (the original's
//! zbus) - the value type is part of the channel's type, so publishing
//! the wrong shape is a compile error, not a runtime one.
//!
//! Observers come in two flavors:
//! - **Listeners** are invoked synchronously, inside `publish`, and must
//!   not block - they may only enqueue work. Modeled as
//!   `&mut dyn Listener<T>` so a publish call can fan out to however
//!   many listeners are registered for that tick without heap
//!   allocation.
//! - **Subscribers** are woken (out of scope for this module - that's
//!   the RTIC monotonic/task-spawn layer) and later call `read()`
//!   themselves.

use crate::error::BusFault;

/// A listener registered on a channel. `notify` must not block; if the
/// listener's own downstream queue is saturated it returns
/// `Err(BusFault::BusFull)` - the channel's stored value is unaffected,
/// so the listener's next wake still observes the latest value.
pub trait Listener<T> {
    fn notify(&mut self, value: T) -> Result<(), BusFault>;
}

/// A single typed channel: the current value plus a monotonic publish
/// counter (used by tests and by subscribers that want to detect a
/// missed update without storing history).
#[derive(Debug)]
pub struct Channel<T> {
    value: Option<T>,
    publish_count: u32,
}

impl<T> Channel<T> {
    pub const fn new() -> Self {
        Self {
            value: None,
            publish_count: 0,
        }
    }

    pub fn publish_count(&self) -> u32 {
        self.publish_count
    }
}

impl<T: Copy> Channel<T> {
    /// Store `value` and synchronously notify every listener in
    /// registration order. The value is stored unconditionally, even if
    /// a listener reports its queue is full - a saturated observer
    /// still sees the latest value on its next wake.
    pub fn publish(&mut self, value: T, listeners: &mut [&mut dyn Listener<T>]) -> Result<(), BusFault> {
        self.value = Some(value);
        self.publish_count = self.publish_count.wrapping_add(1);

        let mut fault = None;
        for listener in listeners.iter_mut() {
            if let Err(e) = listener.notify(value) {
                fault = Some(e);
            }
        }

        match fault {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Copy the current value into `dst`. Fails with `Stale` if nothing
    /// has ever been published on this channel.
    pub fn read(&self, dst: &mut T) -> Result<(), BusFault> {
        match self.value {
            Some(v) => {
                *dst = v;
                Ok(())
            }
            None => Err(BusFault::Stale),
        }
    }

    pub fn get(&self) -> Option<T> {
        self.value
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self {
            value: None,
            publish_count: 0,
        }
    }
}

use crate::actuators::ActuatorVector;
use crate::sensors::{KalmanData, Loadcells, NavigatorSensors, Pressures, Thermocouples};
use crate::status::MissionStatus;

/// Wire-format radio packet, always 128 bytes.
pub type PacketFrame = [u8; 128];

/// The eight channels the control loop shares, each strongly typed.
#[derive(Debug, Default)]
pub struct EventBus {
    pub thermo_sensors: Channel<Thermocouples>,
    pub pressure_sensors: Channel<Pressures>,
    pub weight_sensors: Channel<Loadcells>,
    pub navigator_sensors: Channel<NavigatorSensors>,
    pub kalman_data: Channel<KalmanData>,
    pub actuators: Channel<ActuatorVector>,
    pub packets: Channel<PacketFrame>,
    pub rocket_state: Channel<MissionStatus>,
}

impl EventBus {
    pub const fn new() -> Self {
        Self {
            thermo_sensors: Channel::new(),
            pressure_sensors: Channel::new(),
            weight_sensors: Channel::new(),
            navigator_sensors: Channel::new(),
            kalman_data: Channel::new(),
            actuators: Channel::new(),
            packets: Channel::new(),
            rocket_state: Channel::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        calls: u32,
        fail_after: Option<u32>,
    }

    impl Listener<u32> for Counter {
        fn notify(&mut self, _value: u32) -> Result<(), BusFault> {
            self.calls += 1;
            if self.fail_after == Some(self.calls) {
                Err(BusFault::BusFull)
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn read_before_any_publish_is_stale() {
        let ch: Channel<u32> = Channel::new();
        let mut dst = 0u32;
        assert_eq!(ch.read(&mut dst), Err(BusFault::Stale));
    }

    #[test]
    fn late_subscriber_sees_latest_value() {
        let mut ch: Channel<u32> = Channel::new();
        ch.publish(1, &mut []).unwrap();
        ch.publish(2, &mut []).unwrap();
        ch.publish(3, &mut []).unwrap();

        let mut dst = 0u32;
        ch.read(&mut dst).unwrap();
        assert_eq!(dst, 3);
        assert_eq!(ch.publish_count(), 3);
    }

    #[test]
    fn listeners_are_notified_synchronously_in_order() {
        let mut ch: Channel<u32> = Channel::new();
        let mut a = Counter {
            calls: 0,
            fail_after: None,
        };
        let mut b = Counter {
            calls: 0,
            fail_after: None,
        };
        let mut listeners: [&mut dyn Listener<u32>; 2] = [&mut a, &mut b];
        ch.publish(42, &mut listeners).unwrap();
        assert_eq!(a.calls, 1);
        assert_eq!(b.calls, 1);
    }

    #[test]
    fn saturated_listener_reports_bus_full_but_value_is_still_stored() {
        let mut ch: Channel<u32> = Channel::new();
        let mut saturated = Counter {
            calls: 0,
            fail_after: Some(1),
        };
        let mut listeners: [&mut dyn Listener<u32>; 1] = [&mut saturated];
        let result = ch.publish(7, &mut listeners);
        assert_eq!(result, Err(BusFault::BusFull));

        let mut dst = 0u32;
        ch.read(&mut dst).unwrap();
        assert_eq!(dst, 7);
    }

    #[test]
    fn event_bus_channels_are_independent() {
        let mut bus = EventBus::new();
        bus.thermo_sensors.publish(Thermocouples::default(), &mut []).unwrap();
        assert!(bus.pressure_sensors.get().is_none());
        assert!(bus.thermo_sensors.get().is_some());
    }
}
