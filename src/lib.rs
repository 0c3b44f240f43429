//! On-board controller for a two-stage hybrid (N2O/N2) liquid rocket:
//! a deterministic periodic control loop running a hierarchical state
//! machine over the filling sequence and the flight itself.
//!
//! The crate is `no_std` whenever it's built for the target (the `mcu`
//! feature, which also pulls in `cortex-m`, `rtic` and the HAL); under
//! `cargo test` it builds against `std` so every module's logic can run
//! on the host without a debugger attached.

#![cfg_attr(not(test), no_std)]

pub mod actuator_writer;
pub mod actuators;
pub mod bus;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod event_bus;
pub mod hsm;
pub mod radio;
pub mod sensor_sampler;
pub mod sensors;
pub mod status;

pub use controller::Controller;
pub use event_bus::EventBus;
