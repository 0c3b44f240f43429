//! Sensor data model: three disjoint, periodically-updated bundles
//! published by the `SensorSampler`, plus the externally-sourced
//! navigator data.
//!
//! All fields use the same fixed-point units as the field bus: tenths of
//! a degree Celsius for temperatures, deci-bar for pressures, and whole
//! grams for load cells. Disconnected slots are zero.

#[cfg(feature = "mcu")]
use defmt::Format;

/// Thermocouple readings, tenths of degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "mcu", derive(Format))]
pub struct Thermocouples {
    pub n2o_tank_uf_1: i16,
    pub n2o_tank_uf_2: i16,
    pub n2o_tank_uf_3: i16,
    pub n2o_tank_lf_1: i16,
    pub n2o_tank_lf_2: i16,
    pub chamber: i16,
    pub n2o_line_before_solenoid: i16,
    pub n2o_line_after_solenoid: i16,
    pub n2_line: i16,
}

/// Pressure readings, deci-bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "mcu", derive(Format))]
pub struct Pressures {
    pub n2o_tank: u16,
    pub chamber: u16,
    pub n2o_line: u16,
    pub n2_line: u16,
    pub quick_disconnect: u16,
}

/// Load cell readings, grams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "mcu", derive(Format))]
pub struct Loadcells {
    pub n2o_tank: u16,
    pub rail: u16,
    pub thrust_1: u16,
    pub thrust_2: u16,
    pub thrust_3: u16,
}

/// Full periodically-updated sensor snapshot. Owned by the EventBus;
/// the Controller reads a copy into its HSM input on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "mcu", derive(Format))]
pub struct SensorSnapshot {
    pub thermocouples: Thermocouples,
    pub pressures: Pressures,
    pub loadcells: Loadcells,
}

/// GPS fix, barometric altitude and IMU readings, ingested from the
/// external navigator (out of scope: this crate only stores what it's
/// given).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "mcu", derive(Format))]
pub struct NavigatorSensors {
    pub gps_latitude: f32,
    pub gps_longitude: f32,
    pub gps_altitude_m: f32,
    pub gps_ground_speed: f32,
    pub gps_satellites: u8,
    pub baro_1: u16,
    pub baro_2: u16,
    pub mag: [i16; 3],
    pub gyro: [i16; 3],
    pub accel: [i16; 3],
}

/// Derived Kalman-filtered outputs, also ingested from the external
/// navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "mcu", derive(Format))]
pub struct KalmanData {
    /// mm/s.
    pub vertical_speed: i16,
    /// mm/s^2.
    pub vertical_acceleration: i16,
    /// Meters.
    pub altitude: i16,
    /// Meters.
    pub max_altitude: i16,
    /// Scaled fixed-point quaternion components (w, x, y, z).
    pub attitude_quaternion: [i16; 4],
}
