//! Mission configuration: immutable for the duration of a mission,
//! assembled once at `init()` from crate-level defaults. This crate has
//! no persistent storage, so unlike `corvus`'s `UserCfg`, which
//! round-trips through flash, `MissionConfig` is never saved or loaded -
//! only ever constructed fresh.

#[cfg(feature = "mcu")]
use defmt::Format;

/// Hysteresis target/trigger pair shared by every pressure-only filling
/// composite (`SAFE_PAUSE`, `FILL_N2`, `PRE_PRESS`, `POST_PRESS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "mcu", derive(Format))]
pub struct PressureHysteresis {
    pub target: u16,
    pub trigger: u16,
}

/// `FILL_N2O`'s richer hysteresis rule: weight-gated entry/exit, with a
/// pressure+temperature interlock governing the vent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "mcu", derive(Format))]
pub struct FillN2oConfig {
    pub target_weight: u16,
    pub target_pressure: u16,
    pub trigger_pressure: u16,
    pub trigger_temperature: i16,
}

/// Flight sub-machine thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "mcu", derive(Format))]
pub struct FlightConfig {
    /// Tenths of degrees Celsius.
    pub min_chamber_launch_temp: i16,
    /// mm/s.
    pub boost_vertical_speed: i16,
    /// mm/s.
    pub coast_vertical_speed: i16,
    /// Meters.
    pub main_chute_deploy_altitude: i16,
    /// Meters.
    pub touchdown_altitude: i16,
    pub boost_time_ms: u32,
}

/// The top-level `ABORT` state's entry behavior; the delay value is
/// left to configuration rather than fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "mcu", derive(Format))]
pub struct AbortConfig {
    pub pressurizing_delay_ms: u32,
}

/// Default abort-entry delay before the `pressurizing` valve is added to
/// the abort vector, chosen in the same range as the hardware warm-up
/// delays this crate's ambient stack otherwise uses; tunable per mission.
pub const DEFAULT_ABORT_PRESSURIZING_DELAY_MS: u32 = 2_000;

/// The two sensor samplers' independent periods: the Hydra sampler
/// (tank instrumentation) runs faster than the Lift sampler (load
/// cells), so neither shares the other's bus bandwidth budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "mcu", derive(Format))]
pub struct SamplingConfig {
    pub hydra_period_ms: u32,
    pub lift_period_ms: u32,
}

pub const DEFAULT_HYDRA_SAMPLE_MS: u32 = 100;
pub const DEFAULT_LIFT_SAMPLE_MS: u32 = 200;

/// Everything the HSM needs to evaluate guards and hysteresis rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "mcu", derive(Format))]
pub struct MissionConfig {
    pub safe_pause: PressureHysteresis,
    pub fill_n2: PressureHysteresis,
    pub pre_press: PressureHysteresis,
    pub fill_n2o: FillN2oConfig,
    pub post_press: PressureHysteresis,
    pub flight: FlightConfig,
    pub abort: AbortConfig,
    pub sampling: SamplingConfig,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            safe_pause: PressureHysteresis {
                target: 0,
                trigger: 0,
            },
            fill_n2: PressureHysteresis {
                target: 0,
                trigger: 0,
            },
            pre_press: PressureHysteresis {
                target: 0,
                trigger: 0,
            },
            fill_n2o: FillN2oConfig {
                target_weight: 0,
                target_pressure: 0,
                trigger_pressure: 0,
                trigger_temperature: 0,
            },
            post_press: PressureHysteresis {
                target: 0,
                trigger: 0,
            },
            flight: FlightConfig {
                min_chamber_launch_temp: 0,
                boost_vertical_speed: 0,
                coast_vertical_speed: 0,
                main_chute_deploy_altitude: 0,
                touchdown_altitude: 0,
                boost_time_ms: 0,
            },
            abort: AbortConfig {
                pressurizing_delay_ms: DEFAULT_ABORT_PRESSURIZING_DELAY_MS,
            },
            sampling: SamplingConfig {
                hydra_period_ms: DEFAULT_HYDRA_SAMPLE_MS,
                lift_period_ms: DEFAULT_LIFT_SAMPLE_MS,
            },
        }
    }
}
