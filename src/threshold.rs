//! Threshold evaluator.
//!
//! Maps one reading and the current configuration to the four condition
//! flags the actuator machines consume.  Comparisons are strict and there is
//! no hysteresis here: the exit thresholds differ per actuator, so the bands
//! live in the machines themselves (see [`crate::fsm::actuators`]).

use serde::Serialize;

use crate::config::ControlConfig;
use crate::reading::Reading;

/// Alarm conditions derived from a single reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionFlags {
    pub water_level_low: bool,
    pub water_level_high: bool,
    pub ph_low: bool,
    pub ph_high: bool,
}

impl ConditionFlags {
    /// True if any alarm condition is raised.
    pub fn any(&self) -> bool {
        self.water_level_low || self.water_level_high || self.ph_low || self.ph_high
    }
}

/// Pure and deterministic: identical arguments always give identical flags.
pub fn evaluate(reading: &Reading, config: &ControlConfig) -> ConditionFlags {
    ConditionFlags {
        water_level_low: reading.water_level_pct < config.water_level_min,
        water_level_high: reading.water_level_pct > config.water_level_max,
        ph_low: reading.ph < config.ph_min,
        ph_high: reading.ph > config.ph_max,
    }
}
