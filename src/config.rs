//! System configuration parameters
//!
//! All tunable parameters for the control engine.  [`ControlConfig`] is the
//! threshold/timing configuration owned by the host and passed into every
//! engine call; [`EngineOptions`] sizes the engine's bounded buffers at
//! construction.  Values can be overridden from a JSON settings file.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Threshold and timing configuration for the actuator state machines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControlConfig {
    // --- Water level (0-100 %) ---
    /// Water intake turns on below this level
    pub water_level_min: f32,
    /// Overflow valve opens above this level; water intake stops at it
    pub water_level_max: f32,
    /// Overflow valve closes once the level drops this far below the max
    pub overflow_margin_pct: f32,

    // --- pH ---
    pub ph_min: f32,
    pub ph_max: f32,
    /// Desired pH, advisory for operators
    pub ph_target: f32,

    // --- Nutrition ---
    /// Interval between dose starts (milliseconds)
    pub nutrition_interval_ms: u64,
    /// Dose volume per cycle (mL), reported in notifications
    pub nutrition_dosage_ml: u32,
    /// How long the pump runs per dose (milliseconds)
    pub nutrition_dose_duration_ms: u64,
    /// Mixing time after a dose before the pump reports ready (milliseconds)
    pub nutrition_cooldown_ms: u64,

    // --- Switches ---
    /// When false, readings are buffered and evaluated but no actuator moves
    pub auto_control_enabled: bool,
    /// When false, no alerts are surfaced (the full log is still kept)
    pub alert_enabled: bool,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            // Water level
            water_level_min: 30.0,
            water_level_max: 90.0,
            overflow_margin_pct: 10.0,

            // pH
            ph_min: 5.5,
            ph_max: 6.5,
            ph_target: 6.0,

            // Nutrition
            nutrition_interval_ms: 3_600_000, // 1 hour
            nutrition_dosage_ml: 50,
            nutrition_dose_duration_ms: 5_000,
            nutrition_cooldown_ms: 60_000,

            // Switches
            auto_control_enabled: true,
            alert_enabled: true,
        }
    }
}

impl ControlConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            self.water_level_min,
            self.water_level_max,
            self.overflow_margin_pct,
            self.ph_min,
            self.ph_max,
            self.ph_target,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::ValidationFailed(
                "thresholds must be finite numbers",
            ));
        }
        if !(0.0..=100.0).contains(&self.water_level_min)
            || !(0.0..=100.0).contains(&self.water_level_max)
        {
            return Err(ConfigError::ValidationFailed(
                "water level thresholds must be 0–100",
            ));
        }
        if self.water_level_min >= self.water_level_max {
            return Err(ConfigError::ValidationFailed(
                "water_level_min must be < water_level_max",
            ));
        }
        if !(0.0..=100.0).contains(&self.overflow_margin_pct) {
            return Err(ConfigError::ValidationFailed(
                "overflow_margin_pct must be 0–100",
            ));
        }
        if !(0.0..=14.0).contains(&self.ph_min) || !(0.0..=14.0).contains(&self.ph_max) {
            return Err(ConfigError::ValidationFailed("pH thresholds must be 0–14"));
        }
        if self.ph_min >= self.ph_max {
            return Err(ConfigError::ValidationFailed("ph_min must be < ph_max"));
        }
        if self.ph_target < self.ph_min || self.ph_target > self.ph_max {
            return Err(ConfigError::ValidationFailed(
                "ph_target must lie within ph_min..=ph_max",
            ));
        }
        if self.nutrition_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "nutrition_interval_ms must be > 0",
            ));
        }
        if self.nutrition_dose_duration_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "nutrition_dose_duration_ms must be > 0",
            ));
        }
        Ok(())
    }
}

/// Sizing of the engine's bounded stores.  Fixed for the engine's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineOptions {
    /// Readings retained for charting (most recent N)
    pub buffer_capacity: usize,
    /// Notifications retained in the full log
    pub log_capacity: usize,
    /// Newest notifications surfaced as alerts
    pub alert_count: usize,
    /// No delivery for this long marks the source stale (milliseconds)
    pub source_timeout_ms: u64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            buffer_capacity: 100,
            log_capacity: 50,
            alert_count: 10,
            source_timeout_ms: 30_000, // ten missed 3 s deliveries
        }
    }
}

impl EngineOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_capacity == 0 {
            return Err(ConfigError::ValidationFailed("buffer_capacity must be > 0"));
        }
        if self.log_capacity == 0 {
            return Err(ConfigError::ValidationFailed("log_capacity must be > 0"));
        }
        if self.alert_count > self.log_capacity {
            return Err(ConfigError::ValidationFailed(
                "alert_count must be <= log_capacity",
            ));
        }
        if self.source_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "source_timeout_ms must be > 0",
            ));
        }
        Ok(())
    }
}

/// Everything persisted in a settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub control: ControlConfig,
    pub engine: EngineOptions,
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.control.validate()?;
        self.engine.validate()
    }
}
