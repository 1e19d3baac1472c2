//! Concrete actuator update handlers and table builder.
//!
//! Each actuator is one row: a plain `fn` pointer that looks at the shared
//! [`ControlContext`] and its own [`ActuatorRecord`] and returns the next
//! state plus the trigger, or `None` to stay put.
//!
//! ```text
//!  WATER INTAKE   Idle ──[level < min]──▶ Active ──[level >= max]──▶ Idle
//!  OVERFLOW       Idle ──[level > max]──▶ Active ──[level < max - margin]──▶ Idle
//!  PH UP          Idle ──[ph < ph_min, no pH pump on]──▶ Active ──[ph in band]──▶ Idle
//!  PH DOWN        Idle ──[ph > ph_max, no pH pump on]──▶ Active ──[ph in band]──▶ Idle
//!  NUTRITION      Idle ──[interval elapsed]──▶ Dosing ──[dose time]──▶ Cooldown ──[mix time]──▶ Idle
//! ```
//!
//! The intake stops only when the level reaches the *high* bound and the
//! overflow closes only after a fixed margin below it, so neither chatters
//! around its entry threshold.

use super::context::ControlContext;
use super::{ActuatorDescriptor, ActuatorId, ActuatorRecord, ActuatorState, Trigger};

/// Result of an update handler: the requested next state and why.
type Step = Option<(ActuatorState, Trigger)>;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the actuator table.  Row order is evaluation order.
pub fn build_actuator_table() -> [ActuatorDescriptor; ActuatorId::COUNT] {
    [
        // Index 0: Water intake
        ActuatorDescriptor {
            id: ActuatorId::WaterIntake,
            name: "WaterIntake",
            on_update: water_intake_update,
        },
        // Index 1: Overflow valve
        ActuatorDescriptor {
            id: ActuatorId::OverflowValve,
            name: "OverflowValve",
            on_update: overflow_valve_update,
        },
        // Index 2: pH up
        ActuatorDescriptor {
            id: ActuatorId::PhUpPump,
            name: "PhUpPump",
            on_update: ph_up_update,
        },
        // Index 3: pH down
        ActuatorDescriptor {
            id: ActuatorId::PhDownPump,
            name: "PhDownPump",
            on_update: ph_down_update,
        },
        // Index 4: Nutrition
        ActuatorDescriptor {
            id: ActuatorId::NutritionPump,
            name: "NutritionPump",
            on_update: nutrition_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Water level
// ═══════════════════════════════════════════════════════════════════════════

fn water_intake_update(ctx: &ControlContext, rec: &ActuatorRecord) -> Step {
    let level = ctx.reading.water_level_pct;
    match rec.state {
        ActuatorState::Idle if ctx.flags.water_level_low => {
            Some((ActuatorState::Active, Trigger::WaterLevelLow { level }))
        }
        ActuatorState::Active if level >= ctx.config.water_level_max => {
            Some((ActuatorState::Idle, Trigger::WaterLevelRestored { level }))
        }
        _ => None,
    }
}

fn overflow_valve_update(ctx: &ControlContext, rec: &ActuatorRecord) -> Step {
    let level = ctx.reading.water_level_pct;
    let close_below = ctx.config.water_level_max - ctx.config.overflow_margin_pct;
    match rec.state {
        ActuatorState::Idle if ctx.flags.water_level_high => {
            Some((ActuatorState::Active, Trigger::WaterLevelHigh { level }))
        }
        ActuatorState::Active if level < close_below => {
            Some((ActuatorState::Idle, Trigger::WaterLevelNormalized { level }))
        }
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  pH: the two pumps never run together
// ═══════════════════════════════════════════════════════════════════════════

fn ph_up_update(ctx: &ControlContext, rec: &ActuatorRecord) -> Step {
    let ph = ctx.reading.ph;
    match rec.state {
        ActuatorState::Idle if ctx.flags.ph_low && !ctx.ph_pump_active() => {
            Some((ActuatorState::Active, Trigger::PhLow { ph }))
        }
        ActuatorState::Active if ctx.ph_in_band() => {
            Some((ActuatorState::Idle, Trigger::PhNormalized { ph }))
        }
        _ => None,
    }
}

fn ph_down_update(ctx: &ControlContext, rec: &ActuatorRecord) -> Step {
    let ph = ctx.reading.ph;
    match rec.state {
        ActuatorState::Idle if ctx.flags.ph_high && !ctx.ph_pump_active() => {
            Some((ActuatorState::Active, Trigger::PhHigh { ph }))
        }
        ActuatorState::Active if ctx.ph_in_band() => {
            Some((ActuatorState::Idle, Trigger::PhNormalized { ph }))
        }
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Nutrition: timer driven, checked on every tick
// ═══════════════════════════════════════════════════════════════════════════

fn nutrition_update(ctx: &ControlContext, rec: &ActuatorRecord) -> Step {
    let cfg = ctx.config;
    match rec.state {
        ActuatorState::Idle if ctx.ms_since(ctx.last_dose_ms) >= cfg.nutrition_interval_ms => {
            Some((
                ActuatorState::Dosing,
                Trigger::DoseDue {
                    dosage_ml: cfg.nutrition_dosage_ml,
                },
            ))
        }
        ActuatorState::Dosing if ctx.ms_since(rec.since_ms) >= cfg.nutrition_dose_duration_ms => {
            Some((ActuatorState::Cooldown, Trigger::DoseComplete))
        }
        ActuatorState::Cooldown if ctx.ms_since(rec.since_ms) >= cfg.nutrition_cooldown_ms => {
            Some((ActuatorState::Idle, Trigger::CooldownElapsed))
        }
        _ => None,
    }
}
