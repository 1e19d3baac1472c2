//! Function-pointer actuator state machines.
//!
//! One table row per actuator, the classic embedded FSM layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  ActuatorTable                                        │
//! │  ┌───────────────┬───────────────┬──────────────────┐ │
//! │  │ ActuatorId    │ name          │ on_update        │ │
//! │  ├───────────────┼───────────────┼──────────────────┤ │
//! │  │ WaterIntake   │ "WaterIntake" │ fn(ctx, rec)->.. │ │
//! │  │ OverflowValve │ ...           │ fn(ctx, rec)->.. │ │
//! │  │ PhUpPump      │ ...           │ fn(ctx, rec)->.. │ │
//! │  │ PhDownPump    │ ...           │ fn(ctx, rec)->.. │ │
//! │  │ NutritionPump │ ...           │ fn(ctx, rec)->.. │ │
//! │  └───────────────┴───────────────┴──────────────────┘ │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the [`ActuatorBank`] walks the table in row order and calls
//! `on_update` for every actuator.  A `Some((next, trigger))` with a new
//! state becomes a [`Transition`], stamped with the tick's clock time.  The
//! bank never talks to the outside world; the engine turns transitions into
//! notifications and commands.

pub mod actuators;
pub mod context;

use context::ControlContext;
use log::info;
use serde::Serialize;

use crate::config::ControlConfig;
use crate::notify::{Category, Severity};
use crate::reading::Reading;
use crate::threshold::ConditionFlags;

// ---------------------------------------------------------------------------
// Actuator identity
// ---------------------------------------------------------------------------

/// The five controlled devices.  Discriminants index the actuator table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ActuatorId {
    WaterIntake = 0,
    OverflowValve = 1,
    PhUpPump = 2,
    PhDownPump = 3,
    NutritionPump = 4,
}

impl ActuatorId {
    /// Number of actuators; sizes the table array.
    pub const COUNT: usize = 5;

    /// Every actuator, in evaluation order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::WaterIntake,
        Self::OverflowValve,
        Self::PhUpPump,
        Self::PhDownPump,
        Self::NutritionPump,
    ];

    /// Identifier used on the outbound command channel.
    pub const fn key(self) -> &'static str {
        match self {
            Self::WaterIntake => "water_intake",
            Self::OverflowValve => "overflow_valve",
            Self::PhUpPump => "ph_up_pump",
            Self::PhDownPump => "ph_down_pump",
            Self::NutritionPump => "nutrition_pump",
        }
    }

    /// Parse a channel identifier.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.key() == key)
    }

    /// Human-readable device name used in notifications.
    pub const fn label(self) -> &'static str {
        match self {
            Self::WaterIntake => "water intake pump",
            Self::OverflowValve => "overflow valve",
            Self::PhUpPump => "pH up pump",
            Self::PhDownPump => "pH down pump",
            Self::NutritionPump => "nutrition pump",
        }
    }

    /// Notification category for this actuator's transitions.
    pub const fn category(self) -> Category {
        match self {
            Self::WaterIntake => Category::WaterIntake,
            Self::OverflowValve => Category::Overflow,
            Self::PhUpPump | Self::PhDownPump => Category::PhControl,
            Self::NutritionPump => Category::Nutrition,
        }
    }
}

// ---------------------------------------------------------------------------
// States and triggers
// ---------------------------------------------------------------------------

/// Actuator state.  Threshold actuators use `Idle`/`Active`; the nutrition
/// pump cycles `Idle` → `Dosing` → `Cooldown` → `Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ActuatorState {
    #[default]
    Idle,
    Active,
    Dosing,
    Cooldown,
}

impl ActuatorState {
    /// Whether the relay is energised in this state.
    pub const fn relay_on(self) -> bool {
        matches!(self, Self::Active | Self::Dosing)
    }
}

/// The condition that caused a transition, with the value that tripped it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Trigger {
    WaterLevelLow { level: f32 },
    WaterLevelRestored { level: f32 },
    WaterLevelHigh { level: f32 },
    WaterLevelNormalized { level: f32 },
    PhLow { ph: f32 },
    PhHigh { ph: f32 },
    PhNormalized { ph: f32 },
    DoseDue { dosage_ml: u32 },
    DoseComplete,
    CooldownElapsed,
}

impl Trigger {
    /// Alarm entries warn; returns to normal and scheduled dosing inform.
    pub const fn severity(self) -> Severity {
        match self {
            Self::WaterLevelLow { .. }
            | Self::WaterLevelHigh { .. }
            | Self::PhLow { .. }
            | Self::PhHigh { .. } => Severity::Warning,
            _ => Severity::Info,
        }
    }
}

/// One state change of one actuator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub actuator: ActuatorId,
    pub from: ActuatorState,
    pub to: ActuatorState,
    pub trigger: Trigger,
    pub at_ms: u64,
}

impl Transition {
    /// Whether the transition changes the relay output, and therefore needs
    /// a command on the outbound channel.
    pub const fn switches_relay(&self) -> bool {
        self.from.relay_on() != self.to.relay_on()
    }

    pub const fn severity(&self) -> Severity {
        self.trigger.severity()
    }

    /// Operator-facing description of the transition.
    pub fn message(&self) -> String {
        let label = self.actuator.label();
        match self.trigger {
            Trigger::WaterLevelLow { level } => {
                format!("Water level low ({level}%). Starting {label}.")
            }
            Trigger::WaterLevelRestored { level } => {
                format!("Water level optimal ({level}%). Stopping {label}.")
            }
            Trigger::WaterLevelHigh { level } => {
                format!("Water level too high ({level}%). Opening {label}!")
            }
            Trigger::WaterLevelNormalized { level } => {
                format!("Water level normalized ({level}%). Closing {label}.")
            }
            Trigger::PhLow { ph } => format!("pH too low ({ph}). Activating {label}."),
            Trigger::PhHigh { ph } => format!("pH too high ({ph}). Activating {label}."),
            Trigger::PhNormalized { ph } => format!("pH normalized ({ph}). Stopping {label}."),
            Trigger::DoseDue { dosage_ml } => format!("Dosing {dosage_ml}ml of nutrients."),
            Trigger::DoseComplete => format!("Nutrition dose complete. Stopping {label}."),
            Trigger::CooldownElapsed => format!("The {label} is ready for the next dose."),
        }
    }
}

/// Transitions produced by one tick.  Each actuator moves at most once.
pub type Transitions = heapless::Vec<Transition, { ActuatorId::COUNT }>;

// ---------------------------------------------------------------------------
// Table rows
// ---------------------------------------------------------------------------

/// Per-tick update handler.  Returns `Some((next, trigger))` to request a
/// transition, or `None` to stay.
pub type ActuatorUpdateFn = fn(&ControlContext, &ActuatorRecord) -> Option<(ActuatorState, Trigger)>;

/// Static descriptor for one actuator machine.
pub struct ActuatorDescriptor {
    pub id: ActuatorId,
    pub name: &'static str,
    pub on_update: ActuatorUpdateFn,
}

/// Live state of one actuator: where it is, since when, and why.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActuatorRecord {
    pub state: ActuatorState,
    pub since_ms: u64,
    pub last_trigger: Option<Trigger>,
}

impl ActuatorRecord {
    const fn idle(since_ms: u64) -> Self {
        Self {
            state: ActuatorState::Idle,
            since_ms,
            last_trigger: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Bank
// ---------------------------------------------------------------------------

/// The five actuator machines and their shared nutrition clock.
pub struct ActuatorBank {
    /// Fixed-size table indexed by `ActuatorId as usize`.
    table: [ActuatorDescriptor; ActuatorId::COUNT],
    records: [ActuatorRecord; ActuatorId::COUNT],
    /// When the last dose started; the nutrition interval counts from here.
    last_dose_ms: u64,
    transition_count: u64,
}

impl ActuatorBank {
    /// All actuators start `Idle` at `now_ms`, which also starts the
    /// nutrition interval.
    pub fn new(table: [ActuatorDescriptor; ActuatorId::COUNT], now_ms: u64) -> Self {
        Self {
            table,
            records: [ActuatorRecord::idle(now_ms); ActuatorId::COUNT],
            last_dose_ms: now_ms,
            transition_count: 0,
        }
    }

    /// Advance every machine once, in table order.
    pub fn step(
        &mut self,
        reading: &Reading,
        flags: ConditionFlags,
        config: &ControlConfig,
        now_ms: u64,
    ) -> Transitions {
        let mut ctx = ControlContext {
            reading,
            flags,
            config,
            now_ms,
            last_dose_ms: self.last_dose_ms,
            states: self.states(),
        };
        let mut out = Transitions::new();

        for (idx, desc) in self.table.iter().enumerate() {
            let Some((next, trigger)) = (desc.on_update)(&ctx, &self.records[idx]) else {
                continue;
            };
            let from = self.records[idx].state;
            if next == from {
                continue;
            }

            info!("ACTUATOR {}: {:?} -> {:?} ({:?})", desc.name, from, next, trigger);
            self.records[idx] = ActuatorRecord {
                state: next,
                since_ms: now_ms,
                last_trigger: Some(trigger),
            };
            ctx.states[idx] = next;
            if next == ActuatorState::Dosing {
                self.last_dose_ms = now_ms;
                ctx.last_dose_ms = now_ms;
            }
            self.transition_count += 1;

            let _ = out.push(Transition {
                actuator: desc.id,
                from,
                to: next,
                trigger,
                at_ms: now_ms,
            });
        }
        out
    }

    pub fn state(&self, id: ActuatorId) -> ActuatorState {
        self.records[id as usize].state
    }

    pub fn record(&self, id: ActuatorId) -> ActuatorRecord {
        self.records[id as usize]
    }

    /// Every actuator's state, indexed by `ActuatorId as usize`.
    pub fn states(&self) -> [ActuatorState; ActuatorId::COUNT] {
        self.records.map(|r| r.state)
    }

    pub fn last_dose_ms(&self) -> u64 {
        self.last_dose_ms
    }

    /// Transitions performed since construction.
    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }
}
