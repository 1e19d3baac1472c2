//! Read-only context handed to every actuator update handler.
//!
//! `ControlContext` is the "blackboard" for one reading-processing tick: the
//! reading, its condition flags, the configuration, the engine clock, and a
//! live view of every actuator's state.  The bank refreshes `states` after
//! each transition so later machines in the fixed order see earlier ones'
//! decisions from the same tick.

use super::{ActuatorId, ActuatorState};
use crate::config::ControlConfig;
use crate::reading::Reading;
use crate::threshold::ConditionFlags;

pub struct ControlContext<'a> {
    // -- Inputs --
    pub reading: &'a Reading,
    pub flags: ConditionFlags,
    pub config: &'a ControlConfig,

    // -- Timing --
    /// Engine clock for this tick (ms).
    pub now_ms: u64,
    /// When the nutrition pump last started a dose (ms).
    pub last_dose_ms: u64,

    // -- Actuators --
    /// Current state of every actuator, indexed by `ActuatorId as usize`.
    pub states: [ActuatorState; ActuatorId::COUNT],
}

impl ControlContext<'_> {
    pub fn state_of(&self, id: ActuatorId) -> ActuatorState {
        self.states[id as usize]
    }

    /// True if either pH pump is currently running.
    pub fn ph_pump_active(&self) -> bool {
        self.state_of(ActuatorId::PhUpPump) == ActuatorState::Active
            || self.state_of(ActuatorId::PhDownPump) == ActuatorState::Active
    }

    /// pH within the closed band `[ph_min, ph_max]`.
    pub fn ph_in_band(&self) -> bool {
        (self.config.ph_min..=self.config.ph_max).contains(&self.reading.ph)
    }

    /// Milliseconds elapsed since `since_ms`.  A clock that steps backwards
    /// reads as zero elapsed rather than wrapping.
    pub fn ms_since(&self, since_ms: u64) -> u64 {
        self.now_ms.saturating_sub(since_ms)
    }
}
