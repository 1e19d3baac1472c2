//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (operator panel,
//! settings file watcher, replay driver) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.

use crate::config::ControlConfig;
use crate::fsm::ActuatorId;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Replace the control configuration.  Rejected if invalid; the
    /// previous configuration then stays in effect.
    UpdateConfig(ControlConfig),

    /// Drive one actuator directly, outside the automatic machines.
    ManualOverride { actuator: ActuatorId, on: bool },

    /// Flip an actuator's manual override (the overflow valve button).
    ToggleOverride(ActuatorId),

    /// Stop feeding deliveries into the engine.
    PauseMonitoring,

    /// Resume feeding deliveries into the engine.
    ResumeMonitoring,
}
