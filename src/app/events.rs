//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log them, publish them, or feed a
//! dashboard.

use serde::Serialize;

use crate::dispatch::CommandFailure;
use crate::engine::{ConnectionStatus, EngineStats};
use crate::fsm::{ActuatorId, ActuatorState, Transition};
use crate::reading::Reading;
use crate::threshold::ConditionFlags;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The service has started.
    Started { at_ms: u64 },

    /// A reading passed deduplication and was buffered.
    ReadingAccepted { reading: Reading, flags: ConditionFlags },

    /// An actuator machine changed state.
    ActuatorChanged(Transition),

    /// An operator drove an actuator directly.
    OverrideApplied { actuator: ActuatorId, on: bool },

    /// The transport could not deliver a command.
    CommandFailed(CommandFailure),

    /// The source health changed.
    StatusChanged(ConnectionStatus),

    /// A configuration update took effect.
    ConfigUpdated,

    /// A configuration update was refused.
    ConfigRejected(&'static str),

    MonitoringPaused,
    MonitoringResumed,

    /// Periodic or on-demand telemetry snapshot.
    Telemetry(Box<Telemetry>),

    /// The service shut down.
    Stopped { at_ms: u64 },
}

/// One actuator's rung in the ladder view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActuatorTelemetry {
    pub id: ActuatorId,
    pub state: ActuatorState,
    pub relay_on: bool,
    pub manual_override: bool,
    pub since_ms: u64,
}

/// A point-in-time snapshot suitable for logging or transmission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Telemetry {
    pub at_ms: u64,
    pub status: ConnectionStatus,
    pub monitoring: bool,
    pub auto_control: bool,
    pub reading: Option<Reading>,
    pub flags: ConditionFlags,
    /// Any alarm condition raised by the latest reading.
    pub alarm: bool,
    pub actuators: [ActuatorTelemetry; ActuatorId::COUNT],
    pub stats: EngineStats,
    /// Deliveries handed to the engine since start.
    pub cycles: u64,
}
