//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (reading sources, command transports, event sinks,
//! settings storage, clocks) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics,
//! so the domain core never touches a file, socket or wall clock directly.
//!
//! ## Notes
//!
//! - **ConfigPort** implementations MUST validate before persisting.
//! - **CommandChannel** implementations MUST NOT block; queue instead.

use serde_json::Value;

use crate::config::Settings;
use crate::dispatch::ActuatorCommand;
pub use crate::error::{ConfigError, TransportError};

// ───────────────────────────────────────────────────────────────
// Reading source (driven adapter: sensors → domain)
// ───────────────────────────────────────────────────────────────

/// Outcome of asking a [`ReadingSource`] for the next delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum SourcePoll {
    /// A raw payload.  `Value::Null` means the source had no data.
    Payload(Value),
    /// The source failed to deliver; the reason is surfaced to operators.
    Failed(&'static str),
    /// No more deliveries will arrive.
    Exhausted,
}

/// Read-side port: the domain pulls raw payloads from here.
pub trait ReadingSource {
    fn poll(&mut self) -> SourcePoll;
}

// ───────────────────────────────────────────────────────────────
// Command channel (driven adapter: domain → actuators)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the dispatcher sends `(actuator_id, 0|1)` here.
pub trait CommandChannel {
    fn send(&mut self, command: &ActuatorCommand) -> Result<(), TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent settings)
// ───────────────────────────────────────────────────────────────

/// Loads and persists [`Settings`].
///
/// Implementations MUST validate values before persisting.  Invalid ranges
/// are rejected with [`ConfigError::ValidationFailed`], never clamped.
pub trait ConfigPort {
    /// Returns [`Settings::default()`] if nothing is stored yet.
    fn load(&self) -> Result<Settings, ConfigError>;

    fn save(&self, settings: &Settings) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.  Nutrition timing and connection staleness
/// are measured against it, so tests inject a manual one.
pub trait Clock {
    fn now_ms(&self) -> u64;
}
