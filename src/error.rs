//! Unified error types for the control engine.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! ingest loop's error handling uniform.  All variants are `Copy` so they
//! can be passed through the dispatcher and the notification log without
//! allocation.  None of them is fatal: the engine keeps processing readings
//! after every one of these.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level engine error
// ---------------------------------------------------------------------------

/// Every fallible operation in the engine funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A numeric field could not be parsed.  Recovered by defaulting to 0.
    MalformedReading(&'static str),
    /// The payload is identical to the last accepted one.  A filtered no-op.
    DuplicateReading,
    /// The outbound command channel failed.
    Transport(TransportError),
    /// A configuration update violated an invariant and was rejected.
    ConfigurationInvalid(&'static str),
    /// The inbound reading source delivered nothing usable.
    SourceUnavailable(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedReading(field) => write!(f, "malformed reading field: {field}"),
            Self::DuplicateReading => write!(f, "duplicate reading"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::ConfigurationInvalid(msg) => write!(f, "configuration invalid: {msg}"),
            Self::SourceUnavailable(msg) => write!(f, "source unavailable: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Failures of the outbound actuation channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The remote end is not reachable.
    Disconnected,
    /// The remote end refused the command.
    Rejected,
    /// The local outbound queue is full; the command was dropped.
    QueueFull,
    /// Generic I/O failure while writing the command.
    Io,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Rejected => write!(f, "command rejected"),
            Self::QueueFull => write!(f, "outbound queue full"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from [`ConfigPort`](crate::app::ports::ConfigPort) operations and
/// from [`ControlConfig::validate`](crate::config::ControlConfig::validate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::ConfigurationInvalid(msg),
            ConfigError::Corrupted => Self::ConfigurationInvalid("stored config corrupted"),
            ConfigError::IoError => Self::ConfigurationInvalid("config storage I/O error"),
        }
    }
}
