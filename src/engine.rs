//! Sensor ingestion and threshold control engine.
//!
//! [`ControlEngine`] owns every piece of mutable control state: the
//! deduplicator, the reading buffer, the actuator bank, the dispatcher and
//! the notification log.  Configuration is owned by the caller and lent to
//! each call, so an update takes effect on the next reading.
//!
//! ```text
//!  raw ──▶ Deduplicator ──▶ Buffer ──▶ evaluate ──▶ ActuatorBank
//!                                                      │
//!                                   NotificationLog ◀──┴──▶ CommandDispatcher
//! ```
//!
//! Every reading is processed to completion before the next.  None of the
//! errors returned here stop later readings from being processed.

use log::{info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::app::ports::CommandChannel;
use crate::config::{ControlConfig, EngineOptions};
use crate::dispatch::{ActuatorCommand, CommandDispatcher, CommandFailure};
use crate::error::Error;
use crate::fsm::actuators::build_actuator_table;
use crate::fsm::{ActuatorBank, ActuatorId, ActuatorRecord, ActuatorState, Transitions};
use crate::notify::{Category, Notification, NotificationLog, Severity};
use crate::reading::buffer::{ReadingBuffer, Window};
use crate::reading::dedup::Deduplicator;
use crate::reading::{MalformedFields, Reading};
use crate::threshold::{self, ConditionFlags};

/// Reason given when the source delivers an empty snapshot.
pub const NO_DATA: &str = "No data available";

/// Health of the inbound reading source as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Nothing delivered yet.
    Connecting,
    Connected,
    /// Deliveries stopped arriving for longer than the source timeout.
    Stale,
    /// The last delivery attempt failed.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceState {
    Connecting,
    Connected,
    Failed,
}

/// Counters since engine creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    pub readings_accepted: u64,
    pub duplicates_dropped: u64,
    pub malformed_fields: u64,
    pub source_errors: u64,
    pub transitions: u64,
    /// Notifications written since start, including evicted ones.
    pub notifications: u64,
    pub commands_sent: u64,
    pub commands_failed: u64,
}

/// Commands that failed while processing one reading.
pub type Failures = heapless::Vec<CommandFailure, { ActuatorId::COUNT }>;

/// Everything that happened while processing one accepted reading.
#[derive(Debug, Clone)]
pub struct Ingest {
    pub reading: Reading,
    pub flags: ConditionFlags,
    pub transitions: Transitions,
    pub malformed: MalformedFields,
    pub failures: Failures,
}

pub struct ControlEngine {
    dedup: Deduplicator,
    buffer: ReadingBuffer,
    flags: ConditionFlags,
    bank: ActuatorBank,
    dispatcher: CommandDispatcher,
    log: NotificationLog,
    source: SourceState,
    last_delivery_ms: Option<u64>,
    source_timeout_ms: u64,
    readings_accepted: u64,
    duplicates_dropped: u64,
    malformed_fields: u64,
    source_errors: u64,
}

impl ControlEngine {
    /// All actuators start `Idle`; the nutrition interval starts at `now_ms`.
    pub fn new(options: &EngineOptions, now_ms: u64) -> Self {
        info!(
            "ENGINE: created (buffer={}, log={})",
            options.buffer_capacity, options.log_capacity
        );
        Self {
            dedup: Deduplicator::new(),
            buffer: ReadingBuffer::new(options.buffer_capacity),
            flags: ConditionFlags::default(),
            bank: ActuatorBank::new(build_actuator_table(), now_ms),
            dispatcher: CommandDispatcher::new(),
            log: NotificationLog::new(options.log_capacity),
            source: SourceState::Connecting,
            last_delivery_ms: None,
            source_timeout_ms: options.source_timeout_ms,
            readings_accepted: 0,
            duplicates_dropped: 0,
            malformed_fields: 0,
            source_errors: 0,
        }
    }

    // ── Ingest ────────────────────────────────────────────────

    /// Process one raw delivery to completion.
    ///
    /// A `null` payload is a source failure.  A repeat of the last accepted
    /// payload is [`Error::DuplicateReading`].  Anything else is buffered and
    /// evaluated; with auto control enabled the actuators advance and
    /// commands go out on `channel`.
    pub fn process(
        &mut self,
        raw: &Value,
        config: &ControlConfig,
        now_ms: u64,
        channel: &mut impl CommandChannel,
    ) -> Result<Ingest, Error> {
        if raw.is_null() {
            self.source_error(NO_DATA, now_ms);
            return Err(Error::SourceUnavailable(NO_DATA));
        }

        self.last_delivery_ms = Some(now_ms);
        self.source = SourceState::Connected;

        let normalized = match self.dedup.accept(raw, now_ms) {
            Ok(n) => n,
            Err(e) => {
                self.duplicates_dropped += 1;
                return Err(e);
            }
        };
        for field in &normalized.malformed {
            warn!("ENGINE: {}", Error::MalformedReading(*field));
        }
        self.malformed_fields += normalized.malformed.len() as u64;

        let reading = normalized.reading;
        self.buffer.push(reading);
        self.readings_accepted += 1;

        let flags = threshold::evaluate(&reading, config);
        self.flags = flags;

        let mut ingest = Ingest {
            reading,
            flags,
            transitions: Transitions::new(),
            malformed: normalized.malformed,
            failures: Failures::new(),
        };
        if !config.auto_control_enabled {
            return Ok(ingest);
        }

        ingest.transitions = self.bank.step(&reading, flags, config, now_ms);
        for t in &ingest.transitions {
            self.log
                .append(t.actuator.category(), t.severity(), t.message(), now_ms);
            if !t.switches_relay() {
                continue;
            }
            let command = ActuatorCommand::new(t.actuator, t.to.relay_on());
            if let Err(error) = self.dispatcher.send(channel, command) {
                let failure = CommandFailure { command, error };
                self.log_transport_failure(failure, now_ms);
                let _ = ingest.failures.push(failure);
            }
        }
        Ok(ingest)
    }

    // ── Manual control ────────────────────────────────────────

    /// Set an actuator's advisory override and send the command.  The
    /// automatic machines are not touched.
    pub fn manual_override(
        &mut self,
        actuator: ActuatorId,
        on: bool,
        now_ms: u64,
        channel: &mut impl CommandChannel,
    ) -> Result<(), Error> {
        let result = self.dispatcher.manual_override(channel, actuator, on);
        self.finish_override(actuator, on, result, now_ms)
    }

    /// Flip an actuator's override.  Returns the value that was sent.
    pub fn toggle_override(
        &mut self,
        actuator: ActuatorId,
        now_ms: u64,
        channel: &mut impl CommandChannel,
    ) -> Result<bool, Error> {
        let (on, result) = self.dispatcher.toggle(channel, actuator);
        self.finish_override(actuator, on, result, now_ms)?;
        Ok(on)
    }

    fn finish_override(
        &mut self,
        actuator: ActuatorId,
        on: bool,
        result: Result<(), crate::error::TransportError>,
        now_ms: u64,
    ) -> Result<(), Error> {
        if let Err(error) = result {
            self.log_transport_failure(
                CommandFailure {
                    command: ActuatorCommand::new(actuator, on),
                    error,
                },
                now_ms,
            );
            return Err(Error::Transport(error));
        }
        let (message, severity) = override_message(actuator, on);
        self.log.append(actuator.category(), severity, message, now_ms);
        Ok(())
    }

    // ── Failures & source health ──────────────────────────────

    /// Record a failure reported after the channel accepted the command.
    /// The actuator state is left as it is.
    pub fn record_transport_failure(&mut self, failure: CommandFailure, now_ms: u64) {
        self.dispatcher.note_failure();
        self.log_transport_failure(failure, now_ms);
    }

    fn log_transport_failure(&mut self, failure: CommandFailure, now_ms: u64) {
        let CommandFailure { command, error } = failure;
        let message = format!(
            "Failed to switch {} {}: {}",
            command.actuator.label(),
            if command.on { "on" } else { "off" },
            error
        );
        warn!("ENGINE: {}", message);
        self.log
            .append(Category::Error, Severity::Error, message, now_ms);
    }

    /// The source failed to deliver.  Status reads `Error` until the next
    /// delivery.
    pub fn source_error(&mut self, reason: &str, now_ms: u64) {
        warn!("ENGINE: source error: {}", reason);
        self.source = SourceState::Failed;
        self.source_errors += 1;
        self.log.append(
            Category::Error,
            Severity::Error,
            format!("Error fetching data: {reason}"),
            now_ms,
        );
    }

    /// The source (re)connected.  The next payload is accepted even if it
    /// repeats the last one.
    pub fn source_connected(&mut self, now_ms: u64) {
        info!("ENGINE: source connected");
        self.source = SourceState::Connected;
        self.last_delivery_ms = Some(now_ms);
        self.dedup.reset();
        self.log.append(
            Category::Info,
            Severity::Info,
            "Connected to sensor source",
            now_ms,
        );
    }

    pub fn connection_status(&self, now_ms: u64) -> ConnectionStatus {
        match (self.source, self.last_delivery_ms) {
            (SourceState::Failed, _) => ConnectionStatus::Error,
            (SourceState::Connecting, _) | (SourceState::Connected, None) => {
                ConnectionStatus::Connecting
            }
            (SourceState::Connected, Some(at)) => {
                if now_ms.saturating_sub(at) >= self.source_timeout_ms {
                    ConnectionStatus::Stale
                } else {
                    ConnectionStatus::Connected
                }
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn latest_reading(&self) -> Option<&Reading> {
        self.buffer.latest()
    }

    pub fn window(&self, n: usize) -> Window<'_> {
        self.buffer.window(n)
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Flags computed for the latest accepted reading.
    pub fn flags(&self) -> ConditionFlags {
        self.flags
    }

    pub fn actuator_state(&self, id: ActuatorId) -> ActuatorState {
        self.bank.state(id)
    }

    pub fn actuator_states(&self) -> [(ActuatorId, ActuatorState); ActuatorId::COUNT] {
        ActuatorId::ALL.map(|id| (id, self.bank.state(id)))
    }

    pub fn actuator_record(&self, id: ActuatorId) -> ActuatorRecord {
        self.bank.record(id)
    }

    pub fn override_for(&self, id: ActuatorId) -> bool {
        self.dispatcher.override_for(id)
    }

    /// Up to `n` notifications, newest first.
    pub fn recent_notifications(&self, n: usize) -> impl Iterator<Item = &Notification> {
        self.log.recent(n)
    }

    pub fn notification_count(&self) -> usize {
        self.log.len()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            readings_accepted: self.readings_accepted,
            duplicates_dropped: self.duplicates_dropped,
            malformed_fields: self.malformed_fields,
            source_errors: self.source_errors,
            transitions: self.bank.transition_count(),
            notifications: self.log.total_appended(),
            commands_sent: self.dispatcher.sent(),
            commands_failed: self.dispatcher.failed(),
        }
    }
}

fn override_message(actuator: ActuatorId, on: bool) -> (String, Severity) {
    match (actuator, on) {
        (ActuatorId::OverflowValve, true) => ("Overflow valve OPENED".into(), Severity::Warning),
        (ActuatorId::OverflowValve, false) => ("Overflow valve CLOSED".into(), Severity::Info),
        (id, on) => (
            format!(
                "Manual override: {} {}",
                id.label(),
                if on { "ON" } else { "OFF" }
            ),
            Severity::Info,
        ),
    }
}
