//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the control configuration, the engine options and
//! the [`ControlEngine`].  It exposes a hardware-agnostic API: deliveries,
//! commands and queries go in, events and outbound commands come out through
//! port traits injected at call sites, so the whole service is testable with
//! mock adapters.
//!
//! ```text
//!  ReadingSource ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                    │       AppService        │
//!         Clock  ──▶ │  Config · ControlEngine │ ──▶ CommandChannel
//!                    └────────────────────────┘
//! ```

use log::{info, warn};
use serde_json::Value;

use crate::config::{ControlConfig, EngineOptions, Settings};
use crate::dispatch::queue::CommandQueue;
use crate::dispatch::{ActuatorCommand, CommandFailure};
use crate::engine::{ConnectionStatus, ControlEngine, EngineStats, Ingest};
use crate::error::{ConfigError, Error};
use crate::fsm::{ActuatorId, ActuatorState};
use crate::notify::Notification;
use crate::reading::Reading;

use super::commands::AppCommand;
use super::events::{ActuatorTelemetry, AppEvent, Telemetry};
use super::ports::{Clock, CommandChannel, EventSink, ReadingSource, SourcePoll};

/// What became of one delivery.
#[derive(Debug, Clone)]
pub enum Delivery {
    /// The engine accepted and processed a reading.
    Processed(Box<Ingest>),
    /// Monitoring is paused; the delivery was dropped unseen.
    Skipped,
    /// The source has nothing more to deliver.
    Exhausted,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService<C: Clock> {
    clock: C,
    config: ControlConfig,
    options: EngineOptions,
    engine: ControlEngine,
    monitoring: bool,
    /// Deliveries handed to the engine.
    cycles: u64,
    last_status: ConnectionStatus,
}

impl<C: Clock> AppService<C> {
    /// Validate `settings` and create the engine.  The nutrition interval
    /// starts now.
    pub fn new(settings: Settings, clock: C) -> Result<Self, Error> {
        settings.validate()?;
        let Settings { control, engine } = settings;
        let now = clock.now_ms();
        let core = ControlEngine::new(&engine, now);
        let last_status = core.connection_status(now);
        Ok(Self {
            clock,
            config: control,
            options: engine,
            engine: core,
            monitoring: true,
            cycles: 0,
            last_status,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        let at_ms = self.clock.now_ms();
        sink.emit(&AppEvent::Started { at_ms });
        info!("AppService started at {} ms", at_ms);
    }

    /// Stop the service and hand back the final snapshot.
    pub fn shutdown(self, sink: &mut impl EventSink) -> Telemetry {
        let telemetry = self.build_telemetry();
        sink.emit(&AppEvent::Stopped {
            at_ms: telemetry.at_ms,
        });
        info!(
            "AppService stopped after {} cycles ({} readings accepted)",
            self.cycles, telemetry.stats.readings_accepted
        );
        telemetry
    }

    // ── Deliveries ────────────────────────────────────────────

    /// Hand one raw payload to the engine.
    pub fn ingest(
        &mut self,
        raw: &Value,
        channel: &mut impl CommandChannel,
        sink: &mut impl EventSink,
    ) -> Result<Delivery, Error> {
        if !self.monitoring {
            return Ok(Delivery::Skipped);
        }
        self.cycles += 1;
        let now = self.clock.now_ms();
        let result = self.engine.process(raw, &self.config, now, channel);
        self.publish_status(sink);

        let ingest = result?;
        sink.emit(&AppEvent::ReadingAccepted {
            reading: ingest.reading,
            flags: ingest.flags,
        });
        for t in &ingest.transitions {
            sink.emit(&AppEvent::ActuatorChanged(*t));
        }
        for f in &ingest.failures {
            sink.emit(&AppEvent::CommandFailed(*f));
        }
        Ok(Delivery::Processed(Box::new(ingest)))
    }

    /// Pull the next delivery from `source` and process it.
    pub fn poll(
        &mut self,
        source: &mut impl ReadingSource,
        channel: &mut impl CommandChannel,
        sink: &mut impl EventSink,
    ) -> Result<Delivery, Error> {
        match source.poll() {
            SourcePoll::Payload(raw) => self.ingest(&raw, channel, sink),
            SourcePoll::Failed(reason) => {
                if !self.monitoring {
                    return Ok(Delivery::Skipped);
                }
                self.report_source_error(reason, sink);
                Err(Error::SourceUnavailable(reason))
            }
            SourcePoll::Exhausted => Ok(Delivery::Exhausted),
        }
    }

    /// The source failed outside of a delivery (e.g. a fetch timed out).
    pub fn report_source_error(&mut self, reason: &str, sink: &mut impl EventSink) {
        let now = self.clock.now_ms();
        self.engine.source_error(reason, now);
        self.publish_status(sink);
    }

    pub fn source_connected(&mut self, sink: &mut impl EventSink) {
        let now = self.clock.now_ms();
        self.engine.source_connected(now);
        self.publish_status(sink);
    }

    /// Re-check the link against the clock.  Call between deliveries so a
    /// silent source is reported as `Stale` without waiting for a query.
    pub fn tick(&mut self, sink: &mut impl EventSink) -> ConnectionStatus {
        self.publish_status(sink);
        self.last_status
    }

    /// Fold failures reported by the asynchronous forwarder into the log.
    /// Returns how many were absorbed.
    pub fn absorb_transport_failures(
        &mut self,
        queue: &CommandQueue,
        sink: &mut impl EventSink,
    ) -> usize {
        let now = self.clock.now_ms();
        let mut absorbed = 0;
        while let Some(failure) = queue.try_take_failure() {
            self.engine.record_transport_failure(failure, now);
            sink.emit(&AppEvent::CommandFailed(failure));
            absorbed += 1;
        }
        absorbed
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        channel: &mut impl CommandChannel,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        let now = self.clock.now_ms();
        match cmd {
            AppCommand::UpdateConfig(new_config) => {
                if let Err(e) = new_config.validate() {
                    warn!("Configuration update rejected: {}", e);
                    let reason = match e {
                        ConfigError::ValidationFailed(msg) => msg,
                        _ => "invalid configuration",
                    };
                    sink.emit(&AppEvent::ConfigRejected(reason));
                    return Err(Error::ConfigurationInvalid(reason));
                }
                self.config = new_config;
                sink.emit(&AppEvent::ConfigUpdated);
                info!("Configuration updated at runtime");
            }
            AppCommand::ManualOverride { actuator, on } => {
                let result = self.engine.manual_override(actuator, on, now, channel);
                self.emit_override(actuator, on, result, sink)?;
            }
            AppCommand::ToggleOverride(actuator) => {
                let on = !self.engine.override_for(actuator);
                let result = self.engine.toggle_override(actuator, now, channel).map(|_| ());
                self.emit_override(actuator, on, result, sink)?;
            }
            AppCommand::PauseMonitoring => {
                if self.monitoring {
                    self.monitoring = false;
                    sink.emit(&AppEvent::MonitoringPaused);
                    info!("Monitoring paused");
                }
            }
            AppCommand::ResumeMonitoring => {
                if !self.monitoring {
                    self.monitoring = true;
                    sink.emit(&AppEvent::MonitoringResumed);
                    info!("Monitoring resumed");
                }
            }
        }
        Ok(())
    }

    fn emit_override(
        &self,
        actuator: ActuatorId,
        on: bool,
        result: Result<(), Error>,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        match result {
            Ok(()) => sink.emit(&AppEvent::OverrideApplied { actuator, on }),
            Err(Error::Transport(error)) => sink.emit(&AppEvent::CommandFailed(CommandFailure {
                command: ActuatorCommand::new(actuator, on),
                error,
            })),
            Err(_) => {}
        }
        result
    }

    fn publish_status(&mut self, sink: &mut impl EventSink) {
        let status = self.engine.connection_status(self.clock.now_ms());
        if status != self.last_status {
            self.last_status = status;
            sink.emit(&AppEvent::StatusChanged(status));
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn latest_reading(&self) -> Option<Reading> {
        self.engine.latest_reading().copied()
    }

    /// The last `n` readings, oldest first.
    pub fn window(&self, n: usize) -> Vec<Reading> {
        self.engine.window(n).copied().collect()
    }

    pub fn actuator_states(&self) -> [(ActuatorId, ActuatorState); ActuatorId::COUNT] {
        self.engine.actuator_states()
    }

    /// Up to `n` notifications, newest first.
    pub fn recent_notifications(&self, n: usize) -> Vec<Notification> {
        self.engine.recent_notifications(n).cloned().collect()
    }

    /// The newest notifications surfaced as alerts, or nothing when alerts
    /// are switched off.
    pub fn alerts(&self) -> Vec<Notification> {
        if !self.config.alert_enabled {
            return Vec::new();
        }
        self.recent_notifications(self.options.alert_count)
    }

    /// Clone of the live configuration.
    pub fn config(&self) -> ControlConfig {
        self.config.clone()
    }

    pub fn settings(&self) -> Settings {
        Settings {
            control: self.config.clone(),
            engine: self.options.clone(),
        }
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.engine.connection_status(self.clock.now_ms())
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring
    }

    pub fn stats(&self) -> EngineStats {
        self.engine.stats()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Ladder-logic view of the whole system.
    pub fn build_telemetry(&self) -> Telemetry {
        let at_ms = self.clock.now_ms();
        let actuators = ActuatorId::ALL.map(|id| {
            let rec = self.engine.actuator_record(id);
            ActuatorTelemetry {
                id,
                state: rec.state,
                relay_on: rec.state.relay_on(),
                manual_override: self.engine.override_for(id),
                since_ms: rec.since_ms,
            }
        });
        Telemetry {
            at_ms,
            status: self.engine.connection_status(at_ms),
            monitoring: self.monitoring,
            auto_control: self.config.auto_control_enabled,
            reading: self.latest_reading(),
            flags: self.engine.flags(),
            alarm: self.engine.flags().any(),
            actuators,
            stats: self.engine.stats(),
            cycles: self.cycles,
        }
    }
}
