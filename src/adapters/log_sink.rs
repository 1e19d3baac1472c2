//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each application event as one
//! `log` record.  The binary routes those records to stderr through
//! `tracing-subscriber`; a dashboard adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { at_ms } => info!("START | at={}ms", at_ms),
            AppEvent::ReadingAccepted { reading, flags } => {
                info!(
                    "READ  | level={:.1}% pH={:.2} | air={:.1}\u{00b0}C water={:.1}\u{00b0}C \
                     hum={:.0}% | low={} high={} ph_low={} ph_high={}",
                    reading.water_level_pct,
                    reading.ph,
                    reading.air_temp_c,
                    reading.water_temp_c,
                    reading.humidity_pct,
                    flags.water_level_low,
                    flags.water_level_high,
                    flags.ph_low,
                    flags.ph_high,
                );
            }
            AppEvent::ActuatorChanged(t) => {
                info!(
                    "ACT   | {} {:?} -> {:?} | {}",
                    t.actuator.key(),
                    t.from,
                    t.to,
                    t.message()
                );
            }
            AppEvent::OverrideApplied { actuator, on } => {
                info!("MAN   | {}={}", actuator.key(), u8::from(*on));
            }
            AppEvent::CommandFailed(f) => {
                warn!(
                    "FAIL  | {}={} | {}",
                    f.command.actuator.key(),
                    f.command.value(),
                    f.error
                );
            }
            AppEvent::StatusChanged(status) => info!("LINK  | {:?}", status),
            AppEvent::ConfigUpdated => info!("CFG   | updated"),
            AppEvent::ConfigRejected(reason) => warn!("CFG   | rejected: {}", reason),
            AppEvent::MonitoringPaused => info!("MON   | paused"),
            AppEvent::MonitoringResumed => info!("MON   | resumed"),
            AppEvent::Telemetry(t) => {
                let relays: String = t
                    .actuators
                    .iter()
                    .map(|a| if a.relay_on { '1' } else { '0' })
                    .collect();
                info!(
                    "TELEM | status={:?} alarm={} | relays={} | accepted={} dup={} | sent={} failed={}",
                    t.status,
                    t.alarm,
                    relays,
                    t.stats.readings_accepted,
                    t.stats.duplicates_dropped,
                    t.stats.commands_sent,
                    t.stats.commands_failed,
                );
            }
            AppEvent::Stopped { at_ms } => info!("STOP  | at={}ms", at_ms),
        }
    }
}
