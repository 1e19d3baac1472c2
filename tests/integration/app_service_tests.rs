//! Integration tests for the AppService → engine → dispatcher pipeline.

use hydroctl::adapters::time::ManualClock;
use hydroctl::app::commands::AppCommand;
use hydroctl::app::events::AppEvent;
use hydroctl::app::ports::TransportError;
use hydroctl::app::service::{AppService, Delivery};
use hydroctl::config::{ControlConfig, Settings};
use hydroctl::engine::ConnectionStatus;
use hydroctl::error::Error;
use hydroctl::fsm::{ActuatorId, ActuatorState};
use hydroctl::notify::{Category, Severity};
use serde_json::{Value, json};

use crate::mock_ports::{MockChannel, RecordingSink};

fn make_app() -> (AppService<ManualClock>, ManualClock, MockChannel, RecordingSink) {
    let clock = ManualClock::new(0);
    let mut app = AppService::new(Settings::default(), clock.clone()).unwrap();
    let mut sink = RecordingSink::new();
    app.start(&mut sink);
    (app, clock, MockChannel::new(), sink)
}

fn payload(level: f32, ph: f32) -> Value {
    json!({ "WaterLevelPercent": level, "PH": { "Value": ph } })
}

// ── Manual overrides ──────────────────────────────────────────

#[test]
fn manual_override_sends_without_moving_machines() {
    let (mut app, _clock, mut ch, mut sink) = make_app();
    app.handle_command(
        AppCommand::ManualOverride {
            actuator: ActuatorId::WaterIntake,
            on: true,
        },
        &mut ch,
        &mut sink,
    )
    .unwrap();

    assert_eq!(ch.last_value(ActuatorId::WaterIntake), Some(1));
    let states = app.actuator_states();
    assert!(states.iter().all(|(_, s)| *s == ActuatorState::Idle));
    let n = &app.recent_notifications(1)[0];
    assert_eq!(n.message, "Manual override: water intake pump ON");
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::OverrideApplied { .. })),
        1
    );
}

#[test]
fn overflow_toggle_opens_then_closes() {
    let (mut app, _clock, mut ch, mut sink) = make_app();
    let toggle = || AppCommand::ToggleOverride(ActuatorId::OverflowValve);
    app.handle_command(toggle(), &mut ch, &mut sink).unwrap();
    app.handle_command(toggle(), &mut ch, &mut sink).unwrap();

    let values: Vec<u8> = ch.sent.iter().map(|c| c.value()).collect();
    assert_eq!(values, vec![1, 0]);
    let log = app.recent_notifications(2);
    assert_eq!(log[0].message, "Overflow valve CLOSED");
    assert_eq!(log[1].message, "Overflow valve OPENED");
    assert_eq!(log[1].severity, Severity::Warning);
}

#[test]
fn failed_override_reports_transport_error() {
    let (mut app, _clock, _, mut sink) = make_app();
    let mut ch = MockChannel::failing(TransportError::Rejected);
    let err = app
        .handle_command(
            AppCommand::ManualOverride {
                actuator: ActuatorId::NutritionPump,
                on: true,
            },
            &mut ch,
            &mut sink,
        )
        .unwrap_err();
    assert_eq!(err, Error::Transport(TransportError::Rejected));
    assert_eq!(sink.count(|e| matches!(e, AppEvent::CommandFailed(_))), 1);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::OverrideApplied { .. })),
        0
    );
    assert_eq!(app.stats().commands_failed, 1);
    assert_eq!(app.recent_notifications(1)[0].severity, Severity::Error);
}

// ── Configuration ─────────────────────────────────────────────

#[test]
fn rejected_config_keeps_previous() {
    let (mut app, _clock, mut ch, mut sink) = make_app();
    let bad = ControlConfig {
        water_level_min: 95.0,
        ..ControlConfig::default()
    };
    let err = app
        .handle_command(AppCommand::UpdateConfig(bad), &mut ch, &mut sink)
        .unwrap_err();
    assert!(matches!(err, Error::ConfigurationInvalid(_)));
    assert_eq!(app.config(), ControlConfig::default());
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ConfigRejected(_))), 1);
}

#[test]
fn config_update_applies_on_next_reading() {
    let (mut app, clock, mut ch, mut sink) = make_app();
    app.ingest(&payload(35.0, 6.0), &mut ch, &mut sink).unwrap();
    assert_eq!(
        app.actuator_states()[ActuatorId::WaterIntake as usize].1,
        ActuatorState::Idle
    );

    let cfg = ControlConfig {
        water_level_min: 40.0,
        ..app.config()
    };
    app.handle_command(AppCommand::UpdateConfig(cfg), &mut ch, &mut sink)
        .unwrap();
    clock.advance(3_000);
    app.ingest(&payload(36.0, 6.0), &mut ch, &mut sink).unwrap();
    assert_eq!(
        app.actuator_states()[ActuatorId::WaterIntake as usize].1,
        ActuatorState::Active
    );
}

// ── Source health ─────────────────────────────────────────────

#[test]
fn empty_snapshot_marks_source_error_until_next_delivery() {
    let (mut app, clock, mut ch, mut sink) = make_app();
    assert_eq!(app.connection_status(), ConnectionStatus::Connecting);

    let err = app.ingest(&Value::Null, &mut ch, &mut sink).unwrap_err();
    assert!(matches!(err, Error::SourceUnavailable(_)));
    assert_eq!(app.connection_status(), ConnectionStatus::Error);
    assert_eq!(app.recent_notifications(1)[0].category, Category::Error);

    clock.advance(3_000);
    app.ingest(&payload(60.0, 6.0), &mut ch, &mut sink).unwrap();
    assert_eq!(app.connection_status(), ConnectionStatus::Connected);

    clock.advance(29_999);
    assert_eq!(app.tick(&mut sink), ConnectionStatus::Connected);
    clock.advance(1);
    assert_eq!(app.connection_status(), ConnectionStatus::Stale);
    assert_eq!(app.tick(&mut sink), ConnectionStatus::Stale);
    app.tick(&mut sink);

    let changes: Vec<ConnectionStatus> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::StatusChanged(s) => Some(*s),
            _ => None,
        })
        .collect();
    assert_eq!(
        changes,
        vec![
            ConnectionStatus::Error,
            ConnectionStatus::Connected,
            ConnectionStatus::Stale
        ]
    );
}

// ── Lifecycle ─────────────────────────────────────────────────

#[test]
fn shutdown_returns_final_telemetry() {
    let (mut app, clock, mut ch, mut sink) = make_app();
    app.ingest(&payload(20.0, 6.0), &mut ch, &mut sink).unwrap();
    clock.advance(3_000);
    let telemetry = app.shutdown(&mut sink);

    assert_eq!(telemetry.at_ms, 3_000);
    assert_eq!(telemetry.stats.readings_accepted, 1);
    assert!(telemetry.actuators[ActuatorId::WaterIntake as usize].relay_on);
    assert!(matches!(sink.events.first(), Some(AppEvent::Started { at_ms: 0 })));
    assert!(matches!(sink.events.last(), Some(AppEvent::Stopped { at_ms: 3_000 })));
}

#[test]
fn paused_service_ignores_deliveries() {
    let (mut app, _clock, mut ch, mut sink) = make_app();
    app.handle_command(AppCommand::PauseMonitoring, &mut ch, &mut sink)
        .unwrap();
    assert!(!app.is_monitoring());
    let d = app.ingest(&payload(10.0, 4.0), &mut ch, &mut sink).unwrap();
    assert!(matches!(d, Delivery::Skipped));
    assert!(ch.sent.is_empty());
    assert_eq!(app.stats().readings_accepted, 0);
}
