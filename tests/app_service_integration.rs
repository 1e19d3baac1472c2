//! Integration tests: raw deliveries → AppService → engine → commands + log.

use hydroctl::adapters::time::ManualClock;
use hydroctl::app::commands::AppCommand;
use hydroctl::app::events::AppEvent;
use hydroctl::app::ports::{CommandChannel, EventSink, TransportError};
use hydroctl::app::service::AppService;
use hydroctl::config::{ControlConfig, Settings};
use hydroctl::dispatch::ActuatorCommand;
use hydroctl::fsm::{ActuatorId, ActuatorState};
use hydroctl::notify::{Category, Severity};
use serde_json::{Value, json};

// ── Mock implementations ──────────────────────────────────────

#[derive(Default)]
struct Relays {
    sent: Vec<ActuatorCommand>,
    down: bool,
}

impl CommandChannel for Relays {
    fn send(&mut self, command: &ActuatorCommand) -> Result<(), TransportError> {
        if self.down {
            return Err(TransportError::Disconnected);
        }
        self.sent.push(*command);
        Ok(())
    }
}

#[derive(Default)]
struct Events(Vec<AppEvent>);

impl EventSink for Events {
    fn emit(&mut self, event: &AppEvent) {
        self.0.push(event.clone());
    }
}

fn scenario_settings() -> Settings {
    Settings {
        control: ControlConfig {
            water_level_min: 30.0,
            water_level_max: 90.0,
            ph_min: 5.5,
            ph_max: 6.5,
            ..ControlConfig::default()
        },
        ..Settings::default()
    }
}

fn reading(level: f32, ph: f32) -> Value {
    json!({
        "AirTempC": 23.5,
        "Humidity": 55,
        "WaterTempC": 20.5,
        "PH": { "Value": ph, "Voltage": 2.5 },
        "WaterLevelPercent": level,
    })
}

fn state(app: &AppService<ManualClock>, id: ActuatorId) -> ActuatorState {
    app.actuator_states()[id as usize].1
}

// ── End-to-end scenario ───────────────────────────────────────

#[test]
fn three_reading_scenario() {
    let clock = ManualClock::new(0);
    let mut app = AppService::new(scenario_settings(), clock.clone()).unwrap();
    let mut relays = Relays::default();
    let mut events = Events::default();
    app.start(&mut events);

    app.ingest(&reading(20.0, 6.0), &mut relays, &mut events).unwrap();
    assert_eq!(state(&app, ActuatorId::WaterIntake), ActuatorState::Active);
    assert_eq!(app.recent_notifications(50).len(), 1);

    clock.advance(3_000);
    app.ingest(&reading(25.0, 6.0), &mut relays, &mut events).unwrap();
    assert_eq!(state(&app, ActuatorId::WaterIntake), ActuatorState::Active);
    assert_eq!(app.recent_notifications(50).len(), 1);

    clock.advance(3_000);
    app.ingest(&reading(92.0, 7.0), &mut relays, &mut events).unwrap();
    assert_eq!(state(&app, ActuatorId::WaterIntake), ActuatorState::Idle);
    assert_eq!(state(&app, ActuatorId::OverflowValve), ActuatorState::Active);
    assert_eq!(state(&app, ActuatorId::PhDownPump), ActuatorState::Active);
    assert_eq!(state(&app, ActuatorId::PhUpPump), ActuatorState::Idle);

    let log = app.recent_notifications(50);
    assert_eq!(log.len(), 4);
    let categories: Vec<Category> = log.iter().map(|n| n.category).collect();
    assert_eq!(
        categories,
        vec![
            Category::PhControl,
            Category::Overflow,
            Category::WaterIntake,
            Category::WaterIntake
        ]
    );
    assert!(log.windows(2).all(|w| w[0].id > w[1].id));
    assert_eq!(log[3].severity, Severity::Warning);
    assert_eq!(log[2].severity, Severity::Info);

    let sent: Vec<(ActuatorId, u8)> = relays
        .sent
        .iter()
        .map(|c| (c.actuator, c.value()))
        .collect();
    assert_eq!(
        sent,
        vec![
            (ActuatorId::WaterIntake, 1),
            (ActuatorId::WaterIntake, 0),
            (ActuatorId::OverflowValve, 1),
            (ActuatorId::PhDownPump, 1),
        ]
    );
    let changed = events
        .0
        .iter()
        .filter(|e| matches!(e, AppEvent::ActuatorChanged(_)))
        .count();
    assert_eq!(changed, 4);
}

#[test]
fn water_level_hysteresis_sequence() {
    let clock = ManualClock::new(0);
    let mut app = AppService::new(scenario_settings(), clock.clone()).unwrap();
    let mut relays = Relays::default();
    let mut events = Events::default();

    let expected = [
        (25.0, ActuatorState::Active, ActuatorState::Idle),
        (35.0, ActuatorState::Active, ActuatorState::Idle),
        (89.0, ActuatorState::Active, ActuatorState::Idle),
        (95.0, ActuatorState::Idle, ActuatorState::Active),
        (85.0, ActuatorState::Idle, ActuatorState::Active),
    ];
    for (level, intake, overflow) in expected {
        app.ingest(&reading(level, 6.0), &mut relays, &mut events)
            .unwrap();
        assert_eq!(state(&app, ActuatorId::WaterIntake), intake, "level {level}");
        assert_eq!(state(&app, ActuatorId::OverflowValve), overflow, "level {level}");
        clock.advance(3_000);
    }
}

#[test]
fn disabling_auto_control_freezes_actuators() {
    let clock = ManualClock::new(0);
    let mut app = AppService::new(scenario_settings(), clock.clone()).unwrap();
    let mut relays = Relays::default();
    let mut events = Events::default();

    app.ingest(&reading(20.0, 6.0), &mut relays, &mut events).unwrap();
    let frozen = app.actuator_states();
    let log_len = app.recent_notifications(50).len();

    let cfg = ControlConfig {
        auto_control_enabled: false,
        ..app.config()
    };
    app.handle_command(AppCommand::UpdateConfig(cfg), &mut relays, &mut events)
        .unwrap();

    for (i, (level, ph)) in [(95.0, 7.5), (10.0, 4.0), (99.0, 8.0)].into_iter().enumerate() {
        clock.advance(3_600_000);
        app.ingest(&reading(level, ph), &mut relays, &mut events)
            .unwrap();
        assert_eq!(app.window(100).len(), i + 2);
    }
    assert_eq!(app.actuator_states(), frozen);
    assert_eq!(app.recent_notifications(50).len(), log_len);
    assert_eq!(relays.sent.len(), 1);
    assert!((app.latest_reading().unwrap().water_level_pct - 99.0).abs() < f32::EPSILON);
}

#[test]
fn transport_failure_keeps_state_and_logs_error() {
    let clock = ManualClock::new(0);
    let mut app = AppService::new(scenario_settings(), clock).unwrap();
    let mut relays = Relays {
        down: true,
        ..Default::default()
    };
    let mut events = Events::default();

    app.ingest(&reading(92.0, 6.0), &mut relays, &mut events).unwrap();
    assert_eq!(state(&app, ActuatorId::OverflowValve), ActuatorState::Active);

    let log = app.recent_notifications(2);
    assert_eq!(log[0].category, Category::Error);
    assert_eq!(log[0].severity, Severity::Error);
    assert_eq!(log[1].category, Category::Overflow);

    // Processing continues with the next reading.
    relays.down = false;
    app.ingest(&reading(70.0, 6.0), &mut relays, &mut events).unwrap();
    assert_eq!(state(&app, ActuatorId::OverflowValve), ActuatorState::Idle);
    assert_eq!(relays.sent, vec![ActuatorCommand::new(ActuatorId::OverflowValve, false)]);
}

#[test]
fn nutrition_dose_on_injected_clock() {
    let clock = ManualClock::new(1_000);
    let mut app = AppService::new(scenario_settings(), clock.clone()).unwrap();
    let mut relays = Relays::default();
    let mut events = Events::default();

    clock.advance(3_599_999);
    app.ingest(&reading(60.0, 6.0), &mut relays, &mut events).unwrap();
    assert_eq!(state(&app, ActuatorId::NutritionPump), ActuatorState::Idle);

    clock.advance(1);
    app.ingest(&reading(61.0, 6.0), &mut relays, &mut events).unwrap();
    assert_eq!(state(&app, ActuatorId::NutritionPump), ActuatorState::Dosing);
    assert_eq!(app.recent_notifications(1)[0].message, "Dosing 50ml of nutrients.");

    clock.advance(5_000);
    app.ingest(&reading(62.0, 6.0), &mut relays, &mut events).unwrap();
    assert_eq!(state(&app, ActuatorId::NutritionPump), ActuatorState::Cooldown);
    assert_eq!(
        relays.sent,
        vec![
            ActuatorCommand::new(ActuatorId::NutritionPump, true),
            ActuatorCommand::new(ActuatorId::NutritionPump, false),
        ]
    );
}
