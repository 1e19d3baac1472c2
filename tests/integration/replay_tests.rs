//! Integration tests: recorded deliveries through `AppService::poll`.

use hydroctl::adapters::json_channel::JsonLinesChannel;
use hydroctl::adapters::replay_source::ReplaySource;
use hydroctl::adapters::time::ManualClock;
use hydroctl::app::service::{AppService, Delivery};
use hydroctl::config::Settings;
use hydroctl::engine::ConnectionStatus;
use hydroctl::error::Error;

use crate::mock_ports::RecordingSink;

const RECORDING: &str = r#"
{"WaterLevelPercent": 20, "PH": {"Value": 6.0}}
{"WaterLevelPercent": 20, "PH": {"Value": 6.0}}
{"WaterLevelPercent": 92, "PH": {"Value": 7.0}}
garbage
{"WaterLevelPercent": 60, "PH": {"Value": 6.2}}
"#;

#[test]
fn replay_drives_commands_onto_json_lines() {
    let clock = ManualClock::new(0);
    let mut app = AppService::new(Settings::default(), clock.clone()).unwrap();
    let mut sink = RecordingSink::new();
    let mut source = ReplaySource::new(RECORDING.as_bytes());
    let mut out = JsonLinesChannel::new(Vec::new());

    let mut outcomes = Vec::new();
    loop {
        match app.poll(&mut source, &mut out, &mut sink) {
            Ok(Delivery::Exhausted) => break,
            other => outcomes.push(other),
        }
        clock.advance(3_000);
    }

    assert_eq!(outcomes.len(), 5);
    assert!(matches!(outcomes[1], Err(Error::DuplicateReading)));
    assert!(matches!(outcomes[3], Err(Error::SourceUnavailable(_))));
    assert_eq!(app.connection_status(), ConnectionStatus::Connected);

    let text = String::from_utf8(out.into_inner()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            r#"{"actuator":"water_intake","value":1}"#,
            r#"{"actuator":"water_intake","value":0}"#,
            r#"{"actuator":"overflow_valve","value":1}"#,
            r#"{"actuator":"ph_down_pump","value":1}"#,
            r#"{"actuator":"overflow_valve","value":0}"#,
            r#"{"actuator":"ph_down_pump","value":0}"#,
        ]
    );
    let stats = app.stats();
    assert_eq!(stats.readings_accepted, 3);
    assert_eq!(stats.duplicates_dropped, 1);
    assert_eq!(stats.source_errors, 1);
}
