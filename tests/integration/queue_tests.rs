//! Integration tests for the asynchronous command path:
//! engine → CommandQueue → forwarder → transport, and failures back.

use futures_lite::future::block_on;
use hydroctl::adapters::time::ManualClock;
use hydroctl::app::ports::TransportError;
use hydroctl::app::service::AppService;
use hydroctl::config::Settings;
use hydroctl::dispatch::queue::{CommandQueue, forward_commands, forward_pending};
use hydroctl::fsm::{ActuatorId, ActuatorState};
use hydroctl::notify::Category;
use serde_json::json;

use crate::mock_ports::{MockChannel, RecordingSink};

#[test]
fn queued_commands_reach_the_transport() {
    let clock = ManualClock::new(0);
    let mut app = AppService::new(Settings::default(), clock.clone()).unwrap();
    let mut sink = RecordingSink::new();
    let queue = CommandQueue::new();

    app.ingest(
        &json!({ "WaterLevelPercent": 95, "PH": { "Value": 4.9 } }),
        &mut queue.channel(),
        &mut sink,
    )
    .unwrap();
    assert_eq!(queue.pending(), 2);

    let mut transport = MockChannel::new();
    assert_eq!(block_on(forward_pending(&queue, &mut transport)), 2);
    assert_eq!(transport.last_value(ActuatorId::OverflowValve), Some(1));
    assert_eq!(transport.last_value(ActuatorId::PhUpPump), Some(1));
    assert_eq!(app.absorb_transport_failures(&queue, &mut sink), 0);
}

#[test]
fn forwarder_failures_are_absorbed_into_the_log() {
    let clock = ManualClock::new(0);
    let mut app = AppService::new(Settings::default(), clock.clone()).unwrap();
    let mut sink = RecordingSink::new();
    let queue = CommandQueue::new();

    app.ingest(
        &json!({ "WaterLevelPercent": 10, "PH": { "Value": 6.0 } }),
        &mut queue.channel(),
        &mut sink,
    )
    .unwrap();

    let mut transport = MockChannel::failing(TransportError::Disconnected);
    block_on(forward_pending(&queue, &mut transport));
    clock.advance(100);
    assert_eq!(app.absorb_transport_failures(&queue, &mut sink), 1);

    // Optimistic: the machine stays where it moved.
    assert_eq!(
        app.actuator_states()[ActuatorId::WaterIntake as usize].1,
        ActuatorState::Active
    );
    let newest = &app.recent_notifications(1)[0];
    assert_eq!(newest.category, Category::Error);
    assert_eq!(newest.timestamp_ms, 100);
    assert_eq!(app.stats().commands_failed, 1);
    assert_eq!(app.stats().commands_sent, 1);
}

#[test]
fn forwarder_task_runs_on_local_executor() {
    let queue = CommandQueue::new();
    let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();
    executor
        .spawn(forward_commands(&queue, MockChannel::new()))
        .detach();

    let clock = ManualClock::new(0);
    let mut app = AppService::new(Settings::default(), clock).unwrap();
    let mut sink = RecordingSink::new();

    block_on(executor.run(async {
        app.ingest(
            &json!({ "WaterLevelPercent": 5 }),
            &mut queue.channel(),
            &mut sink,
        )
        .unwrap();
        while queue.pending() > 0 {
            futures_lite::future::yield_now().await;
        }
    }));
    assert_eq!(queue.pending(), 0);
    assert!(queue.try_take_failure().is_none());
}
