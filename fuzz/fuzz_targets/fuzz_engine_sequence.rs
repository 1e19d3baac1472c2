//! Fuzz target: `ControlEngine::process`
//!
//! Splits the input into newline-delimited deliveries and feeds each one
//! through the engine on a 3 s clock.  Whatever arrives, the engine must
//! not panic, the stores must stay bounded and the pH pumps must never run
//! together.
//!
//! cargo fuzz run fuzz_engine_sequence

#![no_main]

use hydroctl::app::ports::{CommandChannel, TransportError};
use hydroctl::config::{ControlConfig, EngineOptions};
use hydroctl::dispatch::ActuatorCommand;
use hydroctl::engine::ControlEngine;
use hydroctl::fsm::{ActuatorId, ActuatorState};
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

struct Flaky(u32);

impl CommandChannel for Flaky {
    fn send(&mut self, _command: &ActuatorCommand) -> Result<(), TransportError> {
        self.0 = self.0.wrapping_add(1);
        if self.0 % 3 == 0 {
            Err(TransportError::Io)
        } else {
            Ok(())
        }
    }
}

fuzz_target!(|data: &[u8]| {
    let options = EngineOptions {
        buffer_capacity: 8,
        log_capacity: 8,
        ..EngineOptions::default()
    };
    let config = ControlConfig {
        nutrition_interval_ms: 9_000,
        nutrition_cooldown_ms: 3_000,
        ..ControlConfig::default()
    };
    let mut engine = ControlEngine::new(&options, 0);
    let mut channel = Flaky(0);

    for (i, line) in data.split(|b| *b == b'\n').enumerate() {
        let raw = serde_json::from_slice::<Value>(line).unwrap_or(Value::Null);
        let _ = engine.process(&raw, &config, i as u64 * 3_000, &mut channel);

        assert!(engine.buffered() <= 8);
        assert!(engine.notification_count() <= 8);
        let up = engine.actuator_state(ActuatorId::PhUpPump) == ActuatorState::Active;
        let down = engine.actuator_state(ActuatorId::PhDownPump) == ActuatorState::Active;
        assert!(!(up && down));
    }
});
