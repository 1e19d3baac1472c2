//! Mock adapters for integration tests.
//!
//! Records every outbound command and every emitted event so tests can
//! assert on the full history without a real transport.

use hydroctl::app::events::AppEvent;
use hydroctl::app::ports::{CommandChannel, TransportError};
use hydroctl::dispatch::ActuatorCommand;
use hydroctl::dispatch::queue::AsyncCommandTransport;
use hydroctl::fsm::ActuatorId;

// ── MockChannel ───────────────────────────────────────────────

#[derive(Default)]
pub struct MockChannel {
    pub sent: Vec<ActuatorCommand>,
    /// When set, every send fails with this error.
    pub fail_with: Option<TransportError>,
}

#[allow(dead_code)]
impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: TransportError) -> Self {
        Self {
            sent: Vec::new(),
            fail_with: Some(error),
        }
    }

    /// Last value sent for `id`, if any.
    pub fn last_value(&self, id: ActuatorId) -> Option<u8> {
        self.sent
            .iter()
            .rev()
            .find(|c| c.actuator == id)
            .map(ActuatorCommand::value)
    }
}

impl CommandChannel for MockChannel {
    fn send(&mut self, command: &ActuatorCommand) -> Result<(), TransportError> {
        match self.fail_with {
            Some(e) => Err(e),
            None => {
                self.sent.push(*command);
                Ok(())
            }
        }
    }
}

impl AsyncCommandTransport for MockChannel {
    async fn send(&mut self, command: &ActuatorCommand) -> Result<(), TransportError> {
        CommandChannel::send(self, command)
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl hydroctl::app::ports::EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
