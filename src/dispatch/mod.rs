//! Command dispatcher.
//!
//! Turns actuator decisions into `(actuator_id, 0|1)` commands on the
//! outbound [`CommandChannel`].  The dispatcher is optimistic: a failed send
//! never rolls the actuator state back, it is only counted and reported.
//!
//! Manual overrides go through the same channel.  The override flag is an
//! advisory per-actuator mirror of the last manual command the channel
//! accepted, and is never read by the automatic machines.

pub mod queue;

use log::{info, warn};
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::app::ports::CommandChannel;
use crate::error::TransportError;
use crate::fsm::ActuatorId;

/// One outbound relay command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorCommand {
    pub actuator: ActuatorId,
    pub on: bool,
}

impl ActuatorCommand {
    pub const fn new(actuator: ActuatorId, on: bool) -> Self {
        Self { actuator, on }
    }

    /// Wire value: `1` energises the relay, `0` releases it.
    pub const fn value(&self) -> u8 {
        self.on as u8
    }
}

/// Wire shape: `{"actuator":"water_intake","value":1}`.
impl Serialize for ActuatorCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ActuatorCommand", 2)?;
        s.serialize_field("actuator", self.actuator.key())?;
        s.serialize_field("value", &self.value())?;
        s.end()
    }
}

/// A command the transport could not deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFailure {
    pub command: ActuatorCommand,
    pub error: TransportError,
}

#[derive(Debug, Default)]
pub struct CommandDispatcher {
    overrides: [bool; ActuatorId::COUNT],
    sent: u64,
    failed: u64,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send one command.  The caller decides what a failure means.
    pub fn send(
        &mut self,
        channel: &mut impl CommandChannel,
        command: ActuatorCommand,
    ) -> Result<(), TransportError> {
        match channel.send(&command) {
            Ok(()) => {
                self.sent += 1;
                Ok(())
            }
            Err(e) => {
                self.failed += 1;
                warn!(
                    "DISPATCH: {}={} failed: {}",
                    command.actuator.key(),
                    command.value(),
                    e
                );
                Err(e)
            }
        }
    }

    /// Send an operator command.  The override flag only moves once the
    /// channel has taken the command, so it always mirrors the last value
    /// that actually went out.
    pub fn manual_override(
        &mut self,
        channel: &mut impl CommandChannel,
        actuator: ActuatorId,
        on: bool,
    ) -> Result<(), TransportError> {
        self.send(channel, ActuatorCommand::new(actuator, on))?;
        self.overrides[actuator as usize] = on;
        info!("DISPATCH: manual override {}={}", actuator.key(), on as u8);
        Ok(())
    }

    /// Send the opposite of the last override that went out.  Returns the
    /// value that was requested.
    pub fn toggle(
        &mut self,
        channel: &mut impl CommandChannel,
        actuator: ActuatorId,
    ) -> (bool, Result<(), TransportError>) {
        let on = !self.overrides[actuator as usize];
        (on, self.manual_override(channel, actuator, on))
    }

    /// Count a failure reported after the channel accepted the command
    /// (e.g. by the asynchronous forwarder).
    pub fn note_failure(&mut self) {
        self.failed += 1;
    }

    pub fn override_for(&self, actuator: ActuatorId) -> bool {
        self.overrides[actuator as usize]
    }

    pub fn overrides(&self) -> [bool; ActuatorId::COUNT] {
        self.overrides
    }

    /// Commands the channel accepted.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }
}
