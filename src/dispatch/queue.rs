//! Asynchronous command forwarding.
//!
//! The engine runs to completion for every reading and never waits on the
//! transport.  Commands are pushed into a bounded `embassy-sync` channel and
//! a separate async task forwards them; failures travel back on a second
//! channel and are absorbed into the notification log on the next tick.
//!
//! ```text
//! ┌──────────────┐ ActuatorCommand ┌──────────────┐  await  ┌───────────┐
//! │    Engine    │────────────────▶│  Forwarder   │────────▶│ Transport │
//! │    (sync)    │◀────────────────│   (async)    │         └───────────┘
//! └──────────────┘ CommandFailure  └──────────────┘
//! ```

use core::future::Future;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use super::{ActuatorCommand, CommandFailure};
use crate::app::ports::CommandChannel;
use crate::error::TransportError;

/// Channel depth for outbound commands.  Five actuators switching on every
/// reading for three readings in a row still fit.
pub const COMMAND_DEPTH: usize = 16;

/// Channel depth for failures reported back to the engine.
pub const FAILURE_DEPTH: usize = 16;

/// Async side of the outbound channel.
pub trait AsyncCommandTransport {
    fn send(
        &mut self,
        command: &ActuatorCommand,
    ) -> impl Future<Output = Result<(), TransportError>>;
}

/// The pair of bounded channels between the engine and the forwarder.
/// Single-threaded: both ends live on the same executor.
pub struct CommandQueue {
    commands: Channel<NoopRawMutex, ActuatorCommand, COMMAND_DEPTH>,
    failures: Channel<NoopRawMutex, CommandFailure, FAILURE_DEPTH>,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandQueue {
    pub const fn new() -> Self {
        Self {
            commands: Channel::new(),
            failures: Channel::new(),
        }
    }

    /// A synchronous [`CommandChannel`] that enqueues into this queue.
    pub fn channel(&self) -> QueuedChannel<'_> {
        QueuedChannel { queue: self }
    }

    /// Next failure reported by the forwarder, if any.
    pub fn try_take_failure(&self) -> Option<CommandFailure> {
        self.failures.try_receive().ok()
    }

    /// Commands waiting to be forwarded.
    pub fn pending(&self) -> usize {
        self.commands.len()
    }

    fn report(&self, failure: CommandFailure) {
        if self.failures.try_send(failure).is_err() {
            warn!(
                "QUEUE: failure channel full, dropping report for {}",
                failure.command.actuator.key()
            );
        }
    }
}

/// Enqueueing end of a [`CommandQueue`].
pub struct QueuedChannel<'a> {
    queue: &'a CommandQueue,
}

impl CommandChannel for QueuedChannel<'_> {
    fn send(&mut self, command: &ActuatorCommand) -> Result<(), TransportError> {
        self.queue
            .commands
            .try_send(*command)
            .map_err(|_| TransportError::QueueFull)
    }
}

async fn forward_one<T: AsyncCommandTransport>(
    queue: &CommandQueue,
    transport: &mut T,
    command: ActuatorCommand,
) {
    if let Err(error) = transport.send(&command).await {
        warn!(
            "QUEUE: forwarding {}={} failed: {}",
            command.actuator.key(),
            command.value(),
            error
        );
        queue.report(CommandFailure { command, error });
    }
}

/// Forward whatever is queued right now, then return the number of
/// commands handled.
pub async fn forward_pending<T: AsyncCommandTransport>(
    queue: &CommandQueue,
    transport: &mut T,
) -> usize {
    let mut handled = 0;
    while let Ok(command) = queue.commands.try_receive() {
        forward_one(queue, transport, command).await;
        handled += 1;
    }
    handled
}

/// Forwarder task body.  Wakes as soon as a command is enqueued; never
/// returns.
pub async fn forward_commands<T: AsyncCommandTransport>(queue: &CommandQueue, mut transport: T) {
    loop {
        let command = queue.commands.receive().await;
        forward_one(queue, &mut transport, command).await;
    }
}
