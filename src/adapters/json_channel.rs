//! JSON-lines command transport.
//!
//! Writes each outbound command as `{"actuator":"…","value":0|1}` followed
//! by a newline.  Usable directly as a synchronous [`CommandChannel`] or
//! behind the command queue as an [`AsyncCommandTransport`].

use std::io::Write;

use crate::app::ports::{CommandChannel, TransportError};
use crate::dispatch::ActuatorCommand;
use crate::dispatch::queue::AsyncCommandTransport;

pub struct JsonLinesChannel<W> {
    out: W,
    written: u64,
}

impl<W: Write> JsonLinesChannel<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_command(&mut self, command: &ActuatorCommand) -> Result<(), TransportError> {
        serde_json::to_writer(&mut self.out, command).map_err(|_| TransportError::Io)?;
        self.out
            .write_all(b"\n")
            .and_then(|()| self.out.flush())
            .map_err(|_| TransportError::Io)?;
        self.written += 1;
        Ok(())
    }
}

impl<W: Write> CommandChannel for JsonLinesChannel<W> {
    fn send(&mut self, command: &ActuatorCommand) -> Result<(), TransportError> {
        self.write_command(command)
    }
}

impl<W: Write> AsyncCommandTransport for JsonLinesChannel<W> {
    async fn send(&mut self, command: &ActuatorCommand) -> Result<(), TransportError> {
        self.write_command(command)
    }
}
