//! Application core: pure domain logic, zero I/O.
//!
//! This module wires the control engine to the outside world: inbound
//! commands, outbound events, and the **port traits** defined in [`ports`].
//! Every interaction with a source, transport or file goes through those
//! traits, keeping this layer fully testable with mock adapters.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
