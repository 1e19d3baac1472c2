//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  Everything runs on the host with a manual clock.

mod app_service_tests;
mod mock_ports;
mod queue_tests;
mod replay_tests;
