//! Hydroponic sensor ingestion and threshold control engine.
//!
//! Exposes the pure-logic modules for integration testing and for hosts that
//! embed the engine.  All I/O sits behind the port traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod fsm;
pub mod notify;
pub mod reading;
pub mod threshold;
