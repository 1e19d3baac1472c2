//! Duplicate-delivery filter.
//!
//! The source may resend the same snapshot without changing anything, so
//! identity is the structural content of the raw payload, taken before the
//! capture timestamp is attached.  Only the last *accepted* payload is
//! remembered; a replay of an older payload is accepted again.

use log::debug;
use serde_json::Value;

use super::{MalformedFields, Reading};
use crate::error::Error;

/// A freshly accepted reading together with its normalization report.
#[derive(Debug, Clone)]
pub struct NormalizedReading {
    pub reading: Reading,
    pub malformed: MalformedFields,
}

/// Filters a stream of raw payloads against the last accepted one.
#[derive(Debug, Default)]
pub struct Deduplicator {
    last_fingerprint: Option<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `raw` unless it is structurally identical to the last accepted
    /// payload, in which case [`Error::DuplicateReading`] is returned and the
    /// stored fingerprint is left untouched.
    pub fn accept(&mut self, raw: &Value, captured_at_ms: u64) -> Result<NormalizedReading, Error> {
        let fingerprint = fingerprint(raw);
        if self.last_fingerprint.as_deref() == Some(fingerprint.as_str()) {
            debug!("dedup: payload unchanged, skipping");
            return Err(Error::DuplicateReading);
        }

        let (reading, malformed) = Reading::from_payload(raw, captured_at_ms);
        self.last_fingerprint = Some(fingerprint);
        Ok(NormalizedReading { reading, malformed })
    }

    /// Forget the last fingerprint so the next payload is always accepted.
    pub fn reset(&mut self) {
        self.last_fingerprint = None;
    }
}

/// Stable serialization of a payload.  `serde_json` objects are sorted maps,
/// so key order in the source document does not affect the fingerprint.
fn fingerprint(raw: &Value) -> String {
    raw.to_string()
}
