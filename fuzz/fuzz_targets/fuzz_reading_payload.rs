//! Fuzz target: `Reading::from_payload`
//!
//! Parses arbitrary bytes as JSON and, when that succeeds, normalizes the
//! document.  Normalization must never panic and every quantity it produces
//! must be finite.
//!
//! cargo fuzz run fuzz_reading_payload

#![no_main]

use hydroctl::reading::Reading;
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = serde_json::from_slice::<Value>(data) else {
        return;
    };
    let (reading, malformed) = Reading::from_payload(&raw, 0);

    for v in [
        reading.air_temp_c,
        reading.humidity_pct,
        reading.water_temp_c,
        reading.ph,
        reading.water_level_pct,
    ] {
        assert!(v.is_finite(), "normalized value must be finite");
    }
    assert!(malformed.len() <= hydroctl::reading::FIELD_COUNT);
});
