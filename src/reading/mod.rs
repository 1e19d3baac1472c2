//! Sensor readings: normalization of raw payloads plus the
//! [`Deduplicator`](dedup::Deduplicator) and [`ReadingBuffer`](buffer::ReadingBuffer).
//!
//! The inbound source delivers a JSON document shaped like:
//!
//! ```text
//! {
//!   "AirTempC": 24.1, "Humidity": 61, "WaterTempC": 21.8,
//!   "PH": { "Value": 6.1, "Voltage": 2.47 },
//!   "WaterLevelPercent": 72,
//!   "EC": 1.9, "DO": 7.2            (optional)
//! }
//! ```
//!
//! Numeric fields may arrive as numbers or numeric strings.  Anything else
//! normalizes to `0.0` and is reported back as a malformed field; a bad
//! payload never aborts processing.

pub mod buffer;
pub mod dedup;

use serde::Serialize;
use serde_json::{Map, Value};

/// Maximum number of distinct numeric fields in a payload.
pub const FIELD_COUNT: usize = 8;

/// Names of malformed fields found while normalizing one payload.
pub type MalformedFields = heapless::Vec<&'static str, FIELD_COUNT>;

/// One accepted, normalized reading.  Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// Engine clock time at which the payload was accepted (ms).
    pub captured_at_ms: u64,
    pub air_temp_c: f32,
    pub humidity_pct: f32,
    pub water_temp_c: f32,
    pub ph: f32,
    pub water_level_pct: f32,
    pub ph_voltage: Option<f32>,
    /// Electrical conductivity (mS/cm), when the probe reports it.
    pub ec: Option<f32>,
    /// Dissolved oxygen (mg/L), when the probe reports it.
    pub dissolved_oxygen: Option<f32>,
}

impl Reading {
    /// A reading with every quantity at zero.  Useful as a test fixture base.
    pub const fn zeroed(captured_at_ms: u64) -> Self {
        Self {
            captured_at_ms,
            air_temp_c: 0.0,
            humidity_pct: 0.0,
            water_temp_c: 0.0,
            ph: 0.0,
            water_level_pct: 0.0,
            ph_voltage: None,
            ec: None,
            dissolved_oxygen: None,
        }
    }

    /// Normalize a raw payload.  Never fails: unparseable numbers become
    /// `0.0` and their field names are returned alongside the reading.
    pub fn from_payload(raw: &Value, captured_at_ms: u64) -> (Self, MalformedFields) {
        let mut malformed = MalformedFields::new();
        let empty = Map::new();
        let obj = raw.as_object().unwrap_or(&empty);
        if !raw.is_object() {
            let _ = malformed.push("payload");
        }

        // "PH" is normally an object, but a bare number is accepted too.
        let ph_obj = obj.get("PH");
        let (ph, ph_voltage) = match ph_obj {
            Some(Value::Object(inner)) => (
                required(inner.get("Value"), "PH.Value", &mut malformed),
                optional(inner.get("Voltage"), "PH.Voltage", &mut malformed),
            ),
            other => (required(other, "PH", &mut malformed), None),
        };

        let reading = Self {
            captured_at_ms,
            air_temp_c: required(obj.get("AirTempC"), "AirTempC", &mut malformed),
            humidity_pct: required(obj.get("Humidity"), "Humidity", &mut malformed),
            water_temp_c: required(obj.get("WaterTempC"), "WaterTempC", &mut malformed),
            ph,
            water_level_pct: required(
                obj.get("WaterLevelPercent"),
                "WaterLevelPercent",
                &mut malformed,
            ),
            ph_voltage,
            ec: optional(obj.get("EC"), "EC", &mut malformed),
            dissolved_oxygen: optional(obj.get("DO"), "DO", &mut malformed),
        };
        (reading, malformed)
    }
}

// ── Field parsing ─────────────────────────────────────────────

enum Parsed {
    Absent,
    Number(f32),
    Malformed,
}

fn parse_number(value: Option<&Value>) -> Parsed {
    let n = match value {
        None | Some(Value::Null) => return Parsed::Absent,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match n.map(|v| v as f32) {
        Some(v) if v.is_finite() => Parsed::Number(v),
        _ => Parsed::Malformed,
    }
}

/// Parse-or-default: absent → 0, malformed → 0 and recorded.
fn required(value: Option<&Value>, field: &'static str, malformed: &mut MalformedFields) -> f32 {
    match parse_number(value) {
        Parsed::Number(v) => v,
        Parsed::Absent => 0.0,
        Parsed::Malformed => {
            let _ = malformed.push(field);
            0.0
        }
    }
}

/// Optional probe values: absent → `None`, malformed → `None` and recorded.
fn optional(
    value: Option<&Value>,
    field: &'static str,
    malformed: &mut MalformedFields,
) -> Option<f32> {
    match parse_number(value) {
        Parsed::Number(v) => Some(v),
        Parsed::Absent => None,
        Parsed::Malformed => {
            let _ = malformed.push(field);
            None
        }
    }
}
