use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::info;
use serde::Deserialize;
use serde_json::Value;

use crate::fetch::DegradedReason;

#[derive(Deserialize)]
struct TimeRoot {
    #[serde(default)]
    abbreviation: Value,
    datetime: Option<String>,
}

/// JSON truthiness: null, false, zero and empty strings/collections are falsy.
pub fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Parse an ISO-8601 date or date-time. A date-time with an offset yields the
/// calendar date at that offset.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Extract today's date from a time-service response.
pub fn parse_current_date(json: &str) -> Result<NaiveDate, DegradedReason> {
    let root: TimeRoot =
        serde_json::from_str(json).map_err(|e| DegradedReason::Malformed(e.to_string()))?;

    if !is_truthy(&root.abbreviation) {
        info!("Invalid time address!");
        return Err(DegradedReason::InvalidTime);
    }

    let raw = root.datetime.ok_or(DegradedReason::InvalidTime)?;
    info!("time reference {}", raw);
    parse_iso_date(&raw).ok_or(DegradedReason::BadDate(raw))
}
