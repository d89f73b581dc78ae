use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// All timestamps are UTC.
pub type Timestamp = DateTime<Utc>;

/// Opaque JSON object carried through job record rewrites (`params`, `artifacts`).
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Current wall-clock time.
pub fn now() -> Timestamp {
    Utc::now()
}

/// RFC 3339 text with a `Z` suffix, as this engine writes new timestamps.
pub fn format_timestamp(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse a timestamp written by this engine or by the job-creation API.
///
/// Accepts RFC 3339 with any offset, and offset-less ISO 8601 (assumed UTC).
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
