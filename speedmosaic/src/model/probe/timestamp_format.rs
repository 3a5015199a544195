use chrono::{DateTime, NaiveDateTime};

/// layouts accepted for probe timestamps, tried in order after RFC 3339.
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// parses a probe timestamp into naive UTC. RFC 3339 values are shifted by their
/// offset, integer values are unix seconds and other layouts are read as UTC.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, String> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_utc());
    }
    for format in TIMESTAMP_FORMATS.iter() {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt);
        }
    }
    if let Ok(seconds) = value.parse::<i64>() {
        return DateTime::from_timestamp(seconds, 0)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| format!("unix timestamp {seconds} out of range"));
    }
    Err(format!("unrecognized timestamp '{value}'"))
}
