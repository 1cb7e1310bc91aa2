//! Record helpers shared by the fetch and staging steps.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// One CKAN datastore row. The field set is only known at read time.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Row-level search metadata that CKAN attaches to every record.
pub const FULL_TEXT_FIELD: &str = "_full_text";

/// Drop `fields` from every record. Missing keys are ignored.
///
/// Besides [`FULL_TEXT_FIELD`], geometry columns such as `_geom` and
/// `_the_geom_webmercator` are common candidates.
pub fn remove_fields<S: AsRef<str>>(records: &mut [Record], fields: &[S]) {
    for record in records.iter_mut() {
        for field in fields {
            record.remove(field.as_ref());
        }
    }
}

/// Parse an ISO-8601 timestamp into Unix epoch seconds.
///
/// Extended and basic forms are accepted, with or without a colon in the
/// offset. Offsets are honoured; timestamps without one (the CKAN datastore
/// default, e.g. `2013-03-28T11:38:56`) are read as UTC. A bare date is
/// midnight UTC.
pub fn time_to_seconds(timestamp: &str) -> Result<i64, chrono::ParseError> {
    if let Ok(aware) = DateTime::parse_from_rfc3339(timestamp) {
        return Ok(aware.timestamp());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y%m%dT%H%M%S%.f%z"] {
        if let Ok(aware) = DateTime::parse_from_str(timestamp, format) {
            return Ok(aware.timestamp());
        }
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y%m%dT%H%M%S%.f",
        "%Y%m%dT%H%M%S%.fZ",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(timestamp, format) {
            return Ok(naive.and_utc().timestamp());
        }
    }
    let date = NaiveDate::parse_from_str(timestamp, "%Y-%m-%d")?;
    Ok(date.and_time(NaiveTime::MIN).and_utc().timestamp())
}
