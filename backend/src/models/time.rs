use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::*;

/// Native timestamp as the document store serializes it (`{seconds, nanoseconds}`).
///
/// Some store exports prefix the fields with an underscore; both spellings are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeTimestamp {
    #[serde(alias = "_seconds")]
    pub seconds: i64,
    #[serde(default, alias = "_nanoseconds")]
    pub nanoseconds: u32,
}

/// A timestamp field as returned by the store.
///
/// Reports written by different client versions carry either the store-native
/// value or an ISO-8601 string. Anything else is kept verbatim and treated as
/// having no usable time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreTimestamp {
    Native(NativeTimestamp),
    Iso(String),
    Unrecognized(serde_json::Value),
}

impl StoreTimestamp {
    /// Build a native timestamp from a chrono value.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        StoreTimestamp::Native(NativeTimestamp {
            seconds: dt.timestamp(),
            nanoseconds: dt.timestamp_subsec_nanos(),
        })
    }

    /// Resolve to a UTC instant, if the value carries one.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            StoreTimestamp::Native(native) => {
                DateTime::from_timestamp(native.seconds, native.nanoseconds)
            }
            StoreTimestamp::Iso(text) => parse_iso(text),
            StoreTimestamp::Unrecognized(_) => None,
        }
    }

    /// Calendar date (UTC) formatted as `YYYY-MM-DD`.
    pub fn to_date_string(&self) -> Option<String> {
        self.to_datetime()
            .map(|dt| dt.format("%Y-%m-%d").to_string())
    }
}

impl From<DateTime<Utc>> for StoreTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        StoreTimestamp::from_datetime(dt)
    }
}

fn parse_iso(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_native_timestamp_to_date() {
        let ts: StoreTimestamp =
            serde_json::from_value(serde_json::json!({"seconds": 1_700_000_000, "nanoseconds": 0}))
                .unwrap();
        assert!(matches!(ts, StoreTimestamp::Native(_)));
        assert_eq!(ts.to_date_string().as_deref(), Some("2023-11-14"));
    }

    #[test]
    fn test_underscore_native_timestamp() {
        let ts: StoreTimestamp =
            serde_json::from_value(serde_json::json!({"_seconds": 0, "_nanoseconds": 5})).unwrap();
        assert_eq!(ts.to_date_string().as_deref(), Some("1970-01-01"));
    }

    #[test]
    fn test_iso_string_variants() {
        let full = StoreTimestamp::Iso("2024-03-05T22:10:00.000Z".to_string());
        assert_eq!(full.to_date_string().as_deref(), Some("2024-03-05"));

        let offset = StoreTimestamp::Iso("2024-03-05T23:30:00-02:00".to_string());
        assert_eq!(offset.to_date_string().as_deref(), Some("2024-03-06"));

        let naive = StoreTimestamp::Iso("2024-03-05T08:00:00".to_string());
        assert_eq!(naive.to_date_string().as_deref(), Some("2024-03-05"));

        let date_only = StoreTimestamp::Iso("2024-03-05".to_string());
        assert_eq!(date_only.to_date_string().as_deref(), Some("2024-03-05"));
    }

    #[test]
    fn test_unparseable_values_have_no_date() {
        assert_eq!(StoreTimestamp::Iso("yesterday".into()).to_date_string(), None);
        let other: StoreTimestamp = serde_json::from_value(serde_json::json!(true)).unwrap();
        assert!(matches!(other, StoreTimestamp::Unrecognized(_)));
        assert_eq!(other.to_datetime(), None);
    }

    #[test]
    fn test_from_datetime_roundtrip() {
        let dt = Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap();
        assert_eq!(StoreTimestamp::from(dt).to_datetime(), Some(dt));
    }
}
