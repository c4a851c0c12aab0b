use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Canonical timestamp format: UTC, second precision, explicit offset.
///
/// Every timestamp the API emits uses this one format, regardless of
/// interval or asset class.
pub const CANONICAL_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S+00:00";

/// Render a timestamp in the canonical form
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.format(CANONICAL_TIME_FORMAT).to_string()
}

/// serde adapter for canonical timestamps
pub mod canonical_time {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_timestamp(time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S+00:00")
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

/// Get snapshot file path from environment variable or use default
pub fn get_snapshot_path() -> PathBuf {
    std::env::var("LIVE_DATA_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("live_data.json"))
}

/// Get upstream base URL from environment variable or use default
pub fn get_upstream_url() -> String {
    std::env::var("UPSTREAM_URL")
        .unwrap_or_else(|_| crate::constants::DEFAULT_UPSTREAM_URL.to_string())
}
