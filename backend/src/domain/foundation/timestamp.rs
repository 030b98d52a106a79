//! Timestamp value object.
//!
//! Serialized transparently as RFC 3339, so stored finalization times
//! round-trip byte for byte through artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point in time, always UTC. Ordered, so the latest of several can be taken with `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// RFC 3339 rendering used by API responses.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn later_timestamps_order_after_earlier_ones() {
        let earlier: Timestamp = serde_json::from_str("\"2024-01-15T10:30:00Z\"").unwrap();
        let later: Timestamp = serde_json::from_str("\"2024-03-01T08:00:00Z\"").unwrap();

        assert!(earlier < later);
        assert_eq!([earlier, later].into_iter().max(), Some(later));
    }

    #[test]
    fn serde_round_trip_is_stable() {
        let ts: Timestamp = serde_json::from_str("\"2024-01-15T10:30:00Z\"").unwrap();

        assert_eq!(ts.as_datetime().year(), 2024);
        let json = serde_json::to_string(&ts).unwrap();
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, back);
        assert_eq!(serde_json::to_string(&back).unwrap(), json);
    }
}
