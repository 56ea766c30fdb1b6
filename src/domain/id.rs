use std::{fmt::Display, num::ParseIntError, str::FromStr};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Represents the track ID.
///
/// Seed tracks use small sequential ids, tracks added by the user get
/// a millisecond timestamp. Ids are unique within one catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub i64);

impl TrackId {
    /// Timestamp-derived id that is strictly greater than every id in `taken`.
    ///
    /// Two adds within the same millisecond would otherwise collide.
    /// Returns `None` once `taken` already holds the largest representable id.
    pub fn next_after<'a>(taken: impl IntoIterator<Item = &'a TrackId>) -> Option<Self> {
        let now = Utc::now().timestamp_millis();
        let max_taken = taken.into_iter().map(|id| id.0).max();
        match max_taken {
            Some(max) if max >= now => max.checked_add(1).map(TrackId),
            _ => Some(TrackId(now)),
        }
    }
}

impl Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TrackId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(TrackId)
    }
}
