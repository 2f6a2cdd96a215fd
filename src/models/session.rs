// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Finished tracking session records.

use crate::models::{de_id, CoordinateSample};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row written to the `sessions` table when a recording is finalized.
#[derive(Debug, Clone, Serialize)]
pub struct NewSessionRecord {
    /// Owner, taken from the authenticated caller at finalize time
    pub user_id: String,
    /// Timestamp of the first sample
    #[serde(serialize_with = "crate::time_utils::serialize_millis")]
    pub start_time: DateTime<Utc>,
    /// Timestamp of the last sample
    #[serde(serialize_with = "crate::time_utils::serialize_millis")]
    pub end_time: DateTime<Utc>,
    /// Full ordered sample sequence, stored verbatim for route rendering
    pub coords: Vec<CoordinateSample>,
    /// Distance in meters, computed once at finalize time
    pub distance: f64,
}

/// Stored session as read back from the `sessions` table.
///
/// Projected selects may omit `user_id`, `coords` or `distance`. Rows
/// written by other clients may carry `null` times or distance, so those
/// are optional and treated as unknown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub coords: Vec<CoordinateSample>,
    #[serde(default)]
    pub distance: Option<f64>,
}

impl SessionRecord {
    /// Distance in meters, 0 when unknown.
    pub fn distance_meters(&self) -> f64 {
        self.distance.unwrap_or(0.0)
    }

    /// Elapsed seconds between start and end, `None` unless both are known.
    /// May be zero or negative for bad clocks.
    pub fn duration_seconds(&self) -> Option<f64> {
        let (start, end) = (self.start_time?, self.end_time?);
        Some((end - start).num_milliseconds() as f64 / 1000.0)
    }

    /// Average speed in km/h, or `None` when the distance is unknown or the
    /// duration is unknown or not positive.
    pub fn avg_speed_kmh(&self) -> Option<f64> {
        let distance = self.distance?;
        self.duration_seconds()
            .filter(|secs| *secs > 0.0)
            .map(|secs| distance / secs * 3.6)
    }
}
