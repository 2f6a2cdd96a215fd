//! Dashboard statistics derived from a user's stored sessions.
//!
//! These are recomputed from the session rows on every request; nothing
//! here is persisted.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::SessionRecord;

/// Aggregates shown on the history dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionStats {
    /// Number of sessions considered
    pub session_count: u32,
    /// Sum of session distances (meters)
    pub total_distance_meters: f64,
    /// Sum of positive session durations (seconds)
    pub total_duration_seconds: f64,
    /// Total distance over total duration (m/s), 0 when no duration
    pub avg_speed_mps: f64,
    /// Same average in km/h
    pub avg_speed_kmh: f64,
}

impl SessionStats {
    /// Aggregate a list of sessions.
    pub fn from_sessions(sessions: &[SessionRecord]) -> Self {
        let mut stats = Self::default();
        for session in sessions {
            stats.add_session(session);
        }
        stats
    }

    /// Fold one session into the totals and refresh the averages.
    pub fn add_session(&mut self, session: &SessionRecord) {
        self.session_count += 1;
        self.total_distance_meters += session.distance_meters();

        // Unknown times and clock skew (end < start) add no time
        if let Some(secs) = session.duration_seconds().filter(|s| *s > 0.0) {
            self.total_duration_seconds += secs;
        }

        self.avg_speed_mps = if self.total_duration_seconds > 0.0 {
            self.total_distance_meters / self.total_duration_seconds
        } else {
            0.0
        };
        self.avg_speed_kmh = self.avg_speed_mps * 3.6;
    }
}
