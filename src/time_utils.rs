// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serializer;

/// Format a UTC timestamp as RFC3339 with millisecond precision (`2024-01-15T10:00:00.000Z`).
pub fn format_utc_millis(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Convert a device clock reading (ms since epoch) into an instant.
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Serde helper writing instants with [`format_utc_millis`].
pub fn serialize_millis<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_utc_millis(*date))
}

/// Render seconds as `"{h}h {m}m {s}s"`.
pub fn format_hms(total_seconds: f64) -> String {
    let total = total_seconds.max(0.0).floor() as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    format!("{}h {}m {}s", h, m, s)
}
