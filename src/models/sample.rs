// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coordinate samples produced by the device location stream.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A single timestamped GPS fix.
///
/// Samples are immutable once produced and ordered by arrival.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CoordinateSample {
    /// Latitude in signed degrees
    pub latitude: f64,
    /// Longitude in signed degrees
    pub longitude: f64,
    /// Device clock reading (milliseconds since epoch)
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub timestamp: i64,
}

impl CoordinateSample {
    pub fn new(latitude: f64, longitude: f64, timestamp: i64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
        }
    }

    /// Whether both coordinates are finite and within WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}
