// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Track distance computation.
//!
//! Uses a flat-earth local approximation: one degree of latitude or longitude
//! is taken as 111 km. No spherical correction is applied, so longitude
//! distances are overstated away from the equator. Only meaningful for
//! short-range tracks.

use crate::models::CoordinateSample;

/// Meters per degree, applied to both axes.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Planar distance in meters between two samples.
pub fn planar_distance(a: &CoordinateSample, b: &CoordinateSample) -> f64 {
    let dx = (a.latitude - b.latitude) * METERS_PER_DEGREE;
    let dy = (a.longitude - b.longitude) * METERS_PER_DEGREE;
    (dx * dx + dy * dy).sqrt()
}

/// Sum of consecutive pairwise distances, accumulated in sample order.
///
/// Pure function of the sequence: fewer than two samples yield 0.
pub fn track_distance(samples: &[CoordinateSample]) -> f64 {
    samples
        .windows(2)
        .fold(0.0, |total, pair| total + planar_distance(&pair[0], &pair[1]))
}

/// Running distance for a live track, fed one sample at a time.
#[derive(Debug, Clone, Default)]
pub struct DistanceAccumulator {
    last: Option<CoordinateSample>,
    total: f64,
}

impl DistanceAccumulator {
    pub fn push(&mut self, sample: &CoordinateSample) {
        if let Some(last) = &self.last {
            self.total += planar_distance(last, sample);
        }
        self.last = Some(*sample);
    }

    pub fn total(&self) -> f64 {
        self.total
    }
}
