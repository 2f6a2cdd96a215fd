// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route rendering helpers for stored sessions.

use crate::models::{CoordinateSample, SessionRecord};
use crate::time_utils::format_utc_millis;
use geo::LineString;
use geojson::{Feature, Geometry, JsonObject};

/// Polyline precision (standard Google encoded polyline).
pub const POLYLINE_PRECISION: u32 = 5;

/// Build a line in (lon, lat) order from samples.
pub fn to_line_string(coords: &[CoordinateSample]) -> LineString<f64> {
    coords
        .iter()
        .map(|c| (c.longitude, c.latitude))
        .collect::<Vec<_>>()
        .into()
}

/// Encode a route as a polyline string.
pub fn encode_route(coords: &[CoordinateSample]) -> Result<String, RouteError> {
    let line = to_line_string(coords);
    polyline::encode_coordinates(line.coords().copied(), POLYLINE_PRECISION)
        .map_err(|e| RouteError::Encode(e.to_string()))
}

/// Session route as a GeoJSON feature with summary properties.
pub fn route_feature(session: &SessionRecord) -> Feature {
    let line = to_line_string(&session.coords);

    let mut properties = JsonObject::new();
    properties.insert("id".to_string(), session.id.clone().into());
    properties.insert("distance".to_string(), session.distance.into());
    properties.insert(
        "start_time".to_string(),
        session.start_time.map(format_utc_millis).into(),
    );
    properties.insert(
        "end_time".to_string(),
        session.end_time.map(format_utc_millis).into(),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::from(&line))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Errors from route rendering.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("Failed to encode polyline: {0}")]
    Encode(String),
}
