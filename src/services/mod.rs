// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod feed;
pub mod location;
pub mod recorder;
pub mod route;
pub mod track;
pub mod tracking;

pub use location::{AccessStatus, DeviceFeed, LocationSource, LocationSubscription, SamplingPolicy};
pub use recorder::{FinishedSession, RecorderState, SessionRecorder, TrackingError};
pub use tracking::TrackingService;
