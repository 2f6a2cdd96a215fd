// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session recorder: the tracking lifecycle from start to persisted finish.
//!
//! Two states, `Idle` and `Recording`:
//! 1. `start()` asks for location access and subscribes with [`TRACKING_POLICY`]
//! 2. Each emission of the subscription appends one sample, in arrival order
//! 3. `stop()` unsubscribes, returns to `Idle`, and finalizes: validate,
//!    compute distance once, resolve the caller, insert into `sessions`
//!
//! Every failure is terminal for the attempt; nothing is retried or queued.

use crate::db::{BackendClient, StoreError};
use crate::models::{CoordinateSample, NewSessionRecord};
use crate::services::location::{
    AccessStatus, LocationError, LocationSource, LocationSubscription, TRACKING_POLICY,
};
use crate::services::track::{track_distance, DistanceAccumulator};
use crate::time_utils::from_epoch_millis;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Minimum number of samples for a session to be persisted.
pub const MIN_SAMPLES: usize = 2;

/// Recorder lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderState {
    Idle,
    Recording,
}

/// Errors from starting or finishing a recording.
#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Not enough GPS points to save the session ({collected} collected, need 2)")]
    InsufficientSamples { collected: usize },

    #[error("No authenticated user")]
    NotAuthenticated,

    /// The store's own message, passed through verbatim.
    #[error("{0}")]
    Store(String),

    #[error("A session is already being recorded")]
    AlreadyRecording,

    #[error("No session is being recorded")]
    NotRecording,

    #[error("Sample timestamp out of range: {0}")]
    InvalidTimestamp(i64),

    #[error(transparent)]
    Location(#[from] LocationError),
}

impl From<StoreError> for TrackingError {
    fn from(err: StoreError) -> Self {
        TrackingError::Store(err.message())
    }
}

/// A session that was persisted successfully.
#[derive(Debug, Clone, Serialize)]
pub struct FinishedSession {
    /// Id assigned by the store
    pub id: String,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub distance_meters: f64,
    pub sample_count: usize,
}

/// In-progress recording.
#[derive(Debug)]
struct ActiveSession {
    subscription: LocationSubscription,
    samples: Vec<CoordinateSample>,
    live_distance: DistanceAccumulator,
}

impl ActiveSession {
    fn append(&mut self, sample: CoordinateSample) {
        self.live_distance.push(&sample);
        self.samples.push(sample);
    }

    /// Move every emission delivered so far into the sample sequence.
    fn drain(&mut self) -> usize {
        let mut appended = 0;
        while let Some(sample) = self.subscription.try_next() {
            self.append(sample);
            appended += 1;
        }
        appended
    }
}

/// Owns one tracking session at a time.
pub struct SessionRecorder<L> {
    location: L,
    backend: BackendClient,
    active: Option<ActiveSession>,
}

impl<L: LocationSource> SessionRecorder<L> {
    pub fn new(location: L, backend: BackendClient) -> Self {
        Self {
            location,
            backend,
            active: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        if self.active.is_some() {
            RecorderState::Recording
        } else {
            RecorderState::Idle
        }
    }

    /// Samples collected so far (empty when idle). Call [`poll`](Self::poll)
    /// first to include the latest emissions.
    pub fn samples(&self) -> &[CoordinateSample] {
        self.active
            .as_ref()
            .map(|a| a.samples.as_slice())
            .unwrap_or(&[])
    }

    /// Running distance for display while recording.
    pub fn live_distance(&self) -> f64 {
        self.active
            .as_ref()
            .map(|a| a.live_distance.total())
            .unwrap_or(0.0)
    }

    /// Append any delivered emissions; returns how many were appended.
    pub fn poll(&mut self) -> usize {
        self.active.as_mut().map(ActiveSession::drain).unwrap_or(0)
    }

    /// Wait for the next emission and append it. Returns `false` once the
    /// stream has ended or the recorder is idle.
    pub async fn record_next(&mut self) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        match active.subscription.next().await {
            Some(sample) => {
                active.append(sample);
                true
            }
            None => false,
        }
    }

    /// Begin a new session.
    pub async fn start(&mut self) -> Result<(), TrackingError> {
        if self.active.is_some() {
            return Err(TrackingError::AlreadyRecording);
        }

        if self.location.request_access().await? != AccessStatus::Granted {
            tracing::info!("Location access denied; recorder stays idle");
            return Err(TrackingError::PermissionDenied);
        }

        let subscription = self.location.subscribe(TRACKING_POLICY).await?;
        self.active = Some(ActiveSession {
            subscription,
            samples: Vec::new(),
            live_distance: DistanceAccumulator::default(),
        });

        tracing::info!(
            min_interval_ms = TRACKING_POLICY.min_interval_ms,
            min_distance_meters = TRACKING_POLICY.min_distance_meters,
            "Recording started"
        );
        Ok(())
    }

    /// End the session and persist it.
    ///
    /// The recorder is idle and empty afterwards whatever the outcome.
    pub async fn stop(&mut self) -> Result<FinishedSession, TrackingError> {
        let mut active = self.active.take().ok_or(TrackingError::NotRecording)?;

        // Anything sent after this point is rejected at the producer
        active.subscription.unsubscribe();
        active.drain();
        let samples = active.samples;

        tracing::info!(samples = samples.len(), "Recording stopped");

        let draft = finalize(&samples)?;

        let user = self
            .backend
            .current_user()
            .await?
            .ok_or(TrackingError::NotAuthenticated)?;

        let record = NewSessionRecord {
            user_id: user.user_id.clone(),
            start_time: draft.start_time,
            end_time: draft.end_time,
            coords: samples,
            distance: draft.distance_meters,
        };

        let id = self.backend.insert_session(&record).await.map_err(|e| {
            tracing::warn!(user_id = %user.user_id, error = %e, "Failed to save session");
            TrackingError::from(e)
        })?;

        tracing::info!(
            session_id = %id,
            user_id = %user.user_id,
            distance_meters = draft.distance_meters,
            "Session saved"
        );

        Ok(FinishedSession {
            id,
            user_id: user.user_id,
            start_time: draft.start_time,
            end_time: draft.end_time,
            distance_meters: draft.distance_meters,
            sample_count: record.coords.len(),
        })
    }
}

/// Derived values of a finished track.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDraft {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub distance_meters: f64,
}

/// Validate a sample sequence and derive its times and distance.
pub fn finalize(samples: &[CoordinateSample]) -> Result<SessionDraft, TrackingError> {
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        return Err(TrackingError::InsufficientSamples { collected: 0 });
    };
    if samples.len() < MIN_SAMPLES {
        return Err(TrackingError::InsufficientSamples {
            collected: samples.len(),
        });
    }

    let start_time =
        from_epoch_millis(first.timestamp).ok_or(TrackingError::InvalidTimestamp(first.timestamp))?;
    let end_time =
        from_epoch_millis(last.timestamp).ok_or(TrackingError::InvalidTimestamp(last.timestamp))?;

    Ok(SessionDraft {
        start_time,
        end_time,
        distance_meters: track_distance(samples),
    })
}
