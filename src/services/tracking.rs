// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user recorder registry backing the tracking API.

use crate::db::{BackendClient, StaticAuth};
use crate::middleware::auth::AuthUser;
use crate::models::CoordinateSample;
use crate::services::location::{AccessStatus, DeviceFeed, PushOutcome};
use crate::services::recorder::{FinishedSession, RecorderState, SessionRecorder, TrackingError};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One user's device feed and recorder.
///
/// The feed has its own lock so pushes never wait behind a finalize.
struct TrackerSlot {
    feed: DeviceFeed,
    recorder: Arc<Mutex<SessionRecorder<DeviceFeed>>>,
}

/// Live view of a user's recorder.
#[derive(Debug, Clone, Serialize)]
pub struct LiveStatus {
    pub state: RecorderState,
    pub sample_count: usize,
    pub distance_meters: f64,
    pub last_sample: Option<CoordinateSample>,
}

impl LiveStatus {
    fn idle() -> Self {
        Self {
            state: RecorderState::Idle,
            sample_count: 0,
            distance_meters: 0.0,
            last_sample: None,
        }
    }
}

/// Counts from pushing a batch of fixes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PushSummary {
    /// Delivered to the recorder
    pub accepted: usize,
    /// Dropped by the sampling policy
    pub throttled: usize,
    /// Invalid coordinates, or no active recording
    pub rejected: usize,
}

/// Keeps one recorder per user; only one session per user can be active.
#[derive(Clone)]
pub struct TrackingService {
    backend: BackendClient,
    slots: Arc<DashMap<String, Arc<TrackerSlot>>>,
}

impl TrackingService {
    pub fn new(backend: BackendClient) -> Self {
        Self {
            backend,
            slots: Arc::new(DashMap::new()),
        }
    }

    fn slot(&self, user: &AuthUser) -> Arc<TrackerSlot> {
        self.slots
            .entry(user.user_id.clone())
            .or_insert_with(|| {
                let feed = DeviceFeed::new();
                let backend = self
                    .backend
                    .with_auth(Arc::new(StaticAuth::signed_in(user.clone())));
                Arc::new(TrackerSlot {
                    feed: feed.clone(),
                    recorder: Arc::new(Mutex::new(SessionRecorder::new(feed, backend))),
                })
            })
            .clone()
    }

    fn existing_slot(&self, user_id: &str) -> Option<Arc<TrackerSlot>> {
        self.slots.get(user_id).map(|slot| slot.clone())
    }

    fn is_current(&self, user_id: &str, slot: &Arc<TrackerSlot>) -> bool {
        self.slots
            .get(user_id)
            .is_some_and(|current| Arc::ptr_eq(current.value(), slot))
    }

    /// Drop the user's slot if it is still `slot` and its recorder is idle.
    /// A recorder that is locked is in use, so its slot stays.
    fn release_if_idle(&self, user_id: &str, slot: &Arc<TrackerSlot>) {
        let released = self.slots.remove_if(user_id, |_, current| {
            Arc::ptr_eq(current, slot)
                && current
                    .recorder
                    .try_lock()
                    .is_ok_and(|recorder| recorder.state() == RecorderState::Idle)
        });
        if released.is_some() {
            tracing::debug!(user_id, "Released idle tracker slot");
        }
    }

    /// Start recording with the permission the device reported.
    pub async fn start(
        &self,
        user: &AuthUser,
        access: AccessStatus,
    ) -> Result<LiveStatus, TrackingError> {
        // An idle slot may be released between lookup and lock; retry on a fresh one
        let (slot, mut recorder) = loop {
            let slot = self.slot(user);
            let recorder = slot.recorder.clone().lock_owned().await;
            if self.is_current(&user.user_id, &slot) {
                break (slot, recorder);
            }
        };

        if recorder.state() == RecorderState::Recording {
            return Err(TrackingError::AlreadyRecording);
        }
        slot.feed.set_access(access).await;

        if let Err(err) = recorder.start().await {
            drop(recorder);
            self.release_if_idle(&user.user_id, &slot);
            return Err(err);
        }
        tracing::info!(user_id = %user.user_id, "Tracking session started");

        Ok(status_of(&recorder))
    }

    /// Push raw fixes, in device order.
    pub async fn push_fixes(&self, user_id: &str, fixes: &[CoordinateSample]) -> PushSummary {
        let mut summary = PushSummary::default();
        let Some(slot) = self.existing_slot(user_id) else {
            summary.rejected = fixes.len();
            return summary;
        };

        for fix in fixes {
            if !fix.is_valid() {
                summary.rejected += 1;
                continue;
            }
            match slot.feed.push(*fix).await {
                PushOutcome::Accepted => summary.accepted += 1,
                PushOutcome::Throttled => summary.throttled += 1,
                PushOutcome::NotSubscribed => summary.rejected += 1,
            }
        }

        tracing::debug!(
            user_id,
            accepted = summary.accepted,
            throttled = summary.throttled,
            rejected = summary.rejected,
            "Pushed location fixes"
        );
        summary
    }

    /// Current recorder state, after appending delivered fixes.
    pub async fn status(&self, user_id: &str) -> LiveStatus {
        let Some(slot) = self.existing_slot(user_id) else {
            return LiveStatus::idle();
        };
        let mut recorder = slot.recorder.lock().await;
        recorder.poll();
        status_of(&recorder)
    }

    /// Stop recording and persist the session.
    pub async fn stop(&self, user_id: &str) -> Result<FinishedSession, TrackingError> {
        let slot = self
            .existing_slot(user_id)
            .ok_or(TrackingError::NotRecording)?;
        let result = slot.recorder.lock().await.stop().await;
        self.release_if_idle(user_id, &slot);
        result
    }
}

fn status_of(recorder: &SessionRecorder<DeviceFeed>) -> LiveStatus {
    LiveStatus {
        state: recorder.state(),
        sample_count: recorder.samples().len(),
        distance_meters: recorder.live_distance(),
        last_sample: recorder.samples().last().copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{tables, MemoryStore};
    use crate::services::location::LocationSource;

    const T0: i64 = 1_700_000_000_000;

    fn service(store: &MemoryStore) -> TrackingService {
        TrackingService::new(BackendClient::new(
            Arc::new(store.clone()),
            Arc::new(StaticAuth::signed_out()),
        ))
    }

    fn user(id: &str) -> AuthUser {
        AuthUser {
            user_id: id.to_string(),
            email: None,
        }
    }

    #[tokio::test]
    async fn test_push_before_start_is_rejected() {
        let store = MemoryStore::new();
        let tracking = service(&store);

        let summary = tracking
            .push_fixes("alice", &[CoordinateSample::new(1.0, 1.0, T0)])
            .await;

        assert_eq!(summary.rejected, 1);
        assert_eq!(tracking.status("alice").await.state, RecorderState::Idle);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let store = MemoryStore::new();
        let tracking = service(&store);

        tracking
            .start(&user("alice"), AccessStatus::Granted)
            .await
            .unwrap();
        let summary = tracking
            .push_fixes(
                "alice",
                &[
                    CoordinateSample::new(48.0, 2.0, T0),
                    CoordinateSample::new(48.001, 2.0, T0 + 1000),
                ],
            )
            .await;
        assert_eq!(summary.accepted, 2);

        assert_eq!(tracking.status("bob").await.state, RecorderState::Idle);
        assert!(matches!(
            tracking.stop("bob").await,
            Err(TrackingError::NotRecording)
        ));

        let finished = tracking.stop("alice").await.unwrap();
        assert_eq!(finished.user_id, "alice");
        assert_eq!(store.rows(tables::SESSIONS).len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_fix_rejected_and_status_polls() {
        let store = MemoryStore::new();
        let tracking = service(&store);
        tracking
            .start(&user("alice"), AccessStatus::Granted)
            .await
            .unwrap();

        let summary = tracking
            .push_fixes(
                "alice",
                &[
                    CoordinateSample::new(200.0, 2.0, T0),
                    CoordinateSample::new(48.0, 2.0, T0),
                    CoordinateSample::new(48.0, 2.0, T0 + 100),
                ],
            )
            .await;
        assert_eq!(
            summary,
            PushSummary {
                accepted: 1,
                throttled: 1,
                rejected: 1
            }
        );

        let status = tracking.status("alice").await;
        assert_eq!(status.state, RecorderState::Recording);
        assert_eq!(status.sample_count, 1);
        assert_eq!(status.last_sample, Some(CoordinateSample::new(48.0, 2.0, T0)));
    }

    #[tokio::test]
    async fn test_second_start_keeps_reported_access() {
        let store = MemoryStore::new();
        let tracking = service(&store);
        tracking
            .start(&user("alice"), AccessStatus::Granted)
            .await
            .unwrap();

        assert!(matches!(
            tracking.start(&user("alice"), AccessStatus::Denied).await,
            Err(TrackingError::AlreadyRecording)
        ));

        let slot = tracking.existing_slot("alice").unwrap();
        assert_eq!(
            slot.feed.request_access().await.unwrap(),
            AccessStatus::Granted
        );
        assert_eq!(tracking.status("alice").await.state, RecorderState::Recording);
    }

    #[tokio::test]
    async fn test_idle_slots_are_released() {
        let store = MemoryStore::new();
        let tracking = service(&store);

        let _ = tracking.start(&user("bob"), AccessStatus::Denied).await;
        assert!(tracking.existing_slot("bob").is_none());

        tracking
            .start(&user("alice"), AccessStatus::Granted)
            .await
            .unwrap();
        assert!(tracking.existing_slot("alice").is_some());

        // Insufficient samples still ends the attempt
        assert!(tracking.stop("alice").await.is_err());
        assert!(tracking.slots.is_empty());

        let status = tracking
            .start(&user("alice"), AccessStatus::Granted)
            .await
            .unwrap();
        assert_eq!(status.state, RecorderState::Recording);
        assert_eq!(tracking.slots.len(), 1);
    }

    #[tokio::test]
    async fn test_denied_start_then_granted_retry() {
        let store = MemoryStore::new();
        let tracking = service(&store);

        assert!(matches!(
            tracking.start(&user("alice"), AccessStatus::Denied).await,
            Err(TrackingError::PermissionDenied)
        ));
        let status = tracking
            .start(&user("alice"), AccessStatus::Granted)
            .await
            .unwrap();
        assert_eq!(status.state, RecorderState::Recording);
    }
}
