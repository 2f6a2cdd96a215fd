// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device location capability.
//!
//! The recorder consumes locations through [`LocationSource`]: ask for
//! access, then subscribe to a stream of samples. A subscription is a
//! cancellable handle; once unsubscribed, nothing sent afterwards is ever
//! received.
//!
//! [`DeviceFeed`] is the implementation used by the API: the mobile client
//! reports its OS permission and pushes raw fixes, which the feed throttles
//! with the subscription's [`SamplingPolicy`] before delivery.

use crate::models::CoordinateSample;
use crate::services::track::planar_distance;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Fixed sampling policy for tracking sessions: a fix every second or every
/// 5 meters of movement, whichever triggers first.
pub const TRACKING_POLICY: SamplingPolicy = SamplingPolicy {
    min_interval_ms: 1000,
    min_distance_meters: 5.0,
};

/// When the location stream should emit a new sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingPolicy {
    pub min_interval_ms: u64,
    pub min_distance_meters: f64,
}

impl SamplingPolicy {
    /// Whether `candidate` should be emitted given the last emitted sample.
    pub fn admits(&self, last: Option<&CoordinateSample>, candidate: &CoordinateSample) -> bool {
        let Some(last) = last else {
            return true;
        };

        let elapsed = candidate.timestamp.saturating_sub(last.timestamp);
        let interval_due = elapsed >= 0 && elapsed as u64 >= self.min_interval_ms;
        let moved_enough = planar_distance(last, candidate) >= self.min_distance_meters;

        interval_due || moved_enough
    }
}

/// Outcome of a location-access request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessStatus {
    Granted,
    #[default]
    Denied,
}

/// Errors from the location capability itself.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location subscription failed: {0}")]
    Subscribe(String),
}

/// Cancellable stream of samples from a [`LocationSource`].
#[derive(Debug)]
pub struct LocationSubscription {
    rx: mpsc::UnboundedReceiver<CoordinateSample>,
    closed: bool,
}

impl LocationSubscription {
    /// Create a subscription and the sender that feeds it.
    pub fn channel() -> (mpsc::UnboundedSender<CoordinateSample>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx, closed: false })
    }

    /// Next sample already delivered, without waiting.
    pub fn try_next(&mut self) -> Option<CoordinateSample> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next sample; `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<CoordinateSample> {
        self.rx.recv().await
    }

    /// Stop the stream. Samples delivered before this call can still be
    /// drained; later sends fail at the producer.
    pub fn unsubscribe(&mut self) {
        if !self.closed {
            self.rx.close();
            self.closed = true;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Location capability consumed by the session recorder.
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Ask the device for location access.
    async fn request_access(&self) -> Result<AccessStatus, LocationError>;

    /// Start a sample stream governed by `policy`.
    async fn subscribe(&self, policy: SamplingPolicy) -> Result<LocationSubscription, LocationError>;
}

/// Result of pushing one fix into a [`DeviceFeed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Delivered to the active subscription
    Accepted,
    /// Dropped by the sampling policy
    Throttled,
    /// No live subscription (never subscribed, or already unsubscribed)
    NotSubscribed,
}

#[derive(Debug, Default)]
struct FeedState {
    access: AccessStatus,
    sender: Option<mpsc::UnboundedSender<CoordinateSample>>,
    policy: Option<SamplingPolicy>,
    last_emitted: Option<CoordinateSample>,
}

/// Location source fed by fixes that a device pushes to the server.
///
/// Clones share state, so one clone can sit inside a recorder while
/// request handlers push into another.
#[derive(Debug, Clone, Default)]
pub struct DeviceFeed {
    state: Arc<Mutex<FeedState>>,
}

impl DeviceFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the permission the device's OS reported.
    pub async fn set_access(&self, access: AccessStatus) {
        self.state.lock().await.access = access;
    }

    /// Offer one raw fix to the active subscription.
    pub async fn push(&self, sample: CoordinateSample) -> PushOutcome {
        let mut state = self.state.lock().await;

        let Some(sender) = state.sender.as_ref() else {
            return PushOutcome::NotSubscribed;
        };
        if sender.is_closed() {
            state.sender = None;
            return PushOutcome::NotSubscribed;
        }

        let policy = state.policy.unwrap_or(TRACKING_POLICY);
        if !policy.admits(state.last_emitted.as_ref(), &sample) {
            return PushOutcome::Throttled;
        }

        if sender.send(sample).is_err() {
            // Receiver closed between the check and the send
            state.sender = None;
            return PushOutcome::NotSubscribed;
        }
        state.last_emitted = Some(sample);
        PushOutcome::Accepted
    }

    /// Whether a recorder is currently listening.
    pub async fn is_subscribed(&self) -> bool {
        self.state
            .lock()
            .await
            .sender
            .as_ref()
            .is_some_and(|s| !s.is_closed())
    }
}

#[async_trait]
impl LocationSource for DeviceFeed {
    async fn request_access(&self) -> Result<AccessStatus, LocationError> {
        Ok(self.state.lock().await.access)
    }

    async fn subscribe(&self, policy: SamplingPolicy) -> Result<LocationSubscription, LocationError> {
        let (tx, subscription) = LocationSubscription::channel();
        let mut state = self.state.lock().await;
        state.sender = Some(tx);
        state.policy = Some(policy);
        state.last_emitted = None;
        Ok(subscription)
    }
}
