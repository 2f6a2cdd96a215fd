// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Post feed assembly.
//!
//! Handles the core workflow:
//! 1. Load a page of posts (newest first)
//! 2. Batch-load the linked sessions and author profiles by distinct id
//! 3. Render each post with its session summary and author

use crate::db::{BackendClient, StoreError};
use crate::models::{Post, SessionRecord, UserProfile};
use crate::time_utils::format_hms;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Author label when no profile email is available.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// Session figures shown under a post.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionSummary {
    pub session_id: String,
    /// Absent when the stored distance is unknown
    pub distance_km: Option<f64>,
    /// `"{h}h {m}m {s}s"`, absent when the duration is unknown or not positive
    pub duration: Option<String>,
    /// True when both times are known and the end is not after the start
    pub duration_invalid: bool,
    pub avg_speed_kmh: Option<f64>,
}

impl SessionSummary {
    pub fn from_session(session: &SessionRecord) -> Self {
        let secs = session.duration_seconds();
        Self {
            session_id: session.id.clone(),
            distance_km: session.distance.map(|d| d / 1000.0),
            duration: secs.filter(|s| *s > 0.0).map(format_hms),
            duration_invalid: secs.is_some_and(|s| s <= 0.0),
            avg_speed_kmh: session.avg_speed_kmh(),
        }
    }
}

/// A post as displayed in the feed.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PostView {
    pub id: String,
    pub content: String,
    pub author: String,
    pub user_id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    /// Absent when the post has no session or it was deleted
    pub session: Option<SessionSummary>,
}

/// Load a page of the feed.
pub async fn load_feed(
    db: &BackendClient,
    limit: usize,
    offset: usize,
) -> Result<Vec<PostView>, StoreError> {
    let posts = db.list_posts(limit, offset).await?;

    let session_ids = distinct(posts.iter().filter_map(|p| p.session_id.as_deref()));
    let user_ids = distinct(posts.iter().map(|p| p.user_id.as_str()));

    let (sessions, profiles) = tokio::try_join!(
        db.sessions_by_ids(&session_ids),
        db.profiles_by_ids(&user_ids)
    )?;

    tracing::debug!(
        posts = posts.len(),
        sessions = sessions.len(),
        profiles = profiles.len(),
        "Loaded feed page"
    );

    Ok(assemble_feed(posts, &sessions, &profiles))
}

/// Join posts with their sessions and authors.
pub fn assemble_feed(
    posts: Vec<Post>,
    sessions: &[SessionRecord],
    profiles: &[UserProfile],
) -> Vec<PostView> {
    let sessions: HashMap<&str, &SessionRecord> =
        sessions.iter().map(|s| (s.id.as_str(), s)).collect();
    let emails: HashMap<&str, &str> = profiles
        .iter()
        .filter_map(|p| p.email.as_deref().map(|e| (p.id.as_str(), e)))
        .collect();

    posts
        .into_iter()
        .map(|post| {
            let session = post
                .session_id
                .as_deref()
                .and_then(|id| sessions.get(id))
                .map(|s| SessionSummary::from_session(s));
            let author = emails
                .get(post.user_id.as_str())
                .copied()
                .unwrap_or(ANONYMOUS_AUTHOR)
                .to_string();

            PostView {
                id: post.id,
                content: post.content,
                author,
                user_id: post.user_id,
                created_at: post.created_at,
                session,
            }
        })
        .collect()
}

fn distinct<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    ids.filter(|id| !id.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}
