// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backend client with typed table operations.
//!
//! Provides high-level operations for:
//! - Sessions (finished tracking records)
//! - Posts and comments
//! - User profiles (read-only)

use crate::db::{tables, AuthProvider, Direction, Query, StoreError, TableStore};
use crate::middleware::auth::AuthUser;
use crate::models::{
    Comment, NewComment, NewPost, NewSessionRecord, Post, SessionRecord, UserProfile,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Columns needed to summarize a session without its route.
const SESSION_SUMMARY_COLUMNS: &[&str] = &["id", "user_id", "start_time", "end_time", "distance"];

/// Handle on the hosted backend: table access plus the caller's identity.
///
/// Cheap to clone; clones share the underlying store.
#[derive(Clone)]
pub struct BackendClient {
    store: Arc<dyn TableStore>,
    auth: Arc<dyn AuthProvider>,
}

impl BackendClient {
    pub fn new(store: Arc<dyn TableStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { store, auth }
    }

    /// Same store, different caller identity.
    pub fn with_auth(&self, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            store: self.store.clone(),
            auth,
        }
    }

    // ─── Generic Operations ──────────────────────────────────────

    pub async fn current_user(&self) -> Result<Option<AuthUser>, StoreError> {
        self.auth.current_user().await
    }

    pub async fn insert<T: Serialize>(&self, table: &str, record: &T) -> Result<Value, StoreError> {
        let value = serde_json::to_value(record).map_err(|e| StoreError::Decode(e.to_string()))?;
        self.store.insert(table, value).await
    }

    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<Vec<T>, StoreError> {
        self.store
            .select(table, query)
            .await?
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| StoreError::Decode(e.to_string())))
            .collect()
    }

    pub async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        self.store.delete(table, id).await
    }

    // ─── Session Operations ──────────────────────────────────────

    /// Store a finished session; returns the id the backend assigned.
    pub async fn insert_session(&self, record: &NewSessionRecord) -> Result<String, StoreError> {
        let row = self.insert(tables::SESSIONS, record).await?;
        row_id(&row)
    }

    /// Sessions owned by a user, newest first, without their routes.
    pub async fn sessions_for_user(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SessionRecord>, StoreError> {
        let query = Query::new()
            .columns(SESSION_SUMMARY_COLUMNS)
            .eq("user_id", user_id)
            .order_by("start_time", Direction::Descending)
            .limit(limit)
            .offset(offset);
        self.select(tables::SESSIONS, &query).await
    }

    /// All of a user's sessions (for stats), without routes.
    pub async fn all_sessions_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<SessionRecord>, StoreError> {
        let query = Query::new()
            .columns(SESSION_SUMMARY_COLUMNS)
            .eq("user_id", user_id)
            .order_by("start_time", Direction::Descending);
        self.select(tables::SESSIONS, &query).await
    }

    /// A session by id if it belongs to the given user.
    pub async fn get_session_for_user(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let query = Query::new()
            .eq("id", session_id)
            .eq("user_id", user_id)
            .limit(1);
        Ok(self
            .select::<SessionRecord>(tables::SESSIONS, &query)
            .await?
            .into_iter()
            .next())
    }

    /// Summaries for a set of session ids (any owner).
    pub async fn sessions_by_ids(&self, ids: &[String]) -> Result<Vec<SessionRecord>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::new()
            .columns(SESSION_SUMMARY_COLUMNS)
            .in_list("id", ids.iter().cloned());
        self.select(tables::SESSIONS, &query).await
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<(), StoreError> {
        self.delete(tables::SESSIONS, session_id).await
    }

    // ─── Post Operations ─────────────────────────────────────────

    pub async fn insert_post(&self, post: &NewPost) -> Result<Post, StoreError> {
        let row = self.insert(tables::POSTS, post).await?;
        serde_json::from_value(row).map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// All posts, newest first.
    pub async fn list_posts(&self, limit: usize, offset: usize) -> Result<Vec<Post>, StoreError> {
        let query = Query::new()
            .order_by("created_at", Direction::Descending)
            .limit(limit)
            .offset(offset);
        self.select(tables::POSTS, &query).await
    }

    pub async fn get_post(&self, post_id: &str) -> Result<Option<Post>, StoreError> {
        let query = Query::new().eq("id", post_id).limit(1);
        Ok(self
            .select::<Post>(tables::POSTS, &query)
            .await?
            .into_iter()
            .next())
    }

    // ─── Comment Operations ──────────────────────────────────────

    pub async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, StoreError> {
        let row = self.insert(tables::COMMENTS, comment).await?;
        serde_json::from_value(row).map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Comments on a post, oldest first.
    pub async fn comments_for_post(&self, post_id: &str) -> Result<Vec<Comment>, StoreError> {
        let query = Query::new()
            .eq("post_id", post_id)
            .order_by("created_at", Direction::Ascending);
        self.select(tables::COMMENTS, &query).await
    }

    // ─── Profile Operations ──────────────────────────────────────

    pub async fn profiles_by_ids(&self, ids: &[String]) -> Result<Vec<UserProfile>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::new()
            .columns(&["id", "email"])
            .in_list("id", ids.iter().cloned());
        self.select(tables::USER_PROFILES, &query).await
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(self
            .profiles_by_ids(&[user_id.to_string()])
            .await?
            .into_iter()
            .next())
    }
}

/// Extract the `id` of an inserted row, whether it is a uuid string or a serial.
fn row_id(row: &Value) -> Result<String, StoreError> {
    match row.get("id") {
        Some(Value::String(id)) => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(StoreError::Decode("Inserted row has no id".to_string())),
    }
}
