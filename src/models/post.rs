// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Social posts and comments on published sessions.

use crate::models::{de_id, de_opt_id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row written to the `posts` table.
#[derive(Debug, Clone, Serialize)]
pub struct NewPost {
    pub user_id: String,
    pub content: String,
    pub session_id: String,
    #[serde(serialize_with = "crate::time_utils::serialize_millis")]
    pub created_at: DateTime<Utc>,
}

/// Stored post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub user_id: String,
    pub content: String,
    /// Published session (older rows may have none)
    #[serde(default, deserialize_with = "de_opt_id")]
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row written to the `comments` table.
#[derive(Debug, Clone, Serialize)]
pub struct NewComment {
    pub post_id: String,
    pub user_id: String,
    pub content: String,
    #[serde(serialize_with = "crate::time_utils::serialize_millis")]
    pub created_at: DateTime<Utc>,
}

/// Stored comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(deserialize_with = "de_id")]
    pub post_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
