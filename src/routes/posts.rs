// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Posts and comments routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Comment, NewComment, NewPost, Post};
use crate::routes::Pagination;
use crate::services::feed::{load_feed, PostView};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/posts", get(list_posts).post(create_post))
        .route(
            "/api/posts/{id}/comments",
            get(list_comments).post(create_comment),
        )
}

// ─── Posts ───────────────────────────────────────────────────

#[derive(Serialize)]
pub struct FeedResponse {
    pub posts: Vec<PostView>,
    pub page: u32,
    pub per_page: u32,
}

async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Pagination>,
) -> Result<Json<FeedResponse>> {
    let (limit, offset) = params.limit_offset();
    let posts = load_feed(&state.backend, limit, offset).await?;

    Ok(Json(FeedResponse {
        posts,
        page: params.page(),
        per_page: params.per_page(),
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(max = 2000, message = "Content must be at most 2000 characters"))]
    pub content: String,
    /// Session being published; must belong to the caller
    pub session_id: Option<String>,
}

async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreatePostRequest>,
) -> Result<Json<Post>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let content = non_empty_content(&req.content)?;
    let session_id = req
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("Select a session to publish".to_string()))?;

    // Only the owner may publish a session
    let session = state
        .backend
        .get_session_for_user(session_id, &user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))?;

    let post = state
        .backend
        .insert_post(&NewPost {
            user_id: user.user_id.clone(),
            content,
            session_id: session.id,
            created_at: chrono::Utc::now(),
        })
        .await?;

    tracing::info!(user_id = %user.user_id, post_id = %post.id, "Post published");
    Ok(Json(post))
}

// ─── Comments ────────────────────────────────────────────────

#[derive(Serialize)]
pub struct CommentsResponse {
    pub comments: Vec<Comment>,
}

async fn ensure_post_exists(state: &AppState, post_id: &str) -> Result<()> {
    state
        .backend
        .get_post(post_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))
}

async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> Result<Json<CommentsResponse>> {
    ensure_post_exists(&state, &post_id).await?;
    let comments = state.backend.comments_for_post(&post_id).await?;
    Ok(Json(CommentsResponse { comments }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(max = 1000, message = "Comment must be at most 1000 characters"))]
    pub content: String,
}

async fn create_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(post_id): Path<String>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<Json<Comment>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let content = non_empty_content(&req.content)?;

    ensure_post_exists(&state, &post_id).await?;

    let comment = state
        .backend
        .insert_comment(&NewComment {
            post_id,
            user_id: user.user_id.clone(),
            content,
            created_at: chrono::Utc::now(),
        })
        .await?;

    Ok(Json(comment))
}

/// Trimmed content, rejecting whitespace-only input.
fn non_empty_content(raw: &str) -> Result<String> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest("Content cannot be empty".to_string()));
    }
    Ok(content.to_string())
}
