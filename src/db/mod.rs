//! Database layer: a generic table store plus typed operations on top.
//!
//! The hosted backend is consumed through two seams:
//! - [`TableStore`]: row insert/select/delete on named tables
//! - [`AuthProvider`]: who the current caller is
//!
//! [`BackendClient`] bundles both and is what services take as a dependency.

pub mod memory;
pub mod query;
pub mod records;
pub mod rest;

pub use memory::MemoryStore;
pub use query::{Direction, Filter, Order, Query};
pub use records::BackendClient;
pub use rest::RestStore;

use crate::middleware::auth::AuthUser;
use async_trait::async_trait;
use serde_json::Value;

/// Table names as constants.
pub mod tables {
    pub const SESSIONS: &str = "sessions";
    pub const POSTS: &str = "posts";
    pub const COMMENTS: &str = "comments";
    pub const USER_PROFILES: &str = "user_profiles";
}

/// Errors from the table store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// The backend rejected the request; message is passed through verbatim.
    #[error("{0}")]
    Backend(String),

    #[error("Backend unreachable: {0}")]
    Transport(String),

    #[error("Unexpected row shape: {0}")]
    Decode(String),
}

impl StoreError {
    /// Message suitable for showing to the user.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Row-level access to the hosted backend's tables.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Insert one row and return it as stored (with its assigned `id`).
    async fn insert(&self, table: &str, record: Value) -> Result<Value, StoreError>;

    /// Select rows matching a query.
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, StoreError>;

    /// Delete the row with the given `id`. Deleting a missing row is not an error.
    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError>;
}

/// Resolves the authenticated caller.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn current_user(&self) -> Result<Option<AuthUser>, StoreError>;
}

/// Auth provider with a fixed answer, bound from a verified request token.
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    user: Option<AuthUser>,
}

impl StaticAuth {
    pub fn signed_in(user: AuthUser) -> Self {
        Self { user: Some(user) }
    }

    pub fn signed_out() -> Self {
        Self { user: None }
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn current_user(&self) -> Result<Option<AuthUser>, StoreError> {
        Ok(self.user.clone())
    }
}
