//! User profile model.

use crate::models::de_id;
use serde::{Deserialize, Serialize};

/// Public profile row from `user_profiles`, maintained by the hosted backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Auth user id (same as the JWT subject)
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    /// Email address, if the user shared one
    #[serde(default)]
    pub email: Option<String>,
}
