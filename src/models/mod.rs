// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod post;
pub mod sample;
pub mod session;
pub mod stats;
pub mod user;

pub use post::{Comment, NewComment, NewPost, Post};
pub use sample::CoordinateSample;
pub use session::{NewSessionRecord, SessionRecord};
pub use stats::SessionStats;
pub use user::UserProfile;

use serde::{Deserialize, Deserializer};

/// Row ids come back as strings (uuid) or integers (serial) depending on the table.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Str(String),
    Int(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Str(s) => s,
            RawId::Int(n) => n.to_string(),
        }
    }
}

pub(crate) fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

pub(crate) fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawId>::deserialize(deserializer).map(|raw| raw.map(String::from))
}
