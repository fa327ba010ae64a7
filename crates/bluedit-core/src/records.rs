//! REST record shapes returned and accepted by the upstream backend.
//!
//! Field names follow the backend's snake_case JSON. Relations are optional
//! because the backend embeds them only on some endpoints.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Identifier of an upstream record.
///
/// The backend is not consistent about emitting ids as strings or numbers,
/// so both are accepted and normalized to a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Default)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Signed(n) => Self(n.to_string()),
            Raw::Unsigned(n) => Self(n.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiUser {
    pub id: RecordId,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiPost {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub user: Option<ApiUser>,
    #[serde(default)]
    pub subbluedit: Option<Box<ApiSubbluedit>>,
    #[serde(default)]
    pub comments: Option<Vec<ApiComment>>,
    #[serde(default)]
    pub votes: Option<Vec<ApiVote>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiComment {
    pub id: RecordId,
    pub body: String,
    #[serde(default)]
    pub user: Option<ApiUser>,
    #[serde(default)]
    pub post: Option<Box<ApiPost>>,
    #[serde(default)]
    pub parent_comment: Option<Box<ApiComment>>,
    #[serde(default)]
    pub replies: Option<Vec<ApiComment>>,
    #[serde(default)]
    pub votes: Option<Vec<ApiVote>>,
}

/// A vote as the backend renders it.
///
/// `votable` is kept as raw JSON: its shape depends on `votable_type`, and
/// the backend may omit the discriminant. Use [`ApiVote::votable`] to get a
/// typed variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiVote {
    pub id: RecordId,
    pub value: i32,
    #[serde(default)]
    pub user: Option<ApiUser>,
    #[serde(default)]
    pub votable_type: Option<String>,
    #[serde(default)]
    pub votable: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSubbluedit {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub user: Option<ApiUser>,
    #[serde(default)]
    pub posts: Option<Vec<ApiPost>>,
}

/// Response of `POST /auth/google`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiAuthResponse {
    pub token: String,
    pub user: ApiUser,
}

/// Response of `POST /votes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiVoteResponse {
    pub success: bool,
}

// -- request bodies ---------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleSignIn {
    pub google_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubbluedit {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub subbluedit_name: String,
    pub title: String,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub post_id: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVote {
    pub votable_id: String,
    pub votable_type: String,
    pub value: i32,
}
