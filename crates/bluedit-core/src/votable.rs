//! The target of a vote: either a post or a comment.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::records::{ApiComment, ApiPost, ApiVote};

/// Discriminant naming what kind of record a vote targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VotableType {
    Post,
    Comment,
}

impl VotableType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "Post",
            Self::Comment => "Comment",
        }
    }
}

impl fmt::Display for VotableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not a known votable type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVotableType(pub String);

impl fmt::Display for UnknownVotableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown votable type '{}': expected Post or Comment", self.0)
    }
}

impl std::error::Error for UnknownVotableType {}

impl FromStr for VotableType {
    type Err = UnknownVotableType;

    /// Exact match on `Post` or `Comment`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Post" => Ok(Self::Post),
            "Comment" => Ok(Self::Comment),
            other => Err(UnknownVotableType(other.to_string())),
        }
    }
}

/// A decoded vote target.
#[derive(Debug, Clone, PartialEq)]
pub enum Votable {
    Post(ApiPost),
    Comment(ApiComment),
}

impl Votable {
    pub fn kind(&self) -> VotableType {
        match self {
            Self::Post(_) => VotableType::Post,
            Self::Comment(_) => VotableType::Comment,
        }
    }

    /// Decode `raw` as the record named by `kind`.
    ///
    /// Returns `None` when the payload does not have the expected shape.
    pub fn decode(kind: VotableType, raw: &Value) -> Option<Self> {
        let decoded = match kind {
            VotableType::Post => serde_json::from_value(raw.clone()).map(Self::Post),
            VotableType::Comment => serde_json::from_value(raw.clone()).map(Self::Comment),
        };
        match decoded {
            Ok(votable) => Some(votable),
            Err(e) => {
                tracing::debug!(%kind, error = %e, "votable payload does not match its type");
                None
            }
        }
    }

    /// Guess the kind of an untagged payload from the fields it carries.
    ///
    /// A `title` means a post; a `body` without a `title` means a comment.
    pub fn infer_kind(raw: &Value) -> Option<VotableType> {
        let object = raw.as_object()?;
        if object.contains_key("title") {
            Some(VotableType::Post)
        } else if object.contains_key("body") {
            Some(VotableType::Comment)
        } else {
            None
        }
    }
}

impl ApiVote {
    /// The vote's target as a typed variant.
    ///
    /// The backend-supplied `votable_type` wins when present; structural
    /// inspection is used only when it is missing.
    pub fn votable(&self) -> Option<Votable> {
        let raw = self.votable.as_ref()?;
        let kind = match self.votable_type.as_deref() {
            Some(tag) => match tag.parse::<VotableType>() {
                Ok(kind) => kind,
                Err(e) => {
                    tracing::debug!(vote_id = %self.id, error = %e, "ignoring unknown votable type");
                    return None;
                }
            },
            None => Votable::infer_kind(raw)?,
        };
        Votable::decode(kind, raw)
    }
}
