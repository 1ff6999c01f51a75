// Vote wire types
//
// A vote is created first and only then can a comment be attached to it,
// using the id the server handed back.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::firm::FirmId;

/// Server-assigned vote identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteId(pub i64);

impl fmt::Display for VoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Body of `POST /api/vote`
///
/// The comment is always sent as `null`; rationale goes through the
/// follow-up comment endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ballot {
    pub winner_id: FirmId,
    pub loser_id: FirmId,
    pub comment: Option<String>,
}

impl Ballot {
    pub fn new(winner_id: FirmId, loser_id: FirmId) -> Self {
        Ballot {
            winner_id,
            loser_id,
            comment: None,
        }
    }
}

/// Answer of `POST /api/vote/{id}/comment`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommentReceipt {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl CommentReceipt {
    pub fn saved() -> Self {
        CommentReceipt {
            success: true,
            error: None,
            message: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        CommentReceipt {
            success: false,
            error: Some(error.into()),
            message: None,
        }
    }

    /// Human-readable failure reason
    pub fn failure_reason(&self) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| "comment was not saved".to_string())
    }
}
