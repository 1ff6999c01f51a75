// Error taxonomy for the ranking client
//
// Transport and decoding failures come from the API layer; the vote-flow
// variants come from the controller refusing an action in its current state.

use thiserror::Error;

use crate::vote::VoteId;

#[derive(Error, Debug)]
pub enum RankError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected status {status} from {path}")]
    Status { status: u16, path: String },

    #[error("Server rejected request: {0}")]
    Rejected(String),

    #[error("Invalid vote: {0}")]
    InvalidVote(String),

    #[error("No matchup is being presented")]
    NoMatchup,

    #[error("A vote for this matchup is already in flight")]
    VoteInFlight,

    #[error("Vote {0} is not the most recent vote")]
    UnknownVote(VoteId),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RankError>;
