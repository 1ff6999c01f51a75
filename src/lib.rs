// QuantRank - head-to-head rankings for quant firms
// Core library: ranking API client, vote controller, read-side views

pub mod api;
pub mod browse;
pub mod careers;
pub mod config;
pub mod controller;
pub mod error;
pub mod firm;
pub mod vote;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use api::{HttpRankingApi, RankingApi};
pub use browse::{list_firms, load_firm, FirmView};
pub use careers::CareerRegistry;
pub use config::ClientConfig;
pub use controller::{
    Command, CommentPhase, Completion, MatchupController, StatsPhase, Ticket,
    UnavailableReason, VoteResult, VoteState,
};
pub use error::{RankError, Result};
pub use firm::{
    filter_firms, win_rate, CategoryFilter, Comment, Firm, FirmDetail, FirmId, FirmType,
    Matchup, Sentiment, Side, WinRateTier,
};
pub use vote::{Ballot, CommentReceipt, VoteId};
pub use worker::{Dispatcher, Job, Outcome, SharedApi};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
