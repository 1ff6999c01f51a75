// Test double for the ranking service

use std::collections::HashMap;
use std::sync::Mutex;

use crate::api::RankingApi;
use crate::error::{RankError, Result};
use crate::firm::{Comment, Firm, FirmDetail, FirmId, FirmType, Sentiment};
use crate::vote::{Ballot, CommentReceipt, VoteId};

/// Canned-answer `RankingApi` that records every call it receives
pub(crate) struct FakeApi {
    pub matchup_firms: Vec<Firm>,
    pub firms: Vec<Firm>,
    pub details: HashMap<FirmId, FirmDetail>,
    pub vote_id: i64,
    pub comment_receipt: CommentReceipt,
    pub fail_matchup: bool,
    pub fail_votes: bool,
    pub fail_stats: bool,
    pub fail_comments: bool,
    calls: Mutex<Vec<String>>,
}

fn offline(path: &str) -> RankError {
    RankError::Status {
        status: 503,
        path: path.to_string(),
    }
}

pub(crate) fn firm_a() -> Firm {
    Firm::new(1, "A", FirmType::HedgeFund)
}

pub(crate) fn firm_b() -> Firm {
    Firm::new(2, "B", FirmType::TradingFirm)
}

pub(crate) fn comment(text: &str, sentiment: Sentiment, other: &str) -> Comment {
    Comment {
        text: text.to_string(),
        sentiment,
        other_firm: Some(other.to_string()),
        created_at: Some("2024-05-01 12:00:00".to_string()),
    }
}

impl FakeApi {
    /// Matchup A vs B, vote id 42, A has five comments on record
    pub fn new() -> Self {
        let a = firm_a().with_record(4, 1);
        let comments = (1..=5)
            .map(|i| comment(&format!("comment {}", i), Sentiment::Picked, "B"))
            .collect();

        let mut details = HashMap::new();
        details.insert(
            a.id,
            FirmDetail {
                firm: a.clone(),
                comments,
            },
        );

        FakeApi {
            matchup_firms: vec![firm_a(), firm_b()],
            firms: vec![
                a,
                firm_b().with_record(1, 4),
                Firm::new(3, "Goldman Sachs", FirmType::GlobalBank),
            ],
            details,
            vote_id: 42,
            comment_receipt: CommentReceipt::saved(),
            fail_matchup: false,
            fail_votes: false,
            fail_stats: false,
            fail_comments: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_matchup(mut self, firms: Vec<Firm>) -> Self {
        self.matchup_firms = firms;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl RankingApi for FakeApi {
    fn matchup(&self) -> Result<Vec<Firm>> {
        self.record("matchup".to_string());
        if self.fail_matchup {
            return Err(offline("/api/matchup"));
        }
        Ok(self.matchup_firms.clone())
    }

    fn firms(&self) -> Result<Vec<Firm>> {
        self.record("firms".to_string());
        Ok(self.firms.clone())
    }

    fn firm(&self, id: FirmId) -> Result<Option<FirmDetail>> {
        self.record(format!("firm {}", id));
        if self.fail_stats {
            return Err(offline("/api/firm"));
        }
        Ok(self.details.get(&id).cloned())
    }

    fn vote(&self, ballot: &Ballot) -> Result<VoteId> {
        self.record(format!("vote {} {}", ballot.winner_id, ballot.loser_id));
        if self.fail_votes {
            return Err(offline("/api/vote"));
        }
        Ok(VoteId(self.vote_id))
    }

    fn comment(&self, vote_id: VoteId, text: &str) -> Result<CommentReceipt> {
        self.record(format!("comment {} {}", vote_id, text));
        if self.fail_comments {
            return Err(offline("/api/vote/comment"));
        }
        Ok(self.comment_receipt.clone())
    }
}
