// Remote Ranking API - contract + HTTP client
//
// Endpoints:
//   GET  /api/matchup                -> { firms: [Firm, Firm] }
//   GET  /api/firms                  -> { firms: [Firm, ...] }
//   GET  /api/firm/{id}              -> { firm, comments } | 404
//   POST /api/vote                   -> { vote_id }
//   POST /api/vote/{id}/comment      -> { success, error? }

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::error::{RankError, Result};
use crate::firm::{Comment, Firm, FirmDetail, FirmId};
use crate::vote::{Ballot, CommentReceipt, VoteId};

/// Everything the client needs from the ranking service
pub trait RankingApi {
    /// A fresh random pairing; may hold fewer than two firms
    fn matchup(&self) -> Result<Vec<Firm>>;

    /// All firms with aggregate stats
    fn firms(&self) -> Result<Vec<Firm>>;

    /// Stats and comments for one firm, `None` when it does not exist
    fn firm(&self, id: FirmId) -> Result<Option<FirmDetail>>;

    fn vote(&self, ballot: &Ballot) -> Result<VoteId>;

    fn comment(&self, vote_id: VoteId, text: &str) -> Result<CommentReceipt>;
}

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
struct FirmsEnvelope {
    #[serde(default)]
    firms: Vec<Firm>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirmDetailEnvelope {
    #[serde(default)]
    firm: Option<Firm>,
    #[serde(default)]
    comments: Vec<Comment>,
}

#[derive(Debug, Deserialize)]
struct VoteEnvelope {
    #[serde(default)]
    vote_id: Option<VoteId>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct CommentRequest<'a> {
    comment: &'a str,
}

// ============================================================================
// HTTP CLIENT
// ============================================================================

pub struct HttpRankingApi {
    base: String,
    client: Client,
}

impl HttpRankingApi {
    pub fn new(base: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base = base.into().trim_end_matches('/').to_string();
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base, client })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn get(&self, path: &str) -> Result<Response> {
        let url = self.url(path);
        debug!(%url, "GET");
        Ok(self.client.get(&url).send()?)
    }

    fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<Response> {
        let url = self.url(path);
        debug!(%url, "POST");
        Ok(self.client.post(&url).json(body).send()?)
    }
}

fn expect_success(response: Response, path: &str) -> Result<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(RankError::Status {
            status: response.status().as_u16(),
            path: path.to_string(),
        })
    }
}

fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes()?;
    Ok(serde_json::from_slice(&bytes)?)
}

impl RankingApi for HttpRankingApi {
    #[instrument(skip(self), fields(base = %self.base))]
    fn matchup(&self) -> Result<Vec<Firm>> {
        let path = "/api/matchup";
        let response = self.get(path)?;

        // The service answers 400 when it cannot form a pair; that is an
        // empty matchup, not a transport failure.
        let response = if response.status() == StatusCode::BAD_REQUEST {
            response
        } else {
            expect_success(response, path)?
        };

        let envelope: FirmsEnvelope = read_json(response)?;
        if let Some(error) = &envelope.error {
            debug!(%error, "Matchup unavailable");
        }
        Ok(envelope.firms)
    }

    #[instrument(skip(self), fields(base = %self.base))]
    fn firms(&self) -> Result<Vec<Firm>> {
        let path = "/api/firms";
        let response = expect_success(self.get(path)?, path)?;
        let envelope: FirmsEnvelope = read_json(response)?;
        info!(count = envelope.firms.len(), "Fetched firms");
        Ok(envelope.firms)
    }

    #[instrument(skip(self), fields(base = %self.base))]
    fn firm(&self, id: FirmId) -> Result<Option<FirmDetail>> {
        let path = format!("/api/firm/{}", id);
        let response = self.get(&path)?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(%id, "Firm not found");
            return Ok(None);
        }

        let envelope: FirmDetailEnvelope = read_json(expect_success(response, &path)?)?;
        Ok(envelope.firm.map(|firm| FirmDetail {
            firm,
            comments: envelope.comments,
        }))
    }

    #[instrument(skip(self), fields(base = %self.base))]
    fn vote(&self, ballot: &Ballot) -> Result<VoteId> {
        let path = "/api/vote";
        let response = self.post(path, ballot)?;
        let status = response.status();

        let envelope: VoteEnvelope = read_json(response).map_err(|e| match e {
            RankError::Json(_) if !status.is_success() => RankError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            },
            other => other,
        })?;

        match envelope.vote_id {
            Some(vote_id) => {
                info!(%vote_id, winner = %ballot.winner_id, loser = %ballot.loser_id, "Vote recorded");
                Ok(vote_id)
            }
            None => Err(RankError::Rejected(
                envelope
                    .error
                    .unwrap_or_else(|| format!("no vote id in {} response", status)),
            )),
        }
    }

    #[instrument(skip(self, text), fields(base = %self.base))]
    fn comment(&self, vote_id: VoteId, text: &str) -> Result<CommentReceipt> {
        let path = format!("/api/vote/{}/comment", vote_id);
        let response = self.post(&path, &CommentRequest { comment: text })?;
        let status = response.status();

        // 400/404 carry an `{error}` body that the caller shows to the user
        match read_json::<CommentReceipt>(response) {
            Ok(receipt) => Ok(receipt),
            Err(RankError::Json(_)) if !status.is_success() => Err(RankError::Status {
                status: status.as_u16(),
                path,
            }),
            Err(e) => Err(e),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
