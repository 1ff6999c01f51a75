// 🗳️ Matchup-Vote Controller
//
// One state value, owned by the controller, drives the whole vote flow:
//
//   Idle/Result/Unavailable ──request_matchup──▶ Loading ──▶ Presenting
//   Presenting ──cast_vote──▶ Submitting ──▶ Result ──▶ (comment saga)
//
// Network effects are returned as `Command`s tagged with a `Ticket`. Their
// outcomes come back as `Completion`s and are applied only if the state is
// still waiting on that exact ticket, so a slow answer to an abandoned
// request can never overwrite newer state.

use std::mem;
use tracing::{debug, info, warn};

use crate::api::RankingApi;
use crate::error::{RankError, Result};
use crate::firm::{Firm, FirmDetail, FirmId, Matchup, Side};
use crate::vote::{Ballot, CommentReceipt, VoteId};

pub const DEFAULT_RECENT_COMMENTS: usize = 3;

// ============================================================================
// TICKETS, COMMANDS, COMPLETIONS
// ============================================================================

/// Identifies one outstanding request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// A network effect the controller wants performed
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchMatchup { ticket: Ticket },
    SubmitVote { ticket: Ticket, ballot: Ballot },
    FetchStats { ticket: Ticket, firm_id: FirmId },
    AttachComment { ticket: Ticket, vote_id: VoteId, text: String },
}

/// The outcome of a `Command`, carrying the same ticket
#[derive(Debug)]
pub enum Completion {
    Matchup { ticket: Ticket, result: Result<Vec<Firm>> },
    Vote { ticket: Ticket, result: Result<VoteId> },
    Stats { ticket: Ticket, result: Result<Option<FirmDetail>> },
    Comment { ticket: Ticket, text: String, result: Result<CommentReceipt> },
}

impl Command {
    /// Perform the request against the API
    pub fn execute(self, api: &dyn RankingApi) -> Completion {
        match self {
            Command::FetchMatchup { ticket } => Completion::Matchup {
                ticket,
                result: api.matchup(),
            },
            Command::SubmitVote { ticket, ballot } => Completion::Vote {
                ticket,
                result: api.vote(&ballot),
            },
            Command::FetchStats { ticket, firm_id } => Completion::Stats {
                ticket,
                result: api.firm(firm_id),
            },
            Command::AttachComment {
                ticket,
                vote_id,
                text,
            } => {
                let result = api.comment(vote_id, &text);
                Completion::Comment {
                    ticket,
                    text,
                    result,
                }
            }
        }
    }
}

impl Completion {
    pub fn ticket(&self) -> Ticket {
        match self {
            Completion::Matchup { ticket, .. }
            | Completion::Vote { ticket, .. }
            | Completion::Stats { ticket, .. }
            | Completion::Comment { ticket, .. } => *ticket,
        }
    }
}

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum UnavailableReason {
    /// The service could not form a pair of distinct firms
    NotEnoughFirms,
    /// The matchup request failed
    Transport(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatsPhase {
    Loading { ticket: Ticket },
    Ready(FirmDetail),
    /// Fetch failed or firm vanished; names are still shown
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommentPhase {
    Closed,
    Editing {
        draft: String,
        notice: Option<String>,
    },
    /// Comment sent, waiting for the server
    Pending { text: String, ticket: Ticket },
    Submitted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoteResult {
    pub vote_id: VoteId,
    pub winner: Firm,
    pub loser: Firm,
    pub stats: StatsPhase,
    pub comment: CommentPhase,
}

impl VoteResult {
    /// Winner stats, when they arrived
    pub fn winner_stats(&self) -> Option<&FirmDetail> {
        match &self.stats {
            StatsPhase::Ready(detail) => Some(detail),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VoteState {
    /// Nothing requested yet
    Idle,
    Loading { ticket: Ticket },
    /// Empty/error presentation with a retry prompt
    Unavailable { reason: UnavailableReason },
    Presenting {
        matchup: Matchup,
        notice: Option<String>,
    },
    Submitting {
        matchup: Matchup,
        ballot: Ballot,
        ticket: Ticket,
    },
    Result(VoteResult),
}

impl VoteState {
    pub fn name(&self) -> &'static str {
        match self {
            VoteState::Idle => "idle",
            VoteState::Loading { .. } => "loading",
            VoteState::Unavailable { .. } => "unavailable",
            VoteState::Presenting { .. } => "presenting",
            VoteState::Submitting { .. } => "submitting",
            VoteState::Result(_) => "result",
        }
    }

    pub fn matchup(&self) -> Option<&Matchup> {
        match self {
            VoteState::Presenting { matchup, .. } | VoteState::Submitting { matchup, .. } => {
                Some(matchup)
            }
            _ => None,
        }
    }

    // ------------------------------------------------------------------------
    // Pure transitions: (state, input) -> state
    // ------------------------------------------------------------------------

    fn on_matchup(self, ticket: Ticket, result: Result<Vec<Firm>>) -> (Self, bool) {
        match self {
            VoteState::Loading { ticket: expected } if expected == ticket => {
                let next = match result {
                    Ok(firms) => match Matchup::from_firms(firms) {
                        Some(matchup) => VoteState::Presenting {
                            matchup,
                            notice: None,
                        },
                        None => VoteState::Unavailable {
                            reason: UnavailableReason::NotEnoughFirms,
                        },
                    },
                    Err(e) => {
                        warn!(error = %e, "Matchup request failed");
                        VoteState::Unavailable {
                            reason: UnavailableReason::Transport(e.to_string()),
                        }
                    }
                };
                (next, true)
            }
            other => (other, false),
        }
    }

    fn on_vote(self, ticket: Ticket, result: Result<VoteId>, stats_ticket: Ticket) -> (Self, bool) {
        match self {
            VoteState::Submitting {
                matchup,
                ballot,
                ticket: expected,
            } if expected == ticket => {
                let next = match result {
                    Ok(vote_id) => {
                        let winner = matchup.find(ballot.winner_id).cloned();
                        let loser = matchup.find(ballot.loser_id).cloned();
                        match (winner, loser) {
                            (Some(winner), Some(loser)) => VoteState::Result(VoteResult {
                                vote_id,
                                winner,
                                loser,
                                stats: StatsPhase::Loading {
                                    ticket: stats_ticket,
                                },
                                comment: CommentPhase::Closed,
                            }),
                            _ => VoteState::Presenting {
                                matchup,
                                notice: Some("vote referred to a firm outside the matchup".to_string()),
                            },
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Vote submission failed");
                        VoteState::Presenting {
                            matchup,
                            notice: Some(format!("Vote not recorded: {}", e)),
                        }
                    }
                };
                (next, true)
            }
            other => (other, false),
        }
    }

    fn on_stats(
        self,
        ticket: Ticket,
        result: Result<Option<FirmDetail>>,
        recent_comments: usize,
    ) -> (Self, bool) {
        match self {
            VoteState::Result(mut outcome)
                if outcome.stats == (StatsPhase::Loading { ticket }) =>
            {
                outcome.stats = match result {
                    Ok(Some(mut detail)) => {
                        detail.comments = detail.recent_comments(recent_comments).to_vec();
                        StatsPhase::Ready(detail)
                    }
                    Ok(None) => {
                        warn!(firm = %outcome.winner.id, "Winner stats not found");
                        StatsPhase::Unavailable
                    }
                    Err(e) => {
                        warn!(error = %e, "Winner stats request failed");
                        StatsPhase::Unavailable
                    }
                };
                (VoteState::Result(outcome), true)
            }
            other => (other, false),
        }
    }

    fn on_comment(self, ticket: Ticket, text: String, result: Result<CommentReceipt>) -> (Self, bool) {
        match self {
            VoteState::Result(mut outcome)
                if matches!(&outcome.comment, CommentPhase::Pending { ticket: t, .. } if *t == ticket) =>
            {
                outcome.comment = match result {
                    Ok(receipt) if receipt.success => {
                        info!(vote_id = %outcome.vote_id, "Comment saved");
                        CommentPhase::Submitted
                    }
                    Ok(receipt) => {
                        warn!(vote_id = %outcome.vote_id, reason = %receipt.failure_reason(), "Comment rejected");
                        CommentPhase::Editing {
                            draft: text,
                            notice: Some(receipt.failure_reason()),
                        }
                    }
                    Err(e) => {
                        warn!(vote_id = %outcome.vote_id, error = %e, "Comment request failed");
                        CommentPhase::Editing {
                            draft: text,
                            notice: Some(e.to_string()),
                        }
                    }
                };
                (VoteState::Result(outcome), true)
            }
            other => (other, false),
        }
    }
}

// ============================================================================
// CONTROLLER
// ============================================================================

pub struct MatchupController {
    state: VoteState,
    next_ticket: u64,
    recent_comments: usize,
}

impl MatchupController {
    pub fn new(recent_comments: usize) -> Self {
        MatchupController {
            state: VoteState::Idle,
            next_ticket: 0,
            recent_comments,
        }
    }

    pub fn state(&self) -> &VoteState {
        &self.state
    }

    /// Vote id from the most recent successful vote, while its result is shown
    pub fn held_vote(&self) -> Option<VoteId> {
        match &self.state {
            VoteState::Result(outcome) => Some(outcome.vote_id),
            _ => None,
        }
    }

    /// Voting is disabled while a vote is in flight
    pub fn can_vote(&self) -> bool {
        matches!(self.state, VoteState::Presenting { .. })
    }

    fn issue_ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        Ticket(self.next_ticket)
    }

    /// Ask for a new pair. Also serves "skip" and "next matchup".
    ///
    /// Refused while a vote is in flight; any other outstanding request is
    /// abandoned and its answer will be discarded.
    pub fn request_matchup(&mut self) -> Result<Command> {
        if let VoteState::Submitting { .. } = self.state {
            return Err(RankError::VoteInFlight);
        }
        let ticket = self.issue_ticket();
        debug!(from = self.state.name(), "Requesting matchup");
        self.state = VoteState::Loading { ticket };
        Ok(Command::FetchMatchup { ticket })
    }

    pub fn cast_vote(&mut self, winner_id: FirmId, loser_id: FirmId) -> Result<Command> {
        if winner_id == loser_id {
            return Err(RankError::InvalidVote(format!(
                "winner and loser are both firm {}",
                winner_id
            )));
        }

        let matchup = match &self.state {
            VoteState::Presenting { matchup, .. } => matchup.clone(),
            VoteState::Submitting { .. } => return Err(RankError::VoteInFlight),
            _ => return Err(RankError::NoMatchup),
        };

        for id in [winner_id, loser_id] {
            if !matchup.contains(id) {
                return Err(RankError::InvalidVote(format!(
                    "firm {} is not part of the current matchup",
                    id
                )));
            }
        }

        let ticket = self.issue_ticket();
        let ballot = Ballot::new(winner_id, loser_id);
        self.state = VoteState::Submitting {
            matchup,
            ballot: ballot.clone(),
            ticket,
        };
        Ok(Command::SubmitVote { ticket, ballot })
    }

    /// Vote for the firm on one side of the current matchup
    pub fn pick(&mut self, side: Side) -> Result<Command> {
        let (winner, loser) = match self.state.matchup() {
            Some(matchup) => {
                let other = match side {
                    Side::Left => Side::Right,
                    Side::Right => Side::Left,
                };
                (matchup.firm(side).id, matchup.firm(other).id)
            }
            None => return Err(RankError::NoMatchup),
        };
        self.cast_vote(winner, loser)
    }

    /// Send a comment for the held vote.
    ///
    /// No-op (no request) when no vote is held or the text is blank. Each
    /// call with text issues a new request; only the latest answer counts.
    pub fn attach_comment(&mut self, vote_id: VoteId, text: &str) -> Result<Option<Command>> {
        let text = text.trim();
        let Some(held) = self.held_vote() else {
            debug!(%vote_id, "No vote held, ignoring comment");
            return Ok(None);
        };
        if text.is_empty() {
            return Ok(None);
        }
        if held != vote_id {
            return Err(RankError::UnknownVote(vote_id));
        }

        let ticket = self.issue_ticket();
        if let VoteState::Result(outcome) = &mut self.state {
            outcome.comment = CommentPhase::Pending {
                text: text.to_string(),
                ticket,
            };
        }
        Ok(Some(Command::AttachComment {
            ticket,
            vote_id,
            text: text.to_string(),
        }))
    }

    pub fn open_comment(&mut self) {
        if let VoteState::Result(outcome) = &mut self.state {
            if outcome.comment == CommentPhase::Closed {
                outcome.comment = CommentPhase::Editing {
                    draft: String::new(),
                    notice: None,
                };
            }
        }
    }

    pub fn update_draft(&mut self, text: &str) {
        if let VoteState::Result(outcome) = &mut self.state {
            if let CommentPhase::Editing { draft, .. } = &mut outcome.comment {
                *draft = text.to_string();
            }
        }
    }

    pub fn close_comment(&mut self) {
        if let VoteState::Result(outcome) = &mut self.state {
            if let CommentPhase::Editing { .. } = outcome.comment {
                outcome.comment = CommentPhase::Closed;
            }
        }
    }

    /// Send whatever is in the open comment box
    pub fn submit_draft(&mut self) -> Result<Option<Command>> {
        let (vote_id, draft) = match &self.state {
            VoteState::Result(VoteResult {
                vote_id,
                comment: CommentPhase::Editing { draft, .. },
                ..
            }) => (*vote_id, draft.clone()),
            _ => return Ok(None),
        };
        self.attach_comment(vote_id, &draft)
    }

    /// Apply a finished request. Returns a follow-up command, if any.
    pub fn complete(&mut self, completion: Completion) -> Option<Command> {
        let ticket = completion.ticket();
        let is_vote = matches!(completion, Completion::Vote { .. });
        let state = mem::replace(&mut self.state, VoteState::Idle);

        let (next, applied) = match completion {
            Completion::Matchup { result, .. } => state.on_matchup(ticket, result),
            Completion::Vote { result, .. } => {
                let stats_ticket = self.issue_ticket();
                state.on_vote(ticket, result, stats_ticket)
            }
            Completion::Stats { result, .. } => state.on_stats(ticket, result, self.recent_comments),
            Completion::Comment { text, result, .. } => state.on_comment(ticket, text, result),
        };
        self.state = next;

        if !applied {
            debug!(?ticket, state = self.state.name(), "Discarding stale response");
            return None;
        }
        if !is_vote {
            return None;
        }

        // A vote that just landed goes on to fetch the winner's stats
        match &self.state {
            VoteState::Result(VoteResult {
                winner,
                stats: StatsPhase::Loading { ticket: stats_ticket },
                ..
            }) => Some(Command::FetchStats {
                ticket: *stats_ticket,
                firm_id: winner.id,
            }),
            _ => None,
        }
    }

    /// Run a command and any follow-ups to completion, synchronously
    pub fn drive(&mut self, command: Command, api: &dyn RankingApi) {
        let mut pending = Some(command);
        while let Some(command) = pending.take() {
            pending = self.complete(command.execute(api));
        }
    }
}

impl Default for MatchupController {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_COMMENTS)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{firm_a, firm_b, FakeApi};
    use crate::vote::CommentReceipt;

    fn presenting(api: &FakeApi) -> MatchupController {
        let mut controller = MatchupController::default();
        let command = controller.request_matchup().unwrap();
        controller.drive(command, api);
        assert_eq!(controller.state().name(), "presenting");
        controller
    }

    fn voted(api: &FakeApi) -> MatchupController {
        let mut controller = presenting(api);
        let command = controller.cast_vote(FirmId(1), FirmId(2)).unwrap();
        controller.drive(command, api);
        controller
    }

    fn result(controller: &MatchupController) -> &VoteResult {
        match controller.state() {
            VoteState::Result(outcome) => outcome,
            other => panic!("expected result, got {:?}", other),
        }
    }

    #[test]
    fn test_request_matchup_presents_pair() {
        let api = FakeApi::new();
        let controller = presenting(&api);

        let matchup = controller.state().matchup().unwrap();
        assert_eq!(matchup.left().name, "A");
        assert_eq!(matchup.right().name, "B");
        assert!(controller.can_vote());
    }

    #[test]
    fn test_single_firm_is_not_enough() {
        let api = FakeApi::new().with_matchup(vec![firm_a()]);
        let mut controller = MatchupController::default();
        let command = controller.request_matchup().unwrap();
        controller.drive(command, &api);

        assert_eq!(
            controller.state(),
            &VoteState::Unavailable {
                reason: UnavailableReason::NotEnoughFirms
            }
        );
        assert!(controller.state().matchup().is_none());

        // Retry is a plain new request
        assert!(controller.request_matchup().is_ok());
        assert_eq!(api.count("matchup"), 1);
    }

    #[test]
    fn test_matchup_transport_failure() {
        let mut api = FakeApi::new();
        api.fail_matchup = true;
        let mut controller = MatchupController::default();
        let command = controller.request_matchup().unwrap();
        controller.drive(command, &api);

        assert!(matches!(
            controller.state(),
            VoteState::Unavailable {
                reason: UnavailableReason::Transport(_)
            }
        ));
    }

    #[test]
    fn test_vote_same_firm_rejected() {
        let api = FakeApi::new();
        let mut controller = presenting(&api);

        let err = controller.cast_vote(FirmId(1), FirmId(1)).unwrap_err();
        assert!(matches!(err, RankError::InvalidVote(_)));
        assert_eq!(controller.state().name(), "presenting");
        assert_eq!(api.count("vote"), 0);
    }

    #[test]
    fn test_vote_outside_matchup_rejected() {
        let api = FakeApi::new();
        let mut controller = presenting(&api);

        let err = controller.cast_vote(FirmId(1), FirmId(3)).unwrap_err();
        assert!(matches!(err, RankError::InvalidVote(_)));
        assert!(controller.can_vote());
    }

    #[test]
    fn test_vote_without_matchup_rejected() {
        let mut controller = MatchupController::default();
        let err = controller.cast_vote(FirmId(1), FirmId(2)).unwrap_err();

        assert!(matches!(err, RankError::NoMatchup));
    }

    #[test]
    fn test_vote_disabled_while_in_flight() {
        let api = FakeApi::new();
        let mut controller = presenting(&api);

        let first = controller.cast_vote(FirmId(1), FirmId(2)).unwrap();
        assert!(!controller.can_vote());
        assert!(matches!(
            controller.cast_vote(FirmId(1), FirmId(2)),
            Err(RankError::VoteInFlight)
        ));
        assert!(matches!(controller.pick(Side::Right), Err(RankError::VoteInFlight)));

        controller.drive(first, &api);
        assert_eq!(api.count("vote"), 1);
    }

    #[test]
    fn test_request_matchup_forbidden_while_submitting() {
        let api = FakeApi::new();
        let mut controller = presenting(&api);
        let _vote = controller.cast_vote(FirmId(1), FirmId(2)).unwrap();

        assert!(matches!(controller.request_matchup(), Err(RankError::VoteInFlight)));
        assert_eq!(controller.state().name(), "submitting");
    }

    #[test]
    fn test_vote_then_stats() {
        let api = FakeApi::new();
        let controller = voted(&api);
        let outcome = result(&controller);

        assert_eq!(outcome.vote_id, VoteId(42));
        assert_eq!(outcome.winner.name, "A");
        assert_eq!(outcome.loser.name, "B");

        let stats = outcome.winner_stats().unwrap();
        assert_eq!(stats.firm.wins, 4);
        // Five on record, three shown
        assert_eq!(stats.comments.len(), DEFAULT_RECENT_COMMENTS);
        assert_eq!(api.calls(), vec!["matchup", "vote 1 2", "firm 1"]);
    }

    #[test]
    fn test_pick_right_side() {
        let api = FakeApi::new();
        let mut controller = presenting(&api);
        let command = controller.pick(Side::Right).unwrap();

        match &command {
            Command::SubmitVote { ballot, .. } => {
                assert_eq!(ballot.winner_id, firm_b().id);
                assert_eq!(ballot.loser_id, firm_a().id);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_vote_failure_returns_to_presenting() {
        let mut api = FakeApi::new();
        api.fail_votes = true;
        let mut controller = presenting(&api);
        let command = controller.cast_vote(FirmId(1), FirmId(2)).unwrap();
        controller.drive(command, &api);

        match controller.state() {
            VoteState::Presenting { matchup, notice } => {
                assert_eq!(matchup.left().name, "A");
                assert!(notice.as_deref().unwrap().starts_with("Vote not recorded"));
            }
            other => panic!("unexpected state {:?}", other),
        }
        assert!(controller.can_vote());
        assert_eq!(controller.held_vote(), None);
    }

    #[test]
    fn test_stats_failure_keeps_partial_result() {
        let mut api = FakeApi::new();
        api.fail_stats = true;
        let controller = voted(&api);
        let outcome = result(&controller);

        assert_eq!(outcome.winner.name, "A");
        assert_eq!(outcome.loser.name, "B");
        assert_eq!(outcome.stats, StatsPhase::Unavailable);
        assert_eq!(controller.held_vote(), Some(VoteId(42)));
    }

    #[test]
    fn test_comment_before_vote_is_noop() {
        let api = FakeApi::new();
        let mut controller = presenting(&api);

        let command = controller.attach_comment(VoteId(42), "Great culture").unwrap();
        assert!(command.is_none());
        assert_eq!(api.count("comment"), 0);

        let mut fresh = MatchupController::default();
        assert!(fresh.attach_comment(VoteId(1), "hi").unwrap().is_none());
    }

    #[test]
    fn test_blank_comment_issues_no_request() {
        let api = FakeApi::new();
        let mut controller = voted(&api);

        assert!(controller.attach_comment(VoteId(42), "").unwrap().is_none());
        assert!(controller.attach_comment(VoteId(42), "   \n\t").unwrap().is_none());
        assert_eq!(result(&controller).comment, CommentPhase::Closed);
        assert_eq!(api.count("comment"), 0);
    }

    #[test]
    fn test_comment_with_wrong_vote_id() {
        let api = FakeApi::new();
        let mut controller = voted(&api);

        let err = controller.attach_comment(VoteId(41), "Great culture").unwrap_err();
        assert!(matches!(err, RankError::UnknownVote(VoteId(41))));
    }

    #[test]
    fn test_vote_then_comment_saved() {
        let api = FakeApi::new();
        let mut controller = voted(&api);

        let command = controller
            .attach_comment(VoteId(42), "Great culture")
            .unwrap()
            .unwrap();
        assert!(matches!(
            result(&controller).comment,
            CommentPhase::Pending { .. }
        ));

        controller.drive(command, &api);
        assert_eq!(result(&controller).comment, CommentPhase::Submitted);
        assert_eq!(api.count("comment 42 Great culture"), 1);
    }

    #[test]
    fn test_comment_text_is_trimmed() {
        let api = FakeApi::new();
        let mut controller = voted(&api);
        let command = controller
            .attach_comment(VoteId(42), "  Great culture \n")
            .unwrap()
            .unwrap();

        match command {
            Command::AttachComment { text, .. } => assert_eq!(text, "Great culture"),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_comment_twice_sends_twice() {
        let api = FakeApi::new();
        let mut controller = voted(&api);

        let first = controller.attach_comment(VoteId(42), "one").unwrap().unwrap();
        let second = controller.attach_comment(VoteId(42), "two").unwrap().unwrap();
        controller.drive(first, &api);
        controller.drive(second, &api);

        assert_eq!(api.count("comment"), 2);
        assert_eq!(result(&controller).comment, CommentPhase::Submitted);
    }

    #[test]
    fn test_comment_rejected_keeps_box_open() {
        let mut api = FakeApi::new();
        api.comment_receipt = CommentReceipt::failed("Vote not found");
        let mut controller = voted(&api);
        controller.open_comment();
        controller.update_draft("Great culture");

        let command = controller.submit_draft().unwrap().unwrap();
        controller.drive(command, &api);

        assert_eq!(
            result(&controller).comment,
            CommentPhase::Editing {
                draft: "Great culture".to_string(),
                notice: Some("Vote not found".to_string()),
            }
        );
    }

    #[test]
    fn test_comment_transport_failure_keeps_draft() {
        let mut api = FakeApi::new();
        api.fail_comments = true;
        let mut controller = voted(&api);
        let command = controller.attach_comment(VoteId(42), "Great culture").unwrap().unwrap();
        controller.drive(command, &api);

        match &result(&controller).comment {
            CommentPhase::Editing { draft, notice } => {
                assert_eq!(draft, "Great culture");
                assert!(notice.is_some());
            }
            other => panic!("unexpected comment phase {:?}", other),
        }
    }

    #[test]
    fn test_comment_box_open_close() {
        let api = FakeApi::new();
        let mut controller = voted(&api);

        controller.open_comment();
        controller.update_draft("draft");
        assert!(matches!(result(&controller).comment, CommentPhase::Editing { .. }));

        controller.close_comment();
        assert_eq!(result(&controller).comment, CommentPhase::Closed);
        assert!(controller.submit_draft().unwrap().is_none());
    }

    #[test]
    fn test_stale_matchup_response_discarded() {
        let api = FakeApi::new();
        let mut controller = MatchupController::default();

        let stale = controller.request_matchup().unwrap();
        let fresh = controller.request_matchup().unwrap();

        // The abandoned request answers first with a single firm
        let one_firm = FakeApi::new().with_matchup(vec![firm_a()]);
        assert!(controller.complete(stale.execute(&one_firm)).is_none());
        assert_eq!(controller.state().name(), "loading");

        controller.drive(fresh, &api);
        assert_eq!(controller.state().name(), "presenting");
    }

    #[test]
    fn test_late_stats_after_next_matchup_discarded() {
        let api = FakeApi::new();
        let mut controller = presenting(&api);
        let vote = controller.cast_vote(FirmId(1), FirmId(2)).unwrap();
        let stats = controller.complete(vote.execute(&api)).unwrap();

        // User moves on before the stats arrive
        let next = controller.request_matchup().unwrap();
        assert!(controller.complete(stats.execute(&api)).is_none());
        assert_eq!(controller.state().name(), "loading");

        controller.drive(next, &api);
        assert_eq!(controller.state().name(), "presenting");
        assert_eq!(controller.held_vote(), None);
    }

    #[test]
    fn test_late_comment_after_next_matchup_discarded() {
        let api = FakeApi::new();
        let mut controller = voted(&api);
        let comment = controller
            .attach_comment(VoteId(42), "Great culture")
            .unwrap()
            .unwrap();

        // User moves on while the comment is still pending
        let next = controller.request_matchup().unwrap();
        assert!(controller.complete(comment.execute(&api)).is_none());
        assert_eq!(controller.state().name(), "loading");
        assert_eq!(api.count("comment"), 1);

        controller.drive(next, &api);
        assert_eq!(controller.state().name(), "presenting");
        assert_eq!(controller.held_vote(), None);
    }

    #[test]
    fn test_next_matchup_after_result() {
        let api = FakeApi::new();
        let mut controller = voted(&api);

        let command = controller.request_matchup().unwrap();
        assert_eq!(controller.held_vote(), None);
        controller.drive(command, &api);

        assert!(controller.can_vote());
        assert_eq!(api.count("matchup"), 2);
    }
}
