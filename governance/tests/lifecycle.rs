//! End-to-end proposal lifecycle against the in-memory store.

use std::sync::Arc;

use mirror_governance::{
    ClosedReason, GovernanceError, GovernanceParams, ProposalDraft, ProposalLifecycle,
    ProposalStatus, VoteChoice, VotingEngine,
};
use mirror_nullables::{NullClock, NullGovernanceStore};
use mirror_types::{ProposalId, Timestamp, UserId};

const START: u64 = 1_700_000_000;
const DAY: u64 = 24 * 3600;

struct Harness {
    store: Arc<NullGovernanceStore>,
    clock: Arc<NullClock>,
    engine: VotingEngine,
}

impl Harness {
    fn new() -> Self {
        Self::with_params(GovernanceParams::default())
    }

    fn with_params(params: GovernanceParams) -> Self {
        let store = Arc::new(NullGovernanceStore::new());
        let clock = Arc::new(NullClock::new(START));
        let lifecycle = ProposalLifecycle::new(store.clone(), clock.clone(), params);
        Self {
            store,
            clock,
            engine: VotingEngine::new(Arc::new(lifecycle)),
        }
    }

    fn lifecycle(&self) -> &ProposalLifecycle {
        self.engine.lifecycle()
    }

    fn open(&self, super_majority: bool) -> ProposalId {
        let proposal = self
            .lifecycle()
            .submit_draft(&user("author"), draft(super_majority))
            .unwrap();
        self.lifecycle()
            .admit_to_voting(&proposal.id, &user("guardian"), None)
            .unwrap();
        proposal.id
    }

    fn cast(&self, id: &ProposalId, voter: &str, choice: VoteChoice) {
        self.engine
            .cast_vote(id, &user(voter), choice, None)
            .unwrap();
    }

    fn cast_many(&self, id: &ProposalId, approve: usize, reject: usize) {
        for i in 0..approve {
            self.cast(id, &format!("approver-{i}"), VoteChoice::Approve);
        }
        for i in 0..reject {
            self.cast(id, &format!("rejecter-{i}"), VoteChoice::Reject);
        }
    }
}

fn user(name: &str) -> UserId {
    UserId::parse(name).unwrap()
}

fn draft(requires_super_majority: bool) -> ProposalDraft {
    ProposalDraft {
        title: "Quiet hours for notifications".into(),
        description: "Hold non-urgent notifications overnight.".into(),
        full_text: "Notifications other than crisis alerts are held between 22:00 and 07:00 \
                    local time and delivered as a single digest in the morning."
            .into(),
        rationale: "Late-night pings encourage reactive posting instead of reflection.".into(),
        requires_super_majority,
        affected_sections: vec![],
    }
}

#[test]
fn supermajority_seven_of_ten_passes_at_deadline() {
    // Early resolution would trigger at 10 decisive votes, so use a quorum
    // above the vote count to exercise the deadline path.
    let h = Harness::with_params(GovernanceParams {
        early_resolution_quorum: 100,
        ..GovernanceParams::default()
    });
    let id = h.open(true);
    h.cast_many(&id, 7, 3);
    h.clock.advance(8 * DAY);
    assert_eq!(h.lifecycle().resolve(&id).unwrap(), ProposalStatus::Passed);
}

#[test]
fn supermajority_six_of_ten_is_rejected() {
    let h = Harness::new();
    let id = h.open(true);
    h.cast_many(&id, 6, 4);
    assert_eq!(h.lifecycle().get(&id).unwrap().status, ProposalStatus::Voting);
    h.clock.advance(8 * DAY);
    assert_eq!(h.lifecycle().resolve(&id).unwrap(), ProposalStatus::Rejected);
}

#[test]
fn supermajority_passes_early_once_quorum_is_met() {
    let h = Harness::new();
    let id = h.open(true);
    h.cast_many(&id, 6, 3);
    assert_eq!(h.lifecycle().get(&id).unwrap().status, ProposalStatus::Voting);

    let receipt = h
        .engine
        .cast_vote(&id, &user("tenth"), VoteChoice::Approve, None)
        .unwrap();
    assert_eq!(receipt.status, ProposalStatus::Passed);
    assert_eq!(receipt.votes.approve, 7);

    let proposal = h.lifecycle().get(&id).unwrap();
    assert_eq!(proposal.status, ProposalStatus::Passed);
    assert_eq!(proposal.resolved_at, Some(Timestamp::new(START)));
    assert!(matches!(
        h.engine.cast_vote(&id, &user("late"), VoteChoice::Reject, None),
        Err(GovernanceError::VotingClosed {
            reason: ClosedReason::NotVoting {
                status: ProposalStatus::Passed
            },
            ..
        })
    ));
}

#[test]
fn simple_majority_never_passes_early() {
    let h = Harness::new();
    let id = h.open(false);
    h.cast_many(&id, 12, 0);
    assert_eq!(h.lifecycle().get(&id).unwrap().status, ProposalStatus::Voting);
    h.clock.advance(8 * DAY);
    assert_eq!(h.lifecycle().resolve(&id).unwrap(), ProposalStatus::Passed);
}

#[test]
fn simple_majority_tie_is_rejected() {
    let h = Harness::new();
    let id = h.open(false);
    h.cast_many(&id, 2, 2);
    h.cast(&id, "fence-sitter", VoteChoice::Abstain);
    h.clock.advance(8 * DAY);
    assert_eq!(h.lifecycle().resolve(&id).unwrap(), ProposalStatus::Rejected);
}

#[test]
fn vote_after_deadline_is_closed_regardless_of_tally() {
    let h = Harness::new();
    let id = h.open(false);
    h.cast_many(&id, 3, 0);
    let deadline = h.lifecycle().get(&id).unwrap().voting_deadline.unwrap();
    h.clock.set(deadline.as_secs());
    assert!(matches!(
        h.engine.cast_vote(&id, &user("late"), VoteChoice::Approve, None),
        Err(GovernanceError::VotingClosed {
            reason: ClosedReason::DeadlinePassed { .. },
            ..
        })
    ));
    assert_eq!(h.lifecycle().get(&id).unwrap().votes.total(), 3);
}

#[test]
fn second_vote_is_refused_and_tally_unchanged() {
    let h = Harness::new();
    let id = h.open(false);
    h.cast(&id, "alice", VoteChoice::Approve);
    let err = h
        .engine
        .cast_vote(&id, &user("alice"), VoteChoice::Reject, Some("changed my mind".into()))
        .unwrap_err();
    assert!(matches!(err, GovernanceError::AlreadyVoted { .. }));

    let proposal = h.lifecycle().get(&id).unwrap();
    assert_eq!(proposal.votes.approve, 1);
    assert_eq!(proposal.votes.reject, 0);
    let vote = h.engine.vote_of(&id, &user("alice")).unwrap().unwrap();
    assert_eq!(vote.choice, VoteChoice::Approve);
}

#[test]
fn voting_on_a_draft_is_closed() {
    let h = Harness::new();
    let proposal = h
        .lifecycle()
        .submit_draft(&user("author"), draft(false))
        .unwrap();
    assert!(matches!(
        h.engine
            .cast_vote(&proposal.id, &user("eager"), VoteChoice::Approve, None),
        Err(GovernanceError::VotingClosed {
            reason: ClosedReason::NotVoting {
                status: ProposalStatus::Draft
            },
            ..
        })
    ));
}

#[test]
fn unknown_proposal_is_not_found() {
    let h = Harness::new();
    let missing = ProposalId::new([9; 32]);
    assert!(matches!(
        h.engine
            .cast_vote(&missing, &user("alice"), VoteChoice::Approve, None),
        Err(GovernanceError::ProposalNotFound(id)) if id == missing
    ));
    assert!(matches!(
        h.lifecycle().resolve(&missing),
        Err(GovernanceError::ProposalNotFound(_))
    ));
}

#[test]
fn submitted_text_reads_back_unmodified() {
    let h = Harness::new();
    let mut d = draft(false);
    d.title = "  Padded title, kept as typed  ".into();
    let proposal = h.lifecycle().submit_draft(&user("author"), d.clone()).unwrap();
    let read = h.lifecycle().get(&proposal.id).unwrap();
    assert_eq!(read.title, d.title);
    assert_eq!(read.description, d.description);
    assert_eq!(read.full_text, d.full_text);
    assert_eq!(read.rationale, d.rationale);
    assert_eq!(read.status, ProposalStatus::Draft);
    assert_eq!(read.proposer, user("author"));
}

#[test]
fn identical_drafts_get_distinct_ids() {
    let h = Harness::new();
    let a = h.lifecycle().submit_draft(&user("author"), draft(false)).unwrap();
    let b = h.lifecycle().submit_draft(&user("author"), draft(false)).unwrap();
    assert_ne!(a.id, b.id);
    assert_eq!(h.lifecycle().list(None).unwrap().len(), 2);
}

#[test]
fn short_draft_is_rejected_and_not_stored() {
    let h = Harness::new();
    let mut d = draft(false);
    d.rationale = "because".into();
    assert!(matches!(
        h.lifecycle().submit_draft(&user("author"), d),
        Err(GovernanceError::Validation(_))
    ));
    assert!(h.lifecycle().list(None).unwrap().is_empty());
}

#[test]
fn admission_deadline_must_leave_the_minimum_window() {
    let h = Harness::new();
    let proposal = h.lifecycle().submit_draft(&user("author"), draft(false)).unwrap();
    let too_soon = Timestamp::new(START + 60);
    assert!(matches!(
        h.lifecycle()
            .admit_to_voting(&proposal.id, &user("guardian"), Some(too_soon)),
        Err(GovernanceError::InvalidDeadline { .. })
    ));

    let deadline = Timestamp::new(START + 2 * DAY);
    let admitted = h
        .lifecycle()
        .admit_to_voting(&proposal.id, &user("guardian"), Some(deadline))
        .unwrap();
    assert_eq!(admitted.status, ProposalStatus::Voting);
    assert_eq!(admitted.voting_deadline, Some(deadline));
    assert_eq!(admitted.admitted_at, Some(Timestamp::new(START)));

    assert!(matches!(
        h.lifecycle()
            .admit_to_voting(&proposal.id, &user("guardian"), Some(deadline)),
        Err(GovernanceError::InvalidTransition {
            from: ProposalStatus::Voting,
            to: ProposalStatus::Voting,
            ..
        })
    ));
}

#[test]
fn veto_is_terminal_and_needs_a_reason() {
    let h = Harness::new();
    let id = h.open(false);
    assert!(matches!(
        h.lifecycle().veto(&id, &user("guardian"), "   "),
        Err(GovernanceError::Validation(_))
    ));

    let vetoed = h
        .lifecycle()
        .veto(&id, &user("guardian"), "conflicts with crisis-support policy")
        .unwrap();
    assert_eq!(vetoed.status, ProposalStatus::Vetoed);
    let veto = vetoed.veto.unwrap();
    assert_eq!(veto.guardian, user("guardian"));
    assert_eq!(veto.reason, "conflicts with crisis-support policy");

    assert!(matches!(
        h.lifecycle().veto(&id, &user("guardian"), "again"),
        Err(GovernanceError::InvalidTransition { .. })
    ));
    h.clock.advance(8 * DAY);
    assert_eq!(h.lifecycle().resolve(&id).unwrap(), ProposalStatus::Vetoed);
}

#[test]
fn resolve_is_idempotent() {
    let h = Harness::new();
    let id = h.open(false);
    h.cast_many(&id, 2, 1);
    h.clock.advance(8 * DAY);
    assert_eq!(h.lifecycle().resolve(&id).unwrap(), ProposalStatus::Passed);
    let first = h.lifecycle().load(&id).unwrap();

    h.clock.advance(DAY);
    assert_eq!(h.lifecycle().resolve(&id).unwrap(), ProposalStatus::Passed);
    let second = h.lifecycle().load(&id).unwrap();
    assert_eq!(first, second);
}

#[test]
fn resolve_before_deadline_reports_still_open() {
    let h = Harness::new();
    let id = h.open(false);
    assert!(matches!(
        h.lifecycle().resolve(&id),
        Err(GovernanceError::VotingStillOpen { .. })
    ));
}

#[test]
fn resolve_expired_sweeps_only_due_proposals() {
    let h = Harness::new();
    let due = h.open(false);
    h.cast_many(&due, 1, 0);

    let later = h.lifecycle().submit_draft(&user("author"), draft(false)).unwrap();
    h.lifecycle()
        .admit_to_voting(&later.id, &user("guardian"), Some(Timestamp::new(START + 30 * DAY)))
        .unwrap();

    h.clock.advance(8 * DAY);
    let changes = h.lifecycle().resolve_expired().unwrap();
    assert_eq!(changes, vec![(due, ProposalStatus::Passed)]);
    assert!(h.lifecycle().resolve_expired().unwrap().is_empty());
    assert_eq!(h.lifecycle().get(&later.id).unwrap().status, ProposalStatus::Voting);
}

#[test]
fn list_filters_by_status_in_creation_order() {
    let h = Harness::new();
    let first = h.open(false);
    h.clock.advance(10);
    let second = h.lifecycle().submit_draft(&user("author"), draft(true)).unwrap();
    h.clock.advance(10);
    let third = h.open(true);

    let all: Vec<_> = h.lifecycle().list(None).unwrap().into_iter().map(|p| p.id).collect();
    assert_eq!(all, vec![first, second.id, third]);
    let voting: Vec<_> = h
        .lifecycle()
        .list(Some(ProposalStatus::Voting))
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(voting, vec![first, third]);
}

#[test]
fn retries_through_a_few_conflicts() {
    let h = Harness::new();
    let id = h.open(false);
    h.store.inject_conflicts(3);
    let receipt = h
        .engine
        .cast_vote(&id, &user("alice"), VoteChoice::Approve, None)
        .unwrap();
    assert_eq!(receipt.votes.approve, 1);
}

#[test]
fn gives_up_as_contended_and_writes_nothing() {
    let h = Harness::with_params(GovernanceParams {
        max_write_attempts: 4,
        ..GovernanceParams::default()
    });
    let id = h.open(false);
    h.store.inject_conflicts(4);
    let err = h
        .engine
        .cast_vote(&id, &user("alice"), VoteChoice::Approve, None)
        .unwrap_err();
    assert!(matches!(err, GovernanceError::Contended(_)));
    assert!(err.is_transient());
    assert_eq!(h.store.total_votes(), 0);
    assert_eq!(h.lifecycle().get(&id).unwrap().votes.total(), 0);
}

#[test]
fn audit_listing_matches_tally() {
    let h = Harness::new();
    let id = h.open(false);
    h.cast_many(&id, 3, 2);
    h.engine
        .cast_vote(&id, &user("quiet"), VoteChoice::Abstain, Some("  need more detail ".into()))
        .unwrap();

    let votes = h.engine.votes(&id).unwrap();
    assert_eq!(votes.len(), 6);
    let quiet = votes.iter().find(|v| v.voter == user("quiet")).unwrap();
    assert_eq!(quiet.comment.as_deref(), Some("need more detail"));
    assert_eq!(h.engine.recount(&id).unwrap(), h.lifecycle().get(&id).unwrap().votes);
}
