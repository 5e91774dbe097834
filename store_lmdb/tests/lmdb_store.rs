//! Exercises the LMDB governance and amendment stores against a temporary
//! environment.

use mirror_store::{AmendmentCommit, AmendmentStore, GovernanceStore, StoreError, VoteCommit};
use mirror_store_lmdb::LmdbEnvironment;
use mirror_types::{ProposalId, UserId};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
    let dir = tempfile::tempdir().expect("temp dir");
    let env = LmdbEnvironment::open(dir.path(), 64 * 1024 * 1024).expect("open env");
    (dir, env)
}

fn pid(seed: u8) -> ProposalId {
    ProposalId::new([seed; 32])
}

fn user(name: &str) -> UserId {
    UserId::parse(name).unwrap()
}

// ---------------------------------------------------------------------------
// Proposals
// ---------------------------------------------------------------------------

#[test]
fn proposal_insert_read_and_duplicate() {
    let (_dir, env) = temp_env();
    let store = env.governance_store();

    store.insert_proposal(&pid(1), b"draft").unwrap();
    let read = store.get_proposal(&pid(1)).unwrap();
    assert_eq!(read.revision, 1);
    assert_eq!(read.data, b"draft");

    assert!(matches!(
        store.insert_proposal(&pid(1), b"again"),
        Err(StoreError::Duplicate(_))
    ));
    assert!(matches!(store.get_proposal(&pid(2)), Err(StoreError::NotFound(_))));
}

#[test]
fn proposal_update_checks_revision() {
    let (_dir, env) = temp_env();
    let store = env.governance_store();
    store.insert_proposal(&pid(1), b"v1").unwrap();

    assert_eq!(store.update_proposal(&pid(1), 1, b"v2").unwrap(), 2);
    let stale = store.update_proposal(&pid(1), 1, b"v2-stale");
    assert!(matches!(
        stale,
        Err(StoreError::Conflict { expected: 1, found: 2, .. })
    ));
    assert_eq!(store.get_proposal(&pid(1)).unwrap().data, b"v2");
}

#[test]
fn list_proposals_returns_every_record() {
    let (_dir, env) = temp_env();
    let store = env.governance_store();
    for seed in [3u8, 1, 2] {
        store.insert_proposal(&pid(seed), &[seed]).unwrap();
    }
    let ids: Vec<ProposalId> = store
        .list_proposals()
        .unwrap()
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert_eq!(ids, vec![pid(1), pid(2), pid(3)]);
}

// ---------------------------------------------------------------------------
// Votes
// ---------------------------------------------------------------------------

#[test]
fn vote_commit_is_atomic_with_proposal_rewrite() {
    let (_dir, env) = temp_env();
    let store = env.governance_store();
    store.insert_proposal(&pid(1), b"tally=0").unwrap();
    let alice = user("alice");

    let rev = store
        .commit_vote(&VoteCommit {
            proposal: &pid(1),
            voter: &alice,
            expected_revision: 1,
            proposal_data: b"tally=1",
            vote_data: b"approve",
        })
        .unwrap();
    assert_eq!(rev, 2);
    assert_eq!(store.get_proposal(&pid(1)).unwrap().data, b"tally=1");
    assert_eq!(store.get_vote(&pid(1), &alice).unwrap().unwrap(), b"approve");
}

#[test]
fn duplicate_vote_leaves_proposal_untouched() {
    let (_dir, env) = temp_env();
    let store = env.governance_store();
    store.insert_proposal(&pid(1), b"tally=0").unwrap();
    let alice = user("alice");
    let id = pid(1);
    let commit = |rev: u64, data: &'static [u8]| VoteCommit {
        proposal: &id,
        voter: &alice,
        expected_revision: rev,
        proposal_data: data,
        vote_data: b"approve",
    };

    let first = commit(1, b"tally=1");
    store.commit_vote(&first).unwrap();
    let second = commit(2, b"tally=2");
    assert!(matches!(store.commit_vote(&second), Err(StoreError::Duplicate(_))));

    let read = store.get_proposal(&pid(1)).unwrap();
    assert_eq!(read.revision, 2);
    assert_eq!(read.data, b"tally=1");
    assert_eq!(store.list_votes(&pid(1)).unwrap().len(), 1);
}

#[test]
fn stale_vote_commit_conflicts_without_inserting() {
    let (_dir, env) = temp_env();
    let store = env.governance_store();
    store.insert_proposal(&pid(1), b"tally=0").unwrap();
    store.update_proposal(&pid(1), 1, b"admitted").unwrap();
    let bob = user("bob");

    let result = store.commit_vote(&VoteCommit {
        proposal: &pid(1),
        voter: &bob,
        expected_revision: 1,
        proposal_data: b"tally=1",
        vote_data: b"reject",
    });
    assert!(matches!(result, Err(StoreError::Conflict { .. })));
    assert!(store.get_vote(&pid(1), &bob).unwrap().is_none());
}

#[test]
fn vote_on_missing_proposal_is_not_found() {
    let (_dir, env) = temp_env();
    let store = env.governance_store();
    let result = store.commit_vote(&VoteCommit {
        proposal: &pid(9),
        voter: &user("dave"),
        expected_revision: 1,
        proposal_data: b"",
        vote_data: b"",
    });
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[test]
fn vote_listing_is_scoped_to_one_proposal() {
    let (_dir, env) = temp_env();
    let store = env.governance_store();
    for seed in [1u8, 2] {
        store.insert_proposal(&pid(seed), b"p").unwrap();
    }
    let mut rev = 1;
    for name in ["a", "b", "c"] {
        rev = store
            .commit_vote(&VoteCommit {
                proposal: &pid(1),
                voter: &user(name),
                expected_revision: rev,
                proposal_data: b"p",
                vote_data: name.as_bytes(),
            })
            .unwrap();
    }
    store
        .commit_vote(&VoteCommit {
            proposal: &pid(2),
            voter: &user("z"),
            expected_revision: 1,
            proposal_data: b"p",
            vote_data: b"z",
        })
        .unwrap();

    assert_eq!(store.list_votes(&pid(1)).unwrap().len(), 3);
    assert_eq!(store.list_votes(&pid(2)).unwrap().len(), 1);
    assert_eq!(
        store.list_votes(&pid(1)).unwrap(),
        vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]
    );
}

#[test]
fn nonces_are_strictly_increasing() {
    let (_dir, env) = temp_env();
    let store = env.governance_store();
    let a = store.next_nonce().unwrap();
    let b = store.next_nonce().unwrap();
    assert!(b > a);
}

// ---------------------------------------------------------------------------
// Amendments
// ---------------------------------------------------------------------------

fn amendment_commit<'a>(
    proposal: &'a ProposalId,
    proposal_rev: u64,
    number: u64,
    constitution_rev: u64,
) -> AmendmentCommit<'a> {
    AmendmentCommit {
        proposal,
        expected_proposal_revision: proposal_rev,
        proposal_data: b"implemented",
        number,
        amendment_data: b"amendment",
        expected_constitution_revision: constitution_rev,
        constitution_data: b"constitution",
    }
}

#[test]
fn amendment_commit_writes_all_records() {
    let (_dir, env) = temp_env();
    let store = env.governance_store();
    store.insert_proposal(&pid(1), b"passed").unwrap();

    store.commit_amendment(&amendment_commit(&pid(1), 1, 1, 0)).unwrap();

    assert_eq!(store.latest_amendment_number().unwrap(), 1);
    assert_eq!(store.amendment_for_proposal(&pid(1)).unwrap().unwrap(), b"amendment");
    assert_eq!(store.get_proposal(&pid(1)).unwrap().data, b"implemented");
    let constitution = store.get_constitution().unwrap().unwrap();
    assert_eq!(constitution.revision, 1);
    assert_eq!(constitution.data, b"constitution");
}

#[test]
fn second_amendment_for_same_proposal_is_duplicate() {
    let (_dir, env) = temp_env();
    let store = env.governance_store();
    store.insert_proposal(&pid(1), b"passed").unwrap();
    store.commit_amendment(&amendment_commit(&pid(1), 1, 1, 0)).unwrap();

    let again = store.commit_amendment(&amendment_commit(&pid(1), 2, 2, 1));
    assert!(matches!(again, Err(StoreError::Duplicate(_))));
    assert_eq!(store.list_amendments().unwrap().len(), 1);
}

#[test]
fn amendment_number_and_constitution_revision_are_checked() {
    let (_dir, env) = temp_env();
    let store = env.governance_store();
    store.insert_proposal(&pid(1), b"passed").unwrap();
    store.insert_proposal(&pid(2), b"passed").unwrap();
    store.commit_amendment(&amendment_commit(&pid(1), 1, 1, 0)).unwrap();

    let wrong_number = store.commit_amendment(&amendment_commit(&pid(2), 1, 1, 1));
    assert!(matches!(wrong_number, Err(StoreError::Conflict { .. })));
    let stale_document = store.commit_amendment(&amendment_commit(&pid(2), 1, 2, 0));
    assert!(matches!(stale_document, Err(StoreError::Conflict { .. })));

    store.commit_amendment(&amendment_commit(&pid(2), 1, 2, 1)).unwrap();
    assert_eq!(store.latest_amendment_number().unwrap(), 2);
    assert!(store.amendment_for_proposal(&pid(3)).unwrap().is_none());
}

#[test]
fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
        env.governance_store().insert_proposal(&pid(4), b"kept").unwrap();
        env.sync().unwrap();
    }
    let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
    assert_eq!(env.governance_store().get_proposal(&pid(4)).unwrap().data, b"kept");
}
