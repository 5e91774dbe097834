//! Nullable store: thread-safe in-memory storage for testing.

use mirror_store::{
    AmendmentCommit, AmendmentStore, GovernanceStore, StoreError, Versioned, VoteCommit,
};
use mirror_types::{ProposalId, UserId};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    proposals: BTreeMap<ProposalId, Versioned>,
    votes: BTreeMap<(ProposalId, UserId), Vec<u8>>,
    amendments: BTreeMap<u64, Vec<u8>>,
    amendment_index: HashMap<ProposalId, u64>,
    constitution: Option<Versioned>,
    nonce: u64,
    /// Conditional writes still to be refused with a conflict.
    injected_conflicts: u32,
}

impl Inner {
    fn take_injected_conflict(&mut self, key: &ProposalId, expected: u64) -> Result<(), StoreError> {
        if self.injected_conflicts == 0 {
            return Ok(());
        }
        self.injected_conflicts -= 1;
        Err(StoreError::Conflict {
            key: key.to_string(),
            expected,
            found: expected + 1,
        })
    }

    fn replace_proposal(
        &mut self,
        id: &ProposalId,
        expected: u64,
        data: &[u8],
    ) -> Result<u64, StoreError> {
        let current = self
            .proposals
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if current.revision != expected {
            return Err(StoreError::Conflict {
                key: id.to_string(),
                expected,
                found: current.revision,
            });
        }
        current.revision += 1;
        current.data = data.to_vec();
        Ok(current.revision)
    }
}

/// An in-memory governance and amendment store for testing.
///
/// One lock guards every map, so each commit is atomic with respect to
/// concurrent readers and writers.
#[derive(Default)]
pub struct NullGovernanceStore {
    inner: Mutex<Inner>,
}

impl NullGovernanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse the next `count` conditional writes with a revision conflict.
    pub fn inject_conflicts(&self, count: u32) {
        self.lock().injected_conflicts = count;
    }

    /// Number of votes stored across all proposals.
    pub fn total_votes(&self) -> usize {
        self.lock().votes.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl GovernanceStore for NullGovernanceStore {
    fn insert_proposal(&self, id: &ProposalId, data: &[u8]) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.proposals.contains_key(id) {
            return Err(StoreError::Duplicate(id.to_string()));
        }
        inner.proposals.insert(
            *id,
            Versioned {
                revision: 1,
                data: data.to_vec(),
            },
        );
        Ok(())
    }

    fn get_proposal(&self, id: &ProposalId) -> Result<Versioned, StoreError> {
        self.lock()
            .proposals
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn list_proposals(&self) -> Result<Vec<(ProposalId, Versioned)>, StoreError> {
        Ok(self
            .lock()
            .proposals
            .iter()
            .map(|(id, v)| (*id, v.clone()))
            .collect())
    }

    fn update_proposal(
        &self,
        id: &ProposalId,
        expected_revision: u64,
        data: &[u8],
    ) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        inner.take_injected_conflict(id, expected_revision)?;
        inner.replace_proposal(id, expected_revision, data)
    }

    fn commit_vote(&self, commit: &VoteCommit<'_>) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        if !inner.proposals.contains_key(commit.proposal) {
            return Err(StoreError::NotFound(commit.proposal.to_string()));
        }
        let key = (*commit.proposal, commit.voter.clone());
        if inner.votes.contains_key(&key) {
            return Err(StoreError::Duplicate(format!(
                "{}/{}",
                commit.proposal, commit.voter
            )));
        }
        inner.take_injected_conflict(commit.proposal, commit.expected_revision)?;
        let next = inner.replace_proposal(
            commit.proposal,
            commit.expected_revision,
            commit.proposal_data,
        )?;
        inner.votes.insert(key, commit.vote_data.to_vec());
        Ok(next)
    }

    fn get_vote(
        &self,
        proposal: &ProposalId,
        voter: &UserId,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.lock().votes.get(&(*proposal, voter.clone())).cloned())
    }

    fn list_votes(&self, proposal: &ProposalId) -> Result<Vec<Vec<u8>>, StoreError> {
        Ok(self
            .lock()
            .votes
            .iter()
            .filter(|((id, _), _)| id == proposal)
            .map(|(_, data)| data.clone())
            .collect())
    }

    fn next_nonce(&self) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        inner.nonce += 1;
        Ok(inner.nonce)
    }
}

impl AmendmentStore for NullGovernanceStore {
    fn commit_amendment(&self, commit: &AmendmentCommit<'_>) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.amendment_index.contains_key(commit.proposal) {
            return Err(StoreError::Duplicate(commit.proposal.to_string()));
        }
        let latest = inner.amendments.keys().next_back().copied().unwrap_or(0);
        if commit.number != latest + 1 {
            return Err(StoreError::Conflict {
                key: "amendments".into(),
                expected: commit.number.saturating_sub(1),
                found: latest,
            });
        }
        let constitution_revision = inner.constitution.as_ref().map_or(0, |c| c.revision);
        if constitution_revision != commit.expected_constitution_revision {
            return Err(StoreError::Conflict {
                key: "constitution".into(),
                expected: commit.expected_constitution_revision,
                found: constitution_revision,
            });
        }
        inner.take_injected_conflict(commit.proposal, commit.expected_proposal_revision)?;
        inner.replace_proposal(
            commit.proposal,
            commit.expected_proposal_revision,
            commit.proposal_data,
        )?;
        inner
            .amendments
            .insert(commit.number, commit.amendment_data.to_vec());
        inner.amendment_index.insert(*commit.proposal, commit.number);
        inner.constitution = Some(Versioned {
            revision: constitution_revision + 1,
            data: commit.constitution_data.to_vec(),
        });
        Ok(())
    }

    fn latest_amendment_number(&self) -> Result<u64, StoreError> {
        Ok(self.lock().amendments.keys().next_back().copied().unwrap_or(0))
    }

    fn amendment_for_proposal(
        &self,
        proposal: &ProposalId,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .amendment_index
            .get(proposal)
            .and_then(|number| inner.amendments.get(number))
            .cloned())
    }

    fn list_amendments(&self) -> Result<Vec<Vec<u8>>, StoreError> {
        Ok(self.lock().amendments.values().cloned().collect())
    }

    fn get_constitution(&self) -> Result<Option<Versioned>, StoreError> {
        Ok(self.lock().constitution.clone())
    }
}
