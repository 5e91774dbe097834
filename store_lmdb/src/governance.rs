//! LMDB implementation of GovernanceStore.

use heed::RwTxn;

use mirror_store::{GovernanceStore, StoreError, Versioned, VoteCommit};
use mirror_types::{ProposalId, UserId};

use crate::environment::LmdbEnvironment;
use crate::keys::{
    decode_u64, decode_versioned, encode_versioned, proposal_id_from_key, vote_key,
    META_PROPOSAL_NONCE,
};
use crate::LmdbError;

/// Proposal, vote and amendment storage over one LMDB environment.
#[derive(Clone)]
pub struct LmdbGovernanceStore {
    pub(crate) env: LmdbEnvironment,
}

impl LmdbGovernanceStore {
    pub fn new(env: LmdbEnvironment) -> Self {
        Self { env }
    }

    /// Read a proposal inside an open write transaction.
    pub(crate) fn proposal_in_txn(
        &self,
        wtxn: &RwTxn<'_>,
        id: &ProposalId,
    ) -> Result<Option<Versioned>, LmdbError> {
        self.env
            .proposals_db
            .get(wtxn, id.as_bytes())?
            .map(decode_versioned)
            .transpose()
    }

    /// Verify `expected` against the stored revision and write the next one.
    pub(crate) fn replace_proposal_in_txn(
        &self,
        wtxn: &mut RwTxn<'_>,
        id: &ProposalId,
        expected: u64,
        data: &[u8],
    ) -> Result<u64, StoreError> {
        let current = self
            .proposal_in_txn(wtxn, id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if current.revision != expected {
            return Err(StoreError::Conflict {
                key: id.to_string(),
                expected,
                found: current.revision,
            });
        }
        let next = expected + 1;
        self.env
            .proposals_db
            .put(wtxn, id.as_bytes(), &encode_versioned(next, data))
            .map_err(LmdbError::from)?;
        Ok(next)
    }
}

impl GovernanceStore for LmdbGovernanceStore {
    fn insert_proposal(&self, id: &ProposalId, data: &[u8]) -> Result<(), StoreError> {
        let mut wtxn = self.env.env.write_txn().map_err(LmdbError::from)?;
        if self.proposal_in_txn(&wtxn, id)?.is_some() {
            return Err(StoreError::Duplicate(id.to_string()));
        }
        self.env
            .proposals_db
            .put(&mut wtxn, id.as_bytes(), &encode_versioned(1, data))
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_proposal(&self, id: &ProposalId) -> Result<Versioned, StoreError> {
        let rtxn = self.env.env.read_txn().map_err(LmdbError::from)?;
        let raw = self
            .env
            .proposals_db
            .get(&rtxn, id.as_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(id.to_string()))?;
        Ok(decode_versioned(raw)?)
    }

    fn list_proposals(&self) -> Result<Vec<(ProposalId, Versioned)>, StoreError> {
        let rtxn = self.env.env.read_txn().map_err(LmdbError::from)?;
        let mut out = Vec::new();
        for entry in self.env.proposals_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (key, value) = entry.map_err(LmdbError::from)?;
            out.push((proposal_id_from_key(key)?, decode_versioned(value)?));
        }
        Ok(out)
    }

    fn update_proposal(
        &self,
        id: &ProposalId,
        expected_revision: u64,
        data: &[u8],
    ) -> Result<u64, StoreError> {
        let mut wtxn = self.env.env.write_txn().map_err(LmdbError::from)?;
        let next = self.replace_proposal_in_txn(&mut wtxn, id, expected_revision, data)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(next)
    }

    fn commit_vote(&self, commit: &VoteCommit<'_>) -> Result<u64, StoreError> {
        let mut wtxn = self.env.env.write_txn().map_err(LmdbError::from)?;
        if self.proposal_in_txn(&wtxn, commit.proposal)?.is_none() {
            return Err(StoreError::NotFound(commit.proposal.to_string()));
        }
        let key = vote_key(commit.proposal, commit.voter);
        if self
            .env
            .votes_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(format!(
                "{}/{}",
                commit.proposal, commit.voter
            )));
        }
        let next = self.replace_proposal_in_txn(
            &mut wtxn,
            commit.proposal,
            commit.expected_revision,
            commit.proposal_data,
        )?;
        self.env
            .votes_db
            .put(&mut wtxn, &key, commit.vote_data)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(next)
    }

    fn get_vote(
        &self,
        proposal: &ProposalId,
        voter: &UserId,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.env.read_txn().map_err(LmdbError::from)?;
        let value = self
            .env
            .votes_db
            .get(&rtxn, &vote_key(proposal, voter))
            .map_err(LmdbError::from)?;
        Ok(value.map(<[u8]>::to_vec))
    }

    fn list_votes(&self, proposal: &ProposalId) -> Result<Vec<Vec<u8>>, StoreError> {
        let rtxn = self.env.env.read_txn().map_err(LmdbError::from)?;
        let mut out = Vec::new();
        for entry in self
            .env
            .votes_db
            .prefix_iter(&rtxn, proposal.as_bytes())
            .map_err(LmdbError::from)?
        {
            let (_, value) = entry.map_err(LmdbError::from)?;
            out.push(value.to_vec());
        }
        Ok(out)
    }

    fn next_nonce(&self) -> Result<u64, StoreError> {
        let mut wtxn = self.env.env.write_txn().map_err(LmdbError::from)?;
        let current = match self
            .env
            .meta_db
            .get(&wtxn, META_PROPOSAL_NONCE)
            .map_err(LmdbError::from)?
        {
            Some(raw) => decode_u64(raw)?,
            None => 0,
        };
        let next = current + 1;
        self.env
            .meta_db
            .put(&mut wtxn, META_PROPOSAL_NONCE, &next.to_be_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(next)
    }
}
