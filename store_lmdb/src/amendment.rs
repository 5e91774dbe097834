//! LMDB implementation of AmendmentStore.

use mirror_store::{AmendmentCommit, AmendmentStore, StoreError, Versioned};
use mirror_types::ProposalId;

use crate::governance::LmdbGovernanceStore;
use crate::keys::{decode_u64, decode_versioned, encode_versioned, META_CONSTITUTION};
use crate::LmdbError;

impl AmendmentStore for LmdbGovernanceStore {
    fn commit_amendment(&self, commit: &AmendmentCommit<'_>) -> Result<(), StoreError> {
        let mut wtxn = self.env.env.write_txn().map_err(LmdbError::from)?;

        if self
            .env
            .amendment_index_db
            .get(&wtxn, commit.proposal.as_bytes())
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(commit.proposal.to_string()));
        }

        let latest = match self.env.amendments_db.last(&wtxn).map_err(LmdbError::from)? {
            Some((key, _)) => decode_u64(key)?,
            None => 0,
        };
        if commit.number != latest + 1 {
            return Err(StoreError::Conflict {
                key: "amendments".into(),
                expected: commit.number.saturating_sub(1),
                found: latest,
            });
        }

        let constitution_revision = match self
            .env
            .meta_db
            .get(&wtxn, META_CONSTITUTION)
            .map_err(LmdbError::from)?
        {
            Some(raw) => decode_versioned(raw)?.revision,
            None => 0,
        };
        if constitution_revision != commit.expected_constitution_revision {
            return Err(StoreError::Conflict {
                key: "constitution".into(),
                expected: commit.expected_constitution_revision,
                found: constitution_revision,
            });
        }

        self.replace_proposal_in_txn(
            &mut wtxn,
            commit.proposal,
            commit.expected_proposal_revision,
            commit.proposal_data,
        )?;

        let number_key = commit.number.to_be_bytes();
        self.env
            .amendments_db
            .put(&mut wtxn, &number_key, commit.amendment_data)
            .map_err(LmdbError::from)?;
        self.env
            .amendment_index_db
            .put(&mut wtxn, commit.proposal.as_bytes(), &number_key)
            .map_err(LmdbError::from)?;
        self.env
            .meta_db
            .put(
                &mut wtxn,
                META_CONSTITUTION,
                &encode_versioned(constitution_revision + 1, commit.constitution_data),
            )
            .map_err(LmdbError::from)?;

        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn latest_amendment_number(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.env.read_txn().map_err(LmdbError::from)?;
        match self.env.amendments_db.last(&rtxn).map_err(LmdbError::from)? {
            Some((key, _)) => Ok(decode_u64(key)?),
            None => Ok(0),
        }
    }

    fn amendment_for_proposal(
        &self,
        proposal: &ProposalId,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.env.read_txn().map_err(LmdbError::from)?;
        let Some(number) = self
            .env
            .amendment_index_db
            .get(&rtxn, proposal.as_bytes())
            .map_err(LmdbError::from)?
        else {
            return Ok(None);
        };
        let data = self
            .env
            .amendments_db
            .get(&rtxn, number)
            .map_err(LmdbError::from)?
            .ok_or_else(|| {
                LmdbError::Corrupt(format!("amendment index points at missing record for {proposal}"))
            })?;
        Ok(Some(data.to_vec()))
    }

    fn list_amendments(&self) -> Result<Vec<Vec<u8>>, StoreError> {
        let rtxn = self.env.env.read_txn().map_err(LmdbError::from)?;
        let mut out = Vec::new();
        for entry in self.env.amendments_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_, value) = entry.map_err(LmdbError::from)?;
            out.push(value.to_vec());
        }
        Ok(out)
    }

    fn get_constitution(&self) -> Result<Option<Versioned>, StoreError> {
        let rtxn = self.env.env.read_txn().map_err(LmdbError::from)?;
        let raw = self
            .env
            .meta_db
            .get(&rtxn, META_CONSTITUTION)
            .map_err(LmdbError::from)?;
        Ok(raw.map(decode_versioned).transpose()?)
    }
}
