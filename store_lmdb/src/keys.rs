//! Key and value layouts shared by the LMDB stores.
//!
//! - `proposals`:       `id (32)` → `revision (u64 BE) ‖ record`
//! - `votes`:           `id (32) ‖ voter` → `record`
//! - `amendments`:      `number (u64 BE)` → `record`
//! - `amendment_index`: `id (32)` → `number (u64 BE)`
//! - `meta`:            ascii key → value

use mirror_store::Versioned;
use mirror_types::{ProposalId, UserId};

use crate::LmdbError;

pub const META_SCHEMA_VERSION: &[u8] = b"schema_version";
pub const META_PROPOSAL_NONCE: &[u8] = b"proposal_nonce";
pub const META_CONSTITUTION: &[u8] = b"constitution";

pub fn vote_key(proposal: &ProposalId, voter: &UserId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32 + voter.as_str().len());
    key.extend_from_slice(proposal.as_bytes());
    key.extend_from_slice(voter.as_str().as_bytes());
    key
}

pub fn proposal_id_from_key(key: &[u8]) -> Result<ProposalId, LmdbError> {
    let bytes: [u8; 32] = key
        .try_into()
        .map_err(|_| LmdbError::Corrupt(format!("proposal key has {} bytes", key.len())))?;
    Ok(ProposalId::new(bytes))
}

pub fn encode_versioned(revision: u64, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + data.len());
    out.extend_from_slice(&revision.to_be_bytes());
    out.extend_from_slice(data);
    out
}

pub fn decode_versioned(raw: &[u8]) -> Result<Versioned, LmdbError> {
    if raw.len() < 8 {
        return Err(LmdbError::Corrupt("versioned record shorter than header".into()));
    }
    let (head, data) = raw.split_at(8);
    Ok(Versioned {
        revision: decode_u64(head)?,
        data: data.to_vec(),
    })
}

pub fn decode_u64(raw: &[u8]) -> Result<u64, LmdbError> {
    let arr: [u8; 8] = raw
        .try_into()
        .map_err(|_| LmdbError::Corrupt(format!("expected 8-byte integer, got {}", raw.len())))?;
    Ok(u64::from_be_bytes(arr))
}
