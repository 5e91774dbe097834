//! Proposal identifiers.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::{Timestamp, TypeError, UserId};

type Blake2b256 = Blake2b<U32>;

/// A 32-byte proposal identifier.
///
/// Derived from the proposer, title, creation time and a store-local nonce so
/// that two drafts with identical content still receive distinct ids. Rendered
/// as 64 lowercase hex characters on the wire and in URLs.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProposalId([u8; 32]);

impl ProposalId {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive the id of a freshly submitted draft.
    pub fn derive(proposer: &UserId, title: &str, created_at: Timestamp, nonce: u64) -> Self {
        let mut hasher = Blake2b256::new();
        for part in [proposer.as_str().as_bytes(), title.as_bytes()] {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        hasher.update(created_at.as_secs().to_le_bytes());
        hasher.update(nonce.to_le_bytes());
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for ProposalId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out)
            .map_err(|_| TypeError::InvalidProposalId(s.to_string()))?;
        Ok(Self(out))
    }
}

impl fmt::Debug for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProposalId({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ProposalId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ProposalId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
