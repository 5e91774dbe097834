//! Pass/fail thresholds.
//!
//! Comparisons are done on exact integer products rather than the rounded
//! basis-point share, so a 2-of-3 approval (66.67%) clears a 6600 bps
//! supermajority and a 1-of-2 split never clears a 5000 bps simple majority.

use crate::params::GovernanceParams;
use crate::proposal::ProposalStatus;
use crate::vote::VoteTally;

/// The bar a proposal's approval share must clear.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Threshold {
    /// Approval share strictly greater than `bps`.
    SimpleMajority { bps: u32 },
    /// Approval share greater than or equal to `bps`.
    Supermajority { bps: u32 },
}

impl Threshold {
    pub fn for_proposal(requires_super_majority: bool, params: &GovernanceParams) -> Self {
        if requires_super_majority {
            Self::Supermajority {
                bps: params.supermajority_bps,
            }
        } else {
            Self::SimpleMajority {
                bps: params.simple_majority_bps,
            }
        }
    }

    pub fn is_met(&self, tally: &VoteTally) -> bool {
        let decisive = tally.decisive();
        if decisive == 0 {
            return false;
        }
        let approve = u128::from(tally.approve) * 10_000;
        match *self {
            Self::SimpleMajority { bps } => approve > u128::from(bps) * u128::from(decisive),
            Self::Supermajority { bps } => approve >= u128::from(bps) * u128::from(decisive),
        }
    }
}

/// Outcome once the deadline has been reached.
pub fn final_outcome(
    tally: &VoteTally,
    requires_super_majority: bool,
    params: &GovernanceParams,
) -> ProposalStatus {
    if Threshold::for_proposal(requires_super_majority, params).is_met(tally) {
        ProposalStatus::Passed
    } else {
        ProposalStatus::Rejected
    }
}

/// Whether a supermajority proposal may pass before its deadline.
///
/// Ordinary proposals always wait for the deadline.
pub fn passes_early(
    tally: &VoteTally,
    requires_super_majority: bool,
    params: &GovernanceParams,
) -> bool {
    requires_super_majority
        && tally.decisive() >= params.early_resolution_quorum
        && Threshold::for_proposal(true, params).is_met(tally)
}
