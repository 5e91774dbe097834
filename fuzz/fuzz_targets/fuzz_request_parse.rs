#![no_main]

use libfuzzer_sys::fuzz_target;

use mirror_governance::{GovernanceParams, ProposalDraft, ProposalStatus, VoteChoice};
use mirror_types::{ProposalId, UserId};

// Everything a caller controls arrives as text: path ids, the identity
// header, query filters, vote choices and draft bodies.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(id) = text.parse::<ProposalId>() {
        assert_eq!(id.to_string().parse::<ProposalId>().ok(), Some(id));
    }
    if let Ok(user) = UserId::parse(text) {
        assert!(!user.as_str().is_empty());
    }
    let _ = text.parse::<ProposalStatus>();
    let _ = text.parse::<VoteChoice>();

    if let Ok(draft) = serde_json::from_str::<ProposalDraft>(text) {
        let _ = draft.validate(&GovernanceParams::default());
    }
});
