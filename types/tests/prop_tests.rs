use proptest::prelude::*;

use mirror_types::{ProposalId, Timestamp, UserId};

proptest! {
    /// Any id parses back from its own display form.
    #[test]
    fn proposal_id_display_parses_back(bytes in prop::array::uniform32(0u8..)) {
        let id = ProposalId::new(bytes);
        let parsed: ProposalId = id.to_string().parse().unwrap();
        prop_assert_eq!(parsed, id);
    }

    /// Different nonces never collapse onto the same id for the same draft.
    #[test]
    fn distinct_nonces_distinct_ids(
        title in "[a-zA-Z ]{10,40}",
        secs in 0u64..2_000_000_000,
        n1 in any::<u64>(),
        n2 in any::<u64>(),
    ) {
        prop_assume!(n1 != n2);
        let author = UserId::parse("author").unwrap();
        let a = ProposalId::derive(&author, &title, Timestamp::new(secs), n1);
        let b = ProposalId::derive(&author, &title, Timestamp::new(secs), n2);
        prop_assert_ne!(a, b);
    }

    /// UserId accepts exactly the non-empty, bounded, whitespace-free strings.
    #[test]
    fn user_id_acceptance(raw in "\\PC{0,140}") {
        let expected = !raw.is_empty()
            && raw.len() <= UserId::MAX_LEN
            && !raw.chars().any(char::is_whitespace);
        prop_assert_eq!(UserId::parse(raw.clone()).is_ok(), expected);
    }

    /// plus_secs never moves time backwards.
    #[test]
    fn plus_secs_monotonic(start in any::<u64>(), delta in any::<u64>()) {
        let t = Timestamp::new(start);
        prop_assert!(t.plus_secs(delta) >= t);
    }
}
