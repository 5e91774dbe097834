#![no_main]

use libfuzzer_sys::fuzz_target;

use mirror_consti::{Amendment, ConstitutionDocument};
use mirror_governance::record::{decode_proposal, decode_vote, encode_proposal};

// Stored records come back from disk as raw bytes. Decoding must fail
// cleanly on corruption, and whatever does decode must re-encode.
fuzz_target!(|data: &[u8]| {
    let _ = mirror_store_lmdb::keys::decode_versioned(data);
    let _ = mirror_store_lmdb::keys::proposal_id_from_key(data);
    let _ = mirror_store_lmdb::keys::decode_u64(data);

    if let Ok(proposal) = decode_proposal(data) {
        let bytes = encode_proposal(&proposal).expect("decoded proposal must re-encode");
        assert_eq!(decode_proposal(&bytes).ok(), Some(proposal));
    }
    let _ = decode_vote(data);
    let _ = Amendment::from_bytes(data);
    let _ = ConstitutionDocument::from_bytes(data);
});
