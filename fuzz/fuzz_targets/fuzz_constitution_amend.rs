#![no_main]

use libfuzzer_sys::fuzz_target;

use mirror_consti::ConstitutionDocument;

// Apply a sequence of amendments whose section lists come from the input.
// Section keys must stay unique and the version must count amendments.
fuzz_target!(|data: &[u8]| {
    let mut doc = ConstitutionDocument::genesis();
    let mut applied = 0u64;

    for (n, chunk) in data.chunks(4).enumerate() {
        let sections: Vec<String> = chunk
            .iter()
            .filter(|b| **b % 3 != 0)
            .map(|b| format!("article-{}", b % 8))
            .collect();
        let mut unique = sections.clone();
        unique.sort();
        unique.dedup();
        if unique.len() != sections.len() {
            continue;
        }
        let number = n as u64 + 1;
        doc.amend(number, &format!("Amendment {number}"), "text", &sections);
        applied += 1;

        let mut keys: Vec<&str> = doc.articles.iter().map(|a| a.section.as_str()).collect();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total, "duplicate section after amendment {number}");
        assert_eq!(doc.version, applied);
    }
});
