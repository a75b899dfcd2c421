#![no_main]

use chrono::NaiveDate;
use libfuzzer_sys::fuzz_target;
use veredicto::pipeline::{compute_evidence, EvidenceOptions, Repositories};
use veredicto::store::InMemoryRepository;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(repo) = InMemoryRepository::from_json(text) else {
        return;
    };
    let Some(as_of) = NaiveDate::from_ymd_opt(2024, 6, 1) else {
        return;
    };

    // Any parseable document must evaluate or fail cleanly
    let repos = Repositories::single(&repo);
    for (user, records) in &repo.users {
        for protocol in &records.protocols {
            let _ = compute_evidence(&repos, user, &protocol.id, &EvidenceOptions::new(as_of));
        }
    }
});
