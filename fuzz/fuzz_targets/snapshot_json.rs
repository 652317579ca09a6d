//! Fuzz harness for snapshot decoding and restore.
//!
//! Malformed blobs must come back as errors, never panics or partially
//! constructed stores.
//! Target: `daygrid_snapshot::{Snapshot, restore}`

#![no_main]

use daygrid_snapshot::Snapshot;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(blob) = Snapshot::<String>::from_json(input) {
        if let Ok(store) = daygrid_snapshot::restore(blob.clone()) {
            // Anything that restores must also round-trip cleanly.
            assert_eq!(store.len(), blob.len);
            let recaptured = daygrid_snapshot::snapshot(&store);
            let restored_again =
                daygrid_snapshot::restore(recaptured).expect("recapture must restore");
            assert_eq!(restored_again.len(), store.len());
        }
    }
});
