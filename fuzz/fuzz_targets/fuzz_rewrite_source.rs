#![no_main]

use libfuzzer_sys::fuzz_target;
use asyncify::rewriter::rewrite_source;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Unterminated spans are errors, not panics.
        if let Ok(rw) = rewrite_source(input) {
            // Rewriting only ever inserts, and never twice.
            assert!(rw.text.len() >= input.len());
            let again = rewrite_source(&rw.text).expect("rewritten text still scans");
            assert_eq!(again.text, rw.text);
        }
    }
});
