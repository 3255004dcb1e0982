#![no_main]

use libfuzzer_sys::fuzz_target;
use volcan::ingest::parse_line;

fuzz_target!(|data: &[u8]| {
    // Convert arbitrary bytes to UTF-8 string (lossy conversion)
    if let Ok(input) = std::str::from_utf8(data) {
        // Attempt to parse the line as an EMF A/B record.
        // This should not panic regardless of input: garbage lines are
        // skipped and incomplete records are rejected with an error.
        let _ = parse_line(input, 1);
    }
});
