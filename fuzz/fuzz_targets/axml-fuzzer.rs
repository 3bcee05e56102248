#![no_main]

use axres::AxmlDocument;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // must provide at least 8 bytes
    if data.len() < 8 {
        return;
    }

    let mut input = data;
    let _ = AxmlDocument::parse(&mut input);
});
