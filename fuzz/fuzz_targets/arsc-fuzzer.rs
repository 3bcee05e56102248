#![no_main]

use axres::ArscTable;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // must provide at least 12 bytes
    if data.len() < 12 {
        return;
    }

    let mut input = data;
    let _ = ArscTable::parse(&mut input);
});
