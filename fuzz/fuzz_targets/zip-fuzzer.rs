#![no_main]

use axres_zip::ZipEntry;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let input = data.to_vec();
    let _ = ZipEntry::new(input);
});
