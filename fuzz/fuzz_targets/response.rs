#![no_main]

use epp_core::response;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(xml) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(parsed) = response::interpret(xml) {
        assert!(parsed.nameservers.len() <= response::MAX_NAMESERVERS);
    }
});
