#![no_main]

use epp_core::Frame;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Decoding arbitrary bytes must never panic, and anything that decodes
    // must re-encode to the same bytes.
    if let Ok(frame) = Frame::parse(data) {
        assert_eq!(frame.serialize().ok().as_deref(), Some(data));
    }
});
