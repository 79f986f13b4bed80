//! Fuzz target: `ClimateFrame::decode`
//!
//! Drives arbitrary byte sequences into the frame decoder and asserts
//! that it never panics and that every accepted frame really carries a
//! matching checksum and finite values.
//!
//! cargo fuzz run fuzz_frame_decode

#![no_main]

use climalink::wire::{self, ClimateFrame};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok((temperature, humidity)) = ClimateFrame::decode(data) {
        assert!(data.len() >= wire::FRAME_LEN, "accepted a short frame");
        assert_eq!(
            wire::checksum(&data[..4]),
            data[4],
            "accepted a bad checksum"
        );
        assert!(temperature.is_finite());
        assert!(humidity.is_finite());
    }
});
