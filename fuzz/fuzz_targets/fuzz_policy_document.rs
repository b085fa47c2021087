#![no_main]

use std::path::Path;

use gridpdp::{Format, PolicyBuilder, Registry, Request};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let registry = Registry::builtin();

    // Malformed documents are errors, never panics. Group references are
    // resolved against a directory that holds no group files.
    for format in [Format::Json, Format::Toml] {
        let _ = PolicyBuilder::new(&registry).parse_str(text, format, Path::new("/nonexistent"));
        let _ = Request::parse_str(&registry, text, format);
    }
});
