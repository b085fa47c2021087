#![no_main]

use arbitrary::Arbitrary;
use gridpdp::{AttributeKind, Function, FunctionFamily};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    kind: u8,
    family: u8,
    raw: String,
    candidate: String,
}

fuzz_target!(|input: Input| {
    let kind = AttributeKind::ALL[usize::from(input.kind) % AttributeKind::ALL.len()];

    // Anything that parses must survive its own canonical encoding
    if let Ok(value) = kind.parse(&input.raw) {
        let encoded = value.encode();
        let reparsed = kind
            .parse(&encoded)
            .unwrap_or_else(|e| panic!("canonical form {encoded:?} rejected: {e}"));
        assert_eq!(reparsed.equal(&value), Some(true), "{encoded:?}");
        assert_eq!(reparsed.encode(), encoded);
    }

    let family = match input.family % 3 {
        0 => FunctionFamily::Equal,
        1 => FunctionFamily::Match,
        _ => FunctionFamily::InRange,
    };
    let Some(function) = Function::new(family, kind) else {
        return;
    };
    let Ok(pattern) = function.compile(&input.raw) else {
        return;
    };
    if let Ok(candidate) = function.candidate_kind().parse(&input.candidate) {
        // Candidates of the declared kind always give a definite answer
        assert!(function.evaluate(&pattern, &candidate).is_some());
    }
});
