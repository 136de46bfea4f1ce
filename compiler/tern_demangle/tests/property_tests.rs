//! Property-based tests for the demangler.
//!
//! Symbols come from untrusted binaries, so the demangler must reject
//! anything malformed with an error. These tests feed it random and mutated
//! input and check:
//! 1. No panics: every input returns `Ok` or `Err`
//! 2. Determinism: the same input always gives the same result
//! 3. Isolation: a failed call does not affect the next one
//! 4. Punycode: the encoder's output decodes back to the original text

#![allow(clippy::unwrap_used, reason = "Tests can panic")]
#![allow(
    clippy::doc_markdown,
    clippy::redundant_closure_for_method_calls,
    reason = "Proptest macros generate code with these patterns"
)]

use proptest::prelude::*;
use tern_demangle::{demangle, demangle_type, punycode};

const SEEDS: &[&str] = &[
    "$s17unitHelpFrawework10ReturnsInt1a1bS2i_SitF",
    "$s17unitHelpFrawework3FooC4failACSgSb_tcfc",
    "$s17unitHelpFrawework3FooCyS2icis",
    "$s17unitHelpFrawework3foo1a1b1c1dyx_q_q0_q1_tr2_lF",
    "$s4main3FooVAA1PA2aDP3baryyFTW",
];

/// Characters that appear in mangled names.
fn mangling_chars() -> impl Strategy<Value = String> {
    prop::string::string_regex("[0-9A-Za-z_]{0,48}").unwrap()
}

/// A seed symbol with one byte replaced and its tail cut.
fn mutated_seed() -> impl Strategy<Value = String> {
    (0..SEEDS.len(), any::<prop::sample::Index>(), any::<prop::sample::Index>(), "[0-9A-Za-z_]")
        .prop_map(|(seed, at, cut, replacement)| {
            let seed = SEEDS[seed];
            let at = 2 + at.index(seed.len() - 2);
            let mut mutated = String::with_capacity(seed.len());
            mutated.push_str(&seed[..at]);
            mutated.push_str(&replacement);
            mutated.push_str(&seed[at + 1..]);
            let cut = 2 + cut.index(mutated.len() - 1);
            mutated.truncate(cut);
            mutated
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn random_symbols_never_panic(body in mangling_chars()) {
        let symbol = format!("$s{body}");
        let _ = demangle(&symbol);
        let _ = demangle_type(&body);
    }

    #[test]
    fn mutated_symbols_never_panic(symbol in mutated_seed()) {
        let _ = demangle(&symbol);
    }

    #[test]
    fn demangling_is_deterministic(symbol in mutated_seed()) {
        prop_assert_eq!(demangle(&symbol), demangle(&symbol));
    }

    #[test]
    fn failures_do_not_leak_into_later_calls(symbol in mutated_seed()) {
        let _ = demangle(&symbol);
        for seed in SEEDS {
            prop_assert!(demangle(seed).is_ok());
        }
    }

    #[test]
    fn punycode_encode_then_decode(text in "[a-z\u{e0}-\u{ff}\u{3b1}-\u{3c9}]{1,16}") {
        if let Ok(encoded) = punycode::encode(&text) {
            prop_assert_eq!(punycode::decode(encoded.as_bytes()), Ok(text));
        }
    }
}
