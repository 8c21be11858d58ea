//! High-level assertion helpers for common test patterns.

#![allow(dead_code)]
//!
//! Each helper evaluates a script and checks one property of the result,
//! with a message that names the script on failure.

use jsrt::{Engine, JsrtError, Outcome, SpecReport, Value};

/// Asserts that `source` completes and returns its completion value.
pub fn assert_completes(engine: &mut Engine, source: &str) -> Value {
    match engine.try_eval(source) {
        Ok(Outcome::Completed(value)) => value,
        Ok(Outcome::Threw(error)) => panic!("script threw {} : {}", error, source),
        Err(e) => panic!("script failed to parse ({}) : {}", e, source),
    }
}

/// Asserts that `source` completes with a value whose string form is `expected`.
pub fn assert_evaluates_to(engine: &mut Engine, source: &str, expected: &str) {
    let value = assert_completes(engine, source);
    let shown = engine.display(&value);
    assert_eq!(shown, expected, "unexpected result for: {}", source);
}

/// Asserts that `source` raises, and that the error text contains `needle`.
///
/// The two conditions are checked separately so a failure names which one broke.
pub fn assert_raises_with(engine: &mut Engine, source: &str, needle: &str) {
    let outcome = engine
        .try_eval(source)
        .unwrap_or_else(|e| panic!("script failed to parse ({}) : {}", e, source));
    assert!(outcome.raised(), "expected an exception from: {}", source);
    assert!(
        outcome.message_contains(needle),
        "expected error mentioning {:?}, got {:?}",
        needle,
        outcome.error().map(|e| e.text.clone())
    );
}

/// Asserts that `source` is rejected by the parser.
pub fn assert_syntax_error(engine: &mut Engine, source: &str) {
    match engine.try_eval(source) {
        Err(JsrtError::Syntax { .. }) => {}
        other => panic!("expected a syntax error, got {:?} for: {}", other, source),
    }
}

/// Asserts that the spec named `full_name` ran and passed.
pub fn assert_spec_passes(report: &SpecReport, full_name: &str) {
    let result = report
        .find(full_name)
        .unwrap_or_else(|| panic!("no spec named {:?} in {:?}", full_name, report));
    assert!(
        result.passed(),
        "spec {:?} should pass, failures: {:?}",
        full_name,
        result.failures()
    );
}

/// Asserts that the spec named `full_name` failed with a message containing `needle`.
pub fn assert_spec_fails_with(report: &SpecReport, full_name: &str, needle: &str) {
    let result = report
        .find(full_name)
        .unwrap_or_else(|| panic!("no spec named {:?} in {:?}", full_name, report));
    assert!(!result.passed(), "spec {:?} should fail", full_name);
    assert!(
        result.failures().iter().any(|m| m.contains(needle)),
        "spec {:?} failures {:?} should mention {:?}",
        full_name,
        result.failures(),
        needle
    );
}
