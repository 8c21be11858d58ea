//! Calling a method on an undefined property must raise a TypeError whose
//! message names the method being called.

mod common;
use common::{
    assertions::{assert_completes, assert_evaluates_to, assert_raises_with, assert_spec_passes},
    engine,
    fixtures::{random_identifier, seeded_rng, undefined_member_call},
    spec_path,
};
use jsrt::{ErrorKind, Outcome, Value};

const SPEC_NAME: &str =
    "calling a function on an undefined property of an object should include the function name in the error message";

#[test]
fn test_error_handling_spec_file_passes() {
    let mut engine = engine();
    let report = engine
        .run_spec_file(&spec_path("errorHandlingSpec.js"))
        .unwrap();

    assert_eq!(report.total(), 1);
    assert_spec_passes(&report, SPEC_NAME);
    assert_eq!(report.find(SPEC_NAME).unwrap().expectations, 1);
    assert!(report.success());
}

#[test]
fn test_uncaught_member_call_names_method() {
    let mut engine = engine();
    let outcome = engine.try_eval("foo = {}; foo.bar.foobar();").unwrap();

    // Whether it raised and what it says are asserted independently.
    assert!(outcome.raised());
    assert!(outcome.message_contains("foobar"));

    let error = outcome.error().unwrap();
    assert_eq!(error.kind, Some(ErrorKind::TypeError));
    assert_eq!(error.message, "Cannot call method 'foobar' of undefined");
    assert_eq!(
        error.text,
        "TypeError: Cannot call method 'foobar' of undefined"
    );
}

#[test]
fn test_completed_script_never_matches_message() {
    let mut engine = engine();
    let outcome = engine.try_eval("var foobar = 'foobar'; foobar;").unwrap();
    assert!(!outcome.raised());
    assert!(!outcome.message_contains("foobar"));
}

#[test]
fn test_message_names_method_for_generated_identifiers() {
    let mut rng = seeded_rng();
    for _ in 0..64 {
        let object = random_identifier(&mut rng);
        let property = random_identifier(&mut rng);
        let method = random_identifier(&mut rng);
        let source = undefined_member_call(&object, &property, &method);

        let mut engine = engine();
        let outcome = engine.try_eval(&source).unwrap();
        assert!(outcome.raised(), "no exception from: {}", source);
        assert!(
            outcome.message_contains(&method),
            "{:?} does not mention {}",
            outcome.error(),
            method
        );
    }
}

#[test]
fn test_reading_missing_property_is_not_an_error() {
    let mut engine = engine();
    let outcome = engine.try_eval("foo = {}; foo.bar").unwrap();
    assert!(!outcome.raised());
    assert!(outcome.error().is_none());
    assert_eq!(outcome.value(), Some(&Value::Undefined));
}

#[test]
fn test_calling_undefined_values_directly_raises() {
    for source in ["var u; u()", "null()", "(void 0)()", "undefined()"] {
        let mut engine = engine();
        let outcome = engine.try_eval(source).unwrap();
        assert!(outcome.raised(), "no exception from: {}", source);
        let error = outcome.error().unwrap();
        assert_eq!(error.kind, Some(ErrorKind::TypeError), "{}", source);
        assert!(
            outcome.message_contains("is not a function"),
            "{:?} for: {}",
            error,
            source
        );
    }
}

#[test]
fn test_accessed_property_name_does_not_change_outcome() {
    let mut rng = seeded_rng();
    for _ in 0..64 {
        let object = random_identifier(&mut rng);
        let property = random_identifier(&mut rng);

        // Reading the missing property alone completes with undefined.
        let mut engine = engine();
        let read = format!("var {o} = {{}}; {o}.{p}", o = object, p = property);
        let outcome = engine.try_eval(&read).unwrap();
        assert_eq!(outcome.value(), Some(&Value::Undefined), "{}", read);

        // Calling through it raises and names the method, not the property.
        let source = undefined_member_call(&object, &property, "foobar");
        let outcome = engine.try_eval(&source).unwrap();
        assert!(outcome.raised(), "no exception from: {}", source);
        assert_eq!(
            outcome.error().map(|e| e.message.clone()),
            Some("Cannot call method 'foobar' of undefined".to_string())
        );
    }
}

#[test]
fn test_null_base_names_method_and_null() {
    let mut engine = engine();
    assert_raises_with(
        &mut engine,
        "var o = { bar: null }; o.bar.baz();",
        "Cannot call method 'baz' of null",
    );
}

#[test]
fn test_computed_method_name_is_evaluated() {
    let mut engine = engine();
    assert_raises_with(
        &mut engine,
        "var o = {}; var name = 'foo' + 'bar'; o.missing[name]();",
        "'foobar'",
    );
}

#[test]
fn test_other_call_failures() {
    let mut engine = engine();
    assert_raises_with(&mut engine, "notDeclared();", "notDeclared is not defined");
    assert_raises_with(&mut engine, "var o = { f: 1 }; o.f();", "o.f is not a function");
    assert_raises_with(&mut engine, "var g = 'text'; g();", "g is not a function");
    assert_raises_with(
        &mut engine,
        "var o = {}; o.bar.baz;",
        "Cannot read property 'baz' of undefined",
    );
}

#[test]
fn test_caught_error_is_a_type_error() {
    let mut engine = engine();
    let source = r#"
        var caught;
        try {
            foo = {};
            foo.bar.foobar();
        } catch (e) {
            caught = e;
        }
        [caught instanceof TypeError, caught instanceof Error, caught.name, /foobar/.test(caught.toString())].join(",");
    "#;
    assert_evaluates_to(&mut engine, source, "true,true,TypeError,true");
}

#[test]
fn test_finally_runs_after_member_call_failure() {
    let mut engine = engine();
    let value = assert_completes(
        &mut engine,
        r#"
        var log = [];
        try {
            try { undefined.foobar(); } finally { log.push("finally"); }
        } catch (e) {
            log.push(e.message);
        }
        log.join("|");
        "#,
    );
    assert_eq!(
        engine.display(&value),
        "finally|Cannot call method 'foobar' of undefined"
    );
}

#[test]
fn test_into_result_converts_uncaught_error() {
    let mut engine = engine();
    let err = engine.eval("foo = {}; foo.bar.foobar();").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Uncaught TypeError: Cannot call method 'foobar' of undefined"
    );
    assert!(matches!(
        engine.try_eval("1").unwrap(),
        Outcome::Completed(_)
    ));
}
