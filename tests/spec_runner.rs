//! Spec collection and execution: suites, hooks, pending specs, matcher
//! failures and the empty-spec rule.

mod common;
use common::{
    assertions::{assert_spec_fails_with, assert_spec_passes},
    engine,
    fixtures::{engine_allowing_empty_specs, error_spec_with_body},
    spec_path,
};
use jsrt::{harness::NO_EXPECTATIONS, JsrtError, SpecStatus};

const SPEC_NAME: &str =
    "calling a function on an undefined property of an object should include the function name in the error message";

#[test]
fn test_spec_without_throw_fails_instead_of_passing_vacuously() {
    // If the call stopped throwing, the catch block and its expectation never run.
    let source = error_spec_with_body(
        r#"
    try {
      foo = { bar: { foobar: function() {} } };
      foo.bar.foobar();
    } catch(e) {
      expect(e.toString()).toMatch(/foobar/);
    }"#,
    );
    let mut engine = engine();
    let report = engine.run_specs(&source).unwrap();
    assert_spec_fails_with(&report, SPEC_NAME, NO_EXPECTATIONS);
    assert!(!report.success());
}

#[test]
fn test_empty_specs_pass_when_allowed() {
    let source = error_spec_with_body("var nothing = 1;");
    let mut engine = engine_allowing_empty_specs();
    let report = engine.run_specs(&source).unwrap();
    assert_spec_passes(&report, SPEC_NAME);
    assert_eq!(report.find(SPEC_NAME).unwrap().expectations, 0);
}

#[test]
fn test_wrong_message_fails_with_matcher_text() {
    let source = error_spec_with_body(
        r#"
    try {
      foo = {};
      foo.bar.other();
    } catch(e) {
      expect(e.toString()).toMatch(/foobar/);
    }"#,
    );
    let mut engine = engine();
    let report = engine.run_specs(&source).unwrap();
    assert_spec_fails_with(
        &report,
        SPEC_NAME,
        "Expected 'TypeError: Cannot call method 'other' of undefined' to match /foobar/.",
    );
}

#[test]
fn test_uncaught_exception_in_spec_is_reported() {
    let source = error_spec_with_body("foo = {}; foo.bar.foobar();");
    let mut engine = engine();
    let report = engine.run_specs(&source).unwrap();
    assert_spec_fails_with(
        &report,
        SPEC_NAME,
        "Uncaught TypeError: Cannot call method 'foobar' of undefined",
    );
    // An uncaught exception is a failure even without expectations.
    let failures = report.find(SPEC_NAME).unwrap().failures();
    assert!(!failures.iter().any(|m| m == NO_EXPECTATIONS));
}

#[test]
fn test_nested_suites_and_hooks_order() {
    let source = r#"
        var log = [];
        describe("outer", function() {
            beforeEach(function() { log.push("before outer"); this.shared = 1; });
            afterEach(function() { log.push("after outer"); });
            describe("inner", function() {
                beforeEach(function() { log.push("before inner"); });
                afterEach(function() { log.push("after inner"); });
                it("sees state from hooks", function() {
                    log.push("body");
                    expect(this.shared).toBe(1);
                });
            });
            it("runs only outer hooks", function() {
                expect(log.length).toBeGreaterThan(0);
            });
        });
    "#;
    let mut engine = engine();
    let report = engine.run_specs(source).unwrap();
    assert_eq!(report.total(), 2);
    assert_spec_passes(&report, "outer inner sees state from hooks");
    assert_spec_passes(&report, "outer runs only outer hooks");

    let log = engine.eval("log.join('|')").unwrap();
    assert_eq!(
        engine.display(&log),
        "before outer|before inner|body|after inner|after outer|before outer|after outer"
    );
}

#[test]
fn test_pending_specs_are_not_run() {
    let source = r#"
        var ran = false;
        describe("suite", function() {
            xit("is pending", function() { ran = true; });
            it("runs", function() { expect(ran).toBe(false); });
        });
    "#;
    let mut engine = engine();
    let report = engine.run_specs(source).unwrap();
    assert_eq!(report.pending(), 1);
    assert_eq!(report.passed(), 1);
    assert_eq!(report.find("suite is pending").unwrap().status, SpecStatus::Pending);
    assert!(report.success());
}

#[test]
fn test_negated_matchers_and_failure_messages() {
    let source = r#"
        describe("matchers", function() {
            it("pass", function() {
                expect([1, { a: "x" }]).toEqual([1, { a: "x" }]);
                expect("foobar").toContain("oba");
                expect(undefined).toBeUndefined();
                expect(null).toBeNull();
                expect(0).toBeFalsy();
                expect(3).not.toBe(4);
                expect(0.1 + 0.2).toBeCloseTo(0.3, 5);
                expect(function() { throw new Error("boom"); }).toThrow("boom");
                expect(function() {}).not.toThrow();
            });
            it("fail", function() {
                expect(1).toBe(2);
                expect("a").not.toEqual("a");
            });
        });
    "#;
    let mut engine = engine();
    let report = engine.run_specs(source).unwrap();
    assert_spec_passes(&report, "matchers pass");
    assert_spec_fails_with(&report, "matchers fail", "Expected 1 to be 2.");
    assert_spec_fails_with(&report, "matchers fail", "Expected 'a' not to equal 'a'.");
    assert_eq!(report.find("matchers fail").unwrap().failures().len(), 2);
}

#[test]
fn test_expect_outside_spec_throws() {
    let mut engine = engine();
    let err = engine.run_specs("expect(1).toBe(1);").unwrap_err();
    assert!(matches!(err, JsrtError::Uncaught(_)));
    assert!(err.to_string().contains("no current spec"));
}

#[test]
fn test_top_level_throw_in_spec_file_is_uncaught() {
    let mut engine = engine();
    let err = engine
        .run_specs("describe('s', function() { undefined.foobar(); });")
        .unwrap_err();
    match err {
        JsrtError::Uncaught(error) => assert!(error.mentions("foobar")),
        other => panic!("expected an uncaught error, got {:?}", other),
    }
}

#[test]
fn test_report_serializes_for_cli() {
    let mut engine = engine();
    let report = engine
        .run_spec_file(&spec_path("errorHandlingSpec.js"))
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["results"][0]["full_name"], SPEC_NAME);
    assert_eq!(json["results"][0]["status"], "passed");
    assert_eq!(json["results"][0]["expectations"], 1);
}

#[test]
fn test_missing_spec_file_is_io_error() {
    let mut engine = engine();
    let err = engine
        .run_spec_file(&spec_path("doesNotExistSpec.js"))
        .unwrap_err();
    assert!(matches!(err, JsrtError::IO(_)));
}

#[test]
fn test_spec_declared_inside_running_spec_fails_outer() {
    let source = r#"
        describe("s", function() {
            it("outer", function() {
                expect(1).toBe(1);
                it("inner", function() { expect(1).toBe(2); });
            });
            it("hooks", function() {
                expect(1).toBe(1);
                beforeEach(function() {});
            });
        });
    "#;
    let mut engine = engine();
    let report = engine.run_specs(source).unwrap();
    assert_eq!(report.total(), 2);
    assert!(!report.success());
    assert_spec_fails_with(
        &report,
        "s outer",
        "Uncaught Error: 'it' should only be used in 'describe' function",
    );
    assert_spec_fails_with(
        &report,
        "s hooks",
        "'beforeEach' should only be used in 'describe' function",
    );
    assert!(report.find("s outer inner").is_none());
}

#[test]
fn test_specs_before_top_level_throw_are_discarded() {
    let mut engine = engine();
    let err = engine
        .run_specs(
            r#"
            describe("a", function() {
                it("x", function() { expect(1).toBe(1); });
            });
            describe("open", function() {
                throw new Error("boom");
            });
            "#,
        )
        .unwrap_err();
    assert!(err.to_string().contains("boom"));

    let report = engine
        .run_specs(r#"describe("b", function() { it("y", function() { expect(1).toBe(1); }); });"#)
        .unwrap();
    let names: Vec<&str> = report.results.iter().map(|r| r.full_name.as_str()).collect();
    assert_eq!(names, vec!["b y"]);
    assert!(report.success());
}
