//! Jasmine-style spec runner.
//!
//! Spec files call `describe`/`it` to declare specs. Evaluating the file only
//! collects them; [`run_collected`] then executes each `it` body in declaration
//! order with its own expectation recorder.
//!
//! A spec passes only when it recorded at least one expectation and none of
//! them failed (see [`Config::fail_on_empty_specs`](crate::Config)). A body
//! that finishes without reaching any `expect` call is reported as a failure
//! rather than a vacuous pass.

use crate::error::ErrorKind;
use crate::runtime::builtins::{arg, define_method};
use crate::runtime::interpreter::{Interpreter, JsResult};
use crate::runtime::object::{NativeFn, ObjectRef};
use crate::runtime::value::{strict_equals, Value};
use serde::Serialize;
use tracing::{debug, info_span};

/// Message recorded for a spec that made no assertions.
pub const NO_EXPECTATIONS: &str = "Spec has no expectations";

/// Deepest object nesting compared by `toEqual` and rendered in messages.
const MAX_COMPARE_DEPTH: usize = 64;
const MAX_PRINT_DEPTH: usize = 3;

struct Suite {
    name: String,
    parent: Option<usize>,
    before_each: Vec<Value>,
    after_each: Vec<Value>,
}

struct CollectedSpec {
    suite: usize,
    name: String,
    /// `None` for specs declared with `xit`.
    body: Option<Value>,
}

#[derive(Default)]
struct Recorder {
    expectations: usize,
    failures: Vec<String>,
}

/// Per-interpreter harness state: declared suites, collected specs and the
/// recorder of the spec currently running.
pub struct HarnessState {
    suites: Vec<Suite>,
    open: Vec<usize>,
    specs: Vec<CollectedSpec>,
    recorder: Option<Recorder>,
    matchers: Option<ObjectRef>,
}

impl Default for HarnessState {
    fn default() -> Self {
        Self {
            suites: vec![Suite {
                name: String::new(),
                parent: None,
                before_each: Vec::new(),
                after_each: Vec::new(),
            }],
            open: vec![0],
            specs: Vec::new(),
            recorder: None,
            matchers: None,
        }
    }
}

impl HarnessState {
    fn current_suite(&self) -> usize {
        self.open.last().copied().unwrap_or(0)
    }

    /// Suite chain from the outermost suite down to `suite`.
    fn lineage(&self, suite: usize) -> Vec<usize> {
        let mut chain = Vec::new();
        let mut current = Some(suite);
        while let Some(index) = current {
            chain.push(index);
            current = self.suites.get(index).and_then(|s| s.parent);
        }
        chain.reverse();
        chain
    }

    fn full_name(&self, spec: &CollectedSpec) -> String {
        let mut parts: Vec<&str> = self
            .lineage(spec.suite)
            .into_iter()
            .filter_map(|i| self.suites.get(i))
            .map(|s| s.name.as_str())
            .filter(|name| !name.is_empty())
            .collect();
        parts.push(&spec.name);
        parts.join(" ")
    }

    /// Number of specs declared and not yet run.
    pub fn pending_specs(&self) -> usize {
        self.specs.len()
    }

    /// Forgets every declared suite and spec, leaving the root suite open.
    pub fn reset_collection(&mut self) {
        let matchers = self.matchers.take();
        *self = Self {
            matchers,
            ..Self::default()
        };
    }
}

/// Outcome of a single spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "messages", rename_all = "lowercase")]
pub enum SpecStatus {
    Passed,
    Failed(Vec<String>),
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecResult {
    pub full_name: String,
    #[serde(flatten)]
    pub status: SpecStatus,
    pub expectations: usize,
}

impl SpecResult {
    pub fn passed(&self) -> bool {
        self.status == SpecStatus::Passed
    }

    pub fn failures(&self) -> &[String] {
        match &self.status {
            SpecStatus::Failed(messages) => messages,
            _ => &[],
        }
    }
}

/// Results of one spec run, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpecReport {
    pub results: Vec<SpecResult>,
}

impl SpecReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.status, SpecStatus::Failed(_)))
            .count()
    }

    pub fn pending(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == SpecStatus::Pending)
            .count()
    }

    /// True when no spec failed.
    pub fn success(&self) -> bool {
        self.failed() == 0
    }

    pub fn find(&self, full_name: &str) -> Option<&SpecResult> {
        self.results.iter().find(|r| r.full_name == full_name)
    }

    pub fn merge(&mut self, other: SpecReport) {
        self.results.extend(other.results);
    }
}

/// Installs `describe`, `it`, `xit`, `beforeEach`, `afterEach` and `expect`.
pub(crate) fn install(interpreter: &mut Interpreter) {
    let global = interpreter.global.clone();
    define_method(interpreter, &global, "describe", 2, describe);
    define_method(interpreter, &global, "it", 2, it);
    define_method(interpreter, &global, "xit", 2, xit);
    define_method(interpreter, &global, "beforeEach", 1, before_each);
    define_method(interpreter, &global, "afterEach", 1, after_each);
    define_method(interpreter, &global, "expect", 1, expect);

    let matchers = interpreter.new_object();
    let table: [(&'static str, usize, NativeFn); 13] = [
        ("toBe", 1, to_be),
        ("toEqual", 1, to_equal),
        ("toMatch", 1, to_match),
        ("toContain", 1, to_contain),
        ("toBeDefined", 0, to_be_defined),
        ("toBeUndefined", 0, to_be_undefined),
        ("toBeNull", 0, to_be_null),
        ("toBeTruthy", 0, to_be_truthy),
        ("toBeFalsy", 0, to_be_falsy),
        ("toBeGreaterThan", 1, to_be_greater_than),
        ("toBeLessThan", 1, to_be_less_than),
        ("toBeCloseTo", 2, to_be_close_to),
        ("toThrow", 1, to_throw),
    ];
    for (name, arity, matcher) in table {
        define_method(interpreter, &matchers, name, arity, matcher);
    }
    interpreter.harness.matchers = Some(matchers);
}

fn require_function(interpreter: &mut Interpreter, value: &Value, caller: &str) -> JsResult<Value> {
    if value.is_callable() {
        return Ok(value.clone());
    }
    Err(interpreter.throw_error(
        ErrorKind::TypeError,
        format!("{} expects a function", caller),
    ))
}

/// Declarations are only collected before specs run; inside a running spec
/// they would never execute.
fn forbid_inside_spec(interpreter: &mut Interpreter, caller: &str) -> JsResult<()> {
    if interpreter.harness.recorder.is_none() {
        return Ok(());
    }
    Err(interpreter.throw_error(
        ErrorKind::Error,
        format!("'{}' should only be used in 'describe' function", caller),
    ))
}

fn describe(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    forbid_inside_spec(interpreter, "describe")?;
    let name = interpreter.to_string(&arg(args, 0))?.to_string();
    let body = require_function(interpreter, &arg(args, 1), "describe")?;

    let state = &mut interpreter.harness;
    let parent = state.current_suite();
    state.suites.push(Suite {
        name,
        parent: Some(parent),
        before_each: Vec::new(),
        after_each: Vec::new(),
    });
    let index = state.suites.len() - 1;
    state.open.push(index);

    let result = interpreter.call(&body, Value::Undefined, &[]);
    interpreter.harness.open.pop();
    result.map(|_| Value::Undefined)
}

fn declare_spec(interpreter: &mut Interpreter, args: &[Value], pending: bool) -> JsResult<Value> {
    forbid_inside_spec(interpreter, if pending { "xit" } else { "it" })?;
    let name = interpreter.to_string(&arg(args, 0))?.to_string();
    let body = if pending {
        None
    } else {
        Some(require_function(interpreter, &arg(args, 1), "it")?)
    };
    let suite = interpreter.harness.current_suite();
    interpreter.harness.specs.push(CollectedSpec { suite, name, body });
    Ok(Value::Undefined)
}

fn it(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    declare_spec(interpreter, args, false)
}

fn xit(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    declare_spec(interpreter, args, true)
}

fn before_each(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    forbid_inside_spec(interpreter, "beforeEach")?;
    let hook = require_function(interpreter, &arg(args, 0), "beforeEach")?;
    let suite = interpreter.harness.current_suite();
    if let Some(suite) = interpreter.harness.suites.get_mut(suite) {
        suite.before_each.push(hook);
    }
    Ok(Value::Undefined)
}

fn after_each(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    forbid_inside_spec(interpreter, "afterEach")?;
    let hook = require_function(interpreter, &arg(args, 0), "afterEach")?;
    let suite = interpreter.harness.current_suite();
    if let Some(suite) = interpreter.harness.suites.get_mut(suite) {
        suite.after_each.push(hook);
    }
    Ok(Value::Undefined)
}

fn expect(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    if interpreter.harness.recorder.is_none() {
        return Err(interpreter.throw_error(
            ErrorKind::Error,
            "'expect' was used when there was no current spec",
        ));
    }
    let prototype = interpreter.harness.matchers.clone();
    let actual = arg(args, 0);
    let make = |negated: bool| {
        let expectation = ObjectRef::new(
            crate::runtime::object::ObjectKind::Ordinary,
            prototype.clone(),
        );
        expectation.define_hidden("actual", actual.clone());
        expectation.define_hidden("isNot", Value::Boolean(negated));
        expectation
    };
    let expectation = make(false);
    expectation.define_hidden("not", Value::Object(make(true)));
    Ok(Value::Object(expectation))
}

// --- Matchers ---

/// Evaluates a matcher against the expectation in `this` and records the outcome.
fn check<F>(
    interpreter: &mut Interpreter,
    this: &Value,
    matcher: &str,
    expected: Option<&Value>,
    test: F,
) -> JsResult<Value>
where
    F: FnOnce(&mut Interpreter, &Value) -> JsResult<bool>,
{
    let Some(expectation) = this.as_object().cloned() else {
        return Err(interpreter.throw_error(
            ErrorKind::TypeError,
            format!("{} must be called on an expectation", matcher),
        ));
    };
    let actual = expectation.get("actual");
    let negated = expectation.get("isNot").to_boolean();
    let passed = test(interpreter, &actual)? != negated;

    let failure = if passed {
        None
    } else {
        let mut message = format!(
            "Expected {}{} {}",
            pretty(interpreter, &actual, 0),
            if negated { " not" } else { "" },
            humanize(matcher)
        );
        if let Some(expected) = expected {
            message.push(' ');
            message.push_str(&pretty(interpreter, expected, 0));
        }
        message.push('.');
        Some(message)
    };

    match interpreter.harness.recorder.as_mut() {
        Some(recorder) => {
            recorder.expectations += 1;
            recorder.failures.extend(failure);
            Ok(Value::Undefined)
        }
        None => Err(interpreter.throw_error(
            ErrorKind::Error,
            "'expect' was used when there was no current spec",
        )),
    }
}

/// `toBeGreaterThan` -> `to be greater than`.
fn humanize(matcher: &str) -> String {
    let mut out = String::new();
    for c in matcher.chars() {
        if c.is_ascii_uppercase() {
            out.push(' ');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Renders a value for failure messages: strings quoted, arrays and objects
/// expanded a few levels deep.
fn pretty(interpreter: &mut Interpreter, value: &Value, depth: usize) -> String {
    let object = match value {
        Value::String(s) => return format!("'{}'", s),
        Value::Object(o) => o.clone(),
        other => return interpreter.display(other),
    };
    if object.is_callable() {
        return "Function".to_string();
    }
    if object.is_error() || object.regexp().is_some() {
        return interpreter.display(value);
    }
    if depth >= MAX_PRINT_DEPTH {
        return if object.is_array() { "Array" } else { "Object" }.to_string();
    }
    if let Some(elements) = object.array_elements() {
        let items: Vec<String> = elements
            .iter()
            .map(|e| pretty(interpreter, e, depth + 1))
            .collect();
        return format!("[ {} ]", items.join(", "));
    }
    let members: Vec<String> = object
        .own_keys(true)
        .iter()
        .map(|key| {
            let member = object.get(key);
            format!("{} : {}", key, pretty(interpreter, &member, depth + 1))
        })
        .collect();
    format!("{{ {} }}", members.join(", "))
}

/// Structural equality used by `toEqual` and `toContain`.
fn deep_equals(a: &Value, b: &Value, depth: usize) -> bool {
    if strict_equals(a, b) {
        return true;
    }
    let (x, y) = match (a, b) {
        (Value::Number(x), Value::Number(y)) => return x.is_nan() && y.is_nan(),
        (Value::Object(x), Value::Object(y)) => (x, y),
        _ => return false,
    };
    if depth >= MAX_COMPARE_DEPTH || x.class_name() != y.class_name() {
        return false;
    }
    if let (Some(rx), Some(ry)) = (x.regexp(), y.regexp()) {
        return rx.source == ry.source && rx.flags == ry.flags;
    }
    if let (Some(p), Some(q)) = (x.primitive_value(), y.primitive_value()) {
        return deep_equals(&p, &q, depth + 1);
    }
    if x.array_length() != y.array_length() {
        return false;
    }
    let keys_x = x.own_keys(true);
    let keys_y = y.own_keys(true);
    if keys_x.len() != keys_y.len() {
        return false;
    }
    if x.is_error() && !deep_equals(&x.get("message"), &y.get("message"), depth + 1) {
        return false;
    }
    keys_x.iter().all(|key| {
        y.has_own_property(key) && deep_equals(&x.get(key), &y.get(key), depth + 1)
    })
}

fn to_be(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let expected = arg(args, 0);
    check(interpreter, this, "toBe", Some(&expected), |_, actual| {
        Ok(strict_equals(actual, &expected))
    })
}

fn to_equal(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let expected = arg(args, 0);
    check(interpreter, this, "toEqual", Some(&expected), |_, actual| {
        Ok(deep_equals(actual, &expected, 0))
    })
}

/// `toMatch` accepts a RegExp or a pattern string.
fn to_match(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let expected = arg(args, 0);
    check(interpreter, this, "toMatch", Some(&expected), |interpreter, actual| {
        let pattern = match expected.as_object() {
            Some(o) if o.regexp().is_some() => o.clone(),
            _ => {
                let source = interpreter.to_string(&expected)?;
                interpreter.new_regexp(&source, "")?
            }
        };
        let text = interpreter.to_string(actual)?;
        Ok(pattern
            .regexp()
            .is_some_and(|data| data.regex.is_match(&text)))
    })
}

fn to_contain(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let expected = arg(args, 0);
    check(interpreter, this, "toContain", Some(&expected), |interpreter, actual| {
        let found = actual
            .as_object()
            .and_then(|array| array.with_elements(|e| e.iter().any(|e| deep_equals(e, &expected, 0))));
        if let Some(found) = found {
            return Ok(found);
        }
        if actual.is_nullish() {
            return Ok(false);
        }
        let haystack = interpreter.to_string(actual)?;
        let needle = interpreter.to_string(&expected)?;
        Ok(haystack.contains(&*needle))
    })
}

fn to_be_defined(interpreter: &mut Interpreter, this: &Value, _args: &[Value]) -> JsResult<Value> {
    check(interpreter, this, "toBeDefined", None, |_, actual| {
        Ok(!actual.is_undefined())
    })
}

fn to_be_undefined(interpreter: &mut Interpreter, this: &Value, _args: &[Value]) -> JsResult<Value> {
    check(interpreter, this, "toBeUndefined", None, |_, actual| {
        Ok(actual.is_undefined())
    })
}

fn to_be_null(interpreter: &mut Interpreter, this: &Value, _args: &[Value]) -> JsResult<Value> {
    check(interpreter, this, "toBeNull", None, |_, actual| {
        Ok(matches!(actual, Value::Null))
    })
}

fn to_be_truthy(interpreter: &mut Interpreter, this: &Value, _args: &[Value]) -> JsResult<Value> {
    check(interpreter, this, "toBeTruthy", None, |_, actual| {
        Ok(actual.to_boolean())
    })
}

fn to_be_falsy(interpreter: &mut Interpreter, this: &Value, _args: &[Value]) -> JsResult<Value> {
    check(interpreter, this, "toBeFalsy", None, |_, actual| {
        Ok(!actual.to_boolean())
    })
}

fn to_be_greater_than(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let expected = arg(args, 0);
    check(interpreter, this, "toBeGreaterThan", Some(&expected), |interpreter, actual| {
        Ok(interpreter.to_number(actual)? > interpreter.to_number(&expected)?)
    })
}

fn to_be_less_than(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let expected = arg(args, 0);
    check(interpreter, this, "toBeLessThan", Some(&expected), |interpreter, actual| {
        Ok(interpreter.to_number(actual)? < interpreter.to_number(&expected)?)
    })
}

/// `toBeCloseTo(expected, precision = 2)`.
fn to_be_close_to(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let expected = arg(args, 0);
    let precision = arg(args, 1);
    check(interpreter, this, "toBeCloseTo", Some(&expected), |interpreter, actual| {
        let precision = match precision {
            Value::Undefined => 2.0,
            other => interpreter.to_number(&other)?,
        };
        let actual = interpreter.to_number(actual)?;
        let expected = interpreter.to_number(&expected)?;
        Ok((actual - expected).abs() < 10f64.powf(-precision) / 2.0)
    })
}

/// `toThrow()` passes when calling the actual value throws. With an argument,
/// the thrown value (or its `message`) must also equal the argument (or its `message`).
fn to_throw(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let expected = args.first().cloned();
    check(interpreter, this, "toThrow", expected.as_ref(), |interpreter, actual| {
        if !actual.is_callable() {
            return Err(interpreter.throw_error(ErrorKind::Error, "Actual is not a function"));
        }
        let thrown = match interpreter.call(actual, Value::Undefined, &[]) {
            Ok(_) => return Ok(false),
            Err(throw) => throw.0,
        };
        let Some(expected) = &expected else {
            return Ok(true);
        };
        let message_of = |value: &Value| match value.as_object() {
            Some(o) if o.has_property("message") => o.get("message"),
            _ => value.clone(),
        };
        Ok(deep_equals(&message_of(&thrown), &message_of(expected), 0))
    })
}

// --- Running ---

/// Runs every collected spec and clears the collection.
pub fn run_collected(interpreter: &mut Interpreter) -> SpecReport {
    let specs = std::mem::take(&mut interpreter.harness.specs);
    let mut report = SpecReport::default();

    for spec in &specs {
        let full_name = interpreter.harness.full_name(spec);
        let Some(body) = &spec.body else {
            report.results.push(SpecResult {
                full_name,
                status: SpecStatus::Pending,
                expectations: 0,
            });
            continue;
        };
        let _span = info_span!("spec", name = %full_name).entered();

        let lineage = interpreter.harness.lineage(spec.suite);
        let mut before = Vec::new();
        let mut after = Vec::new();
        for index in &lineage {
            if let Some(suite) = interpreter.harness.suites.get(*index) {
                before.extend(suite.before_each.iter().cloned());
            }
        }
        for index in lineage.iter().rev() {
            if let Some(suite) = interpreter.harness.suites.get(*index) {
                after.extend(suite.after_each.iter().cloned());
            }
        }

        interpreter.harness.recorder = Some(Recorder::default());
        let context = Value::Object(interpreter.new_object());
        let mut uncaught = Vec::new();

        let mut setup_ok = true;
        for hook in &before {
            if let Err(throw) = interpreter.call(hook, context.clone(), &[]) {
                uncaught.push(throw);
                setup_ok = false;
                break;
            }
        }
        if setup_ok {
            if let Err(throw) = interpreter.call(body, context.clone(), &[]) {
                uncaught.push(throw);
            }
        }
        for hook in &after {
            if let Err(throw) = interpreter.call(hook, context.clone(), &[]) {
                uncaught.push(throw);
            }
        }

        let recorder = interpreter.harness.recorder.take().unwrap_or_default();
        let mut failures = recorder.failures;
        for throw in &uncaught {
            let error = interpreter.thrown_error(throw);
            failures.push(format!("Uncaught {}", error.text));
        }
        if failures.is_empty()
            && recorder.expectations == 0
            && interpreter.config.fail_on_empty_specs
        {
            failures.push(NO_EXPECTATIONS.to_string());
        }

        let status = if failures.is_empty() {
            SpecStatus::Passed
        } else {
            SpecStatus::Failed(failures)
        };
        debug!(expectations = recorder.expectations, status = ?status, "spec finished");
        report.results.push(SpecResult {
            full_name,
            status,
            expectations: recorder.expectations,
        });
    }
    report
}
