//! Core language behavior: scoping, closures, prototypes, operators and
//! control flow.

mod common;
use common::{
    assertions::{assert_evaluates_to, assert_raises_with, assert_syntax_error},
    engine,
};
use jsrt::{Config, Engine, ErrorKind, Value};

#[test]
fn test_hoisting_and_function_scope() {
    let mut engine = engine();
    assert_evaluates_to(&mut engine, "typeof hoisted; var hoisted = 1; typeof hoisted", "number");
    assert_evaluates_to(&mut engine, "early(); function early() { return 'ok'; }", "ok");
    assert_evaluates_to(
        &mut engine,
        "function f() { if (false) { var inner = 1; } return typeof inner; } f()",
        "undefined",
    );
    assert_evaluates_to(&mut engine, "typeof neverDeclared", "undefined");
}

#[test]
fn test_closures_capture_bindings() {
    let mut engine = engine();
    let source = r#"
        function makeCounter() {
            var count = 0;
            return function() { return ++count; };
        }
        var a = makeCounter(), b = makeCounter();
        a(); a();
        [a(), b()].join(",");
    "#;
    assert_evaluates_to(&mut engine, source, "3,1");
}

#[test]
fn test_named_function_expression_binds_itself() {
    let mut engine = engine();
    assert_evaluates_to(
        &mut engine,
        "var fact = function f(n) { return n <= 1 ? 1 : n * f(n - 1); }; fact(5)",
        "120",
    );
    assert_evaluates_to(&mut engine, "typeof f", "undefined");
}

#[test]
fn test_prototypes_and_constructors() {
    let mut engine = engine();
    let source = r#"
        function Animal(name) { this.name = name; }
        Animal.prototype.speak = function() { return this.name + " makes a sound"; };
        function Dog(name) { Animal.call(this, name); }
        Dog.prototype = Object.create(Animal.prototype);
        Dog.prototype.speak = function() { return this.name + " barks"; };
        var d = new Dog("Rex");
        [d.speak(), d instanceof Dog, d instanceof Animal, Animal.prototype.isPrototypeOf(d),
         d.hasOwnProperty("name"), d.hasOwnProperty("speak")].join("|");
    "#;
    assert_evaluates_to(&mut engine, source, "Rex barks|true|true|true|true|false");
}

#[test]
fn test_constructor_returning_object_replaces_instance() {
    let mut engine = engine();
    assert_evaluates_to(
        &mut engine,
        "function F() { this.a = 1; return { b: 2 }; } var o = new F(); [o.a, o.b].join(',')",
        ",2",
    );
}

#[test]
fn test_this_binding() {
    let mut engine = engine();
    let source = r#"
        var o = { v: 7, read: function() { return this.v; } };
        var unbound = o.read;
        var v = "global";
        [o.read(), unbound(), o.read.call({ v: 9 }), o.read.apply({ v: 10 }, [])].join(",");
    "#;
    assert_evaluates_to(&mut engine, source, "7,global,9,10");
}

#[test]
fn test_arguments_object() {
    let mut engine = engine();
    assert_evaluates_to(
        &mut engine,
        "function f() { return arguments.length + ':' + arguments[1]; } f('a', 'b', 'c')",
        "3:b",
    );
}

#[test]
fn test_equality_and_coercion() {
    let mut engine = engine();
    let cases = [
        ("1 == '1'", "true"),
        ("1 === '1'", "false"),
        ("null == undefined", "true"),
        ("null === undefined", "false"),
        ("NaN == NaN", "false"),
        ("'' == 0", "true"),
        ("'5' * '2'", "10"),
        ("'5' + 2", "52"),
        ("[1, 2] + ''", "1,2"),
        ("({}) + ''", "[object Object]"),
        ("typeof null", "object"),
        ("typeof function() {}", "function"),
        ("!!''", "false"),
        ("1 / 0", "Infinity"),
        ("-1 / 0", "-Infinity"),
        ("0.1 + 0.2", "0.30000000000000004"),
        ("7 % -3", "1"),
        ("-7 >> 1", "-4"),
        ("-7 >>> 28", "15"),
        ("'b' > 'a'", "true"),
        ("'10' < '9'", "true"),
        ("10 < 9", "false"),
    ];
    for (source, expected) in cases {
        assert_evaluates_to(&mut engine, source, expected);
    }
}

#[test]
fn test_logical_operators_short_circuit() {
    let mut engine = engine();
    assert_evaluates_to(&mut engine, "var hits = 0; function hit() { hits++; return true; } false && hit(); true || hit(); hits", "0");
    assert_evaluates_to(&mut engine, "null || 'fallback'", "fallback");
    assert_evaluates_to(&mut engine, "'first' && 'second'", "second");
}

#[test]
fn test_loops_break_continue() {
    let mut engine = engine();
    let source = r#"
        var out = [];
        for (var i = 0; i < 10; i++) {
            if (i % 2 === 0) continue;
            if (i > 7) break;
            out.push(i);
        }
        var j = 0;
        do { j++; } while (j < 3);
        while (true) { j++; if (j > 5) break; }
        out.join(",") + ";" + j;
    "#;
    assert_evaluates_to(&mut engine, source, "1,3,5,7;6");
}

#[test]
fn test_for_in_enumerates_own_and_inherited_keys() {
    let mut engine = engine();
    let source = r#"
        function P() { this.own = 1; }
        P.prototype.inherited = 2;
        var keys = [];
        for (var k in new P()) { keys.push(k); }
        keys.join(",");
    "#;
    assert_evaluates_to(&mut engine, source, "own,inherited");
}

#[test]
fn test_delete_and_in() {
    let mut engine = engine();
    assert_evaluates_to(
        &mut engine,
        "var o = { a: 1 }; var before = 'a' in o; delete o.a; before + ',' + ('a' in o)",
        "true,false",
    );
    assert_raises_with(&mut engine, "'a' in 5", "Cannot use 'in' operator");
}

#[test]
fn test_throw_non_error_values() {
    let mut engine = engine();
    let outcome = engine.try_eval("throw 'plain string';").unwrap();
    assert!(outcome.raised());
    let error = outcome.error().unwrap();
    assert_eq!(error.kind, None);
    assert_eq!(error.text, "plain string");

    assert_evaluates_to(
        &mut engine,
        "var r; try { throw { code: 42 }; } catch (e) { r = e.code; } r",
        "42",
    );
}

#[test]
fn test_finally_overrides_return() {
    let mut engine = engine();
    assert_evaluates_to(
        &mut engine,
        "function f() { try { return 'try'; } finally { return 'finally'; } } f()",
        "finally",
    );
}

#[test]
fn test_call_depth_limit_raises_range_error() {
    let mut engine = Engine::with_config(Config {
        max_call_depth: 64,
        ..Config::default()
    });
    let outcome = engine
        .try_eval("function down(n) { return down(n + 1); } down(0);")
        .unwrap();
    let error = outcome.error().unwrap();
    assert_eq!(error.kind, Some(ErrorKind::RangeError));
    assert!(outcome.message_contains("Maximum call stack size exceeded"));

    // The engine stays usable afterwards.
    assert_eq!(engine.eval("1 + 1").unwrap(), Value::Number(2.0));
}

#[test]
fn test_global_var_is_global_property() {
    let mut engine = engine();
    engine.eval("var exported = 'yes'; implicit = 'also';").unwrap();
    assert_evaluates_to(&mut engine, "this.exported + ',' + this.implicit", "yes,also");
    assert_eq!(engine.get_global("exported"), Value::from("yes"));
}

#[test]
fn test_readonly_globals_ignore_assignment() {
    let mut engine = engine();
    assert_evaluates_to(&mut engine, "undefined = 1; NaN = 2; typeof undefined + ',' + isNaN(NaN)", "undefined,true");
}

#[test]
fn test_syntax_errors() {
    let mut engine = engine();
    assert_syntax_error(&mut engine, "var = 1;");
    assert_syntax_error(&mut engine, "function (");
    assert_syntax_error(&mut engine, "'unterminated");
    assert_syntax_error(&mut engine, "switch (x) { case 1: break; }");
    assert_syntax_error(&mut engine, "with (o) {}");
}

#[test]
fn test_print_collects_output() {
    let mut engine = engine();
    engine.eval("print('hello', 1 + 1); print([1, 2]);").unwrap();
    assert_eq!(engine.take_output(), vec!["hello 2", "1,2"]);
    assert!(engine.take_output().is_empty());

    let mut quiet = Engine::with_config(Config {
        enable_print: false,
        ..Config::default()
    });
    assert_raises_with(&mut quiet, "print('x');", "print is not defined");
}

#[test]
fn test_deep_nesting_is_rejected_without_overflow() {
    let mut engine = engine();
    let parens = format!("{}1{}", "(".repeat(5000), ")".repeat(5000));
    assert_syntax_error(&mut engine, &parens);
    let arrays = format!("var x = {}1{};", "[".repeat(5000), "]".repeat(5000));
    assert_syntax_error(&mut engine, &arrays);
    let blocks = format!("{}{}", "{".repeat(5000), "}".repeat(5000));
    assert_syntax_error(&mut engine, &blocks);

    // Ordinary depth still parses and runs.
    let shallow = format!("{}1{}", "(".repeat(100), ")".repeat(100));
    assert_evaluates_to(&mut engine, &shallow, "1");
    assert_evaluates_to(&mut engine, &vec!["1"; 200].join(" + "), "200");

    // Nesting built at run time is bounded too.
    let outcome = engine
        .try_eval("var a = []; for (var i = 0; i < 2000; i++) { a = [a]; } JSON.stringify(a)")
        .unwrap();
    assert_eq!(outcome.error().unwrap().kind, Some(ErrorKind::RangeError));
}
