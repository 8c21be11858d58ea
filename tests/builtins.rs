//! The standard library available to scripts.

mod common;
use common::{
    assertions::{assert_evaluates_to, assert_raises_with},
    engine,
};
use jsrt::ErrorKind;

fn check_all(cases: &[(&str, &str)]) {
    let mut engine = engine();
    for (source, expected) in cases {
        assert_evaluates_to(&mut engine, source, expected);
    }
}

#[test]
fn test_to_fixed() {
    check_all(&[
        ("(1.005).toFixed(2)", "1.00"),
        ("(0.5).toFixed(0)", "1"),
        ("(2.5).toFixed(0)", "3"),
        ("(-1.5).toFixed(0)", "-2"),
        ("(123.456).toFixed(1)", "123.5"),
        ("(0).toFixed(2)", "0.00"),
        ("(1.23).toFixed()", "1"),
        ("(1e21).toFixed(2)", "1e+21"),
        ("(0.000001).toFixed(7)", "0.0000010"),
        ("(NaN).toFixed(2)", "NaN"),
    ]);

    let mut engine = engine();
    let outcome = engine.try_eval("(1).toFixed(21)").unwrap();
    assert_eq!(outcome.error().unwrap().kind, Some(ErrorKind::RangeError));
    assert!(outcome.message_contains("toFixed() digits argument must be between 0 and 20"));
}

#[test]
fn test_number_conversions() {
    check_all(&[
        ("Number('  12 ')", "12"),
        ("Number('1e3')", "1000"),
        ("Number('0x10')", "16"),
        ("Number('12px')", "NaN"),
        ("Number('')", "0"),
        ("(255).toString(16)", "ff"),
        ("(255).toString(2)", "11111111"),
        ("parseInt('0x1f')", "31"),
        ("parseInt('08')", "8"),
        ("parseInt('12px', 10)", "12"),
        ("parseInt('z', 36)", "35"),
        ("parseInt('abc')", "NaN"),
        ("parseFloat('3.14abc')", "3.14"),
        ("parseFloat('-.5e1')", "-5"),
        ("isNaN('x')", "true"),
        ("isFinite('12')", "true"),
        ("Number.MAX_VALUE > 1e308", "true"),
    ]);
}

#[test]
fn test_strings() {
    check_all(&[
        ("'abc'.charAt(1)", "b"),
        ("'abc'.charCodeAt(0)", "97"),
        ("'abc'.length", "3"),
        ("'abc'[2]", "c"),
        ("'a,b,,c'.split(',').length", "4"),
        ("'abc'.split('').join('-')", "a-b-c"),
        ("'a1b2c3'.split(/\\d/, 2).join('|')", "a|b"),
        ("'  x  '.trim()", "x"),
        ("'Hello'.slice(-3)", "llo"),
        ("'Hello'.substring(3, 1)", "el"),
        ("'Hello'.indexOf('l')", "2"),
        ("'Hello'.lastIndexOf('l')", "3"),
        ("'Hello'.toUpperCase()", "HELLO"),
        ("String.fromCharCode(72, 105)", "Hi"),
        ("'a'.concat('b', 1)", "ab1"),
        ("'foo'.replace('o', '0')", "f0o"),
        ("'a-b-c'.replace(/-/g, '+')", "a+b+c"),
        ("'John Smith'.replace(/(\\w+)\\s(\\w+)/, '$2, $1')", "Smith, John"),
        ("'abc'.replace(/b/, function(m) { return m.toUpperCase(); })", "aBc"),
        ("'cost: $5'.replace('$5', '$$10')", "cost: $10"),
        ("'x'.match(/y/)", "null"),
        ("'a1b22'.match(/\\d+/g).join(',')", "1,22"),
        ("'hello'.search(/l+/)", "2"),
        ("'€uro'.length", "4"),
    ]);
}

#[test]
fn test_arrays() {
    check_all(&[
        ("[3, 1, 2].reverse().join()", "2,1,3"),
        ("[1, 2, 3].map(function(x) { return x * 2; }).join()", "2,4,6"),
        ("[1, 2, 3, 4].filter(function(x) { return x % 2; }).join()", "1,3"),
        ("[1, 2, 3].some(function(x) { return x > 2; })", "true"),
        ("var s = 0; [1, 2, 3].forEach(function(x) { s += x; }); s", "6"),
        ("[1, 2, 3].indexOf(2)", "1"),
        ("[1, 2, 3].indexOf('2')", "-1"),
        ("[1, 2, 3, 4].slice(1, -1).join()", "2,3"),
        ("[1].concat([2], 3, [[4]]).length", "4"),
        ("var a = [1, 2]; a.push(3, 4); a.length", "4"),
        ("var a = [1, 2]; a.pop() + a.length", "3"),
        ("var a = [1, 2]; a.shift() + ':' + a.join()", "1:2"),
        ("var a = []; a[3] = 'x'; a.length", "4"),
        ("var a = [1, 2, 3]; a.length = 1; a.join()", "1"),
        ("new Array(3).length", "3"),
        ("new Array(1, 2).join()", "1,2"),
        ("Array.isArray([]) + ',' + Array.isArray({})", "true,false"),
        ("[1, [2, 3]].toString()", "1,2,3"),
        ("[null, undefined, 1].join('-')", "--1"),
    ]);
    let mut engine = engine();
    assert_raises_with(&mut engine, "new Array(-1)", "Invalid array length");
    assert_raises_with(&mut engine, "[1].map(3)", "is not a function");
}

#[test]
fn test_math() {
    check_all(&[
        ("Math.max()", "-Infinity"),
        ("Math.min(3, 1, 2)", "1"),
        ("Math.max(1, NaN)", "NaN"),
        ("Math.round(-2.5)", "-2"),
        ("Math.round(2.5)", "3"),
        ("Math.floor(-1.5)", "-2"),
        ("Math.ceil(1.2)", "2"),
        ("Math.abs(-3)", "3"),
        ("Math.pow(2, 10)", "1024"),
        ("Math.sqrt(16)", "4"),
        ("var r = Math.random(); r >= 0 && r < 1", "true"),
        ("Math.PI > 3.14 && Math.PI < 3.15", "true"),
    ]);
}

#[test]
fn test_json() {
    check_all(&[
        (
            "JSON.stringify({ a: [1, 'x', null], b: undefined, c: function() {} })",
            r#"{"a":[1,"x",null]}"#,
        ),
        ("JSON.stringify({ a: 1 }, null, 2)", "{\n  \"a\": 1\n}"),
        ("JSON.stringify([undefined, NaN, 1.5])", "[null,null,1.5]"),
        ("JSON.stringify('q\"uote')", r#""q\"uote""#),
        ("JSON.stringify({ b: 1, a: 2 })", r#"{"b":1,"a":2}"#),
        ("JSON.stringify({ a: 1, b: 2 }, ['b'])", r#"{"b":2}"#),
        (
            "JSON.stringify({ a: 1, b: 'x' }, function(k, v) { return typeof v === 'number' ? v * 10 : v; })",
            r#"{"a":10,"b":"x"}"#,
        ),
        (
            "JSON.stringify({ toJSON: function() { return 'custom'; } })",
            r#""custom""#,
        ),
        ("typeof JSON.stringify(undefined)", "undefined"),
        ("JSON.parse('{\"x\": [1, 2]}').x[1]", "2"),
        ("JSON.parse('\"text\"')", "text"),
        ("JSON.parse('null') === null", "true"),
    ]);
    let mut engine = engine();
    assert_raises_with(
        &mut engine,
        "var o = {}; o.self = o; JSON.stringify(o);",
        "Converting circular structure to JSON",
    );
    let outcome = engine.try_eval("JSON.parse('{bad')").unwrap();
    assert_eq!(outcome.error().unwrap().kind, Some(ErrorKind::SyntaxError));
}

#[test]
fn test_regexp() {
    check_all(&[
        ("/(\\d+)-(\\d+)/.exec('a 12-34 b')[2]", "34"),
        ("/(\\d+)-(\\d+)/.exec('a 12-34 b').index", "2"),
        ("/abc/i.test('xABCx')", "true"),
        ("/^b/m.test('a\\nb')", "true"),
        ("var r = /a/g; r.test('aa'); r.lastIndex", "1"),
        ("var r = /a/g; r.test('aa'); r.test('aa'); r.test('aa')", "false"),
        ("/x/gi.toString()", "/x/gi"),
        ("new RegExp('a+b').source", "a+b"),
        ("new RegExp('a', 'g').global", "true"),
        ("/a\\/b/.test('a/b')", "true"),
        ("/q/.exec('abc')", "null"),
    ]);
    let mut engine = engine();
    assert_raises_with(&mut engine, "new RegExp('a', 'z')", "Invalid flags");
    let outcome = engine.try_eval("new RegExp('(?=a)')").unwrap();
    assert_eq!(outcome.error().unwrap().kind, Some(ErrorKind::SyntaxError));
}

#[test]
fn test_objects() {
    check_all(&[
        ("Object.keys({ a: 1, b: 2 }).join()", "a,b"),
        ("Object.prototype.toString.call([])", "[object Array]"),
        ("Object.prototype.toString.call(null)", "[object Null]"),
        ("Object.getPrototypeOf([]) === Array.prototype", "true"),
        (
            "var o = {}; Object.defineProperty(o, 'x', { value: 1 }); o.x = 2; o.x + ',' + Object.keys(o).length",
            "1,0",
        ),
        ("var o = Object.create(null); typeof o.toString", "undefined"),
        ("Object.create({ p: 1 }, { q: { value: 2, enumerable: true } }).p", "1"),
        ("typeof new Object()", "object"),
        ("new Boolean(false) ? 'truthy' : 'falsy'", "truthy"),
        ("new Number(5) + 1", "6"),
        ("new String('ab').length", "2"),
    ]);
    let mut engine = engine();
    assert_raises_with(
        &mut engine,
        "var o = {}; Object.defineProperty(o, 'x', { value: 1 }); Object.defineProperty(o, 'x', { value: 2 });",
        "Cannot redefine property",
    );
}

#[test]
fn test_errors_and_functions() {
    check_all(&[
        ("new Error('m').toString()", "Error: m"),
        ("new TypeError('t').name", "TypeError"),
        ("String(new RangeError())", "RangeError"),
        ("TypeError('no new') instanceof TypeError", "true"),
        ("new SyntaxError('s') instanceof Error", "true"),
        ("var e = new Error('x'); e.name = 'Custom'; e.toString()", "Custom: x"),
        ("(function(a, b) {}).length", "2"),
        ("Math.max.apply(null, [1, 5, 3])", "5"),
        ("Array.prototype.slice.call({ length: 2, 0: 'a', 1: 'b' }).join()", "a,b"),
    ]);
    let mut engine = engine();
    let outcome = engine.try_eval("Function('return 1')").unwrap();
    assert_eq!(outcome.error().unwrap().kind, Some(ErrorKind::EvalError));
    assert!(outcome.message_contains("Function constructor is not supported"));
}

#[test]
fn test_large_array_indices_do_not_allocate() {
    check_all(&[
        ("var a = []; a[4000000000] = 1; a.length", "4000000001"),
        ("var a = []; a[4000000000] = 1; a[4000000000]", "1"),
        ("var a = []; a[4000000000] = 1; a[3999999999] === undefined", "true"),
        ("new Array(4294967295).length", "4294967295"),
        ("var a = [1, 2, 3]; a.length = 4294967295; a.length", "4294967295"),
        ("var a = [1, 2, 3]; a.length = 4294967295; a.length = 2; a.join()", "1,2"),
        ("var a = [1]; a[5000] = 'x'; a.length", "5001"),
        ("var a = [1]; a[5000] = 'x'; a.join('')", "1x"),
        ("var a = []; a[5000] = 'x'; Object.keys(a).join()", "5000"),
        ("var a = new Array(3); a.push(7); a.join('-')", "---7"),
        ("var a = []; a[4000000000] = 1; [a.pop(), a.length].join()", "1,4000000000"),
    ]);

    let mut engine = engine();
    for source in [
        "var a = []; a[4000000000] = 1; a.join()",
        "JSON.stringify(new Array(4294967295))",
        "[].concat(new Array(4294967295))",
    ] {
        let outcome = engine.try_eval(source).unwrap();
        assert_eq!(outcome.error().unwrap().kind, Some(ErrorKind::RangeError), "{}", source);
        assert!(outcome.message_contains("Invalid array length"));
    }
}

#[test]
fn test_uri_functions() {
    check_all(&[
        ("encodeURIComponent('a b&c/d')", "a%20b%26c%2Fd"),
        ("encodeURIComponent('é')", "%C3%A9"),
        ("encodeURI('http://x.com/a b?q=1#f')", "http://x.com/a%20b?q=1#f"),
        ("decodeURIComponent('%E2%82%AC%20x')", "€ x"),
        ("decodeURI('%2Fa%20b')", "%2Fa b"),
        ("decodeURIComponent(encodeURIComponent('ü/?'))", "ü/?"),
        ("escape('a b+é€')", "a%20b+%E9%u20AC"),
        ("unescape('%u20AC%41%zz')", "€A%zz"),
    ]);

    let mut engine = engine();
    for source in ["decodeURIComponent('%')", "decodeURI('%E0%A4%A')", "decodeURIComponent('%C0%AF')"] {
        let outcome = engine.try_eval(source).unwrap();
        assert_eq!(outcome.error().unwrap().kind, Some(ErrorKind::URIError), "{}", source);
        assert!(outcome.message_contains("URI malformed"));
    }
    assert_evaluates_to(
        &mut engine,
        "var ok; try { decodeURI('%zz'); } catch (e) { ok = e instanceof URIError && e instanceof Error; } ok",
        "true",
    );
}

#[test]
fn test_regexp_shorthand_classes_are_ascii() {
    check_all(&[
        ("/\\d/.test('\\u0663')", "false"),
        ("/\\D/.test('\\u0663')", "true"),
        ("/\\w/.test('é')", "false"),
        ("/\\bfoo\\b/.test('éfooé')", "true"),
        ("/^\\s$/.test('\\u00a0')", "true"),
        ("'a1b22'.replace(/\\d+/g, '#')", "a#b#"),
        ("/[\\w-]+/.exec('ab-c d')[0]", "ab-c"),
    ]);
}
