//! `RegExp` constructor and `RegExp.prototype`.
//!
//! Patterns are compiled with the `regex` crate. Lookaround and
//! backreferences are rejected with a `SyntaxError` at construction time.
//! The `regex` crate reads `\d`, `\w`, `\s` and `\b` as Unicode classes, so
//! [`translate_pattern`] spells out their script meanings first.

use super::{arg, byte_offset, define_method, utf16_offset};
use crate::error::ErrorKind;
use crate::runtime::global::register_type;
use crate::runtime::interpreter::{Interpreter, JsResult};
use crate::runtime::object::ObjectRef;
use crate::runtime::value::{utf16_len, Value};
use std::rc::Rc;

const DIGIT_SET: &str = "0-9";
const WORD_SET: &str = "0-9A-Za-z_";
const SPACE_SET: &str =
    r"\t\n\x0B\x0C\r \xA0\x{1680}\x{2000}-\x{200A}\x{2028}\x{2029}\x{202F}\x{205F}\x{3000}\x{FEFF}";

/// Rewrites a script pattern into `regex` syntax: `\d`, `\w` and `\s` (and
/// their negations) become explicit sets, `\b` matches ASCII word
/// boundaries, `[\b]` is a backspace and `\/` is a plain slash.
pub fn translate_pattern(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut in_class = false;
    let mut chars = source.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let Some(escaped) = chars.next() else {
                    out.push('\\');
                    break;
                };
                let set = match escaped.to_ascii_lowercase() {
                    'd' => Some(DIGIT_SET),
                    'w' => Some(WORD_SET),
                    's' => Some(SPACE_SET),
                    _ => None,
                };
                match set {
                    Some(set) if escaped.is_ascii_uppercase() => {
                        out.push_str(&format!("[^{}]", set));
                    }
                    Some(set) if in_class => out.push_str(set),
                    Some(set) => out.push_str(&format!("[{}]", set)),
                    None => match escaped {
                        'b' if in_class => out.push_str(r"\x08"),
                        'b' | 'B' => {
                            out.push_str(r"(?-u:\");
                            out.push(escaped);
                            out.push(')');
                        }
                        '/' => out.push('/'),
                        _ => {
                            out.push('\\');
                            out.push(escaped);
                        }
                    },
                }
            }
            '[' if in_class => out.push_str(r"\["),
            '[' => {
                in_class = true;
                out.push(c);
            }
            ']' if in_class => {
                in_class = false;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

pub fn register(interpreter: &mut Interpreter) {
    let prototype = interpreter.intrinsics.regexp_prototype.clone();
    let constructor = interpreter.new_native_function("RegExp", 2, regexp, Some(construct));
    register_type(interpreter, constructor, &prototype);

    define_method(interpreter, &prototype, "exec", 1, exec);
    define_method(interpreter, &prototype, "test", 1, test);
    define_method(interpreter, &prototype, "toString", 0, to_string);
}

/// Called as a function, `RegExp(re)` returns `re` itself.
fn regexp(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let pattern = arg(args, 0);
    let is_regexp = pattern.as_object().is_some_and(|o| o.regexp().is_some());
    if is_regexp && arg(args, 1).is_undefined() {
        return Ok(pattern);
    }
    construct(interpreter, this, args)
}

fn construct(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    let pattern = arg(args, 0);
    let flags = arg(args, 1);
    let (source, default_flags): (Rc<str>, Rc<str>) =
        match pattern.as_object().and_then(|o| o.regexp()) {
            Some(data) => {
                if !flags.is_undefined() {
                    return Err(interpreter.throw_error(
                        ErrorKind::TypeError,
                        "Cannot supply flags when constructing one RegExp from another",
                    ));
                }
                (data.source.clone(), data.flags.clone())
            }
            None => {
                let source = match &pattern {
                    Value::Undefined => Rc::from("(?:)"),
                    other => interpreter.to_string(other)?,
                };
                (source, Rc::from(""))
            }
        };
    let flags = match &flags {
        Value::Undefined => default_flags,
        other => interpreter.to_string(other)?,
    };
    Ok(Value::Object(interpreter.new_regexp(&source, &flags)?))
}

fn this_regexp(interpreter: &Interpreter, this: &Value, method: &str) -> JsResult<ObjectRef> {
    match this.as_object() {
        Some(o) if o.regexp().is_some() => Ok(o.clone()),
        _ => Err(interpreter.throw_error(
            ErrorKind::TypeError,
            format!("RegExp.prototype.{} called on incompatible receiver", method),
        )),
    }
}

/// Runs `regexp` against `input`, honoring and updating `lastIndex` for
/// global expressions. Returns the match array or `null`.
pub(crate) fn exec_at(interpreter: &mut Interpreter, regexp: &ObjectRef, input: &str) -> JsResult<Value> {
    let Some(data) = regexp.regexp() else {
        return Ok(Value::Null);
    };
    let global = data.global();
    let start = if global {
        let last_index = regexp.get("lastIndex");
        let last_index = super::to_integer(interpreter.to_number(&last_index)?);
        if last_index < 0.0 || last_index > utf16_len(input) as f64 {
            regexp.put("lastIndex", Value::Number(0.0));
            return Ok(Value::Null);
        }
        byte_offset(input, last_index as usize)
    } else {
        0
    };

    let Some(captures) = data.regex.captures_at(input, start) else {
        if global {
            regexp.put("lastIndex", Value::Number(0.0));
        }
        return Ok(Value::Null);
    };
    let Some(whole) = captures.get(0) else {
        return Ok(Value::Null);
    };
    if global {
        regexp.put(
            "lastIndex",
            Value::Number(utf16_offset(input, whole.end()) as f64),
        );
    }

    let groups = captures
        .iter()
        .map(|group| group.map_or(Value::Undefined, |m| Value::from(m.as_str())))
        .collect();
    let result = interpreter.new_array(groups);
    result.put(
        "index",
        Value::Number(utf16_offset(input, whole.start()) as f64),
    );
    result.put("input", Value::from(input));
    Ok(Value::Object(result))
}

fn exec(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let regexp = this_regexp(interpreter, this, "exec")?;
    let input = interpreter.to_string(&arg(args, 0))?;
    exec_at(interpreter, &regexp, &input)
}

fn test(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let regexp = this_regexp(interpreter, this, "test")?;
    let input = interpreter.to_string(&arg(args, 0))?;
    let result = exec_at(interpreter, &regexp, &input)?;
    Ok(Value::Boolean(!matches!(result, Value::Null)))
}

fn to_string(interpreter: &mut Interpreter, this: &Value, _args: &[Value]) -> JsResult<Value> {
    let regexp = this_regexp(interpreter, this, "toString")?;
    let text = regexp
        .regexp()
        .map(|data| format!("/{}/{}", data.source, data.flags))
        .unwrap_or_default();
    Ok(Value::from(text))
}
