//! `String` constructor and `String.prototype`.
//!
//! Positions and lengths are measured in UTF-16 code units.

use super::{arg, define_method, relative_index, to_integer, utf16_offset};
use crate::error::ErrorKind;
use crate::runtime::global::register_type;
use crate::runtime::interpreter::{Interpreter, JsResult};
use crate::runtime::object::RegExpData;
use crate::runtime::value::{to_uint32, Value};
use std::rc::Rc;

pub fn register(interpreter: &mut Interpreter) {
    let prototype = interpreter.intrinsics.string_prototype.clone();
    let constructor = interpreter.new_native_function("String", 1, string, Some(construct));
    let constructor = register_type(interpreter, constructor, &prototype);
    define_method(interpreter, &constructor, "fromCharCode", 1, from_char_code);

    let methods: [(&'static str, usize, crate::runtime::object::NativeFn); 16] = [
        ("toString", 0, to_string),
        ("valueOf", 0, to_string),
        ("charAt", 1, char_at),
        ("charCodeAt", 1, char_code_at),
        ("indexOf", 1, index_of),
        ("lastIndexOf", 1, last_index_of),
        ("slice", 2, slice),
        ("substring", 2, substring),
        ("toUpperCase", 0, to_upper_case),
        ("toLowerCase", 0, to_lower_case),
        ("split", 2, split),
        ("trim", 0, trim),
        ("replace", 2, replace),
        ("concat", 1, concat),
        ("match", 1, match_regexp),
        ("search", 1, search),
    ];
    for (name, arity, method) in methods {
        define_method(interpreter, &prototype, name, arity, method);
    }
}

fn string(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    match args.first() {
        Some(value) => Ok(Value::String(interpreter.to_string(value)?)),
        None => Ok(Value::from("")),
    }
}

fn construct(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let value = string(interpreter, this, args)?;
    Ok(Value::Object(interpreter.to_object(&value)?))
}

fn from_char_code(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    let mut units = Vec::with_capacity(args.len());
    for value in args {
        units.push((to_uint32(interpreter.to_number(value)?) & 0xFFFF) as u16);
    }
    Ok(Value::from(String::from_utf16_lossy(&units)))
}

/// `this` coerced to a string; `undefined` and `null` are rejected.
fn this_string(interpreter: &mut Interpreter, this: &Value, method: &str) -> JsResult<Rc<str>> {
    match this {
        Value::String(s) => Ok(s.clone()),
        Value::Undefined | Value::Null => Err(interpreter.throw_error(
            ErrorKind::TypeError,
            format!("String.prototype.{} called on null or undefined", method),
        )),
        Value::Object(o) => match o.primitive_value() {
            Some(Value::String(s)) => Ok(s),
            _ => interpreter.to_string(this),
        },
        other => interpreter.to_string(other),
    }
}

fn units(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

fn from_units(units: &[u16]) -> Value {
    Value::from(String::from_utf16_lossy(units))
}

fn to_string(interpreter: &mut Interpreter, this: &Value, _args: &[Value]) -> JsResult<Value> {
    match this {
        Value::String(s) => Ok(Value::String(s.clone())),
        Value::Object(o) => match o.primitive_value() {
            Some(Value::String(s)) => Ok(Value::String(s)),
            _ => Err(interpreter.throw_error(
                ErrorKind::TypeError,
                "String.prototype.toString is not generic",
            )),
        },
        _ => Err(interpreter.throw_error(
            ErrorKind::TypeError,
            "String.prototype.toString is not generic",
        )),
    }
}

fn position(interpreter: &mut Interpreter, value: &Value) -> JsResult<f64> {
    Ok(to_integer(interpreter.to_number(value)?))
}

fn char_at(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let s = units(&this_string(interpreter, this, "charAt")?);
    let pos = position(interpreter, &arg(args, 0))?;
    if pos < 0.0 || pos >= s.len() as f64 {
        return Ok(Value::from(""));
    }
    Ok(from_units(&s[pos as usize..pos as usize + 1]))
}

fn char_code_at(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let s = units(&this_string(interpreter, this, "charCodeAt")?);
    let pos = position(interpreter, &arg(args, 0))?;
    if pos < 0.0 || pos >= s.len() as f64 {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(f64::from(s[pos as usize])))
}

fn find_units(haystack: &[u16], needle: &[u16], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    (from..haystack.len())
        .find(|&i| haystack[i..].starts_with(needle))
}

fn index_of(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let s = units(&this_string(interpreter, this, "indexOf")?);
    let needle = units(&interpreter.to_string(&arg(args, 0))?);
    let from = position(interpreter, &arg(args, 1))?.clamp(0.0, s.len() as f64) as usize;
    Ok(Value::Number(
        find_units(&s, &needle, from).map_or(-1.0, |i| i as f64),
    ))
}

fn last_index_of(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let s = units(&this_string(interpreter, this, "lastIndexOf")?);
    let needle = units(&interpreter.to_string(&arg(args, 0))?);
    let start = match arg(args, 1) {
        Value::Undefined => s.len(),
        other => {
            let n = interpreter.to_number(&other)?;
            if n.is_nan() {
                s.len()
            } else {
                to_integer(n).clamp(0.0, s.len() as f64) as usize
            }
        }
    };
    if needle.len() > s.len() {
        return Ok(Value::Number(-1.0));
    }
    let last = start.min(s.len() - needle.len());
    let found = (0..=last)
        .rev()
        .find(|&i| s[i..].starts_with(&needle));
    Ok(Value::Number(found.map_or(-1.0, |i| i as f64)))
}

fn slice(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let s = units(&this_string(interpreter, this, "slice")?);
    let start = relative_index(interpreter, &arg(args, 0), s.len(), 0)?;
    let end = relative_index(interpreter, &arg(args, 1), s.len(), s.len())?;
    if start >= end {
        return Ok(Value::from(""));
    }
    Ok(from_units(&s[start..end]))
}

fn substring(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let s = units(&this_string(interpreter, this, "substring")?);
    let len = s.len() as f64;
    let start = position(interpreter, &arg(args, 0))?.clamp(0.0, len) as usize;
    let end = match arg(args, 1) {
        Value::Undefined => s.len(),
        other => position(interpreter, &other)?.clamp(0.0, len) as usize,
    };
    let (from, to) = if start <= end { (start, end) } else { (end, start) };
    Ok(from_units(&s[from..to]))
}

fn to_upper_case(interpreter: &mut Interpreter, this: &Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::from(this_string(interpreter, this, "toUpperCase")?.to_uppercase()))
}

fn to_lower_case(interpreter: &mut Interpreter, this: &Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::from(this_string(interpreter, this, "toLowerCase")?.to_lowercase()))
}

/// ES5 WhiteSpace and LineTerminator characters.
fn is_js_whitespace(c: char) -> bool {
    c.is_whitespace() || c == '\u{FEFF}'
}

fn trim(interpreter: &mut Interpreter, this: &Value, _args: &[Value]) -> JsResult<Value> {
    let s = this_string(interpreter, this, "trim")?;
    Ok(Value::from(s.trim_matches(is_js_whitespace)))
}

fn concat(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let mut out = this_string(interpreter, this, "concat")?.to_string();
    for value in args {
        out.push_str(&interpreter.to_string(value)?);
    }
    Ok(Value::from(out))
}

fn split(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let s = this_string(interpreter, this, "split")?;
    let limit = match arg(args, 1) {
        Value::Undefined => usize::MAX,
        other => to_uint32(interpreter.to_number(&other)?) as usize,
    };
    let separator = arg(args, 0);
    let mut parts: Vec<Value> = if let Some(data) = separator.as_object().and_then(|o| o.regexp()) {
        if s.is_empty() {
            if data.regex.is_match("") {
                Vec::new()
            } else {
                vec![Value::from("")]
            }
        } else {
            data.regex.split(&s).map(Value::from).collect()
        }
    } else if separator.is_undefined() {
        vec![Value::String(s.clone())]
    } else {
        let sep = interpreter.to_string(&separator)?;
        if sep.is_empty() {
            s.encode_utf16().map(|unit| from_units(&[unit])).collect()
        } else {
            s.split(&*sep).map(Value::from).collect()
        }
    };
    parts.truncate(limit);
    Ok(Value::Object(interpreter.new_array(parts)))
}

/// Expands `$&`, `$1`..`$99` and `$$` in a replacement template.
fn expand_template(template: &str, captures: &regex::Captures<'_>) -> String {
    let mut out = String::new();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('$') => {
                chars.next();
                out.push('$');
            }
            Some('&') => {
                chars.next();
                out.push_str(captures.get(0).map_or("", |m| m.as_str()));
            }
            Some(d) if d.is_ascii_digit() => {
                chars.next();
                let mut index = d.to_digit(10).unwrap_or(0) as usize;
                if let Some(next) = chars.peek().and_then(|n| n.to_digit(10)) {
                    let two_digit = index * 10 + next as usize;
                    if two_digit < captures.len() {
                        chars.next();
                        index = two_digit;
                    }
                }
                if index > 0 && index < captures.len() {
                    out.push_str(captures.get(index).map_or("", |m| m.as_str()));
                } else {
                    out.push('$');
                    out.push(d);
                }
            }
            _ => out.push('$'),
        }
    }
    out
}

fn replace(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let s = this_string(interpreter, this, "replace")?;
    let pattern = arg(args, 0);
    let replacement = arg(args, 1);

    let (data, global) = match pattern.as_object().and_then(|o| o.regexp()) {
        Some(data) => {
            let global = data.global();
            (data, global)
        }
        None => {
            let literal = interpreter.to_string(&pattern)?;
            let regex = regex::Regex::new(&regex::escape(&literal)).map_err(|e| {
                interpreter.throw_error(ErrorKind::SyntaxError, e.to_string())
            })?;
            let data = RegExpData {
                source: literal.clone(),
                flags: Rc::from(""),
                regex,
            };
            (Rc::new(data), false)
        }
    };
    if let Some(o) = pattern.as_object() {
        if global {
            o.put("lastIndex", Value::Number(0.0));
        }
    }

    let template = if replacement.is_callable() {
        None
    } else {
        Some(interpreter.to_string(&replacement)?)
    };

    let mut out = String::new();
    let mut last_end = 0;
    for captures in data.regex.captures_iter(&s) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        out.push_str(&s[last_end..whole.start()]);
        let substitute = match &template {
            Some(template) => expand_template(template, &captures),
            None => {
                let mut call_args: Vec<Value> = captures
                    .iter()
                    .map(|group| group.map_or(Value::Undefined, |m| Value::from(m.as_str())))
                    .collect();
                call_args.push(Value::Number(utf16_offset(&s, whole.start()) as f64));
                call_args.push(Value::String(s.clone()));
                let result = interpreter.call(&replacement, Value::Undefined, &call_args)?;
                interpreter.to_string(&result)?.to_string()
            }
        };
        out.push_str(&substitute);
        last_end = whole.end();
        if !global {
            break;
        }
    }
    out.push_str(&s[last_end..]);
    Ok(Value::from(out))
}

fn match_regexp(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let s = this_string(interpreter, this, "match")?;
    let regexp = coerce_regexp(interpreter, &arg(args, 0))?;
    let Some(data) = regexp.regexp() else {
        return Ok(Value::Null);
    };
    if !data.global() {
        return super::regexp::exec_at(interpreter, &regexp, &s);
    }
    regexp.put("lastIndex", Value::Number(0.0));
    let matches: Vec<Value> = data
        .regex
        .find_iter(&s)
        .map(|m| Value::from(m.as_str()))
        .collect();
    if matches.is_empty() {
        return Ok(Value::Null);
    }
    Ok(Value::Object(interpreter.new_array(matches)))
}

fn search(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let s = this_string(interpreter, this, "search")?;
    let regexp = coerce_regexp(interpreter, &arg(args, 0))?;
    let found = regexp
        .regexp()
        .and_then(|data| data.regex.find(&s).map(|m| utf16_offset(&s, m.start())));
    Ok(Value::Number(found.map_or(-1.0, |i| i as f64)))
}

fn coerce_regexp(
    interpreter: &mut Interpreter,
    value: &Value,
) -> JsResult<crate::runtime::ObjectRef> {
    match value.as_object() {
        Some(o) if o.regexp().is_some() => Ok(o.clone()),
        _ => {
            let source = match value {
                Value::Undefined => Rc::from("(?:)"),
                other => interpreter.to_string(other)?,
            };
            interpreter.new_regexp(&source, "")
        }
    }
}
