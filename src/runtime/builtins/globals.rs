//! Global functions: `parseFloat`, `parseInt`, `isNaN`, `isFinite`, `print`.

use super::{arg, define_method};
use crate::runtime::interpreter::{Interpreter, JsResult};
use crate::runtime::value::{to_int32, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

/// Longest prefix of a string that is a StrDecimalLiteral.
static DECIMAL_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:Infinity|(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)")
        .expect("decimal literal pattern is valid")
});

pub fn register(interpreter: &mut Interpreter) {
    let global = interpreter.global.clone();
    define_method(interpreter, &global, "parseFloat", 1, parse_float);
    define_method(interpreter, &global, "parseInt", 2, parse_int);
    define_method(interpreter, &global, "isNaN", 1, is_nan);
    define_method(interpreter, &global, "isFinite", 1, is_finite);
    if interpreter.config.enable_print {
        define_method(interpreter, &global, "print", 1, print);
    }
}

fn trim_start(s: &str) -> &str {
    s.trim_start_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
}

fn parse_float(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    let input = interpreter.to_string(&arg(args, 0))?;
    let trimmed = trim_start(&input);
    let Some(prefix) = DECIMAL_PREFIX.find(trimmed) else {
        return Ok(Value::Number(f64::NAN));
    };
    let literal = prefix.as_str();
    let n = match literal.trim_start_matches(['+', '-']) {
        "Infinity" => f64::INFINITY,
        digits => digits.parse().unwrap_or(f64::NAN),
    };
    Ok(Value::Number(if literal.starts_with('-') { -n } else { n }))
}

fn parse_int(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    let input = interpreter.to_string(&arg(args, 0))?;
    let mut radix = to_int32(interpreter.to_number(&arg(args, 1))?);
    let mut s = trim_start(&input);

    let negative = s.starts_with('-');
    if let Some(rest) = s.strip_prefix(['+', '-']) {
        s = rest;
    }
    let strip_hex = match radix {
        0 => {
            radix = 10;
            true
        }
        16 => true,
        2..=36 => false,
        _ => return Ok(Value::Number(f64::NAN)),
    };
    if strip_hex {
        if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            s = rest;
            radix = 16;
        }
    }

    let radix = radix as u32;
    let mut value = 0.0;
    let mut any = false;
    for c in s.chars() {
        let Some(digit) = c.to_digit(radix) else {
            break;
        };
        value = value * f64::from(radix) + f64::from(digit);
        any = true;
    }
    if !any {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(if negative { -value } else { value }))
}

fn is_nan(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    Ok(Value::Boolean(interpreter.to_number(&arg(args, 0))?.is_nan()))
}

fn is_finite(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    Ok(Value::Boolean(
        interpreter.to_number(&arg(args, 0))?.is_finite(),
    ))
}

/// Writes its arguments, space separated, to the runtime's output sink.
fn print(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    let mut parts = Vec::with_capacity(args.len());
    for value in args {
        parts.push(interpreter.to_string(value)?.to_string());
    }
    let line = parts.join(" ");
    trace!(line = %line, "print");
    interpreter.output.push(line);
    Ok(Value::Undefined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_prefix() {
        let prefix = |s: &str| DECIMAL_PREFIX.find(s).map(|m| m.as_str().to_string());
        assert_eq!(prefix("3.14abc"), Some("3.14".to_string()));
        assert_eq!(prefix("-.5e3x"), Some("-.5e3".to_string()));
        assert_eq!(prefix("1e"), Some("1".to_string()));
        assert_eq!(prefix("Infinityx"), Some("Infinity".to_string()));
        assert_eq!(prefix("abc"), None);
    }
}
