//! `Number` constructor, constants and `Number.prototype`.

use super::{arg, define_method, to_integer};
use crate::config::{TO_FIXED_MAX_DIGITS, TO_FIXED_MAX_MAGNITUDE};
use crate::error::ErrorKind;
use crate::runtime::global::register_type;
use crate::runtime::interpreter::{Interpreter, JsResult};
use crate::runtime::object::Property;
use crate::runtime::value::{number_to_string, to_int32, Value};

pub fn register(interpreter: &mut Interpreter) {
    let prototype = interpreter.intrinsics.number_prototype.clone();
    let constructor = interpreter.new_native_function("Number", 1, number, Some(construct));
    let constructor = register_type(interpreter, constructor, &prototype);

    for (name, value) in [
        ("NaN", f64::NAN),
        ("MAX_VALUE", f64::MAX),
        ("MIN_VALUE", 5e-324),
        ("POSITIVE_INFINITY", f64::INFINITY),
        ("NEGATIVE_INFINITY", f64::NEG_INFINITY),
    ] {
        constructor.define(name, Property::frozen(Value::Number(value)));
    }

    define_method(interpreter, &prototype, "toFixed", 1, to_fixed);
    define_method(interpreter, &prototype, "toString", 1, to_string);
    define_method(interpreter, &prototype, "valueOf", 0, value_of);
}

fn number(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    match args.first() {
        Some(value) => Ok(Value::Number(interpreter.to_number(value)?)),
        None => Ok(Value::Number(0.0)),
    }
}

fn construct(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let value = number(interpreter, this, args)?;
    Ok(Value::Object(interpreter.to_object(&value)?))
}

fn this_number(interpreter: &Interpreter, this: &Value, method: &str) -> JsResult<f64> {
    match this {
        Value::Number(n) => return Ok(*n),
        Value::Object(o) => {
            if let Some(Value::Number(n)) = o.primitive_value() {
                return Ok(n);
            }
        }
        _ => {}
    }
    Err(interpreter.throw_error(
        ErrorKind::TypeError,
        format!("Number.prototype.{} is not generic", method),
    ))
}

/// `Number.prototype.toFixed(digits)`.
///
/// `digits` is only read when it is the sole argument; anything else formats
/// with zero fraction digits.
fn to_fixed(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let x = this_number(interpreter, this, "toFixed")?;
    let digits = match args {
        [digits] => to_int32(interpreter.to_number(digits)?),
        _ => 0,
    };
    if !(0..=TO_FIXED_MAX_DIGITS).contains(&digits) {
        return Err(interpreter.throw_error(
            ErrorKind::RangeError,
            format!(
                "toFixed() digits argument must be between 0 and {}",
                TO_FIXED_MAX_DIGITS
            ),
        ));
    }
    Ok(Value::from(format_fixed(x, digits as usize)))
}

/// Formats `x` with exactly `digits` fraction digits, rounding halfway cases
/// away from zero.
pub fn format_fixed(x: f64, digits: usize) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.abs() >= TO_FIXED_MAX_MAGNITUDE {
        return number_to_string(x);
    }
    if x < 0.0 {
        return format!("-{}", format_fixed(-x, digits));
    }

    // `{:.N}` rounds the exact binary value correctly but resolves exact ties
    // to even; detect those and round them up.
    let rounded = format!("{:.*}", digits + 1, x);
    if rounded.ends_with('5') {
        let extended = format!("{:.*}", digits + 60, x);
        let is_tie = extended.starts_with(&rounded)
            && extended[rounded.len()..].bytes().all(|b| b == b'0');
        if is_tie {
            let truncated = rounded[..rounded.len() - 1].trim_end_matches('.');
            return increment_last_digit(truncated);
        }
    }
    format!("{:.*}", digits, x)
}

fn increment_last_digit(decimal: &str) -> String {
    let mut bytes = decimal.as_bytes().to_vec();
    for i in (0..bytes.len()).rev() {
        match bytes[i] {
            b'.' => continue,
            b'9' => bytes[i] = b'0',
            _ => {
                bytes[i] += 1;
                return String::from_utf8_lossy(&bytes).into_owned();
            }
        }
    }
    format!("1{}", String::from_utf8_lossy(&bytes))
}

fn to_string(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let x = this_number(interpreter, this, "toString")?;
    let radix = match arg(args, 0) {
        Value::Undefined => 10.0,
        other => to_integer(interpreter.to_number(&other)?),
    };
    if !(2.0..=36.0).contains(&radix) {
        return Err(interpreter.throw_error(
            ErrorKind::RangeError,
            "toString() radix argument must be between 2 and 36",
        ));
    }
    if radix == 10.0 || !x.is_finite() {
        return Ok(Value::from(number_to_string(x)));
    }
    Ok(Value::from(to_radix_string(x, radix as u32)))
}

/// Renders a finite number in a non-decimal radix, with up to 52 fraction digits.
fn to_radix_string(x: f64, radix: u32) -> String {
    let negative = x < 0.0;
    let x = x.abs();
    let mut integer = x.trunc();
    let mut fraction = x - integer;

    let mut int_digits = Vec::new();
    let radix_f = f64::from(radix);
    loop {
        let digit = (integer % radix_f) as u32;
        int_digits.push(std::char::from_digit(digit, radix).unwrap_or('0'));
        integer = (integer / radix_f).trunc();
        if integer < 1.0 {
            break;
        }
    }
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.extend(int_digits.iter().rev());

    if fraction > 0.0 {
        out.push('.');
        for _ in 0..52 {
            fraction *= radix_f;
            let digit = fraction.trunc();
            out.push(std::char::from_digit(digit as u32, radix).unwrap_or('0'));
            fraction -= digit;
            if fraction <= 0.0 {
                break;
            }
        }
    }
    out
}

fn value_of(interpreter: &mut Interpreter, this: &Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::Number(this_number(interpreter, this, "valueOf")?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_fixed_rounding() {
        assert_eq!(format_fixed(1.005, 2), "1.00");
        assert_eq!(format_fixed(2.5, 0), "3");
        assert_eq!(format_fixed(0.125, 2), "0.13");
        assert_eq!(format_fixed(9.995, 2), "9.99");
        assert_eq!(format_fixed(99.5, 0), "100");
        assert_eq!(format_fixed(1.45, 1), "1.4");
    }

    #[test]
    fn test_format_fixed_edges() {
        assert_eq!(format_fixed(f64::NAN, 2), "NaN");
        assert_eq!(format_fixed(-1.5, 0), "-2");
        assert_eq!(format_fixed(0.0, 3), "0.000");
        assert_eq!(format_fixed(1e21, 2), "1e+21");
        assert_eq!(format_fixed(f64::INFINITY, 1), "Infinity");
        assert_eq!(format_fixed(123.456, 0), "123");
    }

    #[test]
    fn test_radix_strings() {
        assert_eq!(to_radix_string(255.0, 16), "ff");
        assert_eq!(to_radix_string(-8.0, 2), "-1000");
        assert_eq!(to_radix_string(0.5, 2), "0.1");
        assert_eq!(to_radix_string(0.0, 7), "0");
    }
}
