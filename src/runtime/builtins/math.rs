use super::{arg, define_method};
use crate::runtime::interpreter::{Interpreter, JsResult};
use crate::runtime::object::{NativeFn, Property};
use crate::runtime::value::Value;

pub fn register(interpreter: &mut Interpreter) {
    let math = interpreter.new_object();
    for (name, value) in [
        ("E", std::f64::consts::E),
        ("LN10", std::f64::consts::LN_10),
        ("LN2", std::f64::consts::LN_2),
        ("LOG10E", std::f64::consts::LOG10_E),
        ("LOG2E", std::f64::consts::LOG2_E),
        ("PI", std::f64::consts::PI),
        ("SQRT1_2", std::f64::consts::FRAC_1_SQRT_2),
        ("SQRT2", std::f64::consts::SQRT_2),
    ] {
        math.define(name, Property::frozen(Value::Number(value)));
    }

    let functions: [(&'static str, usize, NativeFn); 15] = [
        ("abs", 1, abs),
        ("ceil", 1, ceil),
        ("floor", 1, floor),
        ("round", 1, round),
        ("sqrt", 1, sqrt),
        ("sin", 1, sin),
        ("cos", 1, cos),
        ("tan", 1, tan),
        ("atan", 1, atan),
        ("exp", 1, exp),
        ("log", 1, log),
        ("pow", 2, pow),
        ("max", 2, max),
        ("min", 2, min),
        ("random", 0, random),
    ];
    for (name, arity, function) in functions {
        define_method(interpreter, &math, name, arity, function);
    }
    interpreter.global.define_hidden("Math", Value::Object(math));
}

fn number_arg(interpreter: &mut Interpreter, args: &[Value], index: usize) -> JsResult<f64> {
    interpreter.to_number(&arg(args, index))
}

macro_rules! unary_math {
    ($($name:ident => $op:expr),* $(,)?) => {
        $(
            fn $name(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
                let x = number_arg(interpreter, args, 0)?;
                let op: fn(f64) -> f64 = $op;
                Ok(Value::Number(op(x)))
            }
        )*
    };
}

unary_math! {
    abs => f64::abs,
    ceil => f64::ceil,
    floor => f64::floor,
    round => js_round,
    sqrt => f64::sqrt,
    sin => f64::sin,
    cos => f64::cos,
    tan => f64::tan,
    atan => f64::atan,
    exp => f64::exp,
    log => f64::ln,
}

/// Rounds half up, toward positive infinity; keeps `-0` for inputs in `[-0.5, 0)`.
fn js_round(x: f64) -> f64 {
    if !x.is_finite() || x.fract() == 0.0 {
        return x;
    }
    if (-0.5..0.0).contains(&x) {
        return -0.0;
    }
    (x + 0.5).floor()
}

fn pow(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    let base = number_arg(interpreter, args, 0)?;
    let exponent = number_arg(interpreter, args, 1)?;
    // powf(1, NaN) is 1, but the script result is NaN.
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(base.powf(exponent)))
}

fn extremum(
    interpreter: &mut Interpreter,
    args: &[Value],
    initial: f64,
    pick: fn(f64, f64) -> f64,
) -> JsResult<Value> {
    let mut result = initial;
    let mut saw_nan = false;
    for value in args {
        let n = interpreter.to_number(value)?;
        if n.is_nan() {
            saw_nan = true;
        } else {
            result = pick(result, n);
        }
    }
    Ok(Value::Number(if saw_nan { f64::NAN } else { result }))
}

fn max(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    extremum(interpreter, args, f64::NEG_INFINITY, f64::max)
}

fn min(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    extremum(interpreter, args, f64::INFINITY, f64::min)
}

fn random(_interpreter: &mut Interpreter, _this: &Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::Number(rand::random::<f64>()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_round() {
        assert_eq!(js_round(2.5), 3.0);
        assert_eq!(js_round(-2.5), -2.0);
        assert_eq!(js_round(-0.2), 0.0);
        assert!(js_round(-0.2).is_sign_negative());
        assert_eq!(js_round(7.0), 7.0);
    }
}
