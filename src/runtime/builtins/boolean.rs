use super::{arg, define_method};
use crate::error::ErrorKind;
use crate::runtime::global::register_type;
use crate::runtime::interpreter::{Interpreter, JsResult};
use crate::runtime::value::Value;

pub fn register(interpreter: &mut Interpreter) {
    let prototype = interpreter.intrinsics.boolean_prototype.clone();
    let constructor = interpreter.new_native_function("Boolean", 1, boolean, Some(construct));
    register_type(interpreter, constructor, &prototype);

    define_method(interpreter, &prototype, "toString", 0, to_string);
    define_method(interpreter, &prototype, "valueOf", 0, value_of);
}

fn boolean(_interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    Ok(Value::Boolean(arg(args, 0).to_boolean()))
}

fn construct(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    let value = Value::Boolean(arg(args, 0).to_boolean());
    Ok(Value::Object(interpreter.to_object(&value)?))
}

fn this_boolean(interpreter: &Interpreter, this: &Value, method: &str) -> JsResult<bool> {
    match this {
        Value::Boolean(b) => Ok(*b),
        Value::Object(o) => match o.primitive_value() {
            Some(Value::Boolean(b)) => Ok(b),
            _ => Err(not_generic(interpreter, method)),
        },
        _ => Err(not_generic(interpreter, method)),
    }
}

fn not_generic(interpreter: &Interpreter, method: &str) -> crate::runtime::Throw {
    interpreter.throw_error(
        ErrorKind::TypeError,
        format!("Boolean.prototype.{} is not generic", method),
    )
}

fn to_string(interpreter: &mut Interpreter, this: &Value, _args: &[Value]) -> JsResult<Value> {
    let b = this_boolean(interpreter, this, "toString")?;
    Ok(Value::from(if b { "true" } else { "false" }))
}

fn value_of(interpreter: &mut Interpreter, this: &Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::Boolean(this_boolean(interpreter, this, "valueOf")?))
}
