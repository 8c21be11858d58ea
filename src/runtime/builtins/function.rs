//! `Function` constructor and `Function.prototype`.

use super::{arg, define_method, list_from_array_like};
use crate::error::ErrorKind;
use crate::runtime::global::register_type;
use crate::runtime::interpreter::{Interpreter, JsResult};
use crate::runtime::object::ObjectKind;
use crate::runtime::value::Value;

pub fn register(interpreter: &mut Interpreter) {
    let prototype = interpreter.intrinsics.function_prototype.clone();
    let constructor = interpreter.new_native_function("Function", 1, function, Some(function));
    register_type(interpreter, constructor, &prototype);

    define_method(interpreter, &prototype, "call", 1, call);
    define_method(interpreter, &prototype, "apply", 2, apply);
    define_method(interpreter, &prototype, "toString", 0, to_string);
}

/// Body of `Function.prototype` itself: accepts anything, returns `undefined`.
pub(crate) fn empty(_interpreter: &mut Interpreter, _this: &Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::Undefined)
}

/// Building functions from source strings needs `eval`, which the runtime does not provide.
fn function(interpreter: &mut Interpreter, _this: &Value, _args: &[Value]) -> JsResult<Value> {
    Err(interpreter.throw_error(
        ErrorKind::EvalError,
        "Function constructor is not supported",
    ))
}

fn call(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let rest = args.get(1..).unwrap_or_default();
    interpreter.call(this, arg(args, 0), rest)
}

fn apply(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let arguments = match arg(args, 1) {
        Value::Undefined | Value::Null => Vec::new(),
        Value::Object(list) => list_from_array_like(interpreter, &list)?,
        _ => {
            return Err(interpreter.throw_error(
                ErrorKind::TypeError,
                "Function.prototype.apply: Arguments list has wrong type",
            ))
        }
    };
    interpreter.call(this, arg(args, 0), &arguments)
}

fn to_string(interpreter: &mut Interpreter, this: &Value, _args: &[Value]) -> JsResult<Value> {
    let function = match this {
        Value::Object(o) if o.is_callable() => o.clone(),
        _ => {
            return Err(interpreter.throw_error(
                ErrorKind::TypeError,
                "Function.prototype.toString is not generic",
            ))
        }
    };
    let text = match &function.borrow().kind {
        ObjectKind::Native(native) => format!("function {}() {{ [native code] }}", native.name),
        ObjectKind::Function(closure) => format!(
            "function {}({}) {{ ... }}",
            closure.def.name.as_deref().unwrap_or(""),
            closure.def.params.join(", ")
        ),
        _ => String::new(),
    };
    Ok(Value::from(text))
}
