//! `Error` and the native error constructors.
//!
//! Every constructor creates an object whose prototype is the matching
//! `<Kind>.prototype`, whether it is called with `new` or as a plain function.

use super::{arg, define_method};
use crate::error::ErrorKind;
use crate::runtime::global::register_type;
use crate::runtime::interpreter::{Interpreter, JsResult};
use crate::runtime::object::{NativeFn, ObjectKind, ObjectRef};
use crate::runtime::value::Value;

/// One constructor per entry of [`ErrorKind::ALL`], selected by index.
const CONSTRUCTORS: [NativeFn; 7] = [
    construct::<0>,
    construct::<1>,
    construct::<2>,
    construct::<3>,
    construct::<4>,
    construct::<5>,
    construct::<6>,
];

pub fn register(interpreter: &mut Interpreter) {
    for (kind, constructor) in ErrorKind::ALL.into_iter().zip(CONSTRUCTORS) {
        let prototype = interpreter.error_prototype(kind);
        let function = interpreter.new_native_function(kind.name(), 1, constructor, Some(constructor));
        register_type(interpreter, function, &prototype);
        if kind == ErrorKind::Error {
            define_method(interpreter, &prototype, "toString", 0, to_string);
        }
    }
}

fn construct<const K: usize>(
    interpreter: &mut Interpreter,
    _this: &Value,
    args: &[Value],
) -> JsResult<Value> {
    let kind = ErrorKind::ALL[K];
    let error = ObjectRef::new(ObjectKind::Error, Some(interpreter.error_prototype(kind)));
    let message = arg(args, 0);
    if !message.is_undefined() {
        let message = interpreter.to_string(&message)?;
        error.define_hidden("message", Value::String(message));
    }
    Ok(Value::Object(error))
}

/// `Error.prototype.toString` (ES5 15.11.4.4).
fn to_string(interpreter: &mut Interpreter, this: &Value, _args: &[Value]) -> JsResult<Value> {
    let object = match this {
        Value::Object(o) => o.clone(),
        _ => {
            return Err(interpreter.throw_error(
                ErrorKind::TypeError,
                "Error.prototype.toString called on non-object",
            ))
        }
    };
    let name = match object.get("name") {
        Value::Undefined => "Error".into(),
        other => interpreter.to_string(&other)?,
    };
    let message = match object.get("message") {
        Value::Undefined => "".into(),
        other => interpreter.to_string(&other)?,
    };
    let text = if name.is_empty() {
        message.to_string()
    } else if message.is_empty() {
        name.to_string()
    } else {
        format!("{}: {}", name, message)
    };
    Ok(Value::from(text))
}
