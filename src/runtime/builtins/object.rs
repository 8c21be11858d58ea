//! `Object` constructor and `Object.prototype`.

use super::{arg, define_method};
use crate::error::ErrorKind;
use crate::runtime::global::register_type;
use crate::runtime::interpreter::{Interpreter, JsResult};
use crate::runtime::object::{ObjectKind, ObjectRef, Property};
use crate::runtime::value::Value;

pub fn register(interpreter: &mut Interpreter) {
    let prototype = interpreter.intrinsics.object_prototype.clone();
    let constructor = interpreter.new_native_function("Object", 1, object, Some(object));
    let constructor = register_type(interpreter, constructor, &prototype);

    define_method(interpreter, &constructor, "keys", 1, keys);
    define_method(interpreter, &constructor, "getPrototypeOf", 1, get_prototype_of);
    define_method(interpreter, &constructor, "create", 2, create);
    define_method(interpreter, &constructor, "defineProperty", 3, define_property);

    define_method(interpreter, &prototype, "hasOwnProperty", 1, has_own_property);
    define_method(interpreter, &prototype, "isPrototypeOf", 1, is_prototype_of);
    define_method(interpreter, &prototype, "toString", 0, to_string);
    define_method(interpreter, &prototype, "valueOf", 0, value_of);
}

fn object(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    let value = arg(args, 0);
    if value.is_nullish() {
        return Ok(Value::Object(interpreter.new_object()));
    }
    Ok(Value::Object(interpreter.to_object(&value)?))
}

fn require_object(interpreter: &Interpreter, value: &Value, caller: &str) -> JsResult<ObjectRef> {
    match value {
        Value::Object(o) => Ok(o.clone()),
        _ => Err(interpreter.throw_error(
            ErrorKind::TypeError,
            format!("{} called on non-object", caller),
        )),
    }
}

fn keys(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    let object = require_object(interpreter, &arg(args, 0), "Object.keys")?;
    let keys = object
        .own_keys(true)
        .into_iter()
        .map(Value::String)
        .collect();
    Ok(Value::Object(interpreter.new_array(keys)))
}

fn get_prototype_of(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    let object = require_object(interpreter, &arg(args, 0), "Object.getPrototypeOf")?;
    Ok(object.prototype().map(Value::Object).unwrap_or(Value::Null))
}

fn create(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    let prototype = match arg(args, 0) {
        Value::Object(o) => Some(o),
        Value::Null => None,
        _ => {
            return Err(interpreter.throw_error(
                ErrorKind::TypeError,
                "Object prototype may only be an Object or null",
            ))
        }
    };
    let object = ObjectRef::new(ObjectKind::Ordinary, prototype);
    if let Value::Object(properties) = arg(args, 1) {
        for key in properties.own_keys(true) {
            let descriptor = properties.get(&key);
            apply_descriptor(interpreter, &object, &key, &descriptor)?;
        }
    }
    Ok(Value::Object(object))
}

fn define_property(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    let target = arg(args, 0);
    let object = require_object(interpreter, &target, "Object.defineProperty")?;
    let key = interpreter.to_string(&arg(args, 1))?;
    apply_descriptor(interpreter, &object, &key, &arg(args, 2))?;
    Ok(target)
}

/// Defines a data property from a descriptor object. Absent attributes default to false.
fn apply_descriptor(
    interpreter: &mut Interpreter,
    object: &ObjectRef,
    key: &str,
    descriptor: &Value,
) -> JsResult<()> {
    let descriptor = match descriptor {
        Value::Object(d) => d.clone(),
        _ => {
            return Err(interpreter.throw_error(
                ErrorKind::TypeError,
                "Property description must be an object",
            ))
        }
    };
    if descriptor.has_property("get") || descriptor.has_property("set") {
        return Err(interpreter.throw_error(
            ErrorKind::TypeError,
            "Accessor properties are not supported",
        ));
    }
    if let Some(existing) = object.get_own_property(key) {
        if !existing.configurable {
            return Err(interpreter.throw_error(
                ErrorKind::TypeError,
                format!("Cannot redefine property: {}", key),
            ));
        }
    }
    object.define(
        key,
        Property {
            value: descriptor.get("value"),
            writable: descriptor.get("writable").to_boolean(),
            enumerable: descriptor.get("enumerable").to_boolean(),
            configurable: descriptor.get("configurable").to_boolean(),
        },
    );
    Ok(())
}

fn has_own_property(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let key = interpreter.to_string(&arg(args, 0))?;
    let object = interpreter.to_object(this)?;
    Ok(Value::Boolean(object.has_own_property(&key)))
}

fn is_prototype_of(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let mut current = match arg(args, 0) {
        Value::Object(o) => o.prototype(),
        _ => return Ok(Value::Boolean(false)),
    };
    let object = interpreter.to_object(this)?;
    while let Some(candidate) = current {
        if candidate.ptr_eq(&object) {
            return Ok(Value::Boolean(true));
        }
        current = candidate.prototype();
    }
    Ok(Value::Boolean(false))
}

fn to_string(interpreter: &mut Interpreter, this: &Value, _args: &[Value]) -> JsResult<Value> {
    let class = match this {
        Value::Undefined => "Undefined",
        Value::Null => "Null",
        other => interpreter.to_object(other)?.class_name(),
    };
    Ok(Value::from(format!("[object {}]", class)))
}

fn value_of(interpreter: &mut Interpreter, this: &Value, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::Object(interpreter.to_object(this)?))
}
