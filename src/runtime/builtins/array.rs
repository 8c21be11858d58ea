//! `Array` constructor and `Array.prototype`.

use super::{arg, define_method, length_of, list_from_array_like, relative_index, require_callable};
use crate::error::ErrorKind;
use crate::runtime::global::register_type;
use crate::runtime::interpreter::{Interpreter, JsResult};
use crate::runtime::object::{NativeFn, ObjectRef};
use crate::runtime::value::{strict_equals, Value};

pub fn register(interpreter: &mut Interpreter) {
    let prototype = interpreter.intrinsics.array_prototype.clone();
    let constructor = interpreter.new_native_function("Array", 1, array, Some(array));
    let constructor = register_type(interpreter, constructor, &prototype);
    define_method(interpreter, &constructor, "isArray", 1, is_array);

    let methods: [(&'static str, usize, NativeFn); 13] = [
        ("push", 1, push),
        ("pop", 0, pop),
        ("shift", 0, shift),
        ("join", 1, join),
        ("reverse", 0, reverse),
        ("indexOf", 1, index_of),
        ("slice", 2, slice),
        ("concat", 1, concat),
        ("forEach", 1, for_each),
        ("map", 1, map),
        ("filter", 1, filter),
        ("some", 1, some),
        ("toString", 0, to_string),
    ];
    for (name, arity, method) in methods {
        define_method(interpreter, &prototype, name, arity, method);
    }
}

/// `Array(len)` sets the length of an empty array; any other argument list
/// becomes the elements.
fn array(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    if let [Value::Number(len)] = args {
        let valid = *len >= 0.0 && len.fract() == 0.0 && *len <= f64::from(u32::MAX);
        if !valid {
            return Err(interpreter.throw_error(ErrorKind::RangeError, "Invalid array length"));
        }
        let array = interpreter.new_array(Vec::new());
        array.put("length", Value::Number(*len));
        return Ok(Value::Object(array));
    }
    Ok(Value::Object(interpreter.new_array(args.to_vec())))
}

fn is_array(_interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    Ok(Value::Boolean(
        arg(args, 0).as_object().is_some_and(ObjectRef::is_array),
    ))
}

/// `this` as an object, with a copy of its elements.
fn elements(interpreter: &mut Interpreter, this: &Value) -> JsResult<(ObjectRef, Vec<Value>)> {
    let object = interpreter.to_object(this)?;
    let elements = list_from_array_like(interpreter, &object)?;
    Ok((object, elements))
}

/// Replaces the contents of an array, or rewrites the indexed properties of
/// an array-like object.
fn store(object: &ObjectRef, values: Vec<Value>) {
    if object.is_array() {
        object.replace_elements(values);
        return;
    }
    let length = values.len();
    for (i, value) in values.into_iter().enumerate() {
        object.put(&Interpreter::index_key(i), value);
    }
    object.put("length", Value::Number(length as f64));
}

fn push(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let object = interpreter.to_object(this)?;
    let mut length = length_of(interpreter, &object)?;
    for value in args {
        object.put(&Interpreter::index_key(length), value.clone());
        length += 1;
    }
    object.put("length", Value::Number(length as f64));
    Ok(Value::Number(length as f64))
}

fn pop(interpreter: &mut Interpreter, this: &Value, _args: &[Value]) -> JsResult<Value> {
    let object = interpreter.to_object(this)?;
    let length = length_of(interpreter, &object)?;
    if length == 0 {
        object.put("length", Value::Number(0.0));
        return Ok(Value::Undefined);
    }
    let key = Interpreter::index_key(length - 1);
    let last = object.get(&key);
    object.delete(&key);
    object.put("length", Value::Number((length - 1) as f64));
    Ok(last)
}

fn shift(interpreter: &mut Interpreter, this: &Value, _args: &[Value]) -> JsResult<Value> {
    let (object, mut values) = elements(interpreter, this)?;
    if values.is_empty() {
        return Ok(Value::Undefined);
    }
    let first = values.remove(0);
    store(&object, values);
    Ok(first)
}

fn reverse(interpreter: &mut Interpreter, this: &Value, _args: &[Value]) -> JsResult<Value> {
    let (object, mut values) = elements(interpreter, this)?;
    values.reverse();
    store(&object, values);
    Ok(Value::Object(object))
}

fn join(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let (_, values) = elements(interpreter, this)?;
    let separator = match arg(args, 0) {
        Value::Undefined => ",".into(),
        other => interpreter.to_string(&other)?,
    };
    let mut parts = Vec::with_capacity(values.len());
    for value in &values {
        if value.is_nullish() {
            parts.push(String::new());
        } else {
            parts.push(interpreter.to_string(value)?.to_string());
        }
    }
    Ok(Value::from(parts.join(&*separator)))
}

fn to_string(interpreter: &mut Interpreter, this: &Value, _args: &[Value]) -> JsResult<Value> {
    join(interpreter, this, &[])
}

fn index_of(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let (_, values) = elements(interpreter, this)?;
    let target = arg(args, 0);
    let from = relative_index(interpreter, &arg(args, 1), values.len(), 0)?;
    let found = values
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, value)| strict_equals(value, &target))
        .map(|(i, _)| i as f64);
    Ok(Value::Number(found.unwrap_or(-1.0)))
}

fn slice(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let (_, values) = elements(interpreter, this)?;
    let start = relative_index(interpreter, &arg(args, 0), values.len(), 0)?;
    let end = relative_index(interpreter, &arg(args, 1), values.len(), values.len())?;
    let sliced = if start < end {
        values[start..end].to_vec()
    } else {
        Vec::new()
    };
    Ok(Value::Object(interpreter.new_array(sliced)))
}

fn concat(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let (_, mut values) = elements(interpreter, this)?;
    for value in args {
        let spread = match value.as_object().filter(|o| o.is_array()) {
            Some(array) => array.with_elements(|items| values.extend_from_slice(items)),
            None => {
                values.push(value.clone());
                Some(())
            }
        };
        if spread.is_none() {
            return Err(interpreter.throw_error(ErrorKind::RangeError, "Invalid array length"));
        }
    }
    Ok(Value::Object(interpreter.new_array(values)))
}

/// Calls `callback(element, index, array)` for each element, stopping when
/// `visit` returns false.
fn iterate<F>(interpreter: &mut Interpreter, this: &Value, args: &[Value], mut visit: F) -> JsResult<()>
where
    F: FnMut(&Value, Value) -> bool,
{
    let (object, values) = elements(interpreter, this)?;
    let callback = require_callable(interpreter, &arg(args, 0))?;
    let this_arg = arg(args, 1);
    for (i, value) in values.into_iter().enumerate() {
        let result = interpreter.call(
            &callback,
            this_arg.clone(),
            &[value.clone(), Value::Number(i as f64), Value::Object(object.clone())],
        )?;
        if !visit(&value, result) {
            break;
        }
    }
    Ok(())
}

fn for_each(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    iterate(interpreter, this, args, |_, _| true)?;
    Ok(Value::Undefined)
}

fn map(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let mut mapped = Vec::new();
    iterate(interpreter, this, args, |_, result| {
        mapped.push(result);
        true
    })?;
    Ok(Value::Object(interpreter.new_array(mapped)))
}

fn filter(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let mut kept = Vec::new();
    iterate(interpreter, this, args, |value, result| {
        if result.to_boolean() {
            kept.push(value.clone());
        }
        true
    })?;
    Ok(Value::Object(interpreter.new_array(kept)))
}

fn some(interpreter: &mut Interpreter, this: &Value, args: &[Value]) -> JsResult<Value> {
    let mut found = false;
    iterate(interpreter, this, args, |_, result| {
        found = result.to_boolean();
        !found
    })?;
    Ok(Value::Boolean(found))
}
