//! Builtin library.
//!
//! Each submodule exposes a `register` function that installs its constructor,
//! prototype methods and static functions. Methods are plain [`NativeFn`]s
//! receiving the interpreter, the `this` value and the argument list.

pub mod array;
pub mod boolean;
pub mod error;
pub mod function;
pub mod globals;
pub mod json;
pub mod math;
pub mod number;
pub mod object;
pub mod regexp;
pub mod string;
pub mod uri;

use super::interpreter::{Interpreter, JsResult};
use super::object::{NativeFn, ObjectRef};
use super::value::Value;
use crate::config::MAX_DENSE_ARRAY_LENGTH;
use crate::error::ErrorKind;

/// The argument at `index`, or `undefined` when fewer were passed.
pub fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

/// Installs a non-enumerable method on `target`.
pub fn define_method(
    interpreter: &Interpreter,
    target: &ObjectRef,
    name: &'static str,
    arity: usize,
    call: NativeFn,
) {
    let function = interpreter.new_native_function(name, arity, call, None);
    target.define_hidden(name, Value::Object(function));
}

/// Converts an optional relative position argument (`slice`, `substring`
/// and friends) into an absolute index clamped to `0..=len`.
pub fn relative_index(
    interpreter: &mut Interpreter,
    value: &Value,
    len: usize,
    default: usize,
) -> JsResult<usize> {
    if value.is_undefined() {
        return Ok(default);
    }
    let n = to_integer(interpreter.to_number(value)?);
    let len_f = len as f64;
    let index = if n < 0.0 {
        (len_f + n).max(0.0)
    } else {
        n.min(len_f)
    };
    Ok(index as usize)
}

/// ToInteger (ES5 9.4).
pub fn to_integer(n: f64) -> f64 {
    if n.is_nan() {
        0.0
    } else {
        n.trunc()
    }
}

/// Callback argument of `forEach`/`map`/`filter` and `replace`.
pub fn require_callable(
    interpreter: &mut Interpreter,
    value: &Value,
) -> JsResult<Value> {
    if value.is_callable() {
        return Ok(value.clone());
    }
    let shown = interpreter.display(value);
    Err(interpreter.throw_error(ErrorKind::TypeError, format!("{} is not a function", shown)))
}

/// `length` of an array or array-like object, as a clamped integer.
pub fn length_of(interpreter: &mut Interpreter, object: &ObjectRef) -> JsResult<usize> {
    if let Some(length) = object.array_length() {
        return Ok(length);
    }
    let length = object.get("length");
    Ok(to_integer(interpreter.to_number(&length)?).max(0.0) as usize)
}

/// Copies the indexed elements of an array or array-like object. Lists
/// longer than [`MAX_DENSE_ARRAY_LENGTH`] raise a `RangeError`.
pub fn list_from_array_like(
    interpreter: &mut Interpreter,
    object: &ObjectRef,
) -> JsResult<Vec<Value>> {
    let length = length_of(interpreter, object)?;
    if length > MAX_DENSE_ARRAY_LENGTH {
        return Err(interpreter.throw_error(ErrorKind::RangeError, "Invalid array length"));
    }
    if let Some(elements) = object.array_elements() {
        return Ok(elements);
    }
    Ok((0..length)
        .map(|i| object.get(&Interpreter::index_key(i)))
        .collect())
}

/// UTF-16 offset of a byte offset into `s`.
pub fn utf16_offset(s: &str, byte_offset: usize) -> usize {
    s[..byte_offset].encode_utf16().count()
}

/// Byte offset of a UTF-16 offset into `s`, clamped to the string's end.
pub fn byte_offset(s: &str, utf16_offset: usize) -> usize {
    let mut units = 0;
    for (byte, c) in s.char_indices() {
        if units >= utf16_offset {
            return byte;
        }
        units += c.len_utf16();
    }
    s.len()
}
