//! `JSON.stringify` and `JSON.parse`, backed by `serde_json`.
//!
//! Script values are converted to and from [`serde_json::Value`]; object key
//! order is preserved through the `preserve_order` feature.

use super::{arg, define_method, list_from_array_like};
use crate::config::MAX_NESTING_DEPTH;
use crate::error::ErrorKind;
use crate::runtime::interpreter::{Interpreter, JsResult};
use crate::runtime::object::ObjectRef;
use crate::runtime::value::Value;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Number};

/// Largest indentation `JSON.stringify` accepts; longer `space` values are cut.
const MAX_INDENT: usize = 10;

pub fn register(interpreter: &mut Interpreter) {
    let json = interpreter.new_object();
    define_method(interpreter, &json, "stringify", 3, stringify);
    define_method(interpreter, &json, "parse", 2, parse);
    interpreter.global.define_hidden("JSON", Value::Object(json));
}

struct Stringifier {
    replacer: Option<Value>,
    allow_list: Option<Vec<String>>,
    stack: Vec<ObjectRef>,
}

impl Stringifier {
    /// Serializes `holder[key]`; `None` means the property is skipped.
    fn property(
        &mut self,
        interpreter: &mut Interpreter,
        holder: &ObjectRef,
        key: &str,
        mut value: Value,
    ) -> JsResult<Option<serde_json::Value>> {
        if let Value::Object(object) = &value {
            let to_json = object.get("toJSON");
            if to_json.is_callable() {
                value = interpreter.call(&to_json, value.clone(), &[Value::from(key)])?;
            }
        }
        if let Some(replacer) = &self.replacer {
            value = interpreter.call(
                replacer,
                Value::Object(holder.clone()),
                &[Value::from(key), value],
            )?;
        }
        if let Value::Object(object) = &value {
            if let Some(primitive) = object.primitive_value() {
                value = match primitive {
                    Value::Number(_) => Value::Number(interpreter.to_number(&value)?),
                    Value::String(_) => Value::String(interpreter.to_string(&value)?),
                    other => other,
                };
            }
        }

        Ok(match value {
            Value::Undefined => None,
            Value::Null => Some(serde_json::Value::Null),
            Value::Boolean(b) => Some(serde_json::Value::Bool(b)),
            Value::Number(n) => Some(number(n)),
            Value::String(s) => Some(serde_json::Value::String(s.to_string())),
            Value::Object(object) if object.is_callable() => None,
            Value::Object(object) => Some(self.object(interpreter, &object)?),
        })
    }

    fn object(
        &mut self,
        interpreter: &mut Interpreter,
        object: &ObjectRef,
    ) -> JsResult<serde_json::Value> {
        if self.stack.iter().any(|seen| seen.ptr_eq(object)) {
            return Err(interpreter.throw_error(
                ErrorKind::TypeError,
                "Converting circular structure to JSON",
            ));
        }
        if self.stack.len() >= MAX_NESTING_DEPTH {
            return Err(interpreter.throw_error(
                ErrorKind::RangeError,
                "Maximum call stack size exceeded",
            ));
        }
        self.stack.push(object.clone());
        let result = self.members(interpreter, object);
        self.stack.pop();
        result
    }

    fn members(
        &mut self,
        interpreter: &mut Interpreter,
        object: &ObjectRef,
    ) -> JsResult<serde_json::Value> {
        if object.is_array() {
            let elements = list_from_array_like(interpreter, object)?;
            let mut items = Vec::with_capacity(elements.len());
            for (i, element) in elements.into_iter().enumerate() {
                let key = Interpreter::index_key(i);
                let item = self.property(interpreter, object, &key, element)?;
                items.push(item.unwrap_or(serde_json::Value::Null));
            }
            return Ok(serde_json::Value::Array(items));
        }

        let keys: Vec<String> = match &self.allow_list {
            Some(list) => list
                .iter()
                .filter(|key| object.has_property(key))
                .cloned()
                .collect(),
            None => object.own_keys(true).iter().map(|k| k.to_string()).collect(),
        };
        let mut map = Map::new();
        for key in keys {
            let value = object.get(&key);
            if let Some(member) = self.property(interpreter, object, &key, value)? {
                map.insert(key, member);
            }
        }
        Ok(serde_json::Value::Object(map))
    }
}

/// Integral doubles are emitted without a fraction (`1`, not `1.0`);
/// non-finite numbers become `null`.
fn number(n: f64) -> serde_json::Value {
    if !n.is_finite() {
        return serde_json::Value::Null;
    }
    if n.fract() == 0.0 && n.abs() < crate::config::MAX_SAFE_INTEGER {
        return serde_json::Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

fn indent(space: &Value) -> String {
    let space = match space.as_object().and_then(ObjectRef::primitive_value) {
        Some(primitive) => primitive,
        None => space.clone(),
    };
    match space {
        Value::Number(n) => {
            let width = super::to_integer(n).clamp(0.0, MAX_INDENT as f64) as usize;
            " ".repeat(width)
        }
        Value::String(s) => s.chars().take(MAX_INDENT).collect(),
        _ => String::new(),
    }
}

fn stringify(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    let replacer = arg(args, 1);
    let mut stringifier = Stringifier {
        replacer: replacer.is_callable().then(|| replacer.clone()),
        allow_list: None,
        stack: Vec::new(),
    };
    if let Some(list) = replacer.as_object().and_then(ObjectRef::array_elements) {
        let mut keys = Vec::new();
        for item in list {
            if matches!(item, Value::String(_) | Value::Number(_)) {
                let key = interpreter.to_string(&item)?.to_string();
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        stringifier.allow_list = Some(keys);
    }
    let indent = indent(&arg(args, 2));

    let wrapper = interpreter.new_object();
    let value = arg(args, 0);
    wrapper.put("", value.clone());
    let Some(json) = stringifier.property(interpreter, &wrapper, "", value)? else {
        return Ok(Value::Undefined);
    };

    let text = if indent.is_empty() {
        serde_json::to_string(&json)
    } else {
        let formatter = PrettyFormatter::with_indent(indent.as_bytes());
        let mut serializer = Serializer::with_formatter(Vec::new(), formatter);
        json.serialize(&mut serializer)
            .map(|()| String::from_utf8_lossy(&serializer.into_inner()).into_owned())
    };
    let text = text.map_err(|e| interpreter.throw_error(ErrorKind::Error, e.to_string()))?;
    Ok(Value::from(text))
}

fn parse(interpreter: &mut Interpreter, _this: &Value, args: &[Value]) -> JsResult<Value> {
    let text = interpreter.to_string(&arg(args, 0))?;
    let json: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
        interpreter.throw_error(
            ErrorKind::SyntaxError,
            format!("Unexpected token in JSON: {}", e),
        )
    })?;
    Ok(to_value(interpreter, json))
}

fn to_value(interpreter: &Interpreter, json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::from(s),
        serde_json::Value::Array(items) => {
            let elements = items
                .into_iter()
                .map(|item| to_value(interpreter, item))
                .collect();
            Value::Object(interpreter.new_array(elements))
        }
        serde_json::Value::Object(map) => {
            let object = interpreter.new_object();
            for (key, item) in map {
                object.put(&key, to_value(interpreter, item));
            }
            Value::Object(object)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_rendering() {
        assert_eq!(number(1.0).to_string(), "1");
        assert_eq!(number(-0.0).to_string(), "0");
        assert_eq!(number(0.5).to_string(), "0.5");
        assert_eq!(number(f64::NAN), serde_json::Value::Null);
        assert_eq!(number(f64::INFINITY), serde_json::Value::Null);
    }
}
