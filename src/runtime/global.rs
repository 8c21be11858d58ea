//! Global object construction.
//!
//! Builtin types are registered the same way: the constructor is bound on the
//! global object as a hidden (non-enumerable) property, its `prototype` is
//! frozen, and the prototype's `constructor` points back at it.

use super::builtins;
use super::interpreter::{Interpreter, Intrinsics};
use super::object::{ArrayStorage, NativeFunction, ObjectKind, ObjectRef, Property};
use super::value::Value;
use crate::error::ErrorKind;
use std::collections::HashMap;
use tracing::debug;

/// Allocates the global object and the intrinsic prototypes.
pub(crate) fn create_realm() -> (ObjectRef, Intrinsics) {
    let object_prototype = ObjectRef::new(ObjectKind::Ordinary, None);
    let with_object_proto = |kind| ObjectRef::new(kind, Some(object_prototype.clone()));

    let function_prototype = with_object_proto(ObjectKind::Native(NativeFunction {
        name: "",
        call: builtins::function::empty,
        construct: None,
    }));
    let array_prototype = with_object_proto(ObjectKind::Array(ArrayStorage::default()));
    let string_prototype = with_object_proto(ObjectKind::String("".into()));
    let number_prototype = with_object_proto(ObjectKind::Number(0.0));
    let boolean_prototype = with_object_proto(ObjectKind::Boolean(false));
    let regexp_prototype = with_object_proto(ObjectKind::Ordinary);

    let base_error_prototype = with_object_proto(ObjectKind::Ordinary);
    let mut error_prototypes = HashMap::new();
    for kind in ErrorKind::ALL {
        let prototype = if kind == ErrorKind::Error {
            base_error_prototype.clone()
        } else {
            ObjectRef::new(ObjectKind::Ordinary, Some(base_error_prototype.clone()))
        };
        prototype.define_hidden("name", Value::from(kind.name()));
        prototype.define_hidden("message", Value::from(""));
        error_prototypes.insert(kind, prototype);
    }

    let global = with_object_proto(ObjectKind::Ordinary);
    let intrinsics = Intrinsics {
        object_prototype: object_prototype.clone(),
        function_prototype,
        array_prototype,
        string_prototype,
        number_prototype,
        boolean_prototype,
        regexp_prototype,
        error_prototypes,
    };
    (global, intrinsics)
}

/// Installs every builtin on the global object.
pub(crate) fn initialize(interpreter: &mut Interpreter) {
    let global = interpreter.global.clone();
    global.define("undefined", Property::frozen(Value::Undefined));
    global.define("NaN", Property::frozen(Value::Number(f64::NAN)));
    global.define("Infinity", Property::frozen(Value::Number(f64::INFINITY)));

    builtins::object::register(interpreter);
    builtins::function::register(interpreter);
    builtins::boolean::register(interpreter);
    builtins::number::register(interpreter);
    builtins::string::register(interpreter);
    builtins::array::register(interpreter);
    builtins::regexp::register(interpreter);
    builtins::error::register(interpreter);
    builtins::math::register(interpreter);
    builtins::json::register(interpreter);
    builtins::globals::register(interpreter);
    builtins::uri::register(interpreter);
    crate::harness::install(interpreter);

    debug!(
        bindings = global.own_keys(false).len(),
        print = interpreter.config.enable_print,
        "global object initialized"
    );
}

/// Binds a builtin constructor and its prototype on the global object.
pub(crate) fn register_type(
    interpreter: &Interpreter,
    constructor: ObjectRef,
    prototype: &ObjectRef,
) -> ObjectRef {
    let name = match &constructor.borrow().kind {
        ObjectKind::Native(native) => native.name,
        _ => "",
    };
    constructor.define("prototype", Property::frozen(Value::Object(prototype.clone())));
    prototype.define_hidden("constructor", Value::Object(constructor.clone()));
    interpreter
        .global
        .define_hidden(name, Value::Object(constructor.clone()));
    constructor
}
