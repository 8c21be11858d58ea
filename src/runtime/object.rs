//! Heap objects.
//!
//! An object is a shared, mutable [`JsObject`] behind an [`ObjectRef`]. Property
//! order is insertion order, except that arrays report their indices first.
//!
//! ## Arrays
//!
//! An array keeps its leading elements in a backing vector and its `length`
//! as a separate field. Writes far past the end of the vector, or past
//! [`MAX_DENSE_ARRAY_LENGTH`], land in the ordinary keyed slots, so a large
//! index or `length` never allocates element storage.
//!
//! ## Borrowing
//!
//! No method here calls back into script code, and none keeps a `RefCell`
//! borrow alive after it returns. Callers can therefore mix `get`/`put` with
//! interpreter calls freely, as long as they don't hold a [`ObjectRef::borrow`]
//! guard across a call.

use super::environment::EnvRef;
use super::interpreter::{Interpreter, JsResult};
use super::value::{array_index, number_key, to_uint32, utf16_len, Value};
use crate::ast::FunctionDef;
use crate::config::{MAX_DENSE_ARRAY_GAP, MAX_DENSE_ARRAY_LENGTH};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Signature of builtin functions: `(interpreter, this, arguments)`.
pub type NativeFn = fn(&mut Interpreter, &Value, &[Value]) -> JsResult<Value>;

/// A builtin function. `construct` is what `new` invokes; `None` means the
/// function is not a constructor.
#[derive(Clone, Copy)]
pub struct NativeFunction {
    pub name: &'static str,
    pub call: NativeFn,
    pub construct: Option<NativeFn>,
}

/// A script function together with the scope it closes over.
pub struct Closure {
    pub def: Rc<FunctionDef>,
    pub scope: EnvRef,
}

/// Compiled regular expression plus the source and flags it was built from.
pub struct RegExpData {
    pub source: Rc<str>,
    pub flags: Rc<str>,
    pub regex: regex::Regex,
}

impl RegExpData {
    pub fn global(&self) -> bool {
        self.flags.contains('g')
    }

    pub fn ignore_case(&self) -> bool {
        self.flags.contains('i')
    }

    pub fn multiline(&self) -> bool {
        self.flags.contains('m')
    }
}

/// Element storage of an array: a dense prefix plus the reported `length`.
#[derive(Default)]
pub struct ArrayStorage {
    dense: Vec<Value>,
    length: usize,
}

impl ArrayStorage {
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// True when every element lives in the backing vector.
    fn is_dense(&self) -> bool {
        self.dense.len() == self.length
    }

    /// Whether a write to `index` belongs in the backing vector.
    fn stores_densely(&self, index: usize) -> bool {
        index < MAX_DENSE_ARRAY_LENGTH && index <= self.dense.len() + MAX_DENSE_ARRAY_GAP
    }
}

impl From<Vec<Value>> for ArrayStorage {
    fn from(dense: Vec<Value>) -> Self {
        let length = dense.len();
        Self { dense, length }
    }
}

pub enum ObjectKind {
    Ordinary,
    Array(ArrayStorage),
    Function(Rc<Closure>),
    Native(NativeFunction),
    Error,
    RegExp(Rc<RegExpData>),
    Boolean(bool),
    Number(f64),
    String(Rc<str>),
}

/// A data property and its attributes.
#[derive(Clone, Debug)]
pub struct Property {
    pub value: Value,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl Property {
    /// Plain assignment semantics: writable, enumerable, configurable.
    pub fn data(value: Value) -> Self {
        Self {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Builtin methods and internal slots: writable and configurable, not enumerable.
    pub fn hidden(value: Value) -> Self {
        Self {
            value,
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }

    /// Constants such as `undefined`, `NaN` and `Math.PI`.
    pub fn frozen(value: Value) -> Self {
        Self {
            value,
            writable: false,
            enumerable: false,
            configurable: false,
        }
    }
}

pub struct JsObject {
    pub kind: ObjectKind,
    pub prototype: Option<ObjectRef>,
    pub extensible: bool,
    keys: Vec<Rc<str>>,
    slots: HashMap<Rc<str>, Property>,
}

impl JsObject {
    fn own_property(&self, key: &str) -> Option<Property> {
        match &self.kind {
            ObjectKind::Array(storage) => {
                if key == "length" {
                    return Some(Property {
                        value: Value::Number(storage.length as f64),
                        writable: true,
                        enumerable: false,
                        configurable: false,
                    });
                }
                if let Some(value) = array_index(key).and_then(|i| storage.dense.get(i)) {
                    return Some(Property::data(value.clone()));
                }
            }
            ObjectKind::String(s) => {
                if key == "length" {
                    return Some(Property::frozen(Value::Number(utf16_len(s) as f64)));
                }
                if let Some(index) = array_index(key) {
                    return s.encode_utf16().nth(index).map(|unit| Property {
                        value: Value::from(String::from_utf16_lossy(&[unit])),
                        writable: false,
                        enumerable: true,
                        configurable: false,
                    });
                }
            }
            _ => {}
        }
        self.slots.get(key).cloned()
    }

    fn insert(&mut self, key: &str, property: Property) {
        match self.slots.get_mut(key) {
            Some(slot) => *slot = property,
            None => {
                let key: Rc<str> = Rc::from(key);
                self.keys.push(key.clone());
                self.slots.insert(key, property);
            }
        }
    }

    fn remove(&mut self, key: &str) {
        if self.slots.remove(key).is_some() {
            self.keys.retain(|k| &**k != key);
        }
    }

    /// Drops keyed array elements whose index satisfies `doomed`.
    fn remove_keyed_elements(&mut self, doomed: impl Fn(usize) -> bool) {
        let slots = &mut self.slots;
        self.keys.retain(|key| match array_index(key) {
            Some(index) if doomed(index) => {
                slots.remove(key);
                false
            }
            _ => true,
        });
    }

    /// Array element write. Returns false when this is not an array.
    fn put_element(&mut self, index: usize, value: Value) -> bool {
        let ObjectKind::Array(storage) = &mut self.kind else {
            return false;
        };
        storage.length = storage.length.max(index + 1);
        if index < storage.dense.len() {
            storage.dense[index] = value;
            return true;
        }
        if !storage.stores_densely(index) {
            self.insert(&number_key(index as f64), Property::data(value));
            return true;
        }
        // Keyed elements the vector now covers move into it.
        let start = storage.dense.len();
        storage.dense.resize(index + 1, Value::Undefined);
        storage.dense[index] = value;
        if !self.keys.is_empty() {
            for i in start..index {
                if let Some(moved) = self.slots.get(&*number_key(i as f64)) {
                    storage.dense[i] = moved.value.clone();
                }
            }
            self.remove_keyed_elements(|i| i >= start && i <= index);
        }
        true
    }

    /// Array `length` write: truncates, or only moves the bound when growing.
    fn set_length(&mut self, length: usize) -> bool {
        let ObjectKind::Array(storage) = &mut self.kind else {
            return false;
        };
        let shrinking = length < storage.length;
        storage.dense.truncate(length);
        storage.length = length;
        if shrinking && !self.keys.is_empty() {
            self.remove_keyed_elements(|i| i >= length);
        }
        true
    }

    /// Elements as a contiguous list, holes read as `undefined`. `None` for
    /// non-arrays and arrays too long to materialize.
    fn materialize(&self) -> Option<Vec<Value>> {
        let ObjectKind::Array(storage) = &self.kind else {
            return None;
        };
        if storage.length > MAX_DENSE_ARRAY_LENGTH {
            return None;
        }
        let mut elements = storage.dense.clone();
        elements.extend((storage.dense.len()..storage.length).map(|i| {
            self.slots
                .get(&*number_key(i as f64))
                .map(|p| p.value.clone())
                .unwrap_or_default()
        }));
        Some(elements)
    }
}

/// Shared handle to a heap object. Equality is identity.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<JsObject>>);

impl ObjectRef {
    pub fn new(kind: ObjectKind, prototype: Option<ObjectRef>) -> Self {
        ObjectRef(Rc::new(RefCell::new(JsObject {
            kind,
            prototype,
            extensible: true,
            keys: Vec::new(),
            slots: HashMap::new(),
        })))
    }

    pub fn borrow(&self) -> Ref<'_, JsObject> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, JsObject> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn prototype(&self) -> Option<ObjectRef> {
        self.borrow().prototype.clone()
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self.borrow().kind,
            ObjectKind::Function(_) | ObjectKind::Native(_)
        )
    }

    pub fn is_array(&self) -> bool {
        matches!(self.borrow().kind, ObjectKind::Array(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self.borrow().kind, ObjectKind::Error)
    }

    /// The `[[Class]]` reported by `Object.prototype.toString`.
    pub fn class_name(&self) -> &'static str {
        match self.borrow().kind {
            ObjectKind::Ordinary => "Object",
            ObjectKind::Array(_) => "Array",
            ObjectKind::Function(_) | ObjectKind::Native(_) => "Function",
            ObjectKind::Error => "Error",
            ObjectKind::RegExp(_) => "RegExp",
            ObjectKind::Boolean(_) => "Boolean",
            ObjectKind::Number(_) => "Number",
            ObjectKind::String(_) => "String",
        }
    }

    pub fn regexp(&self) -> Option<Rc<RegExpData>> {
        match &self.borrow().kind {
            ObjectKind::RegExp(data) => Some(data.clone()),
            _ => None,
        }
    }

    /// An array's `length`; `None` for other objects.
    pub fn array_length(&self) -> Option<usize> {
        match &self.borrow().kind {
            ObjectKind::Array(storage) => Some(storage.len()),
            _ => None,
        }
    }

    /// Runs `f` over an array's elements without copying them when the array
    /// is dense. `None` for non-arrays and for arrays longer than
    /// [`MAX_DENSE_ARRAY_LENGTH`].
    ///
    /// The object stays borrowed while `f` runs, so `f` must not call into
    /// script code.
    pub fn with_elements<R>(&self, f: impl FnOnce(&[Value]) -> R) -> Option<R> {
        let object = self.borrow();
        if let ObjectKind::Array(storage) = &object.kind {
            if storage.is_dense() {
                return Some(f(&storage.dense));
            }
        }
        let elements = object.materialize()?;
        drop(object);
        Some(f(&elements))
    }

    /// Snapshot of an array's elements, for callers that run script code
    /// while walking them.
    pub fn array_elements(&self) -> Option<Vec<Value>> {
        self.with_elements(<[Value]>::to_vec)
    }

    /// Replaces every element of an array, dropping keyed ones.
    pub fn replace_elements(&self, elements: Vec<Value>) {
        let mut object = self.borrow_mut();
        if let ObjectKind::Array(storage) = &mut object.kind {
            *storage = ArrayStorage::from(elements);
            object.remove_keyed_elements(|_| true);
        }
    }

    /// Value wrapped by a `Boolean`, `Number` or `String` object.
    pub fn primitive_value(&self) -> Option<Value> {
        match &self.borrow().kind {
            ObjectKind::Boolean(b) => Some(Value::Boolean(*b)),
            ObjectKind::Number(n) => Some(Value::Number(*n)),
            ObjectKind::String(s) => Some(Value::String(s.clone())),
            _ => None,
        }
    }

    pub fn get_own_property(&self, key: &str) -> Option<Property> {
        self.borrow().own_property(key)
    }

    pub fn has_own_property(&self, key: &str) -> bool {
        self.get_own_property(key).is_some()
    }

    /// Finds a property on this object or its prototype chain.
    pub fn get_property(&self, key: &str) -> Option<Property> {
        let mut current = Some(self.clone());
        while let Some(object) = current {
            if let Some(property) = object.get_own_property(key) {
                return Some(property);
            }
            current = object.prototype();
        }
        None
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.get_property(key).is_some()
    }

    /// `[[Get]]`: the property value, or `undefined` when absent.
    pub fn get(&self, key: &str) -> Value {
        self.get_property(key)
            .map(|p| p.value)
            .unwrap_or(Value::Undefined)
    }

    /// `[[Put]]` with non-strict failure semantics: writes to read-only or
    /// non-extensible targets are silently dropped.
    pub fn put(&self, key: &str, value: Value) {
        if self.put_exotic(key, &value) {
            return;
        }
        let own = self.borrow().slots.get(key).map(|p| p.writable);
        match own {
            Some(true) => {
                if let Some(slot) = self.borrow_mut().slots.get_mut(key) {
                    slot.value = value;
                }
            }
            Some(false) => {}
            None => {
                let inherited_read_only = self
                    .prototype()
                    .and_then(|proto| proto.get_property(key))
                    .is_some_and(|p| !p.writable);
                if inherited_read_only || !self.borrow().extensible {
                    return;
                }
                self.borrow_mut().insert(key, Property::data(value));
            }
        }
    }

    /// Array index and `length` writes. Returns true when handled.
    fn put_exotic(&self, key: &str, value: &Value) -> bool {
        let mut object = self.borrow_mut();
        if let ObjectKind::String(s) = &object.kind {
            return key == "length" || array_index(key).is_some_and(|i| i < utf16_len(s));
        }
        if key == "length" {
            let length = to_uint32(value.primitive_to_number().unwrap_or(f64::NAN)) as usize;
            return object.set_length(length);
        }
        match array_index(key) {
            Some(index) => object.put_element(index, value.clone()),
            None => false,
        }
    }

    /// `[[DefineOwnProperty]]` without attribute checks; used for builtins and literals.
    pub fn define(&self, key: &str, property: Property) {
        let is_array_slot = matches!(self.borrow().kind, ObjectKind::Array(_))
            && (key == "length" || array_index(key).is_some());
        if is_array_slot {
            self.put_exotic(key, &property.value);
            return;
        }
        self.borrow_mut().insert(key, property);
    }

    /// Shorthand for defining a non-enumerable property.
    pub fn define_hidden(&self, key: &str, value: Value) {
        self.define(key, Property::hidden(value));
    }

    /// `[[Delete]]`: returns false when the property is not configurable.
    pub fn delete(&self, key: &str) -> bool {
        let mut object = self.borrow_mut();
        if let ObjectKind::Array(storage) = &mut object.kind {
            if key == "length" {
                return false;
            }
            if let Some(slot) = array_index(key).and_then(|i| storage.dense.get_mut(i)) {
                *slot = Value::Undefined;
                return true;
            }
        }
        let configurable = object.slots.get(key).map(|p| p.configurable);
        match configurable {
            None => true,
            Some(false) => false,
            Some(true) => {
                object.remove(key);
                true
            }
        }
    }

    /// Own property keys in enumeration order; `enumerable_only` filters hidden ones.
    pub fn own_keys(&self, enumerable_only: bool) -> Vec<Rc<str>> {
        let object = self.borrow();
        let mut keys = Vec::new();
        let mut named = object.keys.iter().collect::<Vec<_>>();
        match &object.kind {
            ObjectKind::Array(storage) => {
                keys.extend((0..storage.dense.len()).map(|i| number_key(i as f64)));
                let mut keyed: Vec<(usize, &Rc<str>)> = named
                    .iter()
                    .filter_map(|key| array_index(key).map(|i| (i, *key)))
                    .collect();
                keyed.sort_unstable_by_key(|(i, _)| *i);
                keys.extend(keyed.into_iter().map(|(_, key)| key.clone()));
                named.retain(|key| array_index(key).is_none());
            }
            ObjectKind::String(s) => {
                keys.extend((0..utf16_len(s)).map(|i| number_key(i as f64)));
            }
            _ => {}
        }
        for key in named {
            let visible = object.slots.get(key).is_some_and(|p| p.enumerable);
            if visible || !enumerable_only {
                keys.push(key.clone());
            }
        }
        keys
    }

    /// Keys visited by `for-in`: enumerable properties along the prototype
    /// chain, shadowed names reported once.
    pub fn enumerable_keys_in_chain(&self) -> Vec<Rc<str>> {
        let mut seen: Vec<Rc<str>> = Vec::new();
        let mut result = Vec::new();
        let mut current = Some(self.clone());
        while let Some(object) = current {
            for key in object.own_keys(false) {
                if seen.contains(&key) {
                    continue;
                }
                seen.push(key.clone());
                if object.get_own_property(&key).is_some_and(|p| p.enumerable) {
                    result.push(key);
                }
            }
            current = object.prototype();
        }
        result
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[object {}]", self.class_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prototype_lookup_and_shadowing() {
        let proto = ObjectRef::new(ObjectKind::Ordinary, None);
        proto.put("greeting", Value::from("hi"));
        let child = ObjectRef::new(ObjectKind::Ordinary, Some(proto.clone()));
        assert_eq!(child.get("greeting"), Value::from("hi"));
        assert!(!child.has_own_property("greeting"));

        child.put("greeting", Value::from("hello"));
        assert_eq!(child.get("greeting"), Value::from("hello"));
        assert_eq!(proto.get("greeting"), Value::from("hi"));
        assert!(child.get("missing").is_undefined());
    }

    #[test]
    fn test_read_only_writes_ignored() {
        let object = ObjectRef::new(ObjectKind::Ordinary, None);
        object.define("fixed", Property::frozen(Value::Number(1.0)));
        object.put("fixed", Value::Number(2.0));
        assert_eq!(object.get("fixed"), Value::Number(1.0));
        assert!(!object.delete("fixed"));

        let child = ObjectRef::new(ObjectKind::Ordinary, Some(object));
        child.put("fixed", Value::Number(3.0));
        assert!(!child.has_own_property("fixed"));
    }

    fn array(elements: Vec<Value>) -> ObjectRef {
        ObjectRef::new(ObjectKind::Array(ArrayStorage::from(elements)), None)
    }

    #[test]
    fn test_array_length_tracking() {
        let array = array(vec![Value::Number(1.0)]);
        array.put("3", Value::from("x"));
        assert_eq!(array.get("length"), Value::Number(4.0));
        assert!(array.get("1").is_undefined());
        array.put("length", Value::Number(1.0));
        assert_eq!(array.array_elements().map(|e| e.len()), Some(1));
    }

    #[test]
    fn test_far_index_stored_as_keyed_element() {
        let array = array(Vec::new());
        array.put("4000000000", Value::Number(1.0));
        assert_eq!(array.array_length(), Some(4_000_000_001));
        assert_eq!(array.get("4000000000"), Value::Number(1.0));
        assert!(array.get("3999999999").is_undefined());
        assert_eq!(array.own_keys(true).len(), 1);
        // Too long to materialize.
        assert!(array.with_elements(|e| e.len()).is_none());

        array.put("length", Value::Number(10.0));
        assert_eq!(array.array_length(), Some(10));
        assert!(array.get("4000000000").is_undefined());
        assert!(array.own_keys(false).is_empty());
    }

    #[test]
    fn test_growing_vector_absorbs_keyed_elements() {
        let array = array(Vec::new());
        let far = MAX_DENSE_ARRAY_GAP + 10;
        array.put(&far.to_string(), Value::from("far"));
        for i in 0..far {
            array.put(&i.to_string(), Value::Number(i as f64));
        }
        array.put(&(far + 1).to_string(), Value::Null);
        let elements = array.array_elements().unwrap_or_default();
        assert_eq!(elements.len(), far + 2);
        assert_eq!(elements[far], Value::from("far"));
        assert_eq!(array.own_keys(true).len(), far + 2);

        array.put("length", Value::Number(2.0));
        array.put("length", Value::Number(5.0));
        assert_eq!(array.with_elements(|e| e.to_vec()).map(|e| e.len()), Some(5));
        assert!(array.get("4").is_undefined());
    }

    #[test]
    fn test_key_order_and_enumerability() {
        let object = ObjectRef::new(ObjectKind::Ordinary, None);
        object.put("b", Value::Null);
        object.put("a", Value::Null);
        object.define_hidden("secret", Value::Null);
        let keys: Vec<String> = object.own_keys(true).iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(object.own_keys(false).len(), 3);
        assert!(object.delete("a"));
        assert!(!object.has_own_property("a"));
    }
}
