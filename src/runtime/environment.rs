//! Lexical scope chain.
//!
//! Each function call and each `catch` clause gets a declarative environment.
//! The root of every chain is the global environment, whose bindings live on
//! the global object instead of in `bindings`.

use super::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub type EnvRef = Rc<Environment>;

#[derive(Default)]
pub struct Environment {
    bindings: RefCell<HashMap<Rc<str>, Value>>,
    outer: Option<EnvRef>,
}

impl Environment {
    /// The root environment. Lookups that fall through it go to the global object.
    pub fn global() -> EnvRef {
        Rc::new(Environment::default())
    }

    pub fn child(outer: &EnvRef) -> EnvRef {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            outer: Some(outer.clone()),
        })
    }

    pub fn is_global(&self) -> bool {
        self.outer.is_none()
    }

    /// Creates or overwrites a binding in this environment.
    pub fn declare(&self, name: &Rc<str>, value: Value) {
        self.bindings.borrow_mut().insert(name.clone(), value);
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
    }

    /// Resolves `name` along the chain, excluding the global object.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        self.outer.as_ref().and_then(|outer| outer.lookup(name))
    }

    /// Updates the nearest binding of `name`. Returns false when no
    /// declarative environment on the chain holds it.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.bindings.borrow_mut().get_mut(name) {
            *slot = value;
            return true;
        }
        match &self.outer {
            Some(outer) => outer.assign(name, value),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadowing_and_assignment() {
        let global = Environment::global();
        let outer = Environment::child(&global);
        let name: Rc<str> = Rc::from("x");
        outer.declare(&name, Value::Number(1.0));

        let inner = Environment::child(&outer);
        assert_eq!(inner.lookup("x"), Some(Value::Number(1.0)));
        assert!(inner.assign("x", Value::Number(2.0)));
        assert_eq!(outer.lookup("x"), Some(Value::Number(2.0)));

        inner.declare(&name, Value::Number(3.0));
        assert_eq!(inner.lookup("x"), Some(Value::Number(3.0)));
        assert_eq!(outer.lookup("x"), Some(Value::Number(2.0)));

        assert!(!inner.assign("y", Value::Null));
        assert!(global.is_global() && !inner.is_global());
    }
}
