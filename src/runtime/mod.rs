//! The script runtime: values, the object heap, scopes, the evaluator and the
//! builtin library installed on the global object.
//!
//! ## Structure
//!
//! - [`value`]: primitive values and the conversions that need no interpreter
//! - [`object`]: heap objects, properties and prototype chains
//! - [`environment`]: declarative scopes for functions and `catch` clauses
//! - [`interpreter`]: statement and expression evaluation
//! - [`global`]: construction of the global object
//! - [`builtins`]: `Object`, `Array`, `String`, `JSON`, `Math` and friends

pub mod builtins;
pub mod environment;
pub mod global;
pub mod interpreter;
pub mod object;
pub mod value;

pub use interpreter::{Interpreter, JsResult, Throw};
pub use object::{ObjectRef, Property};
pub use value::Value;
