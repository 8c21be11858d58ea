//! jsrt: a small JavaScript runtime with a Jasmine-style spec runner
//!
//! The crate evaluates an ES5 subset with a tree-walking interpreter and hosts
//! `describe`/`it`/`expect` spec files on top of it.
//!
//! ## Main Components
//!
//! - [`lexer`] and [`parser`]: source text to the [`ast`]
//! - [`runtime`]: values, objects, scopes, the evaluator and the builtin library
//! - [`harness`]: spec collection, matchers and [`SpecReport`]s
//! - [`engine`]: the host entry point tying parsing, evaluation and specs together
//! - [`config`]: centralized limits and the loadable [`Config`]
//! - [`metrics`]: timing summaries for the CLI
//!
//! ## Error Handling
//!
//! Host-level failures are [`JsrtError`]s. Script exceptions stay inside the
//! interpreter until they escape, at which point they are described by a
//! [`ThrownError`]:
//!
//! - `Engine::try_eval()` returns `Result<Outcome, JsrtError>`; an escaped
//!   exception is `Outcome::Threw`, a parse failure is `JsrtError::Syntax`
//! - `Engine::eval()` returns `Result<Value, JsrtError>` with escaped
//!   exceptions as `JsrtError::Uncaught`
//! - `Engine::run_specs()` returns `Result<SpecReport, JsrtError>`
//!
//! ## Quick Start
//!
//! ```rust
//! use jsrt::{Engine, JsrtError};
//!
//! let mut engine = Engine::new();
//! let outcome = engine.try_eval("var foo = {}; foo.bar.foobar();")?;
//! assert!(outcome.raised());
//! assert!(outcome.message_contains("foobar"));
//! # Ok::<(), JsrtError>(())
//! ```
//!
//! ### Running Specs
//! ```rust
//! use jsrt::{Engine, JsrtError};
//!
//! let mut engine = Engine::new();
//! let report = engine.run_specs(r#"
//!     describe("arithmetic", function() {
//!         it("adds", function() { expect(1 + 2).toBe(3); });
//!     });
//! "#)?;
//! assert_eq!(report.passed(), 1);
//! # Ok::<(), JsrtError>(())
//! ```

pub mod ast;
pub mod config;
pub mod engine;
pub mod error;
pub mod harness;
pub mod lexer;
pub mod metrics;
pub mod parser;
pub mod runtime;

// Re-export commonly used types for convenience
pub use config::Config;
pub use engine::{Engine, Outcome};
pub use error::{ErrorKind, JsrtError, Result, ThrownError};
pub use harness::{SpecReport, SpecResult, SpecStatus};
pub use runtime::{ObjectRef, Value};
