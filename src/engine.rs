//! Engine: the host-facing entry point for evaluating scripts and running specs.
//!
//! An [`Engine`] owns one interpreter and therefore one global object; state
//! created by earlier evaluations stays visible to later ones.

use crate::config::{Config, MAX_SOURCE_SIZE_BYTES};
use crate::error::ThrownError;
use crate::harness::{self, SpecReport};
use crate::parser;
use crate::runtime::{Interpreter, ObjectRef, Value};
use crate::{JsrtError, Result};
use std::path::Path;
use tracing::{debug, info_span};

/// Result of running a script to completion.
///
/// Whether the script raised and what the raised error says are separate
/// questions; use [`Outcome::raised`] and [`Outcome::message_contains`]
/// independently.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The script finished; carries the value of the last expression statement.
    Completed(Value),
    /// An exception escaped the script.
    Threw(ThrownError),
}

impl Outcome {
    /// True when an exception escaped the script.
    pub fn raised(&self) -> bool {
        matches!(self, Outcome::Threw(_))
    }

    /// True when the script raised and the error's string form contains `needle`.
    /// A script that completed normally never matches.
    pub fn message_contains(&self, needle: &str) -> bool {
        match self {
            Outcome::Threw(error) => error.mentions(needle),
            Outcome::Completed(_) => false,
        }
    }

    pub fn error(&self) -> Option<&ThrownError> {
        match self {
            Outcome::Threw(error) => Some(error),
            Outcome::Completed(_) => None,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Threw(_) => None,
        }
    }

    /// Converts an escaped exception into [`JsrtError::Uncaught`].
    pub fn into_result(self) -> Result<Value> {
        match self {
            Outcome::Completed(value) => Ok(value),
            Outcome::Threw(error) => Err(JsrtError::Uncaught(error)),
        }
    }
}

pub struct Engine {
    interpreter: Interpreter,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an engine with the default [`Config`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            interpreter: Interpreter::new(config),
        }
    }

    pub fn config(&self) -> &Config {
        self.interpreter.config()
    }

    /// Evaluate `source` and capture whether it completed or threw.
    ///
    /// # Returns
    ///
    /// - `Ok(Outcome::Completed(value))` with the value of the last expression statement
    /// - `Ok(Outcome::Threw(error))` when a script exception escaped
    /// - `Err(JsrtError::Syntax { .. })` when the source does not parse
    pub fn try_eval(&mut self, source: &str) -> Result<Outcome> {
        let _span = info_span!("eval", bytes = source.len()).entered();
        let program = parser::parse(source)?;
        match self.interpreter.eval_program(&program) {
            Ok(value) => Ok(Outcome::Completed(value)),
            Err(throw) => {
                let error = self.interpreter.thrown_error(&throw);
                debug!(error = %error, "uncaught exception");
                Ok(Outcome::Threw(error))
            }
        }
    }

    /// Evaluate `source`, treating an uncaught exception as an error.
    pub fn eval(&mut self, source: &str) -> Result<Value> {
        self.try_eval(source)?.into_result()
    }

    /// Read and evaluate a script file.
    pub fn run_file(&mut self, path: &Path) -> Result<Outcome> {
        let source = read_source(path)?;
        self.try_eval(&source)
    }

    /// Evaluate a spec file's source, then run every spec it declared.
    ///
    /// An exception escaping the top level of the file (outside any `it`
    /// body) is returned as [`JsrtError::Uncaught`]; no specs are run, and
    /// the suites and specs declared before it are discarded.
    pub fn run_specs(&mut self, source: &str) -> Result<SpecReport> {
        if let Err(e) = self.eval(source) {
            let discarded = self.interpreter.harness.pending_specs();
            self.interpreter.harness.reset_collection();
            debug!(discarded, "spec collection abandoned");
            return Err(e);
        }
        let _span = info_span!("specs", declared = self.interpreter.harness.pending_specs()).entered();
        let report = harness::run_collected(&mut self.interpreter);
        debug!(
            total = report.total(),
            passed = report.passed(),
            failed = report.failed(),
            "spec run finished"
        );
        Ok(report)
    }

    pub fn run_spec_file(&mut self, path: &Path) -> Result<SpecReport> {
        let source = read_source(path)?;
        self.run_specs(&source)
    }

    pub fn global(&self) -> &ObjectRef {
        self.interpreter.global_object()
    }

    /// Reads a global binding; `undefined` when it does not exist.
    pub fn get_global(&self, name: &str) -> Value {
        self.global().get(name)
    }

    /// The script's string conversion of `value`.
    pub fn display(&mut self, value: &Value) -> String {
        self.interpreter.display(value)
    }

    /// Drains the lines written by `print`.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.interpreter.output)
    }
}

/// Reads a script file, rejecting files over [`MAX_SOURCE_SIZE_BYTES`].
fn read_source(path: &Path) -> Result<String> {
    let io_error = |e: std::io::Error| {
        JsrtError::IO(format!("Failed to read script {}: {}", path.display(), e))
    };
    let size = std::fs::metadata(path).map_err(io_error)?.len();
    if size > MAX_SOURCE_SIZE_BYTES as u64 {
        return Err(JsrtError::InvalidInput(format!(
            "{} is {} bytes; scripts are limited to {} bytes",
            path.display(),
            size,
            MAX_SOURCE_SIZE_BYTES
        )));
    }
    std::fs::read_to_string(path).map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_predicates_are_independent() {
        let mut engine = Engine::new();
        let completed = engine.try_eval("1 + 1").unwrap();
        assert!(!completed.raised());
        assert!(!completed.message_contains("2"));
        assert_eq!(completed.value(), Some(&Value::Number(2.0)));

        let threw = engine.try_eval("null.x").unwrap();
        assert!(threw.raised());
        assert!(threw.message_contains("Cannot read property"));
        assert!(!threw.message_contains("foobar"));
    }

    #[test]
    fn test_syntax_errors_are_host_errors() {
        let mut engine = Engine::new();
        let err = engine.try_eval("var = 3;").unwrap_err();
        assert!(matches!(err, JsrtError::Syntax { .. }));
    }

    #[test]
    fn test_state_persists_between_evaluations() {
        let mut engine = Engine::new();
        engine.eval("var counter = 41;").unwrap();
        let value = engine.eval("counter + 1").unwrap();
        assert_eq!(value, Value::Number(42.0));
        assert_eq!(engine.get_global("counter"), Value::Number(41.0));
    }
}
