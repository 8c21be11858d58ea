//! Centralized configuration for the jsrt runtime.
//!
//! This module contains constants and default parameters used throughout the
//! interpreter, the builtins and the spec runner, plus the [`Config`] struct
//! the CLI can load from a JSON file.

use crate::{JsrtError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// --- Interpreter Limits ---

/// Maximum nesting of script function calls before a `RangeError` is thrown.
pub const MAX_CALL_DEPTH: usize = 512;

/// Maximum nesting of statements and expressions accepted by the parser, and
/// of objects serialized by `JSON.stringify`. Evaluation recurses along the
/// syntax tree, so the parse limit also bounds its depth.
pub const MAX_NESTING_DEPTH: usize = 512;

/// Arrays keep a contiguous backing vector up to this many elements. Indices
/// beyond it are stored as keyed properties, and array methods that copy
/// elements refuse longer arrays with a `RangeError`.
pub const MAX_DENSE_ARRAY_LENGTH: usize = 1 << 24;

/// Largest run of holes a single index write may open in the backing vector
/// before the element is stored as a keyed property instead.
pub const MAX_DENSE_ARRAY_GAP: usize = 1024;

/// Maximum size of a script file accepted by the engine (16 MB)
pub const MAX_SOURCE_SIZE_BYTES: usize = 16 * 1024 * 1024;

/// Maximum size of a config file (64 KB)
pub const MAX_CONFIG_SIZE_BYTES: usize = 64 * 1024;

// --- Builtin Parameters ---

/// Upper bound of the `digits` argument to `Number.prototype.toFixed`.
pub const TO_FIXED_MAX_DIGITS: i32 = 20;

/// Magnitude at and above which `toFixed` falls back to plain number formatting.
pub const TO_FIXED_MAX_MAGNITUDE: f64 = 1e21;

/// Largest integer a double represents exactly (2^53).
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

// --- Benchmark Parameters ---

/// Loop iterations used by the evaluation benchmark script.
pub const BENCHMARK_LOOP_ITERATIONS: usize = 10_000;

/// Number of repetitions averaged by each benchmark.
pub const BENCHMARK_REPETITIONS: usize = 20;

/// Runtime configuration.
///
/// Every field has a default, so a config file only needs to name the
/// fields it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Maximum script call depth
    pub max_call_depth: usize,
    /// Report specs that record no expectations as failures
    pub fail_on_empty_specs: bool,
    /// Install the global `print` function
    pub enable_print: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_call_depth: MAX_CALL_DEPTH,
            fail_on_empty_specs: true,
            enable_print: true,
        }
    }
}

impl Config {
    /// Loads a config from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path).map_err(|e| {
            JsrtError::IO(format!(
                "Failed to read config from {}: {}",
                path.display(),
                e
            ))
        })?;

        if raw.len() > MAX_CONFIG_SIZE_BYTES {
            return Err(JsrtError::InvalidInput(format!(
                "Config file size {} bytes exceeds maximum {} bytes",
                raw.len(),
                MAX_CONFIG_SIZE_BYTES
            )));
        }

        let config: Config = serde_json::from_slice(&raw)
            .map_err(|e| JsrtError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configs the interpreter cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_call_depth == 0 {
            return Err(JsrtError::Config(
                "max_call_depth must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = serde_json::from_str(r#"{ "fail_on_empty_specs": false }"#).unwrap();
        assert!(!config.fail_on_empty_specs);
        assert_eq!(config.max_call_depth, MAX_CALL_DEPTH);
        assert!(config.enable_print);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: std::result::Result<Config, _> =
            serde_json::from_str(r#"{ "max_depth": 3 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_call_depth_invalid() {
        let config = Config {
            max_call_depth: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
