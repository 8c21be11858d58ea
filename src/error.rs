//! Error types for the jsrt runtime

use std::fmt;

/// The JavaScript error constructors known to the runtime.
///
/// Each kind has a matching global constructor (`TypeError`, `RangeError`, ...)
/// whose prototype carries the `name` reported by `Error.prototype.toString`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Error,
    TypeError,
    ReferenceError,
    RangeError,
    SyntaxError,
    URIError,
    EvalError,
}

impl ErrorKind {
    /// Every kind, in the order the constructors are registered on the global object.
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::Error,
        ErrorKind::ReferenceError,
        ErrorKind::RangeError,
        ErrorKind::SyntaxError,
        ErrorKind::TypeError,
        ErrorKind::URIError,
        ErrorKind::EvalError,
    ];

    /// The constructor name, which is also the prototype's `name` property.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::URIError => "URIError",
            ErrorKind::EvalError => "EvalError",
        }
    }

    /// Reverse of [`ErrorKind::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A script-level exception that escaped to the host.
///
/// `text` is the script's own string conversion of the thrown value (for error
/// objects that is `Error.prototype.toString`, e.g. `TypeError: x is not a function`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrownError {
    /// Constructor kind when the thrown value is an error object
    pub kind: Option<ErrorKind>,
    /// The `message` property, or the whole text for non-error values
    pub message: String,
    /// String conversion of the thrown value
    pub text: String,
}

impl ThrownError {
    /// True if the error text contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }
}

impl fmt::Display for ThrownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Error types for the jsrt library
#[derive(Debug, thiserror::Error)]
pub enum JsrtError {
    /// Source text could not be tokenized or parsed
    #[error("SyntaxError: {message} (line {line}, column {column})")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// A thrown value was not caught by the script
    #[error("Uncaught {0}")]
    Uncaught(ThrownError),

    /// Invalid input parameters (generic fallback)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    Config(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO operation failed
    #[error("IO error: {0}")]
    IO(String),
}

impl JsrtError {
    /// Builds a syntax error at the given position.
    pub fn syntax(line: usize, column: usize, message: impl Into<String>) -> Self {
        JsrtError::Syntax {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Convenience Result type for jsrt operations
pub type Result<T> = std::result::Result<T, JsrtError>;
