use std::convert::Into;
use std::error::Error as StdError;
use std::fmt;

/// The kind of an error (non-exhaustive)
#[non_exhaustive]
#[derive(Debug)]
pub enum ErrorKind {
    /// Generic error
    Msg(String),
    /// The template could not be parsed
    Parse(String),
    /// A macro was called but never defined in the template
    MacroNotFound(String),
    /// A macro was called with more arguments than it declares
    TooManyArguments {
        /// Name of the macro
        name: String,
        /// How many parameters the macro declares
        expected: usize,
        /// How many arguments were given
        got: usize,
    },
    /// Macros called each other too deeply
    CallDepthExceeded(usize),
    /// A method call on a reference failed
    CallMethod(String),
    /// An error happened while serializing JSON
    Json(serde_json::Error),
}

/// The Error type
#[derive(Debug)]
pub struct Error {
    /// Kind of error
    pub kind: ErrorKind,
    source: Option<Box<dyn StdError + Sync + Send>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::Msg(ref message) => write!(f, "{}", message),
            ErrorKind::Parse(ref message) => write!(f, "Syntax error: {}", message),
            ErrorKind::MacroNotFound(ref name) => write!(f, "Macro `#{}` is not defined", name),
            ErrorKind::TooManyArguments { ref name, expected, got } => write!(
                f,
                "Macro `#{}` takes {} argument(s) but {} were given",
                name, expected, got
            ),
            ErrorKind::CallDepthExceeded(limit) => {
                write!(f, "Exceeded the maximum macro call depth of {}", limit)
            }
            ErrorKind::CallMethod(ref name) => write!(f, "Method call `{}` failed", name),
            ErrorKind::Json(ref e) => write!(f, "{}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self.source {
            Some(ref err) => Some(&**err),
            None => match self.kind {
                ErrorKind::Json(ref err) => Some(err),
                _ => None,
            },
        }
    }
}

impl Error {
    /// Creates generic error
    pub fn msg(value: impl ToString) -> Self {
        Self { kind: ErrorKind::Msg(value.to_string()), source: None }
    }

    /// Creates generic error with a source
    pub fn chain(value: impl ToString, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self { kind: ErrorKind::Msg(value.to_string()), source: Some(source.into()) }
    }

    /// Creates a parse error from the (already prettified) parser message
    pub fn parse(message: impl ToString) -> Self {
        Self { kind: ErrorKind::Parse(message.to_string()), source: None }
    }

    /// Creates an error for a call to an undefined macro
    pub fn macro_not_found(name: impl ToString) -> Self {
        Self { kind: ErrorKind::MacroNotFound(name.to_string()), source: None }
    }

    /// Creates an error for a macro call with too many arguments
    pub fn too_many_arguments(name: impl ToString, expected: usize, got: usize) -> Self {
        Self {
            kind: ErrorKind::TooManyArguments { name: name.to_string(), expected, got },
            source: None,
        }
    }

    /// Creates an error for runaway macro recursion
    pub fn call_depth_exceeded(limit: usize) -> Self {
        Self { kind: ErrorKind::CallDepthExceeded(limit), source: None }
    }

    /// Creates an error wrapping a failing method call
    pub fn call_method(
        name: impl ToString,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self { kind: ErrorKind::CallMethod(name.to_string()), source: Some(source.into()) }
    }

    /// Creates JSON error
    pub fn json(value: serde_json::Error) -> Self {
        Self { kind: ErrorKind::Json(value), source: None }
    }

    /// The full message of this error followed by all of its causes, separated by `: `
    pub fn full_message(&self) -> String {
        let mut message = self.to_string();
        let mut source = StdError::source(self);
        while let Some(err) = source {
            message.push_str(": ");
            message.push_str(&err.to_string());
            source = err.source();
        }
        message
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Self::msg(e)
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Self::msg(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::json(e)
    }
}

/// Convenient wrapper around std::Result.
pub type Result<T> = ::std::result::Result<T, Error>;
