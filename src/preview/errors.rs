use std::error::Error as StdError;
use std::fmt;

/// The context text could not be turned into a context
#[derive(Debug)]
pub struct ContextParseError {
    message: String,
    source: Option<serde_json::Error>,
}

impl ContextParseError {
    pub fn new(message: impl ToString) -> Self {
        ContextParseError { message: message.to_string(), source: None }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<serde_json::Error> for ContextParseError {
    fn from(e: serde_json::Error) -> Self {
        ContextParseError { message: e.to_string(), source: Some(e) }
    }
}

impl fmt::Display for ContextParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for ContextParseError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn StdError + 'static))
    }
}

/// The template could not be rendered
#[derive(Debug)]
pub struct TemplateRenderError {
    message: String,
    source: Option<crate::Error>,
}

impl TemplateRenderError {
    pub fn new(message: impl ToString) -> Self {
        TemplateRenderError { message: message.to_string(), source: None }
    }

    /// Keeps the engine error around as the `source()` of this one
    pub fn with_source(message: impl ToString, source: crate::Error) -> Self {
        TemplateRenderError { message: message.to_string(), source: Some(source) }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TemplateRenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for TemplateRenderError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn StdError + 'static))
    }
}

/// Which step of the preview failed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Building the context from the JSON text
    Parse,
    /// Rendering the template
    Render,
}

/// Any error the preview can display
#[derive(Debug)]
pub enum PreviewError {
    Context(ContextParseError),
    Template(TemplateRenderError),
}

impl PreviewError {
    pub fn stage(&self) -> Stage {
        match *self {
            PreviewError::Context(_) => Stage::Parse,
            PreviewError::Template(_) => Stage::Render,
        }
    }

    pub fn message(&self) -> &str {
        match *self {
            PreviewError::Context(ref e) => e.message(),
            PreviewError::Template(ref e) => e.message(),
        }
    }
}

impl From<ContextParseError> for PreviewError {
    fn from(e: ContextParseError) -> Self {
        PreviewError::Context(e)
    }
}

impl From<TemplateRenderError> for PreviewError {
    fn from(e: TemplateRenderError) -> Self {
        PreviewError::Template(e)
    }
}

impl fmt::Display for PreviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl StdError for PreviewError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            PreviewError::Context(ref e) => Some(e),
            PreviewError::Template(ref e) => Some(e),
        }
    }
}
