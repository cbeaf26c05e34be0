use serde_json::Value;

use crate::context::{describe_value, Context};
use crate::preview::errors::ContextParseError;

/// Turns the JSON text typed by the user into a context.
///
/// An empty or blank text is an empty context. Anything else has to be a JSON
/// object: the names it binds are the names usable in the template.
///
/// ```rust
/// # use vellum::preview::parse_context;
/// let context = parse_context(r#"{"name": "World"}"#).unwrap();
/// assert_eq!(context.get("name").unwrap(), "World");
/// assert!(parse_context("   ").unwrap().is_empty());
/// assert!(parse_context("[1, 2]").is_err());
/// ```
pub fn parse_context(context_text: &str) -> Result<Context, ContextParseError> {
    if context_text.trim().is_empty() {
        return Ok(Context::new());
    }

    let value: Value = serde_json::from_str(context_text)?;
    if !value.is_object() {
        return Err(ContextParseError::new(format!(
            "expected a JSON object at the top level but found {}",
            describe_value(&value)
        )));
    }

    Context::from_value(value).map_err(|e| ContextParseError::new(e.to_string()))
}
