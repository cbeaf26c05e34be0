use log::debug;

use crate::config::EngineConfig;
use crate::context::Context;
use crate::errors::{Error, Result};
use crate::renderer::Processor;
use crate::template::Template;

/// The outcome of an evaluation that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// The whole template was rendered
    Complete(String),
    /// The evaluation was halted before the end, holds what was rendered until then
    Incomplete(String),
}

impl Evaluation {
    /// Whether the whole template was rendered
    pub fn is_complete(&self) -> bool {
        matches!(*self, Evaluation::Complete(_))
    }

    /// The rendered text, complete or not
    pub fn into_output(self) -> String {
        match self {
            Evaluation::Complete(s) | Evaluation::Incomplete(s) => s,
        }
    }
}

/// Something that can substitute the values of a context into a template source.
///
/// The preview only depends on this trait so another engine can be plugged in.
pub trait SubstitutionEngine: Send + Sync {
    /// Evaluates `source` against `context`. `log_tag` names the evaluation in logs.
    ///
    /// Each call is independent from the previous ones: nothing assigned while
    /// rendering survives the call and the context is never modified.
    fn evaluate(&self, context: &Context, log_tag: &str, source: &str) -> Result<Evaluation>;
}

/// The VTL engine.
///
/// It is stateless apart from its limits: every evaluation parses the source again
/// and renders it with a fresh call stack.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Create an engine with the default limits
    pub fn new() -> Engine {
        Engine::default()
    }

    /// Create an engine with the given limits
    pub fn with_config(config: EngineConfig) -> Engine {
        Engine { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Renders an already parsed template
    pub fn render_template(&self, template: &Template, context: &Context) -> Result<Evaluation> {
        Processor::new(template, context, &self.config).render()
    }

    /// Renders a template source and returns the output, an incomplete evaluation
    /// being an error.
    ///
    /// ```rust
    /// # use vellum::{Context, Engine};
    /// let mut context = Context::new();
    /// context.insert("name", "world");
    /// let output = Engine::new().render_str("Hello $name!", &context).unwrap();
    /// assert_eq!(output, "Hello world!");
    /// ```
    pub fn render_str(&self, input: &str, context: &Context) -> Result<String> {
        match self.evaluate(context, "one_off", input)? {
            Evaluation::Complete(output) => Ok(output),
            Evaluation::Incomplete(_) => Err(Error::msg(format!(
                "Rendering stopped after reaching the maximum output length of {} bytes",
                self.config.max_output_len.unwrap_or_default()
            ))),
        }
    }

    /// Renders a one off template (for example a template coming from a user
    /// input) with the default limits.
    pub fn one_off(input: &str, context: &Context) -> Result<String> {
        Engine::new().render_str(input, context)
    }
}

impl SubstitutionEngine for Engine {
    fn evaluate(&self, context: &Context, log_tag: &str, source: &str) -> Result<Evaluation> {
        debug!(
            "evaluating `{}` ({} bytes, {} names in context)",
            log_tag,
            source.len(),
            context.len()
        );
        let template = Template::new(log_tag, source)?;
        self.render_template(&template, context)
    }
}
