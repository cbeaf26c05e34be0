use std::sync::Arc;

use log::debug;

use crate::context::Context;
use crate::engine::{Evaluation, SubstitutionEngine};
use crate::preview::errors::TemplateRenderError;

/// Name given to every preview evaluation in the engine logs
pub const LOG_TAG: &str = "TemplateRenderer";

/// Renders string templates with a shared engine.
///
/// Each render gets its own bindings: assignments made by one template are never
/// seen by the next one.
#[derive(Debug)]
pub struct TemplateEvaluator<E> {
    engine: Arc<E>,
}

// Not derived: that would require `E: Clone`
impl<E> Clone for TemplateEvaluator<E> {
    fn clone(&self) -> Self {
        TemplateEvaluator { engine: Arc::clone(&self.engine) }
    }
}

impl<E: SubstitutionEngine> TemplateEvaluator<E> {
    pub fn new(engine: Arc<E>) -> Self {
        TemplateEvaluator { engine }
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// Renders `template` against `context`. The output is not escaped.
    pub fn render(
        &self,
        template: Option<&str>,
        context: Option<&Context>,
    ) -> Result<String, TemplateRenderError> {
        let template = template.ok_or_else(|| TemplateRenderError::new("template is required"))?;
        let context = context.ok_or_else(|| TemplateRenderError::new("context is required"))?;

        match self.engine.evaluate(context, LOG_TAG, template) {
            Ok(Evaluation::Complete(output)) => Ok(output),
            Ok(Evaluation::Incomplete(_)) => {
                debug!("evaluation of `{}` did not complete", LOG_TAG);
                Err(TemplateRenderError::new("Template evaluation failed"))
            }
            Err(e) => Err(TemplateRenderError::with_source(
                format!("Failed to render template: {}", e.full_message()),
                e,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::Engine;
    use crate::errors::Result;

    fn evaluator() -> TemplateEvaluator<Engine> {
        TemplateEvaluator::new(Arc::new(Engine::new()))
    }

    #[test]
    fn can_render_with_context() {
        let mut context = Context::new();
        context.insert("name", "World");
        assert_eq!(
            evaluator().render(Some("<p>Hello $name</p>"), Some(&context)).unwrap(),
            "<p>Hello World</p>"
        );
    }

    #[test]
    fn empty_template_is_legal() {
        assert_eq!(evaluator().render(Some(""), Some(&Context::new())).unwrap(), "");
    }

    #[test]
    fn missing_inputs_are_errors() {
        let err = evaluator().render(None, Some(&Context::new())).unwrap_err();
        assert_eq!(err.message(), "template is required");
        let err = evaluator().render(Some("x"), None).unwrap_err();
        assert_eq!(err.message(), "context is required");
    }

    #[test]
    fn output_is_not_escaped() {
        let mut context = Context::new();
        context.insert("html", "<b>&</b>");
        assert_eq!(evaluator().render(Some("$html"), Some(&context)).unwrap(), "<b>&</b>");
    }

    #[test]
    fn engine_errors_are_wrapped() {
        let err = evaluator().render(Some("#if($x"), Some(&Context::new())).unwrap_err();
        assert!(err.message().starts_with("Failed to render template: Syntax error: line 1"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn incomplete_evaluation_is_an_error() {
        let engine = Engine::with_config(EngineConfig::default().max_output_len(2));
        let evaluator = TemplateEvaluator::new(Arc::new(engine));
        let err = evaluator.render(Some("abcdef"), Some(&Context::new())).unwrap_err();
        assert_eq!(err.message(), "Template evaluation failed");
    }

    #[test]
    fn assignments_do_not_leak_between_renders() {
        let evaluator = evaluator();
        let context = Context::new();
        assert_eq!(evaluator.render(Some("#set($x = 1)$x"), Some(&context)).unwrap(), "1");
        assert_eq!(evaluator.clone().render(Some("$x"), Some(&context)).unwrap(), "$x");
        assert!(context.is_empty());
    }

    struct Recording;

    impl SubstitutionEngine for Recording {
        fn evaluate(&self, _context: &Context, log_tag: &str, source: &str) -> Result<Evaluation> {
            Ok(Evaluation::Complete(format!("{}:{}", log_tag, source)))
        }
    }

    #[test]
    fn any_engine_can_be_plugged_in() {
        let evaluator = TemplateEvaluator::new(Arc::new(Recording));
        let rendered = evaluator.render(Some("x"), Some(&Context::new())).unwrap();
        assert_eq!(rendered, "TemplateRenderer:x");
    }
}
