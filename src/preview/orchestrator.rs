use std::borrow::Cow;
use std::sync::Arc;

use log::debug;

use crate::config::PreviewConfig;
use crate::engine::SubstitutionEngine;
use crate::preview::context_builder::parse_context;
use crate::preview::errors::{PreviewError, Stage};
use crate::preview::evaluator::TemplateEvaluator;
use crate::preview::locale::Locale;
use crate::preview::messages::{DefaultMessages, MessageKey, Messages};
use crate::preview::persistence::{self, KeyValueStore, PersistedSnapshot};
use crate::preview::presenter::{present, Notice};
use crate::preview::sandbox::SandboxPolicy;
use crate::preview::saved_indicator::SavedIndicator;

/// What a render cycle produced
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderResult {
    Rendered(String),
    Failed { stage: Stage, message: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum PreviewState {
    /// No template to render, the placeholder is shown
    #[default]
    Idle,
    Displaying(RenderResult),
}

/// What the display surface has to show
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayUpdate {
    /// Value of the `sandbox` attribute
    pub sandbox: &'static str,
    /// The document to show
    pub srcdoc: String,
}

/// Everything a change produced, for the host to apply
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Update {
    pub display: DisplayUpdate,
    pub notice: Option<Notice>,
    pub state: PreviewState,
}

/// `None` when there is nothing to render
fn run_cycle<E: SubstitutionEngine>(
    evaluator: &TemplateEvaluator<E>,
    template_text: &str,
    context_text: &str,
) -> Option<Result<String, PreviewError>> {
    if template_text.trim().is_empty() {
        return None;
    }

    let result = parse_context(context_text)
        .map_err(PreviewError::from)
        .and_then(|context| {
            evaluator.render(Some(template_text), Some(&context)).map_err(PreviewError::from)
        });
    Some(result)
}

fn to_state(result: &Option<Result<String, PreviewError>>) -> PreviewState {
    match *result {
        None => PreviewState::Idle,
        Some(Ok(ref html)) => PreviewState::Displaying(RenderResult::Rendered(html.clone())),
        Some(Err(ref e)) => PreviewState::Displaying(RenderResult::Failed {
            stage: e.stage(),
            message: e.message().to_string(),
        }),
    }
}

/// Runs one render cycle over the given inputs.
///
/// A blank template gives `Idle` without looking at the context. Otherwise the
/// context is parsed then the template rendered, and the first failure wins.
pub fn evaluate_preview<E: SubstitutionEngine>(
    engine: &Arc<E>,
    template_text: &str,
    context_text: &str,
) -> PreviewState {
    let evaluator = TemplateEvaluator::new(Arc::clone(engine));
    to_state(&run_cycle(&evaluator, template_text, context_text))
}

/// The live preview of one user.
///
/// Every change of an input or of the sandbox policy re-renders the preview right
/// away and returns the `Update` to apply. Failures never end the session.
pub struct PreviewSession<E> {
    evaluator: TemplateEvaluator<E>,
    messages: Arc<dyn Messages>,
    config: PreviewConfig,
    template_text: String,
    context_text: String,
    policy: SandboxPolicy,
    locale: Locale,
    state: PreviewState,
    saved_indicator: SavedIndicator,
}

impl<E: SubstitutionEngine> PreviewSession<E> {
    /// A session with empty inputs, showing the placeholder
    pub fn new(engine: Arc<E>, config: PreviewConfig) -> Self {
        PreviewSession {
            evaluator: TemplateEvaluator::new(engine),
            messages: Arc::new(DefaultMessages),
            saved_indicator: SavedIndicator::new(config.saved_indicator_delay()),
            config,
            template_text: String::new(),
            context_text: String::new(),
            policy: SandboxPolicy::default(),
            locale: Locale::default(),
            state: PreviewState::Idle,
        }
    }

    /// Use another message catalogue
    pub fn with_messages(mut self, messages: Arc<dyn Messages>) -> Self {
        self.messages = messages;
        self
    }

    /// Starts a session from what was persisted and renders it once
    pub fn restore(
        engine: Arc<E>,
        store: &dyn KeyValueStore,
        config: PreviewConfig,
    ) -> (Self, Update) {
        let snapshot = PersistedSnapshot::load(store);
        debug!(
            "restoring preview session ({} template bytes, {} context bytes, locale {})",
            snapshot.template_text.len(),
            snapshot.context_text.len(),
            snapshot.locale
        );

        let mut session = PreviewSession::new(engine, config);
        session.template_text = snapshot.template_text;
        session.context_text = snapshot.context_text;
        session.policy = snapshot.sandbox_policy;
        session.locale = snapshot.locale;
        let update = session.refresh();
        (session, update)
    }

    pub fn template_text(&self) -> &str {
        &self.template_text
    }

    pub fn context_text(&self) -> &str {
        &self.context_text
    }

    pub fn policy(&self) -> SandboxPolicy {
        self.policy
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    pub fn saved_indicator(&self) -> &SavedIndicator {
        &self.saved_indicator
    }

    /// Label of the save button, "Saved!" for a while after a save
    pub fn save_label(&self) -> Cow<'_, str> {
        self.saved_indicator.label(&*self.messages, self.locale)
    }

    pub fn set_template_text(&mut self, text: impl Into<String>) -> Update {
        self.template_text = text.into();
        self.refresh()
    }

    pub fn set_context_text(&mut self, text: impl Into<String>) -> Update {
        self.context_text = text.into();
        self.refresh()
    }

    /// Changes the sandbox policy, persists it and renders again
    pub fn set_policy(&mut self, policy: SandboxPolicy, store: &mut dyn KeyValueStore) -> Update {
        self.policy = policy;
        persistence::save_policy(store, policy);
        self.refresh()
    }

    pub fn toggle_policy(&mut self, store: &mut dyn KeyValueStore) -> Update {
        self.set_policy(self.policy.toggled(), store)
    }

    /// Renders the current inputs again
    pub fn refresh(&mut self) -> Update {
        let result = run_cycle(&self.evaluator, &self.template_text, &self.context_text);
        self.state = to_state(&result);

        let (srcdoc, notice) = match result {
            None => {
                let placeholder = self.messages.get(MessageKey::PreviewPlaceholder, self.locale);
                (placeholder.into_owned(), None)
            }
            Some(Ok(html)) => (html, None),
            Some(Err(e)) => {
                debug!("preview failed at {:?}: {}", e.stage(), e.message());
                let presentation = present(&e, &*self.messages, self.locale, &self.config);
                (presentation.fallback_document, Some(presentation.notice))
            }
        };

        Update {
            display: DisplayUpdate { sandbox: self.policy.sandbox_attribute(), srcdoc },
            notice,
            state: self.state.clone(),
        }
    }

    /// Persists the inputs and the policy, then shows the saved acknowledgement
    pub fn save(&mut self, store: &mut dyn KeyValueStore) {
        store.set(persistence::TEMPLATE_KEY, &self.template_text);
        store.set(persistence::CONTEXT_KEY, &self.context_text);
        persistence::save_policy(store, self.policy);
        self.saved_indicator.trigger();
    }

    /// Empties the inputs, restricts the sandbox and forgets them all but the locale
    pub fn clear(&mut self, store: &mut dyn KeyValueStore) -> Update {
        self.template_text.clear();
        self.context_text.clear();
        self.policy = SandboxPolicy::Restricted;
        store.remove(persistence::TEMPLATE_KEY);
        store.remove(persistence::CONTEXT_KEY);
        store.remove(persistence::ALLOW_SCRIPTS_KEY);
        self.refresh()
    }

    /// Switches the language of the messages and shows them again
    pub fn set_locale(&mut self, locale: Locale, store: &mut dyn KeyValueStore) -> Update {
        self.locale = locale;
        persistence::save_locale(store, locale);

        if self.template_text.is_empty() && self.context_text.is_empty() {
            self.state = PreviewState::Idle;
            return Update {
                display: DisplayUpdate {
                    sandbox: self.policy.sandbox_attribute(),
                    srcdoc: self.messages.get(MessageKey::PreviewPlaceholder, locale).into_owned(),
                },
                notice: None,
                state: PreviewState::Idle,
            };
        }
        self.refresh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::preview::persistence::{
        MemoryStore, ALLOW_SCRIPTS_KEY, CONTEXT_KEY, LOCALE_KEY, TEMPLATE_KEY,
    };
    use pretty_assertions::assert_eq;

    fn session() -> PreviewSession<Engine> {
        PreviewSession::new(Arc::new(Engine::new()), PreviewConfig::default())
    }

    fn placeholder() -> String {
        DefaultMessages.get(MessageKey::PreviewPlaceholder, Locale::English).into_owned()
    }

    #[test]
    fn blank_template_is_idle() {
        let mut session = session();
        let update = session.set_context_text("{not json");
        assert_eq!(update.state, PreviewState::Idle);
        assert_eq!(update.display.srcdoc, placeholder());
        assert!(update.notice.is_none());

        let update = session.set_template_text("  \n ");
        assert_eq!(update.state, PreviewState::Idle);
    }

    #[test]
    fn renders_on_every_change() {
        let mut session = session();
        session.set_template_text("<p>Hello $name</p>");
        let update = session.set_context_text(r#"{"name": "World"}"#);
        assert_eq!(update.display.srcdoc, "<p>Hello World</p>");
        assert_eq!(update.display.sandbox, "allow-same-origin");
        assert_eq!(
            *session.state(),
            PreviewState::Displaying(RenderResult::Rendered("<p>Hello World</p>".to_string()))
        );
    }

    #[test]
    fn parse_failure_shows_notice_and_fallback() {
        let mut session = session();
        session.set_template_text("<p>$name</p>");
        let update = session.set_context_text("{invalid json");

        match update.state {
            PreviewState::Displaying(RenderResult::Failed { stage, .. }) => {
                assert_eq!(stage, Stage::Parse)
            }
            ref other => panic!("unexpected state {:?}", other),
        }
        let notice = update.notice.unwrap();
        assert!(notice.message.starts_with("Invalid JSON: "));
        assert!(update.display.srcdoc.contains("<h3>JSON Parse Error</h3>"));
    }

    #[test]
    fn render_failure_keeps_the_session_alive() {
        let mut session = session();
        let update = session.set_template_text("#nope()");
        match update.state {
            PreviewState::Displaying(RenderResult::Failed { stage, ref message }) => {
                assert_eq!(stage, Stage::Render);
                assert_eq!(message, "Failed to render template: Macro `#nope` is not defined");
            }
            ref other => panic!("unexpected state {:?}", other),
        }
        assert!(update.notice.unwrap().message.starts_with("Template error: "));

        let update = session.set_template_text("fixed");
        assert_eq!(update.display.srcdoc, "fixed");
        assert!(update.notice.is_none());
    }

    #[test]
    fn toggling_rerenders_and_persists() {
        let mut session = session();
        let mut store = MemoryStore::new();
        session.set_template_text("<script>1</script>");

        let update = session.toggle_policy(&mut store);
        assert_eq!(update.display.sandbox, "allow-same-origin allow-scripts");
        assert_eq!(update.display.srcdoc, "<script>1</script>");
        assert_eq!(store.get(ALLOW_SCRIPTS_KEY).as_deref(), Some("true"));

        let update = session.toggle_policy(&mut store);
        assert_eq!(update.display.sandbox, "allow-same-origin");
        assert_eq!(store.get(ALLOW_SCRIPTS_KEY).as_deref(), Some("false"));
    }

    #[test]
    fn clear_forgets_everything_but_the_locale() {
        let mut session = session();
        let mut store = MemoryStore::new();
        session.set_template_text("x");
        session.set_context_text("{}");
        session.set_locale(Locale::Sinhala, &mut store);
        session.toggle_policy(&mut store);
        session.save(&mut store);
        assert_eq!(store.len(), 4);

        let update = session.clear(&mut store);
        assert_eq!(update.state, PreviewState::Idle);
        assert_eq!(update.display.sandbox, "allow-same-origin");
        assert_eq!(session.template_text(), "");
        assert_eq!(session.policy(), SandboxPolicy::Restricted);
        assert_eq!(store.get(TEMPLATE_KEY), None);
        assert_eq!(store.get(CONTEXT_KEY), None);
        assert_eq!(store.get(ALLOW_SCRIPTS_KEY), None);
        assert_eq!(store.get(LOCALE_KEY).as_deref(), Some("si"));
    }

    #[test]
    fn locale_change_with_empty_inputs_shows_placeholder() {
        let mut session = session();
        let mut store = MemoryStore::new();
        let update = session.set_locale(Locale::Sinhala, &mut store);
        assert_eq!(update.state, PreviewState::Idle);
        assert_eq!(update.display.srcdoc, placeholder());
        assert_eq!(session.locale(), Locale::Sinhala);
    }

    #[test]
    fn locale_change_rerenders() {
        let mut session = session();
        let mut store = MemoryStore::new();
        session.set_template_text("#if(");
        let update = session.set_locale(Locale::Sinhala, &mut store);
        assert!(update.notice.is_some());
    }

    #[test]
    fn restore_renders_once() {
        let mut store = MemoryStore::new();
        store.set(TEMPLATE_KEY, "<p>$n</p>");
        store.set(CONTEXT_KEY, r#"{"n": 3}"#);
        store.set(ALLOW_SCRIPTS_KEY, "true");
        store.set(LOCALE_KEY, "si");

        let (session, update) =
            PreviewSession::restore(Arc::new(Engine::new()), &store, PreviewConfig::default());
        assert_eq!(update.display.srcdoc, "<p>3</p>");
        assert_eq!(update.display.sandbox, "allow-same-origin allow-scripts");
        assert_eq!(session.locale(), Locale::Sinhala);
    }

    #[test]
    fn save_writes_content_keys() {
        let mut session = session();
        let mut store = MemoryStore::new();
        session.set_template_text("t");
        session.set_context_text("c");
        session.save(&mut store);
        assert_eq!(store.get(TEMPLATE_KEY).as_deref(), Some("t"));
        assert_eq!(store.get(CONTEXT_KEY).as_deref(), Some("c"));
        assert_eq!(store.get(ALLOW_SCRIPTS_KEY).as_deref(), Some("false"));
        assert_eq!(store.get(LOCALE_KEY), None);
    }

    #[test]
    fn evaluate_preview_is_pure() {
        let engine = Arc::new(Engine::new());
        assert_eq!(evaluate_preview(&engine, "", "{bad"), PreviewState::Idle);
        assert_eq!(
            evaluate_preview(&engine, "$a$a", r#"{"a": 1}"#),
            PreviewState::Displaying(RenderResult::Rendered("11".to_string()))
        );
        assert_eq!(
            evaluate_preview(&engine, "x", "[1]"),
            PreviewState::Displaying(RenderResult::Failed {
                stage: Stage::Parse,
                message: "expected a JSON object at the top level but found an array".to_string(),
            })
        );
    }
}
