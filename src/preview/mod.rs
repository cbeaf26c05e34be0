//! The live preview: turns the two texts typed by the user into what the display
//! and notice surfaces show, every time one of them changes.

mod context_builder;
mod errors;
mod evaluator;
mod locale;
mod messages;
mod orchestrator;
mod persistence;
mod presenter;
mod sandbox;
mod saved_indicator;

pub use self::context_builder::parse_context;
pub use self::errors::{ContextParseError, PreviewError, Stage, TemplateRenderError};
pub use self::evaluator::{TemplateEvaluator, LOG_TAG};
pub use self::locale::Locale;
pub use self::messages::{DefaultMessages, MessageKey, Messages};
pub use self::orchestrator::{
    evaluate_preview, DisplayUpdate, PreviewSession, PreviewState, RenderResult, Update,
};
pub use self::persistence::{
    KeyValueStore, MemoryStore, PersistedSnapshot, ALLOW_SCRIPTS_KEY, CONTEXT_KEY, LOCALE_KEY,
    TEMPLATE_KEY,
};
pub use self::presenter::{present, Notice, NoticePosition, NoticeVariant, Presentation};
pub use self::sandbox::SandboxPolicy;
pub use self::saved_indicator::SavedIndicator;
