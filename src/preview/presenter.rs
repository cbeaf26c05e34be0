use std::time::Duration;

use crate::config::PreviewConfig;
use crate::preview::errors::{PreviewError, Stage};
use crate::preview::locale::Locale;
use crate::preview::messages::{MessageKey, Messages};
use crate::utils::escape_html;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticePosition {
    TopCenter,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeVariant {
    Error,
}

/// A transient message for the notice surface. Nobody waits for it to go away.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub duration: Duration,
    pub position: NoticePosition,
    pub variant: NoticeVariant,
}

/// How a failed preview is shown to the user
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Presentation {
    pub notice: Notice,
    /// A document replacing the preview, without any active content
    pub fallback_document: String,
}

/// Joins all the lines of `text`, notices are a single line
fn single_line(text: &str) -> String {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).collect::<Vec<_>>().join(" ")
}

pub(crate) fn fallback_document(title: &str, message: &str) -> String {
    format!(
        "<html><body style='font-family: Arial, sans-serif; padding: 20px; color: #d32f2f;'>\
         <h3>{}</h3><p>{}</p></body></html>",
        escape_html(title),
        escape_html(message)
    )
}

/// Turns an error into the notice and fallback document the user will see
pub fn present(
    error: &PreviewError,
    messages: &dyn Messages,
    locale: Locale,
    config: &PreviewConfig,
) -> Presentation {
    let (prefix, title) = match error.stage() {
        Stage::Parse => (MessageKey::InvalidJsonPrefix, MessageKey::JsonParseTitle),
        Stage::Render => (MessageKey::TemplateErrorPrefix, MessageKey::TemplateRenderTitle),
    };

    let notice = Notice {
        message: single_line(&format!("{}{}", messages.get(prefix, locale), error.message())),
        duration: config.notice_duration(),
        position: NoticePosition::TopCenter,
        variant: NoticeVariant::Error,
    };

    Presentation {
        notice,
        fallback_document: fallback_document(&messages.get(title, locale), error.message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::errors::{ContextParseError, TemplateRenderError};
    use crate::preview::messages::DefaultMessages;
    use pretty_assertions::assert_eq;

    #[test]
    fn present_parse_error() {
        let error = PreviewError::from(ContextParseError::new("expected value at line 1 column 2"));
        let presentation =
            present(&error, &DefaultMessages, Locale::English, &PreviewConfig::default());

        assert_eq!(presentation.notice.message, "Invalid JSON: expected value at line 1 column 2");
        assert_eq!(presentation.notice.duration, Duration::from_millis(5000));
        assert_eq!(presentation.notice.position, NoticePosition::TopCenter);
        assert_eq!(presentation.notice.variant, NoticeVariant::Error);
        assert_eq!(
            presentation.fallback_document,
            "<html><body style='font-family: Arial, sans-serif; padding: 20px; color: #d32f2f;'>\
             <h3>JSON Parse Error</h3><p>expected value at line 1 column 2</p></body></html>"
        );
    }

    #[test]
    fn present_render_error_escapes_message() {
        let message = "Failed to render template: <b>'x' & \"y\"</b>";
        let error = PreviewError::from(TemplateRenderError::new(message));
        let presentation =
            present(&error, &DefaultMessages, Locale::English, &PreviewConfig::default());

        assert_eq!(presentation.notice.message, format!("Template error: {}", message));
        assert!(presentation.fallback_document.contains("<h3>Template Rendering Error</h3>"));
        assert!(presentation.fallback_document.contains(
            "<p>Failed to render template: &lt;b&gt;&#x27;x&#x27; &amp; &quot;y&quot;&lt;/b&gt;</p>"
        ));
        assert!(!presentation.fallback_document.contains("<b>"));
    }

    #[test]
    fn notice_is_single_line() {
        let error = PreviewError::from(TemplateRenderError::new("first\n  second\r\n\nthird"));
        let config = PreviewConfig::default().notice_duration_ms(10);
        let presentation = present(&error, &DefaultMessages, Locale::Sinhala, &config);
        assert_eq!(presentation.notice.message, "Template error: first second third");
        assert_eq!(presentation.notice.duration, Duration::from_millis(10));
    }
}
