use std::borrow::Cow;

use crate::preview::locale::Locale;

/// The user-facing texts the preview needs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// Document shown while there is no template
    PreviewPlaceholder,
    InvalidJsonPrefix,
    JsonParseTitle,
    TemplateErrorPrefix,
    TemplateRenderTitle,
    SaveButton,
    SavedButton,
}

/// Looks up translated texts. Hosts with their own catalogue implement this.
pub trait Messages: Send + Sync {
    fn get(&self, key: MessageKey, locale: Locale) -> Cow<'_, str>;
}

/// English texts, whatever the locale
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMessages;

impl Messages for DefaultMessages {
    fn get(&self, key: MessageKey, _locale: Locale) -> Cow<'_, str> {
        let text = match key {
            MessageKey::PreviewPlaceholder => {
                "<html><body style='font-family: Arial, sans-serif; \
                 padding: 20px; color: #757575;'>\
                 <p>Type an HTML template and some JSON data to see the preview here.</p>\
                 </body></html>"
            }
            MessageKey::InvalidJsonPrefix => "Invalid JSON: ",
            MessageKey::JsonParseTitle => "JSON Parse Error",
            MessageKey::TemplateErrorPrefix => "Template error: ",
            MessageKey::TemplateRenderTitle => "Template Rendering Error",
            MessageKey::SaveButton => "Save",
            MessageKey::SavedButton => "Saved!",
        };
        Cow::Borrowed(text)
    }
}
