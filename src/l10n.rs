use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Host translation ids look like `PIM_ITEMNAME` or `SYS_YES`.
static RE_TRANSLATION_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{3}_([A-Z0-9]_?)*[A-Z0-9]$").expect("valid regex"));

pub fn is_translation_id(text: &str) -> bool {
    RE_TRANSLATION_ID.is_match(text)
}

/// Lookup into the host application's language catalog.
pub trait Localizer: Send + Sync {
    fn translate(&self, key: &str) -> Option<String>;

    /// Translates `text` when it is a translation id with a known message,
    /// otherwise returns it unchanged.
    fn localize(&self, text: &str) -> String {
        if is_translation_id(text) {
            if let Some(message) = self.translate(text) {
                return message;
            }
        }
        text.to_string()
    }
}

/// In-memory catalog; an empty catalog leaves every id untranslated.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    messages: HashMap<String, String>,
}

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.messages.insert(key.into(), message.into());
        self
    }
}

impl Localizer for MessageCatalog {
    fn translate(&self, key: &str) -> Option<String> {
        self.messages.get(key).cloned()
    }
}
