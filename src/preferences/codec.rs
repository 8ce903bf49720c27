use crate::preferences::PreferenceValue;

/// Prefix of every preference row written by the plugin.
pub const SHORTCUT: &str = "PIM";

/// Separator between list elements inside a stored `((...))` value.
pub const DEFAULT_DB_TOKEN: &str = "#_#";

const NAME_SEPARATOR: &str = "__";
const LIST_OPEN: &str = "((";
const LIST_CLOSE: &str = "))";

/// Row name of a preference leaf: `PIM__section__key`.
pub fn entry_name(section: &str, key: &str) -> String {
    format!("{SHORTCUT}{NAME_SEPARATOR}{section}{NAME_SEPARATOR}{key}")
}

/// Splits a row name back into section and key. Names without the plugin
/// prefix or without both parts are ignored.
pub fn parse_entry_name(name: &str) -> Option<(&str, &str)> {
    let rest = name.strip_prefix(SHORTCUT)?.strip_prefix(NAME_SEPARATOR)?;
    let (section, key) = rest.split_once(NAME_SEPARATOR)?;
    if section.is_empty() || key.is_empty() {
        return None;
    }
    Some((section, key))
}

/// `LIKE` pattern matching all rows of the plugin.
pub fn entry_name_pattern() -> String {
    format!("{SHORTCUT}{NAME_SEPARATOR}%")
}

/// String encoding of preference values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceCodec {
    token: String,
}

impl Default for PreferenceCodec {
    fn default() -> Self {
        Self::new(DEFAULT_DB_TOKEN)
    }
}

impl PreferenceCodec {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn encode(&self, value: &PreferenceValue) -> String {
        match value {
            PreferenceValue::Int(n) => n.to_string(),
            PreferenceValue::Float(f) => {
                let text = f.to_string();
                if f.is_finite() && !text.contains('.') {
                    format!("{text}.0")
                } else {
                    text
                }
            }
            PreferenceValue::Text(s) => s.clone(),
            PreferenceValue::List(items) => {
                format!("{LIST_OPEN}{}{LIST_CLOSE}", items.join(&self.token))
            }
        }
    }

    /// Best-effort decoding: a `((..))` wrapper yields a list, numeric text
    /// yields an int (float when it contains a '.'), anything else is text.
    pub fn decode(&self, raw: &str) -> PreferenceValue {
        if raw.len() >= LIST_OPEN.len() + LIST_CLOSE.len()
            && raw.starts_with(LIST_OPEN)
            && raw.ends_with(LIST_CLOSE)
        {
            let inner = &raw[LIST_OPEN.len()..raw.len() - LIST_CLOSE.len()];
            if inner.is_empty() {
                return PreferenceValue::List(Vec::new());
            }
            return PreferenceValue::List(inner.split(self.token.as_str()).map(str::to_string).collect());
        }

        if is_numeric(raw) {
            let trimmed = raw.trim();
            if trimmed.contains('.') {
                if let Ok(f) = trimmed.parse::<f64>() {
                    return PreferenceValue::Float(f);
                }
            } else if let Ok(n) = trimmed.parse::<i64>() {
                return PreferenceValue::Int(n);
            } else if let Ok(f) = trimmed.parse::<f64>() {
                // exponent notation without a decimal point
                if f.is_finite() && f.abs() < i64::MAX as f64 {
                    return PreferenceValue::Int(f as i64);
                }
            }
        }

        PreferenceValue::Text(raw.to_string())
    }
}

/// Decimal number with optional sign, fraction and exponent, surrounded by
/// optional whitespace.
fn is_numeric(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }
    let mut saw_digit = false;
    for c in trimmed.chars() {
        match c {
            '0'..='9' => saw_digit = true,
            '+' | '-' | '.' | 'e' | 'E' => {}
            _ => return false,
        }
    }
    saw_digit && trimmed.parse::<f64>().is_ok()
}
