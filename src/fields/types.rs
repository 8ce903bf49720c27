use std::fmt::{self, Write as _};
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::HostSettings;
use crate::error::AppError;
use crate::fields::html;
use crate::l10n::Localizer;
use crate::preferences::DateMode;

/// Longest value the data table can hold.
pub const MAX_VALUE_LENGTH: usize = 4000;

/// Canonical storage patterns of DATE values.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

const DATETIME_INPUT_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    Text,
    TextBig,
    Number,
    Decimal,
    Date,
    Checkbox,
    Dropdown,
    RadioButton,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("value is required")]
    Required,
    #[error("value exceeds {MAX_VALUE_LENGTH} characters")]
    TooLong,
    #[error("'{0}' is not a whole number")]
    NotInteger(String),
    #[error("'{0}' is not a number")]
    NotDecimal(String),
    #[error("negative numbers are not allowed")]
    Negative,
    #[error("'{0}' is not a valid date")]
    InvalidDate(String),
    #[error("'{0}' is not a checkbox state")]
    InvalidCheckbox(String),
    #[error("option '{0}' does not exist")]
    UnknownOption(String),
}

/// Inputs to `FieldType::validate` beyond the raw value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationContext<'a> {
    pub date_mode: DateMode,
    pub allow_negative_numbers: bool,
    pub value_list: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueFormat {
    /// Human readable value.
    #[default]
    Default,
    /// Stored value, untouched.
    Database,
    /// Markup for page output.
    Html,
    /// Plain text, icon entries reduced to their label or position.
    Text,
}

pub struct DisplayContext<'a> {
    pub date_mode: DateMode,
    pub settings: &'a HostSettings,
    pub localizer: &'a dyn Localizer,
}

impl FieldType {
    pub const ALL: [FieldType; 8] = [
        FieldType::Text,
        FieldType::TextBig,
        FieldType::Number,
        FieldType::Decimal,
        FieldType::Date,
        FieldType::Checkbox,
        FieldType::Dropdown,
        FieldType::RadioButton,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "TEXT",
            FieldType::TextBig => "TEXT_BIG",
            FieldType::Number => "NUMBER",
            FieldType::Decimal => "DECIMAL",
            FieldType::Date => "DATE",
            FieldType::Checkbox => "CHECKBOX",
            FieldType::Dropdown => "DROPDOWN",
            FieldType::RadioButton => "RADIO_BUTTON",
        }
    }

    pub fn is_list(self) -> bool {
        matches!(self, FieldType::Dropdown | FieldType::RadioButton)
    }

    /// Checks user input and returns the value to store. Empty input is
    /// always accepted and means "clear".
    pub fn validate(self, raw: &str, ctx: &ValidationContext<'_>) -> Result<String, ValidationError> {
        if raw.chars().count() > MAX_VALUE_LENGTH {
            return Err(ValidationError::TooLong);
        }
        if raw.is_empty() {
            return Ok(String::new());
        }

        match self {
            FieldType::Text | FieldType::TextBig => Ok(raw.to_string()),
            FieldType::Number => {
                let trimmed = raw.trim();
                let n: i64 = trimmed
                    .parse()
                    .map_err(|_| ValidationError::NotInteger(raw.to_string()))?;
                if n < 0 && !ctx.allow_negative_numbers {
                    return Err(ValidationError::Negative);
                }
                Ok(n.to_string())
            }
            FieldType::Decimal => {
                let trimmed = raw.trim();
                let f: f64 = trimmed
                    .parse()
                    .ok()
                    .filter(|f: &f64| f.is_finite())
                    .ok_or_else(|| ValidationError::NotDecimal(raw.to_string()))?;
                if f < 0.0 && !ctx.allow_negative_numbers {
                    return Err(ValidationError::Negative);
                }
                Ok(trimmed.to_string())
            }
            FieldType::Date => normalize_date(raw, ctx.date_mode)
                .ok_or_else(|| ValidationError::InvalidDate(raw.to_string())),
            FieldType::Checkbox => match raw.trim() {
                state @ ("0" | "1") => Ok(state.to_string()),
                _ => Err(ValidationError::InvalidCheckbox(raw.to_string())),
            },
            FieldType::Dropdown | FieldType::RadioButton => {
                let count = ctx.value_list.map(|list| list_entries(list).len()).unwrap_or(0);
                match raw.trim().parse::<usize>() {
                    Ok(index) if index <= count => Ok(index.to_string()),
                    _ => Err(ValidationError::UnknownOption(raw.to_string())),
                }
            }
        }
    }

    /// Renders a stored value.
    pub fn format(
        self,
        stored: &str,
        format: ValueFormat,
        value_list: Option<&str>,
        ctx: &DisplayContext<'_>,
    ) -> String {
        if format == ValueFormat::Database {
            return stored.to_string();
        }

        match self {
            FieldType::Date => display_date(stored, ctx),
            FieldType::Dropdown | FieldType::RadioButton => {
                self.list_value(stored, format, value_list.unwrap_or_default(), ctx)
            }
            FieldType::Checkbox if format == ValueFormat::Html => {
                if stored == "1" {
                    html::CHECKBOX_CHECKED.to_string()
                } else {
                    html::CHECKBOX_UNCHECKED.to_string()
                }
            }
            FieldType::TextBig if format == ValueFormat::Html => html::nl2br(stored),
            _ => stored.to_string(),
        }
    }

    fn list_value(
        self,
        stored: &str,
        format: ValueFormat,
        value_list: &str,
        ctx: &DisplayContext<'_>,
    ) -> String {
        let index = match stored.trim().parse::<usize>() {
            Ok(index) if index > 0 => index,
            _ => return String::new(),
        };
        let entries = list_entries(value_list);
        let Some(entry) = entries.get(index - 1) else {
            return String::new();
        };

        if self == FieldType::RadioButton && html::is_image_entry(entry) {
            let (image, label) = entry.split_once('|').unwrap_or((entry.as_str(), ""));
            let label = ctx.localizer.localize(label.trim());
            return match format {
                ValueFormat::Html => html::icon_html(image.trim(), &label),
                ValueFormat::Text if label.is_empty() => index.to_string(),
                _ if label.is_empty() => image.trim().to_string(),
                _ => label,
            };
        }

        ctx.localizer.localize(entry)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AppError::InvalidInput(format!("unknown field type '{}'", s)))
    }
}

/// Entries of a newline separated value list.
pub fn list_entries(value_list: &str) -> Vec<String> {
    if value_list.is_empty() {
        return Vec::new();
    }
    value_list
        .replace("\r\n", "\n")
        .split('\n')
        .map(str::to_string)
        .collect()
}

/// Brings date input into the storage pattern of `mode`.
pub fn normalize_date(raw: &str, mode: DateMode) -> Option<String> {
    let raw = raw.trim();
    match mode {
        DateMode::Date => {
            let date_part = raw.split([' ', 'T']).next().unwrap_or(raw);
            NaiveDate::parse_from_str(date_part, DATE_FORMAT)
                .ok()
                .map(|d| d.format(DATE_FORMAT).to_string())
        }
        DateMode::DateTime => {
            let full = if raw.contains([' ', 'T']) {
                raw.to_string()
            } else {
                format!("{raw} 00:00")
            };
            DATETIME_INPUT_FORMATS
                .iter()
                .find_map(|pattern| NaiveDateTime::parse_from_str(&full, pattern).ok())
                .map(|dt| dt.format(DATETIME_FORMAT).to_string())
        }
    }
}

fn display_date(stored: &str, ctx: &DisplayContext<'_>) -> String {
    if stored.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    let rendered = match ctx.date_mode {
        DateMode::Date => {
            let date_part = stored.split(' ').next().unwrap_or(stored);
            match NaiveDate::parse_from_str(date_part, DATE_FORMAT) {
                Ok(date) => write!(out, "{}", date.format(&ctx.settings.system_date)),
                Err(_) => return stored.to_string(),
            }
        }
        DateMode::DateTime => {
            let full = if stored.contains(' ') {
                stored.to_string()
            } else {
                format!("{stored} 00:00")
            };
            match NaiveDateTime::parse_from_str(&full, DATETIME_FORMAT) {
                Ok(dt) => {
                    let pattern = format!("{} {}", ctx.settings.system_date, ctx.settings.system_time);
                    write!(out, "{}", dt.format(&pattern))
                }
                Err(_) => return stored.to_string(),
            }
        }
    };
    // an unusable host pattern falls back to the stored value
    match rendered {
        Ok(()) => out,
        Err(_) => stored.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::l10n::MessageCatalog;

    fn validation(mode: DateMode, negatives: bool, list: Option<&str>) -> ValidationContext<'_> {
        ValidationContext {
            date_mode: mode,
            allow_negative_numbers: negatives,
            value_list: list,
        }
    }

    #[test]
    fn test_parse_field_type() {
        for t in FieldType::ALL {
            assert_eq!(t.as_str().parse::<FieldType>().unwrap(), t);
        }
        assert!("MULTI".parse::<FieldType>().is_err());
    }

    #[test]
    fn test_validate_numbers() {
        let ctx = validation(DateMode::Date, false, None);
        assert_eq!(FieldType::Number.validate(" 42 ", &ctx).unwrap(), "42");
        assert_eq!(FieldType::Number.validate("-1", &ctx), Err(ValidationError::Negative));
        assert!(matches!(
            FieldType::Number.validate("4.5", &ctx),
            Err(ValidationError::NotInteger(_))
        ));
        assert_eq!(FieldType::Decimal.validate("0.25", &ctx).unwrap(), "0.25");
        assert!(FieldType::Decimal.validate("NaN", &ctx).is_err());

        let ctx = validation(DateMode::Date, true, None);
        assert_eq!(FieldType::Decimal.validate("-3.5", &ctx).unwrap(), "-3.5");
    }

    #[test]
    fn test_validate_dates() {
        let date = validation(DateMode::Date, true, None);
        assert_eq!(FieldType::Date.validate("2024-05-01", &date).unwrap(), "2024-05-01");
        assert_eq!(FieldType::Date.validate("2024-05-01 13:45", &date).unwrap(), "2024-05-01");
        assert!(matches!(
            FieldType::Date.validate("01.05.2024", &date),
            Err(ValidationError::InvalidDate(_))
        ));
        assert!(FieldType::Date.validate("2024-02-30", &date).is_err());

        let datetime = validation(DateMode::DateTime, true, None);
        assert_eq!(
            FieldType::Date.validate("2024-05-01", &datetime).unwrap(),
            "2024-05-01 00:00"
        );
        assert_eq!(
            FieldType::Date.validate("2024-05-01T08:15", &datetime).unwrap(),
            "2024-05-01 08:15"
        );
    }

    #[test]
    fn test_validate_choices() {
        let ctx = validation(DateMode::Date, true, Some("A\r\nB\nC"));
        assert_eq!(FieldType::Dropdown.validate("3", &ctx).unwrap(), "3");
        assert_eq!(FieldType::Dropdown.validate("0", &ctx).unwrap(), "0");
        assert!(FieldType::Dropdown.validate("4", &ctx).is_err());
        assert_eq!(FieldType::Checkbox.validate("1", &ctx).unwrap(), "1");
        assert!(FieldType::Checkbox.validate("yes", &ctx).is_err());
    }

    #[test]
    fn test_validate_empty_and_length() {
        let ctx = validation(DateMode::Date, true, None);
        for t in FieldType::ALL {
            assert_eq!(t.validate("", &ctx).unwrap(), "");
        }
        let long = "x".repeat(MAX_VALUE_LENGTH + 1);
        assert_eq!(FieldType::Text.validate(&long, &ctx), Err(ValidationError::TooLong));
    }

    #[test]
    fn test_format_dates() {
        let settings = HostSettings::default();
        let catalog = MessageCatalog::new();
        let ctx = DisplayContext {
            date_mode: DateMode::Date,
            settings: &settings,
            localizer: &catalog,
        };
        assert_eq!(
            FieldType::Date.format("2024-05-01", ValueFormat::Default, None, &ctx),
            "01.05.2024"
        );
        assert_eq!(
            FieldType::Date.format("2024-05-01", ValueFormat::Database, None, &ctx),
            "2024-05-01"
        );
        assert_eq!(FieldType::Date.format("garbage", ValueFormat::Html, None, &ctx), "garbage");

        let ctx = DisplayContext {
            date_mode: DateMode::DateTime,
            ..ctx
        };
        assert_eq!(
            FieldType::Date.format("2024-05-01", ValueFormat::Default, None, &ctx),
            "01.05.2024 00:00"
        );
    }

    #[test]
    fn test_format_lists() {
        let settings = HostSettings::default();
        let catalog = MessageCatalog::new().with("SYS_YES", "Yes");
        let ctx = DisplayContext {
            date_mode: DateMode::Date,
            settings: &settings,
            localizer: &catalog,
        };
        let list = "Allgemein\r\nSYS_YES";
        assert_eq!(FieldType::Dropdown.format("1", ValueFormat::Default, Some(list), &ctx), "Allgemein");
        assert_eq!(FieldType::Dropdown.format("2", ValueFormat::Html, Some(list), &ctx), "Yes");
        assert_eq!(FieldType::Dropdown.format("0", ValueFormat::Default, Some(list), &ctx), "");
        assert_eq!(FieldType::Dropdown.format("9", ValueFormat::Default, Some(list), &ctx), "");

        let radio = "fa-check|SYS_YES\nfa-times";
        assert_eq!(FieldType::RadioButton.format("1", ValueFormat::Text, Some(radio), &ctx), "Yes");
        assert_eq!(FieldType::RadioButton.format("2", ValueFormat::Text, Some(radio), &ctx), "2");
        assert!(FieldType::RadioButton
            .format("1", ValueFormat::Html, Some(radio), &ctx)
            .starts_with(r#"<i class="fas fa-check""#));
    }

    #[test]
    fn test_format_html() {
        let settings = HostSettings::default();
        let catalog = MessageCatalog::new();
        let ctx = DisplayContext {
            date_mode: DateMode::Date,
            settings: &settings,
            localizer: &catalog,
        };
        assert_eq!(
            FieldType::Checkbox.format("1", ValueFormat::Html, None, &ctx),
            html::CHECKBOX_CHECKED
        );
        assert_eq!(
            FieldType::Checkbox.format("", ValueFormat::Html, None, &ctx),
            html::CHECKBOX_UNCHECKED
        );
        assert_eq!(FieldType::Checkbox.format("1", ValueFormat::Default, None, &ctx), "1");
        assert_eq!(
            FieldType::TextBig.format("a\nb", ValueFormat::Html, None, &ctx),
            "a<br />\nb"
        );
    }
}
