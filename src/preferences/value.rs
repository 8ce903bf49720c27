use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A decoded preference leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreferenceValue {
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
}

impl PreferenceValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PreferenceValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PreferenceValue::Int(n) => Some(*n),
            PreferenceValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            PreferenceValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Loose truthiness of stored flags (`1`, `"1"`, `"true"`).
    pub fn is_truthy(&self) -> bool {
        match self {
            PreferenceValue::Int(n) => *n != 0,
            PreferenceValue::Float(f) => *f != 0.0,
            PreferenceValue::Text(s) => !s.is_empty() && s != "0" && s != "false",
            PreferenceValue::List(items) => !items.is_empty(),
        }
    }
}

impl From<i64> for PreferenceValue {
    fn from(value: i64) -> Self {
        PreferenceValue::Int(value)
    }
}

impl From<f64> for PreferenceValue {
    fn from(value: f64) -> Self {
        PreferenceValue::Float(value)
    }
}

impl From<&str> for PreferenceValue {
    fn from(value: &str) -> Self {
        PreferenceValue::Text(value.to_string())
    }
}

impl From<String> for PreferenceValue {
    fn from(value: String) -> Self {
        PreferenceValue::Text(value)
    }
}

impl From<Vec<String>> for PreferenceValue {
    fn from(value: Vec<String>) -> Self {
        PreferenceValue::List(value)
    }
}

impl From<Vec<&str>> for PreferenceValue {
    fn from(value: Vec<&str>) -> Self {
        PreferenceValue::List(value.into_iter().map(str::to_string).collect())
    }
}

/// How DATE fields are stored and displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateMode {
    #[default]
    Date,
    DateTime,
}

pub type Section = BTreeMap<String, PreferenceValue>;

/// The plugin configuration of one organization: section -> key -> value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginConfig {
    sections: BTreeMap<String, Section>,
}

impl PluginConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&PreferenceValue> {
        self.sections.get(section).and_then(|s| s.get(key))
    }

    pub fn contains(&self, section: &str, key: &str) -> bool {
        self.get(section, key).is_some()
    }

    /// Sets one leaf, creating the section when needed.
    pub fn update(
        &mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<PreferenceValue>,
    ) {
        self.sections
            .entry(section.into())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Removes one leaf; a section left empty is removed as well.
    pub fn remove(&mut self, section: &str, key: &str) -> Option<PreferenceValue> {
        let leaf = self.sections.get_mut(section)?;
        let removed = leaf.remove(key);
        if leaf.is_empty() {
            self.sections.remove(section);
        }
        removed
    }

    pub fn section(&self, section: &str) -> Option<&Section> {
        self.sections.get(section)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &PreferenceValue)> {
        self.sections.iter().flat_map(|(section, leaves)| {
            leaves
                .iter()
                .map(move |(key, value)| (section.as_str(), key.as_str(), value))
        })
    }

    pub fn len(&self) -> usize {
        self.sections.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn date_mode(&self) -> DateMode {
        match self
            .get("Optionen", "field_date_time_format")
            .and_then(PreferenceValue::as_str)
        {
            Some("datetime") => DateMode::DateTime,
            _ => DateMode::Date,
        }
    }

    pub fn allow_negative_numbers(&self) -> bool {
        self.get("Optionen", "allow_negative_numbers")
            .map(PreferenceValue::is_truthy)
            .unwrap_or(true)
    }
}
