use crate::preferences::{PluginConfig, PreferenceValue};

/// Presence delta between stored preferences and the built-in defaults.
/// Values of keys present on both sides are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferenceDiff {
    pub missing: Vec<(String, String, PreferenceValue)>,
    pub stale: Vec<(String, String)>,
}

impl PreferenceDiff {
    pub fn between(stored: &PluginConfig, defaults: &PluginConfig) -> Self {
        let missing = defaults
            .entries()
            .filter(|(section, key, _)| !stored.contains(section, key))
            .map(|(section, key, value)| (section.to_string(), key.to_string(), value.clone()))
            .collect();

        let stale = stored
            .entries()
            .filter(|(section, key, _)| !defaults.contains(section, key))
            .map(|(section, key, _)| (section.to_string(), key.to_string()))
            .collect();

        Self { missing, stale }
    }

    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.stale.is_empty()
    }

    /// Applies the delta in memory: adds missing defaults, drops stale keys.
    pub fn apply(&self, config: &mut PluginConfig) {
        for (section, key, value) in &self.missing {
            config.update(section.as_str(), key.as_str(), value.clone());
        }
        for (section, key) in &self.stale {
            config.remove(section, key);
        }
    }
}
