//! Plugin configuration persisted as flat preference rows.

pub mod codec;
pub mod defaults;
pub mod diff;
pub mod store;
pub mod value;

pub use codec::{entry_name, entry_name_pattern, parse_entry_name, PreferenceCodec, DEFAULT_DB_TOKEN, SHORTCUT};
pub use defaults::{default_config, stamp_plugin_info, ACCESS_SECTION, OPTIONS_SECTION};
pub use diff::PreferenceDiff;
pub use store::PreferenceStore;
pub use value::{DateMode, PluginConfig, PreferenceValue, Section};
