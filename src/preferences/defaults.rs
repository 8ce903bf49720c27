use crate::preferences::PluginConfig;
use crate::version::{PluginInfo, INFO_SECTION};

pub const OPTIONS_SECTION: &str = "Optionen";
pub const ACCESS_SECTION: &str = "access";

/// Built-in configuration every organization is reconciled against.
pub fn default_config() -> PluginConfig {
    let mut config = PluginConfig::new();

    config.update(OPTIONS_SECTION, "interface_pff", 0);
    config.update(OPTIONS_SECTION, "profile_addin", vec!["ITEMNAME", "LAST_RECEIVER"]);
    config.update(OPTIONS_SECTION, "file_name", "InventoryManager");
    config.update(OPTIONS_SECTION, "add_date", 0);
    config.update(OPTIONS_SECTION, "current_user_default_keeper", 0);
    config.update(OPTIONS_SECTION, "allow_negative_numbers", 1);
    config.update(OPTIONS_SECTION, "decimal_step", 0.1);
    config.update(OPTIONS_SECTION, "field_date_time_format", "date");

    config.update(INFO_SECTION, "version", "");
    config.update(INFO_SECTION, "beta-version", "");
    config.update(INFO_SECTION, "stand", "");

    config.update(ACCESS_SECTION, "preferences", Vec::<String>::new());

    config
}

/// Writes the release information into `config`.
pub fn stamp_plugin_info(config: &mut PluginConfig, info: &PluginInfo) {
    config.update(INFO_SECTION, "version", info.version);
    config.update(INFO_SECTION, "beta-version", info.beta_version);
    config.update(INFO_SECTION, "stand", info.stand);
}
