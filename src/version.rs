/// Release information stamped into the `Plugininformationen` preference
/// section on every install pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginInfo {
    pub version: &'static str,
    pub beta_version: &'static str,
    pub stand: &'static str,
}

pub const PLUGIN_INFO: PluginInfo = PluginInfo {
    version: "1.1.9",
    beta_version: "n/a",
    stand: "12.08.2025",
};

pub const INFO_SECTION: &str = "Plugininformationen";
