use std::env;

use crate::db::DEFAULT_ORGANIZATION_ID;
use crate::preferences::DEFAULT_DB_TOKEN;

/// Settings owned by the host application that the plugin only reads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostSettings {
    /// chrono pattern used to display dates
    pub system_date: String,
    /// chrono pattern used to display times
    pub system_time: String,
    /// write a change log entry for every field edit
    pub log_edit_fields: bool,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            system_date: "%d.%m.%Y".to_string(),
            system_time: "%H:%M".to_string(),
            log_edit_fields: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub table_prefix: String,
    pub organization_id: i32,
    pub db_token: String,
    pub max_connections: u32,
    pub settings: HostSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenvy::dotenv().ok();

        let defaults = HostSettings::default();

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            table_prefix: env::var("TABLE_PREFIX").unwrap_or_else(|_| "adm".to_string()),
            organization_id: env::var("ORGANIZATION_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_ORGANIZATION_ID),
            db_token: env::var("PIM_DB_TOKEN").unwrap_or_else(|_| DEFAULT_DB_TOKEN.to_string()),
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            settings: HostSettings {
                system_date: env::var("SYSTEM_DATE").unwrap_or(defaults.system_date),
                system_time: env::var("SYSTEM_TIME").unwrap_or(defaults.system_time),
                log_edit_fields: env::var("PROFILE_LOG_EDIT_FIELDS")
                    .map(|v| parse_flag(&v))
                    .unwrap_or(defaults.log_edit_fields),
            },
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
