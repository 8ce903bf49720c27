use std::sync::LazyLock;

use regex::Regex;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};

static PREFIX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid regex"));

/// Physical table names, derived from the host's table prefix.
///
/// The prefix is validated once here; every other module interpolates these
/// names into SQL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tables {
    pub fields: String,
    pub data: String,
    pub items: String,
    pub log: String,
    pub preferences: String,
}

impl Tables {
    pub fn new(prefix: &str) -> AppResult<Self> {
        if !PREFIX_PATTERN.is_match(prefix) {
            return Err(AppError::InvalidInput(format!(
                "table prefix '{}' must match {}",
                prefix,
                PREFIX_PATTERN.as_str()
            )));
        }
        Ok(Self {
            fields: format!("{prefix}_inventory_manager_fields"),
            data: format!("{prefix}_inventory_manager_data"),
            items: format!("{prefix}_inventory_manager_items"),
            log: format!("{prefix}_inventory_manager_log"),
            preferences: format!("{prefix}_plugin_preferences"),
        })
    }

    /// The inventory tables, children before parents.
    pub fn inventory(&self) -> [&str; 4] {
        [&self.log, &self.data, &self.items, &self.fields]
    }

    fn create_statements(&self) -> Vec<String> {
        vec![
            format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    imf_id SERIAL PRIMARY KEY,
                    imf_org_id INTEGER,
                    imf_type VARCHAR(30) NOT NULL,
                    imf_name VARCHAR(100) NOT NULL,
                    imf_name_intern VARCHAR(110) NOT NULL,
                    imf_sequence INTEGER NOT NULL,
                    imf_system BOOLEAN NOT NULL DEFAULT FALSE,
                    imf_mandatory BOOLEAN NOT NULL DEFAULT FALSE,
                    imf_description TEXT NOT NULL DEFAULT '',
                    imf_value_list TEXT,
                    imf_usr_id_create INTEGER,
                    imf_timestamp_create TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    imf_usr_id_change INTEGER,
                    imf_timestamp_change TIMESTAMP
                )",
                self.fields
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    imd_id SERIAL PRIMARY KEY,
                    imd_imf_id INTEGER,
                    imd_imi_id INTEGER NOT NULL,
                    imd_value VARCHAR(4000) NOT NULL DEFAULT ''
                )",
                self.data
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    imi_id SERIAL PRIMARY KEY,
                    imi_org_id INTEGER,
                    imi_former BOOLEAN DEFAULT FALSE,
                    imi_usr_id_create INTEGER,
                    imi_timestamp_create TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    imi_usr_id_change INTEGER,
                    imi_timestamp_change TIMESTAMP
                )",
                self.items
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    iml_id SERIAL PRIMARY KEY,
                    iml_imi_id INTEGER NOT NULL,
                    iml_imf_id INTEGER NOT NULL,
                    iml_value_old VARCHAR(4000) NOT NULL DEFAULT '',
                    iml_value_new VARCHAR(4000) NOT NULL DEFAULT '',
                    iml_usr_id_create INTEGER,
                    iml_timestamp_create TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    iml_comment VARCHAR(255) NOT NULL DEFAULT ''
                )",
                self.log
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    plp_id SERIAL PRIMARY KEY,
                    plp_org_id INTEGER,
                    plp_name VARCHAR(255) NOT NULL,
                    plp_value TEXT
                )",
                self.preferences
            ),
        ]
    }

    pub async fn create_missing(&self, pool: &PgPool) -> AppResult<()> {
        for statement in self.create_statements() {
            sqlx::query(&statement).execute(pool).await?;
        }
        Ok(())
    }

    pub async fn exists(pool: &PgPool, table: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    pub async fn is_empty(pool: &PgPool, table: &str) -> AppResult<bool> {
        let query = format!("SELECT NOT EXISTS (SELECT 1 FROM {table})");
        let empty: bool = sqlx::query_scalar(&query).fetch_one(pool).await?;
        Ok(empty)
    }

    pub async fn drop_table(pool: &PgPool, table: &str) -> AppResult<()> {
        let query = format!("DROP TABLE IF EXISTS {table}");
        sqlx::query(&query).execute(pool).await?;
        Ok(())
    }
}
