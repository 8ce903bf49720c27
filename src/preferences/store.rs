use sqlx::{PgConnection, PgPool};

use crate::db::{EffectiveScope, Tables};
use crate::error::AppResult;
use crate::models::PreferenceRow;
use crate::preferences::{
    entry_name, entry_name_pattern, parse_entry_name, PluginConfig, PreferenceCodec,
    PreferenceDiff, PreferenceValue,
};

/// Flat `PIM__section__key` rows in the host's plugin preference table.
#[derive(Clone)]
pub struct PreferenceStore {
    pool: PgPool,
    tables: Tables,
    codec: PreferenceCodec,
}

impl PreferenceStore {
    pub fn new(pool: PgPool, tables: Tables, codec: PreferenceCodec) -> Self {
        Self {
            pool,
            tables,
            codec,
        }
    }

    pub fn codec(&self) -> &PreferenceCodec {
        &self.codec
    }

    /// Loads every plugin row visible to the organization.
    ///
    /// Returns `Ok(None)` when the preference table does not exist yet, i.e.
    /// the plugin is not installed. Rows owned by the organization win over
    /// global rows of the same name.
    pub async fn read(&self, scope: EffectiveScope) -> AppResult<Option<PluginConfig>> {
        if !Tables::exists(&self.pool, &self.tables.preferences).await? {
            tracing::debug!(
                "Preference table {} missing, plugin not installed",
                self.tables.preferences
            );
            return Ok(None);
        }

        let query = format!(
            "SELECT {} FROM {} WHERE plp_name LIKE $1 AND {} ORDER BY plp_org_id NULLS FIRST, plp_id",
            PreferenceRow::COLUMNS,
            self.tables.preferences,
            scope.visible("plp_org_id", 2)
        );
        let rows: Vec<PreferenceRow> = sqlx::query_as(&query)
            .bind(entry_name_pattern())
            .bind(scope.organization_id())
            .fetch_all(&self.pool)
            .await?;

        let mut config = PluginConfig::new();
        for row in &rows {
            if let Some((section, key)) = parse_entry_name(&row.name) {
                let value = self.codec.decode(row.value.as_deref().unwrap_or_default());
                config.update(section, key, value);
            }
        }
        Ok(Some(config))
    }

    /// Upserts every leaf of `config` in one transaction.
    pub async fn write(&self, scope: EffectiveScope, config: &PluginConfig) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        for (section, key, value) in config.entries() {
            self.upsert(&mut tx, scope, section, key, value).await?;
        }
        tx.commit().await?;

        tracing::debug!(
            "Wrote {} preferences for organization {}",
            config.len(),
            scope.organization_id()
        );
        Ok(())
    }

    /// Persists a single leaf.
    pub async fn update(
        &self,
        scope: EffectiveScope,
        section: &str,
        key: &str,
        value: &PreferenceValue,
    ) -> AppResult<()> {
        let mut conn = self.pool.acquire().await?;
        self.upsert(&mut conn, scope, section, key, value).await
    }

    /// Looks the row up by name within the organization or the global scope
    /// and overwrites its value in place; inserts an organization row when
    /// nothing matches.
    async fn upsert(
        &self,
        conn: &mut PgConnection,
        scope: EffectiveScope,
        section: &str,
        key: &str,
        value: &PreferenceValue,
    ) -> AppResult<()> {
        let name = entry_name(section, key);
        let encoded = self.codec.encode(value);

        let select = format!(
            "SELECT plp_id FROM {} WHERE plp_name = $1 AND {} ORDER BY plp_org_id NULLS LAST, plp_id LIMIT 1",
            self.tables.preferences,
            scope.visible("plp_org_id", 2)
        );
        let existing: Option<i32> = sqlx::query_scalar(&select)
            .bind(&name)
            .bind(scope.organization_id())
            .fetch_optional(&mut *conn)
            .await?;

        match existing {
            Some(id) => {
                let update = format!(
                    "UPDATE {} SET plp_value = $1 WHERE plp_id = $2",
                    self.tables.preferences
                );
                sqlx::query(&update)
                    .bind(&encoded)
                    .bind(id)
                    .execute(&mut *conn)
                    .await?;
            }
            None => {
                let insert = format!(
                    "INSERT INTO {} (plp_org_id, plp_name, plp_value) VALUES ($1, $2, $3)",
                    self.tables.preferences
                );
                sqlx::query(&insert)
                    .bind(scope.organization_id())
                    .bind(&name)
                    .bind(&encoded)
                    .execute(&mut *conn)
                    .await?;
            }
        }
        Ok(())
    }

    /// Brings the stored configuration in line with `defaults`: missing keys
    /// are added with their default value, keys unknown to the defaults are
    /// deleted. Existing values are kept.
    ///
    /// Only rows owned by the organization are deleted. The returned diff
    /// lists as stale just the keys whose rows were actually removed; global
    /// rows stay in the table but are left out of the returned configuration.
    pub async fn reconcile(
        &self,
        scope: EffectiveScope,
        defaults: &PluginConfig,
    ) -> AppResult<(PluginConfig, PreferenceDiff)> {
        let mut config = self.read(scope).await?.unwrap_or_default();
        let mut diff = PreferenceDiff::between(&config, defaults);
        diff.apply(&mut config);

        let mut removed = Vec::new();
        if !diff.stale.is_empty() {
            let delete = format!(
                "DELETE FROM {} WHERE plp_name = $1 AND {}",
                self.tables.preferences,
                scope.owned("plp_org_id", 2)
            );
            let mut tx = self.pool.begin().await?;
            for (section, key) in diff.stale.drain(..) {
                let result = sqlx::query(&delete)
                    .bind(entry_name(&section, &key))
                    .bind(scope.organization_id())
                    .execute(&mut *tx)
                    .await?;
                if result.rows_affected() > 0 {
                    removed.push((section, key));
                } else {
                    tracing::debug!("Keeping global preference {}/{}", section, key);
                }
            }
            tx.commit().await?;
        }

        if !removed.is_empty() {
            tracing::info!(
                "Removed {} obsolete preferences for organization {}",
                removed.len(),
                scope.organization_id()
            );
        }
        diff.stale = removed;
        Ok((config, diff))
    }

    /// Raw stored text of one leaf, preferring the organization's own row.
    pub async fn stored_text(
        &self,
        scope: EffectiveScope,
        section: &str,
        key: &str,
    ) -> AppResult<Option<String>> {
        let query = format!(
            "SELECT plp_value FROM {} WHERE plp_name = $1 AND {} ORDER BY plp_org_id NULLS LAST, plp_id LIMIT 1",
            self.tables.preferences,
            scope.visible("plp_org_id", 2)
        );
        let value: Option<Option<String>> = sqlx::query_scalar(&query)
            .bind(entry_name(section, key))
            .bind(scope.organization_id())
            .fetch_optional(&self.pool)
            .await?;
        Ok(value.flatten())
    }

    /// Deletes plugin rows of one organization, or of every organization when
    /// `scope` is `None`.
    pub async fn delete_all(&self, scope: Option<EffectiveScope>) -> AppResult<u64> {
        let result = match scope {
            Some(scope) => {
                let query = format!(
                    "DELETE FROM {} WHERE plp_name LIKE $1 AND {}",
                    self.tables.preferences,
                    scope.owned("plp_org_id", 2)
                );
                sqlx::query(&query)
                    .bind(entry_name_pattern())
                    .bind(scope.organization_id())
                    .execute(&self.pool)
                    .await?
            }
            None => {
                let query = format!(
                    "DELETE FROM {} WHERE plp_name LIKE $1",
                    self.tables.preferences
                );
                sqlx::query(&query)
                    .bind(entry_name_pattern())
                    .execute(&self.pool)
                    .await?
            }
        };
        Ok(result.rows_affected())
    }
}
