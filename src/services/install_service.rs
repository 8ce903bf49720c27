use std::sync::Arc;

use serde::Serialize;
use sqlx::PgPool;

use crate::config::Config;
use crate::db::{EffectiveScope, Tables};
use crate::error::AppResult;
use crate::fields::{reconcile_catalog, RemapReport, DEFAULT_FIELDS};
use crate::l10n::Localizer;
use crate::preferences::{default_config, stamp_plugin_info, PreferenceCodec, PreferenceStore};
use crate::version::{PluginInfo, INFO_SECTION, PLUGIN_INFO};

#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub fields: RemapReport,
    pub preferences_added: usize,
    pub preferences_removed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UninstallReport {
    pub deleted_rows: Vec<(String, u64)>,
    pub dropped_tables: Vec<String>,
    pub kept_tables: Vec<String>,
}

/// Install, upgrade detection and removal of the plugin's data.
pub struct InstallService {
    pool: PgPool,
    tables: Tables,
    store: PreferenceStore,
    localizer: Arc<dyn Localizer>,
    info: PluginInfo,
}

impl InstallService {
    pub fn new(
        pool: PgPool,
        tables: Tables,
        codec: PreferenceCodec,
        localizer: Arc<dyn Localizer>,
    ) -> Self {
        let store = PreferenceStore::new(pool.clone(), tables.clone(), codec);
        Self {
            pool,
            tables,
            store,
            localizer,
            info: PLUGIN_INFO,
        }
    }

    pub fn from_config(
        pool: PgPool,
        config: &Config,
        localizer: Arc<dyn Localizer>,
    ) -> AppResult<Self> {
        let tables = Tables::new(&config.table_prefix)?;
        Ok(Self::new(
            pool,
            tables,
            PreferenceCodec::new(config.db_token.clone()),
            localizer,
        ))
    }

    /// Overrides the release information, e.g. to simulate an upgrade.
    pub fn with_plugin_info(mut self, info: PluginInfo) -> Self {
        self.info = info;
        self
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn preference_store(&self) -> &PreferenceStore {
        &self.store
    }

    /// Creates missing tables, reconciles the field catalog and the
    /// preferences of the organization.
    pub async fn init(&self, scope: EffectiveScope) -> AppResult<InstallReport> {
        tracing::info!(
            "Installing inventory manager {} for organization {}",
            self.info.version,
            scope.organization_id()
        );
        self.tables.create_missing(&self.pool).await?;

        let fields = reconcile_catalog(
            &self.pool,
            &self.tables,
            scope,
            &DEFAULT_FIELDS,
            self.localizer.as_ref(),
        )
        .await?;

        let (mut config, diff) = self.store.reconcile(scope, &default_config()).await?;
        stamp_plugin_info(&mut config, &self.info);
        self.store.write(scope, &config).await?;

        Ok(InstallReport {
            fields,
            preferences_added: diff.missing.len(),
            preferences_removed: diff.stale.len(),
        })
    }

    /// Whether an install pass is due: a table is missing, the organization
    /// has no fields, or the stored release differs from this build.
    pub async fn check_for_update(&self, scope: EffectiveScope) -> AppResult<bool> {
        for table in self
            .tables
            .inventory()
            .into_iter()
            .chain([self.tables.preferences.as_str()])
        {
            if !Tables::exists(&self.pool, table).await? {
                tracing::debug!("Table {} missing, update required", table);
                return Ok(true);
            }
        }

        let query = format!(
            "SELECT COUNT(*) FROM {} WHERE {}",
            self.tables.fields,
            scope.owned("imf_org_id", 1)
        );
        let field_count: i64 = sqlx::query_scalar(&query)
            .bind(scope.organization_id())
            .fetch_one(&self.pool)
            .await?;
        if field_count == 0 {
            return Ok(true);
        }

        let version = self.store.stored_text(scope, INFO_SECTION, "version").await?;
        let stand = self.store.stored_text(scope, INFO_SECTION, "stand").await?;
        Ok(version.as_deref() != Some(self.info.version) || stand.as_deref() != Some(self.info.stand))
    }

    /// Removes item data and configuration of one organization, or of every
    /// organization when `all_organizations` is set. Inventory tables are
    /// dropped once empty (always, for all organizations); the shared
    /// preference table only when empty.
    pub async fn uninstall(
        &self,
        scope: EffectiveScope,
        all_organizations: bool,
    ) -> AppResult<UninstallReport> {
        let mut report = UninstallReport::default();

        if !all_organizations {
            self.delete_organization_items(scope, &mut report).await?;
        }

        for table in self.tables.inventory() {
            if !Tables::exists(&self.pool, table).await? {
                continue;
            }
            if all_organizations || Tables::is_empty(&self.pool, table).await? {
                Tables::drop_table(&self.pool, table).await?;
                report.dropped_tables.push(table.to_string());
            } else {
                report.kept_tables.push(table.to_string());
            }
        }

        let preferences = &self.tables.preferences;
        if Tables::exists(&self.pool, preferences).await? {
            let deleted = self
                .store
                .delete_all((!all_organizations).then_some(scope))
                .await?;
            report.deleted_rows.push((preferences.clone(), deleted));
            if Tables::is_empty(&self.pool, preferences).await? {
                Tables::drop_table(&self.pool, preferences).await?;
                report.dropped_tables.push(preferences.clone());
            } else {
                report.kept_tables.push(preferences.clone());
            }
        }

        tracing::info!(
            "Uninstalled inventory manager (all organizations: {}): dropped {:?}",
            all_organizations,
            report.dropped_tables
        );
        Ok(report)
    }

    async fn delete_organization_items(
        &self,
        scope: EffectiveScope,
        report: &mut UninstallReport,
    ) -> AppResult<()> {
        let tables = &self.tables;
        let org_items = format!(
            "SELECT imi_id FROM {} WHERE {}",
            tables.items,
            scope.owned("imi_org_id", 1)
        );
        let statements = [
            (
                &tables.log,
                format!("DELETE FROM {} WHERE iml_imi_id IN ({})", tables.log, org_items),
            ),
            (
                &tables.data,
                format!("DELETE FROM {} WHERE imd_imi_id IN ({})", tables.data, org_items),
            ),
            (
                &tables.items,
                format!("DELETE FROM {} WHERE {}", tables.items, scope.owned("imi_org_id", 1)),
            ),
            (
                &tables.fields,
                format!("DELETE FROM {} WHERE {}", tables.fields, scope.owned("imf_org_id", 1)),
            ),
        ];

        // log and data rows are found through the items table
        let items_exist = Tables::exists(&self.pool, &tables.items).await?;
        let mut present = Vec::with_capacity(statements.len());
        for (table, statement) in statements {
            let reachable = items_exist || *table == tables.fields;
            if reachable && Tables::exists(&self.pool, table).await? {
                present.push((table, statement));
            }
        }

        let mut tx = self.pool.begin().await?;
        for (table, statement) in &present {
            let result = sqlx::query(statement)
                .bind(scope.organization_id())
                .execute(&mut *tx)
                .await?;
            report.deleted_rows.push((table.to_string(), result.rows_affected()));
        }
        tx.commit().await?;
        Ok(())
    }
}
