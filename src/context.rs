use std::sync::Arc;

use sqlx::PgPool;

use crate::config::{Config, HostSettings};
use crate::db::{resolve_scope, EffectiveScope, Tables};
use crate::error::AppResult;
use crate::fields::DisplayContext;
use crate::l10n::Localizer;
use crate::preferences::{default_config, PluginConfig, PreferenceCodec, PreferenceStore, PreferenceValue};

/// Everything a request needs, resolved once: connection pool, table names,
/// organization scope, host settings and the decoded plugin configuration.
#[derive(Clone)]
pub struct RequestContext {
    pub pool: PgPool,
    pub tables: Tables,
    pub scope: EffectiveScope,
    pub settings: HostSettings,
    pub preferences: PluginConfig,
    pub localizer: Arc<dyn Localizer>,
    pub user_id: Option<i32>,
    /// `false` when the preference table does not exist yet.
    pub installed: bool,
    store: PreferenceStore,
}

impl RequestContext {
    /// Stored preferences are laid over the built-in defaults, so keys added
    /// by a newer release are available before the next install pass.
    pub async fn load(
        pool: PgPool,
        config: &Config,
        organization_id: i32,
        user_id: Option<i32>,
        localizer: Arc<dyn Localizer>,
    ) -> AppResult<Self> {
        let tables = Tables::new(&config.table_prefix)?;
        let scope = resolve_scope(organization_id);
        let store = PreferenceStore::new(
            pool.clone(),
            tables.clone(),
            PreferenceCodec::new(config.db_token.clone()),
        );

        let mut preferences = default_config();
        let installed = match store.read(scope).await? {
            Some(stored) => {
                for (section, key, value) in stored.entries() {
                    preferences.update(section, key, value.clone());
                }
                true
            }
            None => {
                tracing::warn!(
                    "Inventory manager is not installed for organization {}",
                    organization_id
                );
                false
            }
        };

        Ok(Self {
            pool,
            tables,
            scope,
            settings: config.settings.clone(),
            preferences,
            localizer,
            user_id,
            installed,
            store,
        })
    }

    pub fn preference_store(&self) -> &PreferenceStore {
        &self.store
    }

    /// Persists one preference and applies it to this context.
    pub async fn update_preference(
        &mut self,
        section: &str,
        key: &str,
        value: impl Into<PreferenceValue>,
    ) -> AppResult<()> {
        let value = value.into();
        self.store.update(self.scope, section, key, &value).await?;
        self.preferences.update(section, key, value);
        Ok(())
    }

    pub fn display_context(&self) -> DisplayContext<'_> {
        DisplayContext {
            date_mode: self.preferences.date_mode(),
            settings: &self.settings,
            localizer: self.localizer.as_ref(),
        }
    }
}
