#![allow(dead_code)]

use std::env;
use std::sync::Arc;

use sqlx::PgPool;

use inventory_manager::config::{Config, HostSettings};
use inventory_manager::db::{create_pool, resolve_scope, EffectiveScope};
use inventory_manager::fields::FieldOrder;
use inventory_manager::l10n::{Localizer, MessageCatalog};
use inventory_manager::preferences::DEFAULT_DB_TOKEN;
use inventory_manager::services::{InstallService, ItemData};
use inventory_manager::{AppResult, RequestContext};

pub const ORG: i32 = 1;
pub const USER: i32 = 42;

/// Database fixture with its own table prefix. Returns `None` without
/// DATABASE_URL so the suite passes on machines without PostgreSQL.
pub struct TestEnv {
    pub pool: PgPool,
    pub config: Config,
    pub service: InstallService,
}

impl TestEnv {
    pub async fn init(name: &str) -> AppResult<Option<Self>> {
        dotenvy::dotenv().ok();
        let database_url = match env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("Skipping DB integration test: DATABASE_URL not set");
                return Ok(None);
            }
        };

        let config = Config {
            database_url,
            table_prefix: format!("t{}_{}", std::process::id(), name),
            organization_id: ORG,
            db_token: DEFAULT_DB_TOKEN.to_string(),
            max_connections: 4,
            settings: HostSettings::default(),
        };
        let pool = create_pool(&config.database_url, config.max_connections).await?;
        let localizer: Arc<dyn Localizer> = Arc::new(MessageCatalog::new());
        let service = InstallService::from_config(pool.clone(), &config, localizer)?;

        // leftovers of an aborted run with the same prefix
        service.uninstall(resolve_scope(ORG), true).await?;

        Ok(Some(Self {
            pool,
            config,
            service,
        }))
    }

    pub fn scope(&self) -> EffectiveScope {
        resolve_scope(ORG)
    }

    pub async fn context(&self, organization_id: i32) -> AppResult<RequestContext> {
        RequestContext::load(
            self.pool.clone(),
            &self.config,
            organization_id,
            Some(USER),
            Arc::new(MessageCatalog::new()),
        )
        .await
    }

    pub async fn items(&self) -> AppResult<ItemData> {
        ItemData::open(self.context(ORG).await?, FieldOrder::Sequence).await
    }

    /// Creates and saves an item with the given values.
    pub async fn create_item(&self, values: &[(&str, &str)]) -> AppResult<i32> {
        let mut item = self.items().await?;
        item.read_item_data(0).await?;
        for (name, value) in values {
            assert!(item.set_value(name, value).await?, "{name} rejected {value}");
        }
        let id = item.get_new_item_id().await?;
        item.save_item_data().await?;
        Ok(id)
    }

    pub async fn count(&self, sql: &str, id: i32) -> AppResult<i64> {
        let count = sqlx::query_scalar(sql).bind(id).fetch_one(&self.pool).await?;
        Ok(count)
    }

    pub async fn cleanup(self) -> AppResult<()> {
        self.service.uninstall(self.scope(), true).await?;
        Ok(())
    }
}
