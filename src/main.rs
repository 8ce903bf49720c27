use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inventory_manager::config::Config;
use inventory_manager::db::{create_pool, resolve_scope};
use inventory_manager::fields::{FieldCatalog, FieldOrder};
use inventory_manager::l10n::{Localizer, MessageCatalog};
use inventory_manager::services::InstallService;

/// Maintenance tool for the inventory manager tables of one installation.
#[derive(Parser, Debug)]
#[command(name = "inventory-manager", version)]
struct Cli {
    /// Organization to operate on (defaults to ORGANIZATION_ID)
    #[arg(long = "org", global = true)]
    organization_id: Option<i32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create missing tables, reconcile fields and preferences
    Install,
    /// Report whether an install pass is needed
    Check,
    /// Print the field catalog
    Fields {
        #[arg(long, value_enum, default_value_t = Order::Sequence)]
        order: Order,
    },
    /// Print the decoded preferences as JSON
    Preferences,
    /// Remove item data and configuration
    Uninstall {
        #[arg(long = "all-orgs")]
        all_organizations: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Order {
    Id,
    Sequence,
    Name,
}

impl From<Order> for FieldOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Id => FieldOrder::Id,
            Order::Sequence => FieldOrder::Sequence,
            Order::Name => FieldOrder::Name,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inventory_manager=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("DATABASE_URL not set")?;
    let scope = resolve_scope(cli.organization_id.unwrap_or(config.organization_id));

    let pool = create_pool(&config.database_url, config.max_connections)
        .await
        .context("could not connect to db")?;
    tracing::debug!("Database connection established");

    let localizer: Arc<dyn Localizer> = Arc::new(MessageCatalog::new());
    let service = InstallService::from_config(pool.clone(), &config, localizer)?;

    match cli.command {
        Command::Install => {
            let report = service.init(scope).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Check => {
            let needed = service.check_for_update(scope).await?;
            println!("{}", if needed { "update required" } else { "up to date" });
        }
        Command::Fields { order } => {
            let catalog = FieldCatalog::load(&pool, service.tables(), scope, order.into()).await?;
            let fields: Vec<_> = catalog.iter().collect();
            println!("{}", serde_json::to_string_pretty(&fields)?);
        }
        Command::Preferences => match service.preference_store().read(scope).await? {
            Some(preferences) => println!("{}", serde_json::to_string_pretty(&preferences)?),
            None => println!("not installed"),
        },
        Command::Uninstall { all_organizations } => {
            let report = service.uninstall(scope, all_organizations).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
