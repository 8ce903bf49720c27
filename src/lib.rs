pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod fields;
pub mod items;
pub mod l10n;
pub mod models;
pub mod preferences;
pub mod services;
pub mod version;

pub use config::Config;
pub use context::RequestContext;
pub use error::{AppError, AppResult};
