pub mod install_service;
pub mod items_service;

pub use install_service::{InstallReport, InstallService, UninstallReport};
pub use items_service::ItemData;
