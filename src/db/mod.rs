pub mod lock;
pub mod pool;
pub mod scope;
pub mod tables;

pub use lock::{lock_field_catalog, FIELD_CATALOG_LOCK_CLASS};
pub use pool::create_pool;
pub use scope::{resolve_scope, EffectiveScope, DEFAULT_ORGANIZATION_ID};
pub use tables::Tables;
