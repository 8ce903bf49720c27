//! Field catalog: types, built-in defaults and reconciliation.

pub mod catalog;
pub mod defaults;
pub mod html;
pub mod reconcile;
pub mod sync;
pub mod types;

pub use catalog::{FieldCatalog, FieldDefinition, FieldOrder, NewField};
pub use defaults::{is_system_name, DefaultField, DEFAULT_FIELDS, SYSTEM_NAME_PREFIX};
pub use reconcile::{plan, DroppedField, FieldDraft, FieldRemap, ReconcilePlan, RemapReport};
pub use sync::{apply_remap, reconcile_catalog};
pub use types::{
    list_entries, normalize_date, DisplayContext, FieldType, ValidationContext, ValidationError,
    ValueFormat, DATETIME_FORMAT, DATE_FORMAT, MAX_VALUE_LENGTH,
};
