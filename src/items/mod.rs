//! Item values, lifecycle and notification building.

pub mod lifecycle;
pub mod notification;
pub mod values;

pub use lifecycle::{ItemEvent, ItemState, LifecycleFlags};
pub use notification::{ChangeRow, NotificationDraft};
pub use values::{Assignment, ChangedValue, ItemValues, StagedValue};
