use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One stored value of an item. `field_id` is NULL once the field was dropped
/// by a catalog reconciliation.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ItemDataModel {
    pub id: i32,
    pub field_id: Option<i32>,
    pub item_id: i32,
    pub value: String,
}

impl ItemDataModel {
    pub const COLUMNS: &'static str =
        "imd_id AS id, imd_imf_id AS field_id, imd_imi_id AS item_id, imd_value AS value";
}
