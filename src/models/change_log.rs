use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ChangeLogModel {
    pub id: i32,
    pub item_id: i32,
    pub field_id: i32,
    pub value_old: String,
    pub value_new: String,
    pub usr_id_create: Option<i32>,
    pub timestamp_create: NaiveDateTime,
    pub comment: String,
}

impl ChangeLogModel {
    pub const COLUMNS: &'static str = "iml_id AS id, iml_imi_id AS item_id, iml_imf_id AS field_id, \
        iml_value_old AS value_old, iml_value_new AS value_new, iml_usr_id_create AS usr_id_create, \
        iml_timestamp_create AS timestamp_create, iml_comment AS comment";
}
