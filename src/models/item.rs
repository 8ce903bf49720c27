use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ItemModel {
    pub id: i32,
    pub org_id: Option<i32>,
    pub former: bool,
    pub usr_id_create: Option<i32>,
    pub timestamp_create: NaiveDateTime,
    pub usr_id_change: Option<i32>,
    pub timestamp_change: Option<NaiveDateTime>,
}

impl ItemModel {
    pub const COLUMNS: &'static str = "imi_id AS id, imi_org_id AS org_id, \
        COALESCE(imi_former, FALSE) AS former, imi_usr_id_create AS usr_id_create, \
        imi_timestamp_create AS timestamp_create, imi_usr_id_change AS usr_id_change, \
        imi_timestamp_change AS timestamp_change";
}
