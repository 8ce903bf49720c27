use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PreferenceRow {
    pub id: i32,
    pub org_id: Option<i32>,
    pub name: String,
    pub value: Option<String>,
}

impl PreferenceRow {
    pub const COLUMNS: &'static str =
        "plp_id AS id, plp_org_id AS org_id, plp_name AS name, plp_value AS value";
}
