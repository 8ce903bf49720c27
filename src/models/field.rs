use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct FieldModel {
    pub id: i32,
    pub org_id: Option<i32>,
    pub field_type: String,
    pub name: String,
    pub name_intern: String,
    pub sequence: i32,
    pub system: bool,
    pub mandatory: bool,
    pub description: String,
    pub value_list: Option<String>,
}

impl FieldModel {
    pub const COLUMNS: &'static str = "imf_id AS id, imf_org_id AS org_id, imf_type AS field_type, \
        imf_name AS name, imf_name_intern AS name_intern, imf_sequence AS sequence, \
        imf_system AS system, imf_mandatory AS mandatory, imf_description AS description, \
        imf_value_list AS value_list";
}
