use crate::fields::FieldType;

/// Display names of system fields carry this prefix; custom fields never do.
pub const SYSTEM_NAME_PREFIX: &str = "PIM_";

/// Built-in field descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultField {
    pub name: &'static str,
    pub name_intern: &'static str,
    pub field_type: FieldType,
    pub mandatory: bool,
    pub value_list: Option<&'static str>,
}

impl DefaultField {
    pub fn description_key(&self) -> String {
        format!("{}_DESCRIPTION", self.name)
    }
}

/// The system fields in their canonical order; the position is the default
/// sequence.
pub const DEFAULT_FIELDS: [DefaultField; 7] = [
    DefaultField {
        name: "PIM_ITEMNAME",
        name_intern: "ITEMNAME",
        field_type: FieldType::Text,
        mandatory: true,
        value_list: None,
    },
    DefaultField {
        name: "PIM_CATEGORY",
        name_intern: "CATEGORY",
        field_type: FieldType::Dropdown,
        mandatory: true,
        value_list: Some("Allgemein"),
    },
    DefaultField {
        name: "PIM_KEEPER",
        name_intern: "KEEPER",
        field_type: FieldType::Text,
        mandatory: false,
        value_list: None,
    },
    DefaultField {
        name: "PIM_IN_INVENTORY",
        name_intern: "IN_INVENTORY",
        field_type: FieldType::Checkbox,
        mandatory: false,
        value_list: None,
    },
    DefaultField {
        name: "PIM_LAST_RECEIVER",
        name_intern: "LAST_RECEIVER",
        field_type: FieldType::Text,
        mandatory: false,
        value_list: None,
    },
    DefaultField {
        name: "PIM_RECEIVED_ON",
        name_intern: "RECEIVED_ON",
        field_type: FieldType::Date,
        mandatory: false,
        value_list: None,
    },
    DefaultField {
        name: "PIM_RECEIVED_BACK_ON",
        name_intern: "RECEIVED_BACK_ON",
        field_type: FieldType::Date,
        mandatory: false,
        value_list: None,
    },
];

pub fn is_system_name(name: &str) -> bool {
    name.starts_with(SYSTEM_NAME_PREFIX)
}
