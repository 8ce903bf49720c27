use std::collections::HashMap;

use serde::Serialize;

use crate::fields::{FieldCatalog, FieldDefinition, ValidationContext, ValidationError};
use crate::models::ItemDataModel;

/// A value of the loaded item, together with what the database holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedValue {
    pub row_id: Option<i32>,
    pub field_id: i32,
    pub value: String,
    persisted: String,
}

impl StagedValue {
    pub fn persisted(&self) -> &str {
        &self.persisted
    }

    pub fn is_dirty(&self) -> bool {
        self.value != self.persisted
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedValue {
    pub name_intern: String,
    pub field_id: i32,
    pub old_value: String,
    pub new_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    Unchanged,
    Changed(ChangedValue),
    Rejected(ValidationError),
}

/// In-memory values of one item, keyed by field id.
#[derive(Debug, Clone, Default)]
pub struct ItemValues {
    values: HashMap<i32, StagedValue>,
    changes: Vec<ChangedValue>,
}

impl ItemValues {
    /// Rows detached from their field are not addressable and are skipped.
    pub fn from_rows(rows: impl IntoIterator<Item = ItemDataModel>) -> Self {
        let values = rows
            .into_iter()
            .filter_map(|row| {
                let field_id = row.field_id?;
                Some((
                    field_id,
                    StagedValue {
                        row_id: Some(row.id),
                        field_id,
                        value: row.value.clone(),
                        persisted: row.value,
                    },
                ))
            })
            .collect();
        Self {
            values,
            changes: Vec::new(),
        }
    }

    /// Replaces the values with freshly read rows; the change history of the
    /// request is kept.
    pub fn refresh(&mut self, rows: impl IntoIterator<Item = ItemDataModel>) {
        let changes = std::mem::take(&mut self.changes);
        *self = Self::from_rows(rows);
        self.changes = changes;
    }

    pub fn get(&self, field_id: i32) -> &str {
        self.values
            .get(&field_id)
            .map(|v| v.value.as_str())
            .unwrap_or_default()
    }

    pub fn row_id(&self, field_id: i32) -> Option<i32> {
        self.values.get(&field_id).and_then(|v| v.row_id)
    }

    /// Validates and stages `raw`. Identical values are not staged again.
    pub fn assign(
        &mut self,
        field: &FieldDefinition,
        raw: &str,
        ctx: &ValidationContext<'_>,
    ) -> Assignment {
        let normalized = match field.field_type.validate(raw, ctx) {
            Ok(value) => value,
            Err(err) => return Assignment::Rejected(err),
        };
        let current = self.get(field.id);
        if current == normalized {
            return Assignment::Unchanged;
        }

        let change = ChangedValue {
            name_intern: field.name_intern.clone(),
            field_id: field.id,
            old_value: current.to_string(),
            new_value: normalized.clone(),
        };
        self.values
            .entry(field.id)
            .or_insert_with(|| StagedValue {
                row_id: None,
                field_id: field.id,
                value: String::new(),
                persisted: String::new(),
            })
            .value = normalized;
        self.changes.push(change.clone());
        Assignment::Changed(change)
    }

    /// Values differing from the database, ordered by field id.
    pub fn dirty(&self) -> Vec<&StagedValue> {
        let mut dirty: Vec<_> = self.values.values().filter(|v| v.is_dirty()).collect();
        dirty.sort_by_key(|v| v.field_id);
        dirty
    }

    pub fn has_changes(&self) -> bool {
        self.values.values().any(StagedValue::is_dirty)
    }

    pub fn changes(&self) -> &[ChangedValue] {
        &self.changes
    }

    /// First mandatory field left empty. New items need every mandatory
    /// field; existing items only fail on values cleared in this request.
    pub fn missing_mandatory<'a>(
        &self,
        catalog: &'a FieldCatalog,
        is_new: bool,
    ) -> Option<&'a FieldDefinition> {
        catalog.iter().find(|field| {
            field.mandatory
                && self.get(field.id).is_empty()
                && (is_new
                    || self
                        .values
                        .get(&field.id)
                        .is_some_and(StagedValue::is_dirty))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldType, ValidationContext};
    use crate::models::FieldModel;

    fn catalog() -> FieldCatalog {
        let field = |id: i32, intern: &str, field_type: &str, mandatory: bool| FieldModel {
            id,
            org_id: Some(1),
            field_type: field_type.to_string(),
            name: format!("PIM_{intern}"),
            name_intern: intern.to_string(),
            sequence: id,
            system: true,
            mandatory,
            description: String::new(),
            value_list: None,
        };
        FieldCatalog::from_models(vec![
            field(1, "ITEMNAME", "TEXT", true),
            field(2, "KEEPER", "TEXT", false),
            field(3, "RECEIVED_ON", "DATE", false),
        ])
        .unwrap()
    }

    fn row(id: i32, field_id: Option<i32>, value: &str) -> ItemDataModel {
        ItemDataModel {
            id,
            field_id,
            item_id: 10,
            value: value.to_string(),
        }
    }

    #[test]
    fn test_same_value_twice_is_staged_once() {
        let catalog = catalog();
        let itemname = catalog.get("ITEMNAME").unwrap();
        let ctx = ValidationContext::default();
        let mut values = ItemValues::default();

        assert!(matches!(values.assign(itemname, "Drill", &ctx), Assignment::Changed(_)));
        assert_eq!(values.assign(itemname, "Drill", &ctx), Assignment::Unchanged);
        assert_eq!(values.changes().len(), 1);
        assert_eq!(values.get(itemname.id), "Drill");
    }

    #[test]
    fn test_loaded_rows_are_clean() {
        let values = ItemValues::from_rows(vec![row(5, Some(1), "Saw"), row(6, None, "orphan")]);
        assert_eq!(values.get(1), "Saw");
        assert_eq!(values.row_id(1), Some(5));
        assert!(!values.has_changes());
        assert!(values.dirty().is_empty());
    }

    #[test]
    fn test_refresh_keeps_changes() {
        let catalog = catalog();
        let mut values = ItemValues::default();
        values.assign(catalog.get("ITEMNAME").unwrap(), "Drill", &ValidationContext::default());
        values.refresh(vec![row(11, Some(1), "Drill")]);
        assert!(!values.has_changes());
        assert_eq!(values.row_id(1), Some(11));
        assert_eq!(values.changes().len(), 1);
    }

    #[test]
    fn test_clearing_marks_row_dirty() {
        let catalog = catalog();
        let keeper = catalog.get("KEEPER").unwrap();
        let mut values = ItemValues::from_rows(vec![row(7, Some(2), "42")]);

        let change = values.assign(keeper, "", &ValidationContext::default());
        assert_eq!(
            change,
            Assignment::Changed(ChangedValue {
                name_intern: "KEEPER".into(),
                field_id: 2,
                old_value: "42".into(),
                new_value: String::new(),
            })
        );
        let dirty = values.dirty();
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty[0].row_id, Some(7));
        assert_eq!(dirty[0].persisted(), "42");
    }

    #[test]
    fn test_rejected_value_is_not_staged() {
        let catalog = catalog();
        let received = catalog.get("RECEIVED_ON").unwrap();
        assert_eq!(received.field_type, FieldType::Date);
        let mut values = ItemValues::default();
        let outcome = values.assign(received, "yesterday", &ValidationContext::default());
        assert!(matches!(outcome, Assignment::Rejected(ValidationError::InvalidDate(_))));
        assert!(!values.has_changes());
    }

    #[test]
    fn test_missing_mandatory() {
        let catalog = catalog();
        let ctx = ValidationContext::default();

        let mut fresh = ItemValues::default();
        assert_eq!(fresh.missing_mandatory(&catalog, true).unwrap().name_intern, "ITEMNAME");
        fresh.assign(catalog.get("ITEMNAME").unwrap(), "Drill", &ctx);
        assert!(fresh.missing_mandatory(&catalog, true).is_none());

        let mut legacy = ItemValues::from_rows(vec![row(8, Some(2), "7")]);
        assert!(legacy.missing_mandatory(&catalog, false).is_none());

        let mut loaded = ItemValues::from_rows(vec![row(9, Some(1), "Drill")]);
        loaded.assign(catalog.get("ITEMNAME").unwrap(), "", &ctx);
        assert!(loaded.missing_mandatory(&catalog, false).is_some());
        legacy.assign(catalog.get("KEEPER").unwrap(), "8", &ctx);
        assert!(legacy.missing_mandatory(&catalog, false).is_none());
    }
}
