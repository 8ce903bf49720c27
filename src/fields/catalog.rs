use std::collections::HashMap;

use serde::Serialize;
use sqlx::PgPool;

use crate::db::{EffectiveScope, Tables};
use crate::error::{AppError, AppResult};
use crate::fields::{FieldType, ValidationContext};
use crate::models::FieldModel;
use crate::preferences::PluginConfig;

/// A field row with its type resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDefinition {
    pub id: i32,
    pub org_id: Option<i32>,
    pub field_type: FieldType,
    pub name: String,
    pub name_intern: String,
    pub sequence: i32,
    pub system: bool,
    pub mandatory: bool,
    pub description: String,
    pub value_list: Option<String>,
}

impl TryFrom<FieldModel> for FieldDefinition {
    type Error = AppError;

    fn try_from(model: FieldModel) -> Result<Self, Self::Error> {
        Ok(Self {
            field_type: model.field_type.parse()?,
            id: model.id,
            org_id: model.org_id,
            name: model.name,
            name_intern: model.name_intern,
            sequence: model.sequence,
            system: model.system,
            mandatory: model.mandatory,
            description: model.description,
            value_list: model.value_list,
        })
    }
}

impl FieldDefinition {
    pub fn validation_context<'a>(&'a self, preferences: &PluginConfig) -> ValidationContext<'a> {
        ValidationContext {
            date_mode: preferences.date_mode(),
            allow_negative_numbers: preferences.allow_negative_numbers(),
            value_list: self.value_list.as_deref(),
        }
    }
}

/// Column the catalog is read in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldOrder {
    Id,
    #[default]
    Sequence,
    Name,
}

impl FieldOrder {
    fn column(self) -> &'static str {
        match self {
            FieldOrder::Id => "imf_id",
            FieldOrder::Sequence => "imf_sequence",
            FieldOrder::Name => "imf_name",
        }
    }
}

/// Administrator supplied attributes of a new custom field.
#[derive(Debug, Clone, PartialEq)]
pub struct NewField {
    pub name: String,
    pub field_type: FieldType,
    pub description: String,
    pub mandatory: bool,
    pub value_list: Option<String>,
}

/// The fields visible to an organization, indexed by internal name.
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    fields: Vec<FieldDefinition>,
    by_name: HashMap<String, usize>,
}

impl FieldCatalog {
    pub fn from_models(models: Vec<FieldModel>) -> AppResult<Self> {
        let fields = models
            .into_iter()
            .map(FieldDefinition::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        let by_name = fields
            .iter()
            .enumerate()
            .map(|(pos, f)| (f.name_intern.clone(), pos))
            .collect();
        Ok(Self { fields, by_name })
    }

    pub async fn load(
        pool: &PgPool,
        tables: &Tables,
        scope: EffectiveScope,
        order: FieldOrder,
    ) -> AppResult<Self> {
        let query = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {}, imf_id",
            FieldModel::COLUMNS,
            tables.fields,
            scope.visible("imf_org_id", 1),
            order.column()
        );
        let models: Vec<FieldModel> = sqlx::query_as(&query)
            .bind(scope.organization_id())
            .fetch_all(pool)
            .await?;
        Self::from_models(models)
    }

    pub fn get(&self, name_intern: &str) -> Option<&FieldDefinition> {
        self.by_name.get(name_intern).map(|&pos| &self.fields[pos])
    }

    pub fn by_id(&self, id: i32) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn next_sequence(&self) -> i32 {
        self.fields
            .iter()
            .map(|f| f.sequence + 1)
            .max()
            .unwrap_or(0)
    }

    /// Derives an unused internal name from a display name:
    /// `"Größe"` becomes `GROESSE`, a clash with an existing name gets `_2`,
    /// `_3`, ... appended.
    pub fn generate_name_intern(&self, name: &str) -> String {
        let base = intern_base(name);
        if self.get(&base).is_none() {
            return base;
        }
        (2..)
            .map(|n| format!("{base}_{n}"))
            .find(|candidate| self.get(candidate).is_none())
            .unwrap_or(base)
    }

    /// Inserts an administrator field at the end of the catalog and returns it.
    pub async fn create_custom_field(
        &mut self,
        pool: &PgPool,
        tables: &Tables,
        scope: EffectiveScope,
        field: NewField,
        user_id: Option<i32>,
    ) -> AppResult<FieldDefinition> {
        if field.name.trim().is_empty() {
            return Err(AppError::InvalidInput("field name is required".to_string()));
        }
        let name_intern = self.generate_name_intern(&field.name);
        let sequence = self.next_sequence();

        let query = format!(
            r#"
            INSERT INTO {} (imf_org_id, imf_type, imf_name, imf_name_intern, imf_sequence,
                imf_system, imf_mandatory, imf_description, imf_value_list, imf_usr_id_create)
            VALUES ($1, $2, $3, $4, $5, FALSE, $6, $7, $8, $9)
            RETURNING {}
            "#,
            tables.fields,
            FieldModel::COLUMNS
        );
        let model: FieldModel = sqlx::query_as(&query)
            .bind(scope.organization_id())
            .bind(field.field_type.as_str())
            .bind(&field.name)
            .bind(&name_intern)
            .bind(sequence)
            .bind(field.mandatory)
            .bind(&field.description)
            .bind(&field.value_list)
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        tracing::info!(
            "Created field {} (id {}) for organization {}",
            model.name_intern,
            model.id,
            scope.organization_id()
        );

        let definition = FieldDefinition::try_from(model)?;
        self.by_name
            .insert(definition.name_intern.clone(), self.fields.len());
        self.fields.push(definition.clone());
        Ok(definition)
    }
}

fn intern_base(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        match c {
            'ä' | 'Ä' => out.push_str("AE"),
            'ö' | 'Ö' => out.push_str("OE"),
            'ü' | 'Ü' => out.push_str("UE"),
            'ß' => out.push_str("SS"),
            ' ' => out.push('_'),
            _ => out.extend(c.to_uppercase()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(id: i32, name_intern: &str, field_type: &str, sequence: i32) -> FieldModel {
        FieldModel {
            id,
            org_id: Some(1),
            field_type: field_type.to_string(),
            name: format!("PIM_{name_intern}"),
            name_intern: name_intern.to_string(),
            sequence,
            system: true,
            mandatory: false,
            description: String::new(),
            value_list: None,
        }
    }

    #[test]
    fn test_lookup() {
        let catalog = FieldCatalog::from_models(vec![
            model(4, "ITEMNAME", "TEXT", 0),
            model(9, "RECEIVED_ON", "DATE", 1),
        ])
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("RECEIVED_ON").unwrap().field_type, FieldType::Date);
        assert_eq!(catalog.by_id(4).unwrap().name_intern, "ITEMNAME");
        assert!(catalog.get("MISSING").is_none());
        assert_eq!(catalog.next_sequence(), 2);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result = FieldCatalog::from_models(vec![model(1, "X", "HOLOGRAM", 0)]);
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_generate_name_intern() {
        let catalog = FieldCatalog::from_models(vec![
            model(1, "SERIAL_NUMBER", "TEXT", 0),
            model(2, "SERIAL_NUMBER_2", "TEXT", 1),
        ])
        .unwrap();
        assert_eq!(catalog.generate_name_intern("Größe"), "GROESSE");
        assert_eq!(catalog.generate_name_intern(" serial number "), "SERIAL_NUMBER_3");
        assert_eq!(FieldCatalog::default().next_sequence(), 0);
    }
}
