//! Merging the built-in field defaults into an organization's catalog.
//!
//! Planning is pure: [`plan`] takes the persisted rows and returns the merged
//! catalog in its final order. Persisting the plan assigns new ids, and
//! [`RemapReport::build`] records how old ids map to new ones so the value
//! rows can be rewritten afterwards.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::fields::{is_system_name, DefaultField};
use crate::l10n::Localizer;
use crate::models::FieldModel;

/// A field row as it will be written by the reconciliation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDraft {
    /// Id of the row this draft replaces, `None` for new system fields.
    pub previous_id: Option<i32>,
    pub field_type: String,
    pub name: String,
    pub name_intern: String,
    pub description: String,
    pub sequence: i32,
    pub system: bool,
    pub mandatory: bool,
    pub value_list: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedField {
    pub id: i32,
    pub name_intern: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcilePlan {
    /// Merged catalog ordered by sequence, numbered `0..n`.
    pub fields: Vec<FieldDraft>,
    /// System rows without a counterpart in the defaults.
    pub dropped: Vec<DroppedField>,
}

pub fn plan(
    existing: &[FieldModel],
    defaults: &[DefaultField],
    localizer: &dyn Localizer,
) -> ReconcilePlan {
    let mut ordered: Vec<&FieldModel> = existing.iter().collect();
    ordered.sort_by_key(|f| (f.sequence, f.id));

    let mut system: HashMap<&str, &FieldModel> = HashMap::new();
    let mut customs: Vec<(&FieldModel, Option<&str>)> = Vec::new();
    for (pos, &field) in ordered.iter().enumerate() {
        if is_system_name(&field.name) {
            system.entry(field.name_intern.as_str()).or_insert(field);
        } else {
            let predecessor = pos
                .checked_sub(1)
                .map(|p| ordered[p].name_intern.as_str());
            customs.push((field, predecessor));
        }
    }

    let mut merged: Vec<FieldDraft> = defaults
        .iter()
        .enumerate()
        .map(|(rank, default)| {
            let current = system.get(default.name_intern).copied();
            let value_list = current
                .and_then(|f| f.value_list.clone())
                .filter(|list| !list.is_empty())
                .or_else(|| default.value_list.map(str::to_string));
            FieldDraft {
                previous_id: current.map(|f| f.id),
                field_type: default.field_type.as_str().to_string(),
                name: default.name.to_string(),
                name_intern: default.name_intern.to_string(),
                description: localizer.localize(&default.description_key()),
                sequence: rank as i32,
                system: true,
                mandatory: default.mandatory,
                value_list,
            }
        })
        .collect();

    let kept: HashSet<i32> = merged.iter().filter_map(|f| f.previous_id).collect();
    let dropped = ordered
        .iter()
        .filter(|f| is_system_name(&f.name) && !kept.contains(&f.id))
        .map(|f| DroppedField {
            id: f.id,
            name_intern: f.name_intern.clone(),
        })
        .collect();

    for (field, predecessor) in customs {
        let target = match predecessor {
            None => 0,
            Some(name) => match merged.iter().find(|f| f.name_intern == name) {
                Some(anchor) => anchor.sequence + 1,
                None => (field.sequence - 1).max(0),
            },
        };
        for f in merged.iter_mut().filter(|f| f.sequence >= target) {
            f.sequence += 1;
        }
        merged.push(FieldDraft {
            previous_id: Some(field.id),
            field_type: field.field_type.clone(),
            name: field.name.clone(),
            name_intern: field.name_intern.clone(),
            description: field.description.clone(),
            sequence: target,
            system: field.system,
            mandatory: field.mandatory,
            value_list: field.value_list.clone(),
        });
    }

    merged.sort_by_key(|f| f.sequence);
    for (pos, field) in merged.iter_mut().enumerate() {
        field.sequence = pos as i32;
    }

    ReconcilePlan {
        fields: merged,
        dropped,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRemap {
    pub name_intern: String,
    pub old_id: i32,
    pub new_id: i32,
}

/// Outcome of a reconciliation pass: which field ids moved, which fields were
/// created and which disappeared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemapReport {
    pub remapped: Vec<FieldRemap>,
    pub created: Vec<String>,
    pub orphaned: Vec<DroppedField>,
}

impl RemapReport {
    /// `new_ids[i]` is the id the row of `plan.fields[i]` received.
    pub fn build(plan: &ReconcilePlan, new_ids: &[i32]) -> Self {
        let mut report = RemapReport {
            orphaned: plan.dropped.clone(),
            ..Default::default()
        };
        for (draft, &new_id) in plan.fields.iter().zip(new_ids) {
            match draft.previous_id {
                Some(old_id) if old_id != new_id => report.remapped.push(FieldRemap {
                    name_intern: draft.name_intern.clone(),
                    old_id,
                    new_id,
                }),
                Some(_) => {}
                None => report.created.push(draft.name_intern.clone()),
            }
        }
        report
    }

    pub fn old_ids(&self) -> Vec<i32> {
        self.remapped.iter().map(|r| r.old_id).collect()
    }

    pub fn new_ids(&self) -> Vec<i32> {
        self.remapped.iter().map(|r| r.new_id).collect()
    }

    pub fn orphaned_ids(&self) -> Vec<i32> {
        self.orphaned.iter().map(|f| f.id).collect()
    }

    pub fn has_reference_changes(&self) -> bool {
        !self.remapped.is_empty() || !self.orphaned.is_empty()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.orphaned
            .iter()
            .map(|f| {
                format!(
                    "Field {} (id {}) no longer exists. Its stored values were detached; please check them manually.",
                    f.name_intern, f.id
                )
            })
            .collect()
    }
}
