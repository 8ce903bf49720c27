use serde::Serialize;

use crate::fields::{DisplayContext, FieldCatalog, ValueFormat};
use crate::items::{ChangedValue, ItemEvent};

/// One line of the change table in a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRow {
    pub field: String,
    pub old_value: String,
    pub new_value: String,
}

/// Everything the host mailer needs to announce an item event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationDraft {
    pub event: ItemEvent,
    pub subject_key: &'static str,
    pub message_key: &'static str,
    pub item_name: String,
    pub changes: Vec<ChangeRow>,
}

impl NotificationDraft {
    pub fn build(
        event: ItemEvent,
        item_name: String,
        changes: &[ChangedValue],
        catalog: &FieldCatalog,
        ctx: &DisplayContext<'_>,
    ) -> Self {
        let rows = if event.lists_changes() {
            changes
                .iter()
                .filter(|c| c.old_value != c.new_value)
                .map(|c| change_row(c, catalog, ctx))
                .collect()
        } else {
            Vec::new()
        };
        Self {
            event,
            subject_key: event.subject_key(),
            message_key: event.message_key(),
            item_name,
            changes: rows,
        }
    }
}

fn change_row(change: &ChangedValue, catalog: &FieldCatalog, ctx: &DisplayContext<'_>) -> ChangeRow {
    let Some(field) = catalog.get(&change.name_intern) else {
        return ChangeRow {
            field: change.name_intern.clone(),
            old_value: change.old_value.clone(),
            new_value: change.new_value.clone(),
        };
    };

    let render = |value: &str| {
        if change.name_intern == "IN_INVENTORY" {
            match value {
                "1" => return ctx.localizer.localize("SYS_YES"),
                "0" => return ctx.localizer.localize("SYS_NO"),
                _ => {}
            }
        }
        field
            .field_type
            .format(value, ValueFormat::Text, field.value_list.as_deref(), ctx)
    };

    ChangeRow {
        field: ctx.localizer.localize(&field.name),
        old_value: render(&change.old_value),
        new_value: render(&change.new_value),
    }
}
