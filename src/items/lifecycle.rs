use serde::Serialize;

/// Where an item handle stands between loading and persisting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ItemState {
    #[default]
    Unbound,
    New,
    Created,
    Loaded,
    Changed,
    Saved,
    Deleted,
    MadeFormer,
    UndoneFormer,
}

impl ItemState {
    /// States in which values may be staged.
    pub fn accepts_values(self) -> bool {
        matches!(
            self,
            ItemState::New | ItemState::Created | ItemState::Loaded | ItemState::Changed | ItemState::Saved
        )
    }
}

/// Notification-worthy outcome of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ItemEvent {
    Imported,
    Created,
    Deleted,
    MadeFormer,
    Changed,
}

impl ItemEvent {
    pub fn subject_key(self) -> &'static str {
        match self {
            ItemEvent::Imported => "PLG_INVENTORY_MANAGER_NOTIFICATION_SUBJECT_ITEMS_IMPORTED",
            ItemEvent::Created => "PLG_INVENTORY_MANAGER_NOTIFICATION_SUBJECT_ITEM_CREATED",
            ItemEvent::Deleted => "PLG_INVENTORY_MANAGER_NOTIFICATION_SUBJECT_ITEM_DELETED",
            ItemEvent::MadeFormer => "PLG_INVENTORY_MANAGER_NOTIFICATION_SUBJECT_ITEM_MADE_FORMER",
            ItemEvent::Changed => "PLG_INVENTORY_MANAGER_NOTIFICATION_SUBJECT_ITEM_CHANGED",
        }
    }

    pub fn message_key(self) -> &'static str {
        match self {
            ItemEvent::Imported => "PLG_INVENTORY_MANAGER_NOTIFICATION_MESSAGE_ITEMS_IMPORTED",
            ItemEvent::Created => "PLG_INVENTORY_MANAGER_NOTIFICATION_MESSAGE_ITEM_CREATED",
            ItemEvent::Deleted => "PLG_INVENTORY_MANAGER_NOTIFICATION_MESSAGE_ITEM_DELETED",
            ItemEvent::MadeFormer => "PLG_INVENTORY_MANAGER_NOTIFICATION_MESSAGE_ITEM_MADE_FORMER",
            ItemEvent::Changed => "PLG_INVENTORY_MANAGER_NOTIFICATION_MESSAGE_ITEM_CHANGED",
        }
    }

    /// Whether the message lists the changed values.
    pub fn lists_changes(self) -> bool {
        matches!(self, ItemEvent::Imported | ItemEvent::Created | ItemEvent::Changed)
    }
}

/// What happened to the item during this request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleFlags {
    pub imported: bool,
    pub created: bool,
    pub deleted: bool,
    pub made_former: bool,
    pub changed: bool,
}

impl LifecycleFlags {
    /// Picks the single event to report: imported, then created, deleted,
    /// made former and changed.
    pub fn classify(&self) -> Option<ItemEvent> {
        if self.imported {
            Some(ItemEvent::Imported)
        } else if self.created {
            Some(ItemEvent::Created)
        } else if self.deleted {
            Some(ItemEvent::Deleted)
        } else if self.made_former {
            Some(ItemEvent::MadeFormer)
        } else if self.changed {
            Some(ItemEvent::Changed)
        } else {
            None
        }
    }
}
