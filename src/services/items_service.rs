use sqlx::PgConnection;

use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::fields::{FieldCatalog, FieldOrder, ValidationError, ValueFormat};
use crate::items::{
    Assignment, ChangedValue, ItemEvent, ItemState, ItemValues, LifecycleFlags, NotificationDraft,
};
use crate::models::{ChangeLogModel, ItemDataModel, ItemModel};

/// Handle on one inventory item of the request's organization.
///
/// Bind it with [`ItemData::read_item_data`] (`0` starts a new item), stage
/// values with [`ItemData::set_value`] and persist them with
/// [`ItemData::save_item_data`].
pub struct ItemData {
    ctx: RequestContext,
    fields: FieldCatalog,
    item_id: i32,
    values: ItemValues,
    state: ItemState,
    flags: LifecycleFlags,
    /// Edits of a new item, logged once the item has an id.
    pending_log: Vec<ChangedValue>,
}

impl ItemData {
    pub async fn open(ctx: RequestContext, order: FieldOrder) -> AppResult<Self> {
        let fields = FieldCatalog::load(&ctx.pool, &ctx.tables, ctx.scope, order).await?;
        Ok(Self {
            ctx,
            fields,
            item_id: 0,
            values: ItemValues::default(),
            state: ItemState::Unbound,
            flags: LifecycleFlags::default(),
            pending_log: Vec::new(),
        })
    }

    pub async fn read_fields(&mut self, order: FieldOrder) -> AppResult<()> {
        self.fields = FieldCatalog::load(&self.ctx.pool, &self.ctx.tables, self.ctx.scope, order).await?;
        Ok(())
    }

    pub fn fields(&self) -> &FieldCatalog {
        &self.fields
    }

    pub fn context(&self) -> &RequestContext {
        &self.ctx
    }

    pub fn item_id(&self) -> i32 {
        self.item_id
    }

    pub fn state(&self) -> ItemState {
        self.state
    }

    pub fn changed_values(&self) -> &[ChangedValue] {
        self.values.changes()
    }

    pub async fn read_item_data(&mut self, item_id: i32) -> AppResult<()> {
        self.values = ItemValues::default();
        self.pending_log.clear();

        if item_id == 0 {
            self.item_id = 0;
            self.state = ItemState::New;
            self.flags.created = true;
            return Ok(());
        }

        if self.find_item(item_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Item {} not found", item_id)));
        }
        self.item_id = item_id;
        let rows = self.load_rows(self.item_id).await?;
        self.values = ItemValues::from_rows(rows);
        self.state = ItemState::Loaded;
        Ok(())
    }

    async fn find_item(&self, item_id: i32) -> AppResult<Option<ItemModel>> {
        let query = format!(
            "SELECT {} FROM {} WHERE imi_id = $1 AND {}",
            ItemModel::COLUMNS,
            self.ctx.tables.items,
            self.ctx.scope.visible("imi_org_id", 2)
        );
        let item = sqlx::query_as(&query)
            .bind(item_id)
            .bind(self.ctx.scope.organization_id())
            .fetch_optional(&self.ctx.pool)
            .await?;
        Ok(item)
    }

    async fn load_rows(&self, item_id: i32) -> AppResult<Vec<ItemDataModel>> {
        let query = format!(
            r#"
            SELECT {} FROM {}
            INNER JOIN {} ON imf_id = imd_imf_id
            WHERE imd_imi_id = $1 AND {}
            "#,
            ItemDataModel::COLUMNS,
            self.ctx.tables.data,
            self.ctx.tables.fields,
            self.ctx.scope.visible("imf_org_id", 2)
        );
        let rows = sqlx::query_as(&query)
            .bind(item_id)
            .bind(self.ctx.scope.organization_id())
            .fetch_all(&self.ctx.pool)
            .await?;
        Ok(rows)
    }

    /// Value of a field in the requested format; unknown fields read as empty.
    pub fn get_value(&self, name_intern: &str, format: ValueFormat) -> String {
        let Some(field) = self.fields.get(name_intern) else {
            return String::new();
        };
        field.field_type.format(
            self.values.get(field.id),
            format,
            field.value_list.as_deref(),
            &self.ctx.display_context(),
        )
    }

    /// Stages a new value. Returns `Ok(false)` when the value was rejected by
    /// the field type; an unchanged value is accepted without side effects.
    pub async fn set_value(&mut self, name_intern: &str, new_value: &str) -> AppResult<bool> {
        if !self.state.accepts_values() {
            return Err(AppError::Precondition(format!(
                "cannot set {} on an item handle in state {:?}",
                name_intern, self.state
            )));
        }
        let field = self
            .fields
            .get(name_intern)
            .ok_or_else(|| AppError::NotFound(format!("Field {} not found", name_intern)))?;
        let validation = field.validation_context(&self.ctx.preferences);

        match self.values.assign(field, new_value, &validation) {
            Assignment::Unchanged => Ok(true),
            Assignment::Rejected(err) => {
                tracing::debug!("Rejected value for {}: {}", name_intern, err);
                Ok(false)
            }
            Assignment::Changed(change) => {
                if self.state == ItemState::Loaded || self.state == ItemState::Saved {
                    self.state = ItemState::Changed;
                }
                if self.ctx.settings.log_edit_fields {
                    if self.item_id > 0 {
                        let mut conn = self.ctx.pool.acquire().await?;
                        self.write_log(&mut conn, &change).await?;
                    } else {
                        self.pending_log.push(change);
                    }
                }
                Ok(true)
            }
        }
    }

    async fn write_log(&self, conn: &mut PgConnection, change: &ChangedValue) -> AppResult<()> {
        let query = format!(
            r#"
            INSERT INTO {} (iml_imi_id, iml_imf_id, iml_value_old, iml_value_new, iml_usr_id_create, iml_comment)
            VALUES ($1, $2, $3, $4, $5, '')
            "#,
            self.ctx.tables.log
        );
        sqlx::query(&query)
            .bind(self.item_id)
            .bind(change.field_id)
            .bind(&change.old_value)
            .bind(&change.new_value)
            .bind(self.ctx.user_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Writes all staged values in one transaction. Cleared values delete
    /// their row.
    pub async fn save_item_data(&mut self) -> AppResult<()> {
        if self.item_id == 0 {
            return Err(AppError::Precondition(
                "item has no id yet, call get_new_item_id first".to_string(),
            ));
        }
        if let Some(field) = self.values.missing_mandatory(&self.fields, self.flags.created) {
            return Err(AppError::validation(
                field.name_intern.clone(),
                ValidationError::Required,
            ));
        }

        let dirty: Vec<_> = self.values.dirty().into_iter().cloned().collect();
        let tables = &self.ctx.tables;
        let mut tx = self.ctx.pool.begin().await?;

        for value in &dirty {
            match (value.row_id, value.value.is_empty()) {
                (Some(row_id), true) => {
                    let query = format!("DELETE FROM {} WHERE imd_id = $1", tables.data);
                    sqlx::query(&query).bind(row_id).execute(&mut *tx).await?;
                }
                (None, true) => {}
                (Some(row_id), false) => {
                    let query = format!("UPDATE {} SET imd_value = $1 WHERE imd_id = $2", tables.data);
                    sqlx::query(&query)
                        .bind(&value.value)
                        .bind(row_id)
                        .execute(&mut *tx)
                        .await?;
                }
                (None, false) => {
                    let query = format!(
                        "INSERT INTO {} (imd_imf_id, imd_imi_id, imd_value) VALUES ($1, $2, $3)",
                        tables.data
                    );
                    sqlx::query(&query)
                        .bind(value.field_id)
                        .bind(self.item_id)
                        .bind(&value.value)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        for change in &self.pending_log {
            self.write_log(&mut tx, change).await?;
        }

        if !self.flags.created && !dirty.is_empty() {
            let query = format!(
                "UPDATE {} SET imi_usr_id_change = $1, imi_timestamp_change = CURRENT_TIMESTAMP WHERE imi_id = $2",
                tables.items
            );
            sqlx::query(&query)
                .bind(self.ctx.user_id)
                .bind(self.item_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        self.pending_log.clear();
        self.flags.changed = !dirty.is_empty();

        tracing::info!("Saved {} values of item {}", dirty.len(), self.item_id);

        let rows = self.load_rows(self.item_id).await?;
        self.values.refresh(rows);
        self.state = ItemState::Saved;
        Ok(())
    }

    /// Creates the item row for a new handle, after removing item rows of the
    /// organization that never received a value.
    pub async fn get_new_item_id(&mut self) -> AppResult<i32> {
        if self.state != ItemState::New {
            return Err(AppError::Precondition(format!(
                "item {} is not new (state {:?})",
                self.item_id, self.state
            )));
        }

        let tables = &self.ctx.tables;
        let scope = self.ctx.scope;
        let mut tx = self.ctx.pool.begin().await?;

        let reclaim = format!(
            "DELETE FROM {} WHERE {} AND NOT EXISTS (SELECT 1 FROM {} WHERE imd_imi_id = imi_id)",
            tables.items,
            scope.owned("imi_org_id", 1),
            tables.data
        );
        let reclaimed = sqlx::query(&reclaim)
            .bind(scope.organization_id())
            .execute(&mut *tx)
            .await?;

        let insert = format!(
            "INSERT INTO {} (imi_org_id, imi_former, imi_usr_id_create) VALUES ($1, FALSE, $2) RETURNING imi_id",
            tables.items
        );
        let item_id: i32 = sqlx::query_scalar(&insert)
            .bind(scope.organization_id())
            .bind(self.ctx.user_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        if reclaimed.rows_affected() > 0 {
            tracing::debug!("Reclaimed {} empty items", reclaimed.rows_affected());
        }
        tracing::info!("Created item {} for organization {}", item_id, scope.organization_id());

        self.item_id = item_id;
        self.state = ItemState::Created;
        self.flags.created = true;
        Ok(item_id)
    }

    /// Removes the item with its values and change log. The handle keeps the
    /// last values of the item for the notification.
    pub async fn delete_item(&mut self, item_id: i32) -> AppResult<()> {
        let last_values = if self.item_id == item_id {
            None
        } else {
            Some(self.load_rows(item_id).await?)
        };

        let tables = &self.ctx.tables;
        let scope = self.ctx.scope;
        let mut tx = self.ctx.pool.begin().await?;

        let query = format!(
            "DELETE FROM {} WHERE imi_id = $1 AND {}",
            tables.items,
            scope.visible("imi_org_id", 2)
        );
        let result = sqlx::query(&query)
            .bind(item_id)
            .bind(scope.organization_id())
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Item {} not found", item_id)));
        }

        for (table, column) in [(&tables.log, "iml_imi_id"), (&tables.data, "imd_imi_id")] {
            let query = format!("DELETE FROM {} WHERE {} = $1", table, column);
            sqlx::query(&query).bind(item_id).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        tracing::info!("Deleted item {}", item_id);

        if let Some(rows) = last_values {
            self.values = ItemValues::from_rows(rows);
        }
        self.pending_log.clear();
        self.item_id = item_id;
        self.state = ItemState::Deleted;
        self.flags.deleted = true;
        Ok(())
    }

    pub async fn make_item_former(&mut self, item_id: i32) -> AppResult<()> {
        self.set_former(item_id, true).await?;
        self.state = ItemState::MadeFormer;
        self.flags.made_former = true;
        Ok(())
    }

    pub async fn undo_item_former(&mut self, item_id: i32) -> AppResult<()> {
        self.set_former(item_id, false).await?;
        self.state = ItemState::UndoneFormer;
        self.flags.made_former = false;
        Ok(())
    }

    async fn set_former(&mut self, item_id: i32, former: bool) -> AppResult<()> {
        let query = format!(
            r#"
            UPDATE {} SET imi_former = $1, imi_usr_id_change = $2, imi_timestamp_change = CURRENT_TIMESTAMP
            WHERE imi_id = $3 AND {}
            "#,
            self.ctx.tables.items,
            self.ctx.scope.visible("imi_org_id", 4)
        );
        let result = sqlx::query(&query)
            .bind(former)
            .bind(self.ctx.user_id)
            .bind(item_id)
            .bind(self.ctx.scope.organization_id())
            .execute(&self.ctx.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Item {} not found", item_id)));
        }
        self.item_id = item_id;
        Ok(())
    }

    /// Marks the request as a bulk import for notification purposes.
    pub fn mark_imported(&mut self) {
        self.flags.imported = true;
    }

    pub fn notification_event(&self) -> Option<ItemEvent> {
        self.flags.classify()
    }

    pub fn notification(&self) -> Option<NotificationDraft> {
        let event = self.notification_event()?;
        Some(NotificationDraft::build(
            event,
            self.get_value("ITEMNAME", ValueFormat::Text),
            self.values.changes(),
            &self.fields,
            &self.ctx.display_context(),
        ))
    }

    /// Items of the organization that hold at least one value.
    pub async fn read_items(&self, show_former: bool) -> AppResult<Vec<ItemModel>> {
        let query = format!(
            r#"
            SELECT {} FROM {}
            WHERE {} AND ($2 OR NOT COALESCE(imi_former, FALSE))
              AND EXISTS (SELECT 1 FROM {} WHERE imd_imi_id = imi_id)
            ORDER BY imi_id
            "#,
            ItemModel::COLUMNS,
            self.ctx.tables.items,
            self.ctx.scope.visible("imi_org_id", 1),
            self.ctx.tables.data
        );
        let items = sqlx::query_as(&query)
            .bind(self.ctx.scope.organization_id())
            .bind(show_former)
            .fetch_all(&self.ctx.pool)
            .await?;
        Ok(items)
    }

    /// Items whose value in one of `field_names` is the given user id.
    pub async fn read_items_by_user(
        &self,
        user_id: i32,
        field_names: &[&str],
        show_former: bool,
    ) -> AppResult<Vec<ItemModel>> {
        let field_ids: Vec<i32> = field_names
            .iter()
            .filter_map(|name| self.fields.get(name))
            .map(|f| f.id)
            .collect();
        if field_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            r#"
            SELECT {} FROM {}
            WHERE {} AND ($2 OR NOT COALESCE(imi_former, FALSE))
              AND EXISTS (
                SELECT 1 FROM {} WHERE imd_imi_id = imi_id AND imd_imf_id = ANY($3) AND imd_value = $4
              )
            ORDER BY imi_id
            "#,
            ItemModel::COLUMNS,
            self.ctx.tables.items,
            self.ctx.scope.visible("imi_org_id", 1),
            self.ctx.tables.data
        );
        let items = sqlx::query_as(&query)
            .bind(self.ctx.scope.organization_id())
            .bind(show_former)
            .bind(&field_ids)
            .bind(user_id.to_string())
            .fetch_all(&self.ctx.pool)
            .await?;
        Ok(items)
    }

    /// Change history of an item, oldest entry first.
    pub async fn read_change_log(&self, item_id: i32) -> AppResult<Vec<ChangeLogModel>> {
        let query = format!(
            r#"
            SELECT {} FROM {}
            WHERE iml_imi_id = $1
              AND EXISTS (SELECT 1 FROM {} WHERE imi_id = iml_imi_id AND {})
            ORDER BY iml_timestamp_create, iml_id
            "#,
            ChangeLogModel::COLUMNS,
            self.ctx.tables.log,
            self.ctx.tables.items,
            self.ctx.scope.visible("imi_org_id", 2)
        );
        let entries = sqlx::query_as(&query)
            .bind(item_id)
            .bind(self.ctx.scope.organization_id())
            .fetch_all(&self.ctx.pool)
            .await?;
        Ok(entries)
    }
}
