use sqlx::{PgConnection, PgPool};

use crate::db::{lock_field_catalog, EffectiveScope, Tables};
use crate::error::AppResult;
use crate::fields::reconcile::{plan, FieldDraft, RemapReport};
use crate::fields::DefaultField;
use crate::l10n::Localizer;
use crate::models::FieldModel;

/// Rewrites the organization's field catalog from `defaults` and repoints
/// stored values at the new field ids.
///
/// Runs in one transaction holding the organization's catalog lock.
pub async fn reconcile_catalog(
    pool: &PgPool,
    tables: &Tables,
    scope: EffectiveScope,
    defaults: &[DefaultField],
    localizer: &dyn Localizer,
) -> AppResult<RemapReport> {
    let mut tx = pool.begin().await?;
    lock_field_catalog(&mut tx, scope).await?;

    let query = format!(
        "SELECT {} FROM {} WHERE {} ORDER BY imf_sequence, imf_id",
        FieldModel::COLUMNS,
        tables.fields,
        scope.owned("imf_org_id", 1)
    );
    let existing: Vec<FieldModel> = sqlx::query_as(&query)
        .bind(scope.organization_id())
        .fetch_all(&mut *tx)
        .await?;

    let plan = plan(&existing, defaults, localizer);

    let delete = format!(
        "DELETE FROM {} WHERE {}",
        tables.fields,
        scope.owned("imf_org_id", 1)
    );
    sqlx::query(&delete)
        .bind(scope.organization_id())
        .execute(&mut *tx)
        .await?;

    let mut new_ids = Vec::with_capacity(plan.fields.len());
    for draft in &plan.fields {
        new_ids.push(insert_field(&mut tx, tables, scope, draft).await?);
    }

    let report = RemapReport::build(&plan, &new_ids);
    apply_remap(&mut tx, tables, &report).await?;

    tx.commit().await?;

    tracing::info!(
        "Reconciled field catalog of organization {}: {} fields, {} created, {} remapped, {} dropped",
        scope.organization_id(),
        plan.fields.len(),
        report.created.len(),
        report.remapped.len(),
        report.orphaned.len()
    );
    for warning in report.warnings() {
        tracing::warn!("{}", warning);
    }

    Ok(report)
}

async fn insert_field(
    conn: &mut PgConnection,
    tables: &Tables,
    scope: EffectiveScope,
    draft: &FieldDraft,
) -> AppResult<i32> {
    let query = format!(
        r#"
        INSERT INTO {} (imf_org_id, imf_type, imf_name, imf_name_intern, imf_sequence,
            imf_system, imf_mandatory, imf_description, imf_value_list)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING imf_id
        "#,
        tables.fields
    );
    let id: i32 = sqlx::query_scalar(&query)
        .bind(scope.organization_id())
        .bind(&draft.field_type)
        .bind(&draft.name)
        .bind(&draft.name_intern)
        .bind(draft.sequence)
        .bind(draft.system)
        .bind(draft.mandatory)
        .bind(&draft.description)
        .bind(&draft.value_list)
        .fetch_one(conn)
        .await?;
    Ok(id)
}

/// Detaches value rows of dropped fields and points value and log rows of
/// moved fields at their new ids.
pub async fn apply_remap(
    conn: &mut PgConnection,
    tables: &Tables,
    report: &RemapReport,
) -> AppResult<()> {
    if !report.orphaned.is_empty() {
        let detach = format!(
            "UPDATE {} SET imd_imf_id = NULL WHERE imd_imf_id = ANY($1)",
            tables.data
        );
        let detached = sqlx::query(&detach)
            .bind(report.orphaned_ids())
            .execute(&mut *conn)
            .await?;
        tracing::debug!("Detached {} value rows", detached.rows_affected());
    }

    if !report.remapped.is_empty() {
        let old_ids = report.old_ids();
        let new_ids = report.new_ids();

        let data = format!(
            r#"
            UPDATE {} AS d SET imd_imf_id = m.new_id
            FROM UNNEST($1::int4[], $2::int4[]) AS m(old_id, new_id)
            WHERE d.imd_imf_id = m.old_id
            "#,
            tables.data
        );
        let moved = sqlx::query(&data)
            .bind(&old_ids)
            .bind(&new_ids)
            .execute(&mut *conn)
            .await?;

        let log = format!(
            r#"
            UPDATE {} AS l SET iml_imf_id = m.new_id
            FROM UNNEST($1::int4[], $2::int4[]) AS m(old_id, new_id)
            WHERE l.iml_imf_id = m.old_id
            "#,
            tables.log
        );
        sqlx::query(&log)
            .bind(&old_ids)
            .bind(&new_ids)
            .execute(&mut *conn)
            .await?;

        tracing::debug!("Repointed {} value rows", moved.rows_affected());
    }

    Ok(())
}
