use sqlx::PgConnection;

use crate::db::EffectiveScope;

/// First key of the two-key advisory lock guarding field catalog rewrites.
/// The second key is the organization id.
pub const FIELD_CATALOG_LOCK_CLASS: i32 = 0x494D_4601;

/// Serializes field catalog rewrites of one organization.
/// The lock is released when the surrounding transaction ends.
pub async fn lock_field_catalog(
    conn: &mut PgConnection,
    scope: EffectiveScope,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
        .bind(FIELD_CATALOG_LOCK_CLASS)
        .bind(scope.organization_id())
        .execute(conn)
        .await?;
    Ok(())
}
