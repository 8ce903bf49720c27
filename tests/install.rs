mod common;

use std::sync::Arc;

use common::{TestEnv, ORG};
use inventory_manager::db::{resolve_scope, Tables};
use inventory_manager::fields::{
    reconcile_catalog, FieldCatalog, FieldOrder, FieldType, NewField, ValueFormat, DEFAULT_FIELDS,
};
use inventory_manager::l10n::MessageCatalog;
use inventory_manager::preferences::{entry_name, PreferenceValue, OPTIONS_SECTION};
use inventory_manager::services::InstallService;
use inventory_manager::version::{PluginInfo, INFO_SECTION, PLUGIN_INFO};
use inventory_manager::AppResult;

fn catalog_layout(catalog: &FieldCatalog) -> Vec<(String, i32)> {
    catalog
        .iter()
        .map(|f| (f.name_intern.clone(), f.sequence))
        .collect()
}

#[tokio::test]
async fn test_fresh_install_creates_default_catalog() -> AppResult<()> {
    let Some(env) = TestEnv::init("fresh").await? else {
        return Ok(());
    };
    let scope = env.scope();
    assert!(env.service.check_for_update(scope).await?);

    let report = env.service.init(scope).await?;
    assert_eq!(report.fields.created.len(), DEFAULT_FIELDS.len());
    assert!(report.fields.orphaned.is_empty());

    let catalog = FieldCatalog::load(&env.pool, env.service.tables(), scope, FieldOrder::Sequence).await?;
    let expected: Vec<(String, i32)> = DEFAULT_FIELDS
        .iter()
        .zip(0..)
        .map(|(f, seq)| (f.name_intern.to_string(), seq))
        .collect();
    assert_eq!(catalog_layout(&catalog), expected);
    assert!(catalog.iter().all(|f| f.system && f.org_id == Some(ORG)));
    assert_eq!(catalog.get("CATEGORY").unwrap().field_type, FieldType::Dropdown);

    assert!(!env.service.check_for_update(scope).await?);
    let stored = env.service.preference_store().read(scope).await?.unwrap();
    assert_eq!(
        stored.get(INFO_SECTION, "version"),
        Some(&PreferenceValue::Text(PLUGIN_INFO.version.to_string()))
    );

    env.cleanup().await
}

#[tokio::test]
async fn test_reinstall_keeps_layout() -> AppResult<()> {
    let Some(env) = TestEnv::init("again").await? else {
        return Ok(());
    };
    let scope = env.scope();
    env.service.init(scope).await?;
    let first = FieldCatalog::load(&env.pool, env.service.tables(), scope, FieldOrder::Sequence).await?;

    let report = env.service.init(scope).await?;
    assert!(report.fields.created.is_empty());
    assert!(report.fields.orphaned.is_empty());
    assert_eq!(report.preferences_added, 0);
    assert_eq!(report.preferences_removed, 0);

    let second = FieldCatalog::load(&env.pool, env.service.tables(), scope, FieldOrder::Sequence).await?;
    assert_eq!(catalog_layout(&first), catalog_layout(&second));

    env.cleanup().await
}

#[tokio::test]
async fn test_dropped_field_detaches_values() -> AppResult<()> {
    let Some(env) = TestEnv::init("dropped").await? else {
        return Ok(());
    };
    let scope = env.scope();
    let tables = env.service.tables().clone();
    env.service.init(scope).await?;

    let mut catalog = FieldCatalog::load(&env.pool, &tables, scope, FieldOrder::Sequence).await?;
    let serial = catalog
        .create_custom_field(
            &env.pool,
            &tables,
            scope,
            NewField {
                name: "Serial number".to_string(),
                field_type: FieldType::Text,
                description: String::new(),
                mandatory: false,
                value_list: None,
            },
            Some(common::USER),
        )
        .await?;
    assert_eq!(serial.name_intern, "SERIAL_NUMBER");
    assert_eq!(serial.sequence, 7);

    let item_id = env
        .create_item(&[
            ("ITEMNAME", "Drill"),
            ("CATEGORY", "1"),
            ("RECEIVED_BACK_ON", "2024-05-01"),
            ("SERIAL_NUMBER", "SN-1"),
        ])
        .await?;
    let dropped_id = catalog.get("RECEIVED_BACK_ON").unwrap().id;

    let report = reconcile_catalog(
        &env.pool,
        &tables,
        scope,
        &DEFAULT_FIELDS[..6],
        &MessageCatalog::new(),
    )
    .await?;
    assert_eq!(report.orphaned_ids(), vec![dropped_id]);
    assert_eq!(report.warnings().len(), 1);

    let catalog = FieldCatalog::load(&env.pool, &tables, scope, FieldOrder::Sequence).await?;
    let layout = catalog_layout(&catalog);
    assert_eq!(layout.len(), 7);
    assert_eq!(layout.last().unwrap(), &("SERIAL_NUMBER".to_string(), 6));
    assert!(catalog.get("RECEIVED_BACK_ON").is_none());

    let mut item = env.items().await?;
    item.read_item_data(item_id).await?;
    assert_eq!(item.get_value("ITEMNAME", ValueFormat::Database), "Drill");
    assert_eq!(item.get_value("SERIAL_NUMBER", ValueFormat::Database), "SN-1");

    let detached = env
        .count(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE imd_imi_id = $1 AND imd_imf_id IS NULL",
                tables.data
            ),
            item_id,
        )
        .await?;
    assert_eq!(detached, 1);

    env.cleanup().await
}

#[tokio::test]
async fn test_upgrade_is_detected_from_stored_version() -> AppResult<()> {
    let Some(env) = TestEnv::init("upgrade").await? else {
        return Ok(());
    };
    let scope = env.scope();
    env.service.init(scope).await?;
    assert!(!env.service.check_for_update(scope).await?);

    let newer = PluginInfo {
        version: "1.2.0",
        ..PLUGIN_INFO
    };
    let upgraded = InstallService::from_config(env.pool.clone(), &env.config, Arc::new(MessageCatalog::new()))?
        .with_plugin_info(newer);
    assert!(upgraded.check_for_update(scope).await?);
    upgraded.init(scope).await?;
    assert!(!upgraded.check_for_update(scope).await?);
    assert!(env.service.check_for_update(scope).await?);

    env.cleanup().await
}

#[tokio::test]
async fn test_preferences_round_trip() -> AppResult<()> {
    let Some(env) = TestEnv::init("prefs").await? else {
        return Ok(());
    };
    env.service.init(env.scope()).await?;

    let mut ctx = env.context(ORG).await?;
    assert!(ctx.installed);
    assert_eq!(
        ctx.preferences.get(OPTIONS_SECTION, "profile_addin"),
        Some(&PreferenceValue::from(vec!["ITEMNAME", "LAST_RECEIVER"]))
    );

    ctx.update_preference(OPTIONS_SECTION, "profile_addin", vec!["ITEMNAME", "KEEPER"])
        .await?;
    ctx.update_preference(OPTIONS_SECTION, "decimal_step", 0.5).await?;
    ctx.update_preference(OPTIONS_SECTION, "field_date_time_format", "datetime")
        .await?;

    let stored = env.service.preference_store().read(env.scope()).await?.unwrap();
    assert_eq!(
        stored.get(OPTIONS_SECTION, "profile_addin"),
        Some(&PreferenceValue::from(vec!["ITEMNAME", "KEEPER"]))
    );
    assert_eq!(
        stored.get(OPTIONS_SECTION, "decimal_step"),
        Some(&PreferenceValue::Float(0.5))
    );
    assert_eq!(stored, ctx.preferences);

    let reloaded = env.context(ORG).await?;
    assert_eq!(reloaded.preferences, ctx.preferences);

    env.cleanup().await
}

#[tokio::test]
async fn test_uninstall_single_organization_drops_only_empty_tables() -> AppResult<()> {
    let Some(env) = TestEnv::init("uninst").await? else {
        return Ok(());
    };
    let other = resolve_scope(ORG + 1);
    env.service.init(env.scope()).await?;
    env.service.init(other).await?;
    let tables = env.service.tables().clone();

    // the remaining organization still has fields but no items
    let report = env.service.uninstall(other, false).await?;
    assert_eq!(
        report.dropped_tables,
        vec![tables.log.clone(), tables.data.clone(), tables.items.clone()]
    );
    assert_eq!(
        report.kept_tables,
        vec![tables.fields.clone(), tables.preferences.clone()]
    );
    assert!(Tables::exists(&env.pool, &tables.fields).await?);
    assert!(!Tables::exists(&env.pool, &tables.items).await?);
    assert!(env.service.check_for_update(env.scope()).await?);

    let report = env.service.uninstall(env.scope(), false).await?;
    assert_eq!(
        report.dropped_tables,
        vec![tables.fields.clone(), tables.preferences.clone()]
    );
    assert!(report.kept_tables.is_empty());

    env.cleanup().await
}

#[tokio::test]
async fn test_uninstall_single_organization_keeps_tables_with_rows() -> AppResult<()> {
    let Some(env) = TestEnv::init("uninrows").await? else {
        return Ok(());
    };
    let other = resolve_scope(ORG + 1);
    env.service.init(env.scope()).await?;
    env.service.init(other).await?;
    env.create_item(&[("ITEMNAME", "Drill"), ("CATEGORY", "1")]).await?;

    let report = env.service.uninstall(other, false).await?;
    assert!(report.dropped_tables.is_empty());
    assert_eq!(report.kept_tables.len(), 5);
    assert!(env.service.check_for_update(other).await?);
    assert!(!env.service.check_for_update(env.scope()).await?);

    env.cleanup().await
}

#[tokio::test]
async fn test_update_claims_global_preference_row() -> AppResult<()> {
    let Some(env) = TestEnv::init("claim").await? else {
        return Ok(());
    };
    let scope = env.scope();
    env.service.init(scope).await?;
    let tables = env.service.tables().clone();
    let name = entry_name(OPTIONS_SECTION, "file_name");

    let clear = format!("DELETE FROM {} WHERE plp_name = $1", tables.preferences);
    sqlx::query(&clear).bind(&name).execute(&env.pool).await?;
    let seed = format!(
        "INSERT INTO {} (plp_org_id, plp_name, plp_value) VALUES (NULL, $1, 'x')",
        tables.preferences
    );
    sqlx::query(&seed).bind(&name).execute(&env.pool).await?;

    let store = env.service.preference_store();
    store
        .update(scope, OPTIONS_SECTION, "file_name", &PreferenceValue::from("y"))
        .await?;

    let rows_query = format!(
        "SELECT plp_org_id, plp_value FROM {} WHERE plp_name = $1",
        tables.preferences
    );
    let rows: Vec<(Option<i32>, Option<String>)> = sqlx::query_as(&rows_query)
        .bind(&name)
        .fetch_all(&env.pool)
        .await?;
    assert_eq!(rows, vec![(None, Some("y".to_string()))]);

    let mut config = store.read(scope).await?.unwrap();
    config.update(OPTIONS_SECTION, "file_name", "z");
    store.write(scope, &config).await?;
    let rows: Vec<(Option<i32>, Option<String>)> = sqlx::query_as(&rows_query)
        .bind(&name)
        .fetch_all(&env.pool)
        .await?;
    assert_eq!(rows, vec![(None, Some("z".to_string()))]);

    env.cleanup().await
}

#[tokio::test]
async fn test_reinstall_counts_only_deleted_preferences() -> AppResult<()> {
    let Some(env) = TestEnv::init("stale").await? else {
        return Ok(());
    };
    let scope = env.scope();
    env.service.init(scope).await?;
    let tables = env.service.tables().clone();
    let global = entry_name(OPTIONS_SECTION, "legacy_global");
    let owned = entry_name(OPTIONS_SECTION, "legacy_owned");

    let seed = format!(
        "INSERT INTO {} (plp_org_id, plp_name, plp_value) VALUES (NULL, $1, '1'), ($2, $3, '1')",
        tables.preferences
    );
    sqlx::query(&seed)
        .bind(&global)
        .bind(ORG)
        .bind(&owned)
        .execute(&env.pool)
        .await?;

    let report = env.service.init(scope).await?;
    assert_eq!(report.preferences_removed, 1);

    let count = format!("SELECT COUNT(*) FROM {} WHERE plp_name = $1", tables.preferences);
    let global_rows: i64 = sqlx::query_scalar(&count).bind(&global).fetch_one(&env.pool).await?;
    let owned_rows: i64 = sqlx::query_scalar(&count).bind(&owned).fetch_one(&env.pool).await?;
    assert_eq!((global_rows, owned_rows), (1, 0));

    let report = env.service.init(scope).await?;
    assert_eq!(report.preferences_removed, 0);

    env.cleanup().await
}
