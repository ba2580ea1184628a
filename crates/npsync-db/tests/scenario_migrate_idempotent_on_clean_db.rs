/// Migrating twice must be idempotent, and status must see the schema.
///
/// DB-backed test, skipped if NPSYNC_DATABASE_URL is not set.
#[tokio::test]
async fn migrate_idempotent_on_clean_db() -> anyhow::Result<()> {
    let url = match std::env::var(npsync_db::ENV_DB_URL) {
        Ok(v) => v,
        Err(_) => {
            eprintln!("SKIP: NPSYNC_DATABASE_URL not set");
            return Ok(());
        }
    };

    let pool = npsync_db::connect(&url).await?;

    npsync_db::migrate(&pool).await?;
    npsync_db::migrate(&pool).await?;

    let st = npsync_db::status(&pool).await?;
    assert!(st.ok);
    assert!(st.has_user_state_tables, "user state tables must exist after migrate");

    Ok(())
}
