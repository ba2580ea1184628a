use anyhow::Result;

use npsync_config::secrets::resolve_database_urls;

use super::load_config;

async fn main_pool(config_paths: &[String]) -> Result<sqlx::PgPool> {
    let loaded = load_config(config_paths)?;
    let urls = resolve_database_urls(&loaded.config_json)?;
    npsync_db::connect(&urls.main).await
}

pub async fn status(config_paths: &[String]) -> Result<()> {
    let pool = main_pool(config_paths).await?;
    let s = npsync_db::status(&pool).await?;
    println!(
        "db_ok={} has_user_state_tables={}",
        s.ok, s.has_user_state_tables
    );
    Ok(())
}

pub async fn migrate(config_paths: &[String]) -> Result<()> {
    let pool = main_pool(config_paths).await?;
    npsync_db::migrate(&pool).await?;
    println!("migrations_applied=true");
    Ok(())
}
