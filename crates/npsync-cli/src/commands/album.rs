use anyhow::Result;
use tracing::info;

use npsync_core::{reconcile, ReconcileRequest, TargetPolicy};
use npsync_db::{PgCatalog, UserSelector};

use super::{connect_pools, load_run_context, report};

pub async fn run(config_paths: &[String], selector: UserSelector) -> Result<()> {
    let ctx = load_run_context(config_paths)?;
    let pools = connect_pools(&ctx.urls).await?;

    let user = npsync_db::resolve_user(&pools.main, &selector).await?;
    info!(%selector, user_id = %user, "user resolved");

    let req = ReconcileRequest::new(user, TargetPolicy::MaxUnlock)
        .with_progress_every(ctx.settings.progress_every);

    let catalog = PgCatalog::new(pools.catalog);
    let mut session = npsync_db::open_session(pools.main);
    let summary = reconcile(&catalog, &mut session, &req).await?;

    print!("{}", report::album_summary(&summary));
    Ok(())
}
