use anyhow::Result;
use tracing::{info, warn};

use npsync_core::{reconcile, ReconcileRequest, TargetPolicy};
use npsync_db::{PgCatalog, UserSelector};

use super::{connect_pools, load_run_context, report, reward_bundle};

pub async fn run(
    config_paths: &[String],
    selector: UserSelector,
    with_rewards: bool,
    unread: bool,
) -> Result<()> {
    let ctx = load_run_context(config_paths)?;
    let pools = connect_pools(&ctx.urls).await?;

    let user = npsync_db::resolve_user(&pools.main, &selector).await?;
    info!(%selector, user_id = %user, "user resolved");

    let policy = if unread {
        TargetPolicy::MarkUnread
    } else {
        TargetPolicy::MarkRead
    };
    let bundle = reward_bundle(&ctx.settings.rewards);

    let mut req =
        ReconcileRequest::new(user, policy).with_progress_every(ctx.settings.progress_every);
    if with_rewards {
        if unread {
            warn!("--with-rewards has no effect together with --unread");
        }
        req = req.with_rewards(bundle.clone());
    }

    let catalog = PgCatalog::new(pools.catalog);
    let mut session = npsync_db::open_session(pools.main);
    let summary = reconcile(&catalog, &mut session, &req).await?;

    let rewards = (with_rewards && !unread).then_some(&bundle);
    print!("{}", report::subscenario_summary(&summary, policy, rewards));
    Ok(())
}
