//! PostgreSQL bindings for npsync.
//!
//! - [`PgCatalog`]: the game catalog, read in primary-key order.
//! - [`PgStateBackend`]: the durable side of the batch committer. One
//!   `commit` is one transaction.
//! - [`resolve_user`]: turns a `--user-id` / `--invite-code` selection into a
//!   [`UserId`] before any catalog read.

use anyhow::{anyhow, Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};

use npsync_core::UserId;

mod catalog;
mod state;

pub use catalog::PgCatalog;
pub use state::{open_session, PgStateBackend};

/// Default main database variable. The binary reads the configured name via
/// `npsync-config`; DB-backed tests read this one directly.
pub const ENV_DB_URL: &str = "NPSYNC_DATABASE_URL";

/// Connect to Postgres at `url`, as resolved from the configured env var.
pub async fn connect(url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

/// Simple status query (connectivity + schema presence).
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;
    let ok = one == 1;

    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select count(*) = 3
        from information_schema.tables
        where table_schema = 'public'
          and table_name in ('users', 'user_subscenario', 'user_album')
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok,
        has_user_state_tables: exists,
    })
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_user_state_tables: bool,
}

/// How the operator names the target user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserSelector {
    Id(i64),
    InviteCode(String),
}

impl std::fmt::Display for UserSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserSelector::Id(id) => write!(f, "user_id={id}"),
            UserSelector::InviteCode(code) => write!(f, "invite_code={code}"),
        }
    }
}

/// Look the user up in `users`. An unknown user is an error.
pub async fn resolve_user(pool: &PgPool, selector: &UserSelector) -> Result<UserId> {
    let row = match selector {
        UserSelector::Id(id) => sqlx::query("select user_id from users where user_id = $1")
            .bind(*id)
            .fetch_optional(pool)
            .await
            .context("resolve_user by id failed")?,
        UserSelector::InviteCode(code) => {
            sqlx::query("select user_id from users where invite_code = $1")
                .bind(code)
                .fetch_optional(pool)
                .await
                .context("resolve_user by invite code failed")?
        }
    };

    let row = row.ok_or_else(|| anyhow!("USER_NOT_FOUND: no user with {selector}"))?;
    let id: i64 = row.try_get("user_id")?;
    Ok(UserId(id))
}

/// Insert a user with zero balances. Used by seeding tools and tests.
pub async fn insert_user(pool: &PgPool, user_id: i64, invite_code: &str) -> Result<()> {
    sqlx::query("insert into users (user_id, invite_code) values ($1, $2)")
        .bind(user_id)
        .bind(invite_code)
        .execute(pool)
        .await
        .context("insert_user failed")?;
    Ok(())
}

/// Current (loveca, game_coin) balance.
pub async fn fetch_balances(pool: &PgPool, user: UserId) -> Result<(i64, i64)> {
    let row = sqlx::query("select loveca, game_coin from users where user_id = $1")
        .bind(user.0)
        .fetch_one(pool)
        .await
        .context("fetch_balances failed")?;
    Ok((row.try_get("loveca")?, row.try_get("game_coin")?))
}
