use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::debug;

use npsync_core::{
    EntityKind, ItemKind, StagedBatch, StagedGrant, StagedSession, StagedWrite, StateBackend,
    StateFields, UserId, UserStateRecord, WriteOp,
};

/// Durable side of the batch committer.
///
/// `commit` runs the whole batch in one transaction: record inserts and
/// updates, one `item_grants` row per granted item and the matching balance
/// increment on `users`. Any failure rolls all of it back.
#[derive(Clone)]
pub struct PgStateBackend {
    pool: PgPool,
}

impl PgStateBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Store and reward issuer for one run against `pool`.
pub fn open_session(pool: PgPool) -> StagedSession<PgStateBackend> {
    StagedSession::new(PgStateBackend::new(pool))
}

#[async_trait]
impl StateBackend for PgStateBackend {
    async fn fetch_record(
        &self,
        user: UserId,
        kind: EntityKind,
        entity_id: i64,
    ) -> Result<Option<UserStateRecord>> {
        let fields = match kind {
            EntityKind::Subscenario => {
                let row = sqlx::query(
                    r#"
                    select completed
                    from user_subscenario
                    where user_id = $1 and subscenario_id = $2
                    "#,
                )
                .bind(user.0)
                .bind(entity_id)
                .fetch_optional(&self.pool)
                .await
                .context("fetch user_subscenario failed")?;

                match row {
                    Some(r) => StateFields::Subscenario {
                        completed: r.try_get("completed")?,
                    },
                    None => return Ok(None),
                }
            }
            EntityKind::Unit => {
                let row = sqlx::query(
                    r#"
                    select rank_max, love_max, rank_level_max, highest_love
                    from user_album
                    where user_id = $1 and unit_id = $2
                    "#,
                )
                .bind(user.0)
                .bind(entity_id)
                .fetch_optional(&self.pool)
                .await
                .context("fetch user_album failed")?;

                match row {
                    Some(r) => StateFields::Album {
                        rank_max: r.try_get("rank_max")?,
                        love_max: r.try_get("love_max")?,
                        rank_level_max: r.try_get("rank_level_max")?,
                        highest_love: r.try_get("highest_love")?,
                    },
                    None => return Ok(None),
                }
            }
        };

        Ok(Some(UserStateRecord {
            user_id: user,
            kind,
            entity_id,
            fields,
        }))
    }

    async fn commit(&self, batch: &StagedBatch) -> Result<()> {
        let mut tx = self.pool.begin().await.context("begin commit tx failed")?;

        for w in &batch.writes {
            apply_write(&mut tx, w).await?;
        }
        for g in &batch.grants {
            apply_grant(&mut tx, g).await?;
        }

        tx.commit().await.context("commit tx failed")?;
        debug!(
            writes = batch.writes.len(),
            grants = batch.grants.len(),
            "batch committed"
        );
        Ok(())
    }
}

async fn apply_write(tx: &mut Transaction<'_, Postgres>, w: &StagedWrite) -> Result<()> {
    let rec = &w.record;
    let affected = match (&rec.fields, w.op) {
        (StateFields::Subscenario { completed }, WriteOp::Insert) => sqlx::query(
            r#"
            insert into user_subscenario (user_id, subscenario_id, completed)
            values ($1, $2, $3)
            "#,
        )
        .bind(rec.user_id.0)
        .bind(rec.entity_id)
        .bind(*completed)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("insert user_subscenario failed entity={}", rec.entity_id))?,

        (StateFields::Subscenario { completed }, WriteOp::Update) => sqlx::query(
            r#"
            update user_subscenario
            set completed = $3
            where user_id = $1 and subscenario_id = $2
            "#,
        )
        .bind(rec.user_id.0)
        .bind(rec.entity_id)
        .bind(*completed)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("update user_subscenario failed entity={}", rec.entity_id))?,

        (
            StateFields::Album {
                rank_max,
                love_max,
                rank_level_max,
                highest_love,
            },
            WriteOp::Insert,
        ) => sqlx::query(
            r#"
            insert into user_album (
              user_id, unit_id, rank_max, love_max, rank_level_max, highest_love
            ) values (
              $1, $2, $3, $4, $5, $6
            )
            "#,
        )
        .bind(rec.user_id.0)
        .bind(rec.entity_id)
        .bind(*rank_max)
        .bind(*love_max)
        .bind(*rank_level_max)
        .bind(*highest_love)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("insert user_album failed entity={}", rec.entity_id))?,

        (
            StateFields::Album {
                rank_max,
                love_max,
                rank_level_max,
                highest_love,
            },
            WriteOp::Update,
        ) => sqlx::query(
            r#"
            update user_album
            set rank_max = $3,
                love_max = $4,
                rank_level_max = $5,
                highest_love = $6
            where user_id = $1 and unit_id = $2
            "#,
        )
        .bind(rec.user_id.0)
        .bind(rec.entity_id)
        .bind(*rank_max)
        .bind(*love_max)
        .bind(*rank_level_max)
        .bind(*highest_love)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("update user_album failed entity={}", rec.entity_id))?,
    };

    if affected.rows_affected() != 1 {
        bail!(
            "COMMIT_ROW_MISMATCH: {:?} kind={} entity={} affected {} rows",
            w.op,
            rec.kind,
            rec.entity_id,
            affected.rows_affected()
        );
    }
    Ok(())
}

async fn apply_grant(tx: &mut Transaction<'_, Postgres>, g: &StagedGrant) -> Result<()> {
    sqlx::query(
        r#"
        insert into item_grants (user_id, item, amount, comment, granted_at)
        values ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(g.user_id.0)
    .bind(g.item.as_str())
    .bind(g.amount)
    .bind(g.comment.as_deref())
    .bind(Utc::now())
    .execute(&mut **tx)
    .await
    .context("insert item_grants failed")?;

    let sql = match g.item {
        ItemKind::Loveca => "update users set loveca = loveca + $2 where user_id = $1",
        ItemKind::GameCoin => "update users set game_coin = game_coin + $2 where user_id = $1",
    };
    let res = sqlx::query(sql)
        .bind(g.user_id.0)
        .bind(g.amount)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("credit {} failed", g.item.as_str()))?;

    if res.rows_affected() != 1 {
        bail!("COMMIT_ROW_MISMATCH: credit target user={} missing", g.user_id);
    }
    Ok(())
}
