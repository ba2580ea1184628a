use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};

use npsync_core::{CatalogEntity, CatalogSource, EntityKind, RarityBounds};

/// Catalog tables read in primary-key order, so runs visit entities in a
/// deterministic sequence.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogSource for PgCatalog {
    async fn list_entities(&self, kind: EntityKind) -> Result<Vec<CatalogEntity>> {
        match kind {
            EntityKind::Subscenario => {
                let rows = sqlx::query(
                    "select subscenario_id from catalog_subscenario order by subscenario_id",
                )
                .fetch_all(&self.pool)
                .await
                .context("list catalog_subscenario failed")?;

                rows.iter()
                    .map(|r| -> Result<CatalogEntity> {
                        Ok(CatalogEntity::subscenario(r.try_get("subscenario_id")?))
                    })
                    .collect()
            }
            EntityKind::Unit => {
                let rows = sqlx::query(
                    "select unit_id, rarity, disable_rank_up from catalog_unit order by unit_id",
                )
                .fetch_all(&self.pool)
                .await
                .context("list catalog_unit failed")?;

                rows.iter()
                    .map(|r| -> Result<CatalogEntity> {
                        Ok(CatalogEntity::unit(
                            r.try_get("unit_id")?,
                            r.try_get("rarity")?,
                            r.try_get("disable_rank_up")?,
                        ))
                    })
                    .collect()
            }
        }
    }

    async fn rarity_bounds(&self, rarity: i32) -> Result<Option<RarityBounds>> {
        let row = sqlx::query(
            r#"
            select rarity, before_level_max, after_level_max, before_love_max, after_love_max
            from catalog_unit_rarity
            where rarity = $1
            "#,
        )
        .bind(rarity)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("rarity lookup failed rarity={rarity}"))?;

        let Some(r) = row else {
            return Ok(None);
        };
        Ok(Some(RarityBounds {
            rarity: r.try_get("rarity")?,
            before_level_max: r.try_get("before_level_max")?,
            after_level_max: r.try_get("after_level_max")?,
            before_love_max: r.try_get("before_love_max")?,
            after_love_max: r.try_get("after_love_max")?,
        }))
    }
}
