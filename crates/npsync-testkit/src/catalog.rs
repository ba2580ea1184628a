use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use npsync_core::{CatalogEntity, CatalogSource, EntityKind, RarityBounds};

/// Catalog snapshot held in memory. Entities are returned in insertion order.
#[derive(Default)]
pub struct MemoryCatalog {
    subscenarios: Vec<CatalogEntity>,
    units: Vec<CatalogEntity>,
    rarities: BTreeMap<i32, RarityBounds>,
    failing_rarity: Option<i32>,
    fail_listing: bool,
    list_calls: AtomicU32,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscenarios(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.subscenarios
            .extend(ids.into_iter().map(CatalogEntity::subscenario));
        self
    }

    pub fn with_unit(mut self, unit_id: i64, rarity: i32, disable_rank_up: i32) -> Self {
        self.units
            .push(CatalogEntity::unit(unit_id, rarity, disable_rank_up));
        self
    }

    pub fn with_rarity(mut self, bounds: RarityBounds) -> Self {
        self.rarities.insert(bounds.rarity, bounds);
        self
    }

    /// Lookups for `rarity` return `Err` instead of `Ok(None)`.
    pub fn with_failing_rarity(mut self, rarity: i32) -> Self {
        self.failing_rarity = Some(rarity);
        self
    }

    pub fn with_failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn list_calls(&self) -> u32 {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for MemoryCatalog {
    async fn list_entities(&self, kind: EntityKind) -> Result<Vec<CatalogEntity>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            return Err(anyhow!("catalog unavailable"));
        }
        Ok(match kind {
            EntityKind::Subscenario => self.subscenarios.clone(),
            EntityKind::Unit => self.units.clone(),
        })
    }

    async fn rarity_bounds(&self, rarity: i32) -> Result<Option<RarityBounds>> {
        if self.failing_rarity == Some(rarity) {
            return Err(anyhow!("rarity table unreachable"));
        }
        Ok(self.rarities.get(&rarity).cloned())
    }
}
