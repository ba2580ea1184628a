//! Contracts of the external collaborators.
//!
//! - [`CatalogSource`]: immutable entity definitions, stable order per snapshot.
//! - [`UserStateStore`]: get / stage_create / stage_mutate / flush.
//! - [`RewardIssuer`]: stages a reward bundle into the same unit of work.
//!
//! Implementations: `npsync-db` (PostgreSQL) and `npsync-testkit` (in-memory).

use anyhow::Result;
use async_trait::async_trait;

use crate::batch::FlushReport;
use crate::types::{
    CatalogEntity, EntityKind, RarityBounds, RewardBundle, StateFields, UserId, UserStateRecord,
};

#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Every entity of `kind`, in an order that is stable for the snapshot.
    async fn list_entities(&self, kind: EntityKind) -> Result<Vec<CatalogEntity>>;

    /// Auxiliary bound lookup.
    ///
    /// `Ok(None)` (no row for this rarity) is recoverable per entity: the
    /// driver warns, counts the entity in `RunSummary::unresolved` and moves
    /// on. `Err` means the bound table itself could not be read; the run
    /// aborts before the flush and nothing is persisted.
    async fn rarity_bounds(&self, rarity: i32) -> Result<Option<RarityBounds>>;
}

#[async_trait]
pub trait UserStateStore: Send + Sync {
    /// Pure lookup. Never creates.
    async fn get(
        &self,
        user: UserId,
        kind: EntityKind,
        entity_id: i64,
    ) -> Result<Option<UserStateRecord>>;

    /// Stage a new record. The returned record is usable immediately; it is
    /// durable only after [`UserStateStore::flush`].
    fn stage_create(
        &mut self,
        user: UserId,
        kind: EntityKind,
        entity_id: i64,
        initial: StateFields,
    ) -> Result<UserStateRecord>;

    /// Stage in-place field changes on an existing or just-created record.
    fn stage_mutate(&mut self, record: &mut UserStateRecord, fields: StateFields) -> Result<()>;

    /// Persist everything staged since the last flush as one unit of work.
    async fn flush(&mut self) -> Result<FlushReport>;
}

#[async_trait]
pub trait RewardIssuer: Send {
    /// Stage every item of `bundle` for `user`, or none of them.
    async fn grant(&mut self, user: UserId, bundle: &RewardBundle) -> Result<()>;
}

/// A store and an issuer that share one pending batch.
pub trait UnitOfWork: UserStateStore + RewardIssuer {}

impl<T: UserStateStore + RewardIssuer + ?Sized> UnitOfWork for T {}
