//! npsync-core
//!
//! Bulk catalog-driven user-state reconciliation.
//!
//! Architectural decisions:
//! - The catalog is read-only; every entity of a kind is visited in catalog order
//! - One user state record per (user, entity); absence means "untouched"
//! - Transitions are classified before any mutation is staged
//! - Rewards are issued at most once per entity per run, forward policies only
//! - Nothing is durable until the single end-of-run flush
//!
//! No SQL, no CLI. Storage and inventory are reached through the traits in
//! [`store`]; `npsync-db` provides the PostgreSQL bindings.

mod batch;
mod engine;
mod policy;
mod summary;
mod transition;
mod types;

pub mod store;

pub use batch::{
    FlushReport, StagedBatch, StagedGrant, StagedSession, StagedWrite, StagingError, StateBackend,
    WriteOp,
};
pub use engine::{reconcile, ReconcileRequest, DEFAULT_PROGRESS_EVERY};
pub use policy::{Direction, PolicyError, RewardPolicy, TargetPolicy};
pub use store::{CatalogSource, RewardIssuer, UnitOfWork, UserStateStore};
pub use summary::RunSummary;
pub use transition::Transition;
pub use types::*;
