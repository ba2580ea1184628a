//! Batch committer.
//!
//! [`StagedSession`] buffers every create, mutation and reward grant of a run
//! and hands them to a [`StateBackend`] in a single `commit` call. Until then
//! nothing is durable; dropping the session discards the batch.
//!
//! Reads go through the staged writes first so a record created earlier in the
//! run is visible to later lookups before it is persisted.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::store::{RewardIssuer, UserStateStore};
use crate::types::{
    EntityKind, ItemKind, RecordKey, RewardBundle, StateFields, UserId, UserStateRecord,
};

/// Durable side of the batch committer.
#[async_trait]
pub trait StateBackend: Send + Sync {
    async fn fetch_record(
        &self,
        user: UserId,
        kind: EntityKind,
        entity_id: i64,
    ) -> Result<Option<UserStateRecord>>;

    /// Apply the whole batch as one unit of work.
    async fn commit(&self, batch: &StagedBatch) -> Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOp {
    Insert,
    Update,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedWrite {
    pub op: WriteOp,
    pub record: UserStateRecord,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedGrant {
    pub user_id: UserId,
    pub item: ItemKind,
    pub amount: i64,
    pub comment: Option<String>,
}

/// Writes in staging order, one entry per record key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StagedBatch {
    pub writes: Vec<StagedWrite>,
    pub grants: Vec<StagedGrant>,
}

impl StagedBatch {
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.grants.is_empty()
    }

    pub fn report(&self) -> FlushReport {
        FlushReport {
            inserted: self
                .writes
                .iter()
                .filter(|w| w.op == WriteOp::Insert)
                .count(),
            updated: self
                .writes
                .iter()
                .filter(|w| w.op == WriteOp::Update)
                .count(),
            grants: self.grants.len(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub inserted: usize,
    pub updated: usize,
    pub grants: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StagingError {
    /// A record for this key is already staged for creation or update.
    DuplicateCreate { key: RecordKey },
    /// Fields of one kind staged onto a record of another.
    KindMismatch { key: RecordKey, got: EntityKind },
    /// Reward items must carry a positive amount.
    InvalidGrant { item: ItemKind, amount: i64 },
}

impl std::fmt::Display for StagingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StagingError::DuplicateCreate { key } => write!(
                f,
                "STAGING_DUPLICATE_CREATE: user={} kind={} entity={} already staged",
                key.user_id, key.kind, key.entity_id
            ),
            StagingError::KindMismatch { key, got } => write!(
                f,
                "STAGING_KIND_MISMATCH: record kind={} entity={} got fields of kind={}",
                key.kind, key.entity_id, got
            ),
            StagingError::InvalidGrant { item, amount } => write!(
                f,
                "STAGING_INVALID_GRANT: item={} amount={} (must be > 0)",
                item.as_str(),
                amount
            ),
        }
    }
}

impl std::error::Error for StagingError {}

/// Store + issuer over one pending batch.
pub struct StagedSession<B> {
    backend: B,
    batch: StagedBatch,
    pending: HashMap<RecordKey, usize>,
    flushes: u32,
}

impl<B: StateBackend> StagedSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            batch: StagedBatch::default(),
            pending: HashMap::new(),
            flushes: 0,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Batch staged since the last flush.
    pub fn pending(&self) -> &StagedBatch {
        &self.batch
    }

    /// Number of successful flushes that reached the backend.
    pub fn flush_count(&self) -> u32 {
        self.flushes
    }
}

#[async_trait]
impl<B: StateBackend> UserStateStore for StagedSession<B> {
    async fn get(
        &self,
        user: UserId,
        kind: EntityKind,
        entity_id: i64,
    ) -> Result<Option<UserStateRecord>> {
        let key = RecordKey {
            user_id: user,
            kind,
            entity_id,
        };
        if let Some(&i) = self.pending.get(&key) {
            return Ok(Some(self.batch.writes[i].record.clone()));
        }
        self.backend.fetch_record(user, kind, entity_id).await
    }

    fn stage_create(
        &mut self,
        user: UserId,
        kind: EntityKind,
        entity_id: i64,
        initial: StateFields,
    ) -> Result<UserStateRecord> {
        let key = RecordKey {
            user_id: user,
            kind,
            entity_id,
        };
        if self.pending.contains_key(&key) {
            return Err(StagingError::DuplicateCreate { key }.into());
        }
        if initial.kind() != kind {
            return Err(StagingError::KindMismatch {
                key,
                got: initial.kind(),
            }
            .into());
        }

        let record = UserStateRecord {
            user_id: user,
            kind,
            entity_id,
            fields: initial,
        };
        self.pending.insert(key, self.batch.writes.len());
        self.batch.writes.push(StagedWrite {
            op: WriteOp::Insert,
            record: record.clone(),
        });
        Ok(record)
    }

    fn stage_mutate(&mut self, record: &mut UserStateRecord, fields: StateFields) -> Result<()> {
        let key = record.key();
        if fields.kind() != record.kind {
            return Err(StagingError::KindMismatch {
                key,
                got: fields.kind(),
            }
            .into());
        }
        record.fields = fields;

        match self.pending.get(&key) {
            // Keep the original op: a staged insert stays an insert.
            Some(&i) => self.batch.writes[i].record = record.clone(),
            None => {
                self.pending.insert(key, self.batch.writes.len());
                self.batch.writes.push(StagedWrite {
                    op: WriteOp::Update,
                    record: record.clone(),
                });
            }
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<FlushReport> {
        let batch = std::mem::take(&mut self.batch);
        self.pending.clear();

        if batch.is_empty() {
            return Ok(FlushReport::default());
        }

        let report = batch.report();
        self.backend.commit(&batch).await?;
        self.flushes += 1;
        Ok(report)
    }
}

#[async_trait]
impl<B: StateBackend> RewardIssuer for StagedSession<B> {
    async fn grant(&mut self, user: UserId, bundle: &RewardBundle) -> Result<()> {
        // Validate the whole bundle first so a bad item stages nothing.
        if let Some(bad) = bundle.items.iter().find(|i| i.amount <= 0) {
            return Err(StagingError::InvalidGrant {
                item: bad.item,
                amount: bad.amount,
            }
            .into());
        }

        for item in &bundle.items {
            self.batch.grants.push(StagedGrant {
                user_id: user,
                item: item.item,
                amount: item.amount,
                comment: item.comment.clone(),
            });
        }
        Ok(())
    }
}
