use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use npsync_core::{
    EntityKind, ItemKind, RecordKey, StagedBatch, StagedGrant, StateBackend, StateFields, UserId,
    UserStateRecord, WriteOp,
};

/// Currency balances, credited by committed grants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Wallet {
    pub loveca: i64,
    pub game_coin: i64,
}

#[derive(Default)]
struct State {
    records: BTreeMap<RecordKey, UserStateRecord>,
    wallets: BTreeMap<UserId, Wallet>,
    grants: Vec<StagedGrant>,
    commits: u32,
    fail_next_commit: bool,
}

/// Durable store double. Commits are all-or-nothing: a batch that would break
/// record uniqueness, or an injected failure, leaves the store untouched.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<State>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only happens after a panicking test; keep going.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert a pre-existing record as if committed by an earlier run.
    pub fn seed(&self, user: UserId, entity_id: i64, fields: StateFields) {
        let rec = UserStateRecord {
            user_id: user,
            kind: fields.kind(),
            entity_id,
            fields,
        };
        self.lock().records.insert(rec.key(), rec);
    }

    pub fn record(&self, user: UserId, kind: EntityKind, entity_id: i64) -> Option<UserStateRecord> {
        self.lock()
            .records
            .get(&RecordKey {
                user_id: user,
                kind,
                entity_id,
            })
            .cloned()
    }

    pub fn record_count(&self) -> usize {
        self.lock().records.len()
    }

    pub fn commit_count(&self) -> u32 {
        self.lock().commits
    }

    pub fn grants(&self) -> Vec<StagedGrant> {
        self.lock().grants.clone()
    }

    pub fn wallet(&self, user: UserId) -> Wallet {
        self.lock().wallets.get(&user).copied().unwrap_or_default()
    }

    /// The next commit fails without applying anything.
    pub fn fail_next_commit(&self) {
        self.lock().fail_next_commit = true;
    }
}

#[async_trait]
impl StateBackend for MemoryBackend {
    async fn fetch_record(
        &self,
        user: UserId,
        kind: EntityKind,
        entity_id: i64,
    ) -> Result<Option<UserStateRecord>> {
        Ok(self.record(user, kind, entity_id))
    }

    async fn commit(&self, batch: &StagedBatch) -> Result<()> {
        let mut st = self.lock();
        if st.fail_next_commit {
            st.fail_next_commit = false;
            bail!("injected commit failure");
        }

        for w in &batch.writes {
            let exists = st.records.contains_key(&w.record.key());
            match w.op {
                WriteOp::Insert if exists => {
                    return Err(anyhow!(
                        "unique violation: record kind={} entity={} exists",
                        w.record.kind,
                        w.record.entity_id
                    ))
                }
                WriteOp::Update if !exists => {
                    return Err(anyhow!(
                        "update of missing record kind={} entity={}",
                        w.record.kind,
                        w.record.entity_id
                    ))
                }
                _ => {}
            }
        }

        for w in &batch.writes {
            st.records.insert(w.record.key(), w.record.clone());
        }
        for g in &batch.grants {
            let wallet = st.wallets.entry(g.user_id).or_default();
            match g.item {
                ItemKind::Loveca => wallet.loveca += g.amount,
                ItemKind::GameCoin => wallet.game_coin += g.amount,
            }
            st.grants.push(g.clone());
        }
        st.commits += 1;
        Ok(())
    }
}
