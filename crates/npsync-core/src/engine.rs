use std::collections::BTreeSet;

use anyhow::{Context, Result};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::policy::{PolicyError, RewardPolicy, TargetPolicy};
use crate::store::{CatalogSource, UnitOfWork};
use crate::summary::RunSummary;
use crate::transition::Transition;
use crate::types::{CatalogEntity, EntityKind, RarityBounds, RewardBundle, StateFields, UserId};

/// Progress is logged every this many processed entities unless overridden.
pub const DEFAULT_PROGRESS_EVERY: u64 = 100;

/// Parameters of one reconciliation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcileRequest {
    pub user: UserId,
    pub kind: EntityKind,
    pub policy: TargetPolicy,
    pub rewards: RewardPolicy,
    /// 0 disables progress logging.
    pub progress_every: u64,
}

impl ReconcileRequest {
    pub fn new(user: UserId, policy: TargetPolicy) -> Self {
        Self {
            user,
            kind: policy.kind(),
            policy,
            rewards: RewardPolicy::Disabled,
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }

    pub fn with_rewards(mut self, bundle: RewardBundle) -> Self {
        self.rewards = RewardPolicy::Grant(bundle);
        self
    }

    pub fn with_progress_every(mut self, n: u64) -> Self {
        self.progress_every = n;
        self
    }
}

/// Drive every catalog entity of `req.kind` to the state `req.policy` prescribes
/// for `req.user`, then flush once.
///
/// Per entity, in catalog order:
/// 1. ineligible => `skipped_ineligible`, nothing read or created
/// 2. bounds required but unavailable => warn, `unresolved`, nothing read or created
/// 3. get, or stage_create with the neutral state when absent
/// 4. classify the transition against the desired state, before mutating
/// 5. stage_mutate only when desired differs from current
/// 6. newly satisfied + forward policy + rewards enabled => one grant
///
/// Any catalog, store or issuer error aborts the run before the flush, so
/// nothing staged becomes durable.
pub async fn reconcile<C, U>(catalog: &C, uow: &mut U, req: &ReconcileRequest) -> Result<RunSummary>
where
    C: CatalogSource + ?Sized,
    U: UnitOfWork + ?Sized,
{
    let run_id = Uuid::new_v4();
    let span = info_span!(
        "reconcile",
        %run_id,
        user = %req.user,
        kind = %req.kind,
        policy = %req.policy
    );
    run(catalog, uow, req).instrument(span).await
}

async fn run<C, U>(catalog: &C, uow: &mut U, req: &ReconcileRequest) -> Result<RunSummary>
where
    C: CatalogSource + ?Sized,
    U: UnitOfWork + ?Sized,
{
    if req.policy.kind() != req.kind {
        return Err(PolicyError::KindMismatch {
            policy: req.policy,
            kind: req.kind,
        }
        .into());
    }

    let entities = catalog
        .list_entities(req.kind)
        .await
        .with_context(|| format!("catalog list_entities failed kind={}", req.kind))?;
    info!(
        count = entities.len(),
        rewards = req.rewards.is_enabled(),
        "processing catalog"
    );

    let bundle = req.rewards.bundle_for(req.policy.direction());
    let mut summary = RunSummary::default();
    let mut rewarded: BTreeSet<i64> = BTreeSet::new();

    for entity in &entities {
        if !req.policy.is_eligible(entity) {
            debug!(entity_id = entity.entity_id, "skipping ineligible entity");
            summary.skipped_ineligible += 1;
            continue;
        }

        let bounds = if req.policy.needs_bounds() {
            match resolve_bounds(catalog, entity).await? {
                Some(b) => Some(b),
                None => {
                    warn!(
                        entity_id = entity.entity_id,
                        rarity = ?entity.rarity(),
                        "could not resolve rarity bounds, skipping"
                    );
                    summary.unresolved += 1;
                    continue;
                }
            }
        } else {
            None
        };

        let existing = uow
            .get(req.user, req.kind, entity.entity_id)
            .await
            .with_context(|| format!("state lookup failed entity={}", entity.entity_id))?;
        let mut record = match existing {
            Some(r) => r,
            None => {
                summary.created += 1;
                uow.stage_create(
                    req.user,
                    req.kind,
                    entity.entity_id,
                    StateFields::neutral(req.kind),
                )?
            }
        };

        let desired = req
            .policy
            .desired(entity, bounds.as_ref(), &record.fields)?;
        let transition = Transition::classify(record.fields.is_satisfied(), desired.is_satisfied());

        if desired != record.fields {
            uow.stage_mutate(&mut record, desired)?;
        }

        if transition == Transition::NewlySatisfied {
            if let Some(bundle) = bundle {
                // One-shot guard: a repeated entity id never earns a second bundle.
                if rewarded.insert(entity.entity_id) {
                    uow.grant(req.user, bundle)
                        .await
                        .with_context(|| format!("reward grant failed entity={}", entity.entity_id))?;
                    summary.rewards_granted += 1;
                }
            }
        }

        summary.record(transition);

        if req.progress_every > 0 && summary.total % req.progress_every == 0 {
            info!(processed = summary.total, "progress");
        }
    }

    let report = uow.flush().await.context("end-of-run flush failed")?;
    info!(
        inserted = report.inserted,
        updated = report.updated,
        grants = report.grants,
        total = summary.total,
        newly_satisfied = summary.newly_satisfied,
        skipped_ineligible = summary.skipped_ineligible,
        unresolved = summary.unresolved,
        "flushed"
    );

    Ok(summary)
}

async fn resolve_bounds<C>(catalog: &C, entity: &CatalogEntity) -> Result<Option<RarityBounds>>
where
    C: CatalogSource + ?Sized,
{
    let Some(rarity) = entity.rarity() else {
        return Ok(None);
    };
    catalog
        .rarity_bounds(rarity)
        .await
        .with_context(|| format!("rarity bound lookup failed rarity={rarity}"))
}
