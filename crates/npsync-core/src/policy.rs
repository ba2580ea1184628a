//! Target-state and reward policies.
//!
//! A [`TargetPolicy`] is a pure mapping from (catalog entity, current state) to
//! the desired state. It never performs I/O; bound lookups are resolved by the
//! driver and passed in.

use crate::types::{CatalogEntity, EntityKind, RarityBounds, RewardBundle, StateFields};

/// Whether a policy moves records toward or away from satisfaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetPolicy {
    /// Set the side-story completion flag.
    MarkRead,
    /// Clear the side-story completion flag.
    MarkUnread,
    /// Unlock every album flag and raise affinity to the rarity bound.
    MaxUnlock,
}

impl TargetPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetPolicy::MarkRead => "MARK_READ",
            TargetPolicy::MarkUnread => "MARK_UNREAD",
            TargetPolicy::MaxUnlock => "MAX_UNLOCK",
        }
    }

    /// The only entity kind this policy can be applied to.
    pub fn kind(&self) -> EntityKind {
        match self {
            TargetPolicy::MarkRead | TargetPolicy::MarkUnread => EntityKind::Subscenario,
            TargetPolicy::MaxUnlock => EntityKind::Unit,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            TargetPolicy::MarkRead | TargetPolicy::MaxUnlock => Direction::Forward,
            TargetPolicy::MarkUnread => Direction::Reverse,
        }
    }

    /// Exclusion predicate. Ineligible entities are never read or created.
    pub fn is_eligible(&self, entity: &CatalogEntity) -> bool {
        match self {
            TargetPolicy::MarkRead | TargetPolicy::MarkUnread => true,
            TargetPolicy::MaxUnlock => !entity.is_support_unit(),
        }
    }

    /// `true` when [`TargetPolicy::desired`] requires rarity bounds.
    pub fn needs_bounds(&self) -> bool {
        matches!(self, TargetPolicy::MaxUnlock)
    }

    pub fn desired(
        &self,
        entity: &CatalogEntity,
        bounds: Option<&RarityBounds>,
        current: &StateFields,
    ) -> Result<StateFields, PolicyError> {
        if entity.kind() != self.kind() || current.kind() != self.kind() {
            return Err(PolicyError::KindMismatch {
                policy: *self,
                kind: entity.kind(),
            });
        }

        match self {
            TargetPolicy::MarkRead => Ok(StateFields::Subscenario { completed: true }),
            TargetPolicy::MarkUnread => Ok(StateFields::Subscenario { completed: false }),
            TargetPolicy::MaxUnlock => {
                let bounds = bounds.ok_or(PolicyError::MissingBounds {
                    entity_id: entity.entity_id,
                })?;
                Ok(StateFields::Album {
                    rank_max: true,
                    love_max: true,
                    rank_level_max: true,
                    highest_love: bounds.after_love_max,
                })
            }
        }
    }
}

impl std::fmt::Display for TargetPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional one-shot reward attached to newly satisfied forward transitions.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum RewardPolicy {
    #[default]
    Disabled,
    Grant(RewardBundle),
}

impl RewardPolicy {
    /// Bundle to issue for a transition under `direction`, if any.
    pub fn bundle_for(&self, direction: Direction) -> Option<&RewardBundle> {
        match (self, direction) {
            (RewardPolicy::Grant(bundle), Direction::Forward) => Some(bundle),
            _ => None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, RewardPolicy::Grant(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PolicyError {
    /// Policy applied to an entity or record of another kind.
    KindMismatch { policy: TargetPolicy, kind: EntityKind },
    /// Bounds were required but not supplied.
    MissingBounds { entity_id: i64 },
}

impl std::fmt::Display for PolicyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyError::KindMismatch { policy, kind } => write!(
                f,
                "POLICY_KIND_MISMATCH: policy {} targets {} but got {}",
                policy,
                policy.kind(),
                kind
            ),
            PolicyError::MissingBounds { entity_id } => write!(
                f,
                "POLICY_MISSING_BOUNDS: entity {} requires rarity bounds",
                entity_id
            ),
        }
    }
}

impl std::error::Error for PolicyError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(after_love_max: i32) -> RarityBounds {
        RarityBounds {
            rarity: 4,
            before_level_max: 80,
            after_level_max: 100,
            before_love_max: 500,
            after_love_max,
        }
    }

    #[test]
    fn mark_read_and_unread_set_completion_flag() {
        let e = CatalogEntity::subscenario(1);
        let cur = StateFields::neutral(EntityKind::Subscenario);

        assert_eq!(
            TargetPolicy::MarkRead.desired(&e, None, &cur).unwrap(),
            StateFields::Subscenario { completed: true }
        );
        assert_eq!(
            TargetPolicy::MarkUnread
                .desired(&e, None, &StateFields::Subscenario { completed: true })
                .unwrap(),
            StateFields::Subscenario { completed: false }
        );
    }

    #[test]
    fn max_unlock_uses_idolized_love_bound() {
        let e = CatalogEntity::unit(10, 4, 0);
        let cur = StateFields::neutral(EntityKind::Unit);
        let want = TargetPolicy::MaxUnlock
            .desired(&e, Some(&bounds(1000)), &cur)
            .unwrap();

        assert_eq!(
            want,
            StateFields::Album {
                rank_max: true,
                love_max: true,
                rank_level_max: true,
                highest_love: 1000,
            }
        );
        assert!(want.is_satisfied());
    }

    #[test]
    fn max_unlock_without_bounds_is_an_error() {
        let e = CatalogEntity::unit(10, 4, 0);
        let cur = StateFields::neutral(EntityKind::Unit);
        let err = TargetPolicy::MaxUnlock.desired(&e, None, &cur).unwrap_err();
        assert_eq!(err, PolicyError::MissingBounds { entity_id: 10 });
    }

    #[test]
    fn policy_rejects_foreign_kind() {
        let e = CatalogEntity::unit(10, 4, 0);
        let cur = StateFields::neutral(EntityKind::Unit);
        let err = TargetPolicy::MarkRead.desired(&e, None, &cur).unwrap_err();
        assert!(matches!(err, PolicyError::KindMismatch { .. }));
    }

    #[test]
    fn support_units_are_ineligible_for_album() {
        assert!(!TargetPolicy::MaxUnlock.is_eligible(&CatalogEntity::unit(1, 1, 1)));
        assert!(TargetPolicy::MaxUnlock.is_eligible(&CatalogEntity::unit(2, 1, 0)));
        assert!(TargetPolicy::MarkRead.is_eligible(&CatalogEntity::subscenario(3)));
    }

    #[test]
    fn rewards_only_flow_forward() {
        let p = RewardPolicy::Grant(RewardBundle::subscenario_default());
        assert!(p.bundle_for(Direction::Forward).is_some());
        assert!(p.bundle_for(Direction::Reverse).is_none());
        assert!(RewardPolicy::Disabled.bundle_for(Direction::Forward).is_none());
    }
}
