use crate::transition::Transition;

/// Counters for one reconciliation run. Created at run start, returned at the end.
///
/// `total` counts every entity whose record was resolved and classified.
/// Ineligible and unresolved entities are tracked separately and never
/// included in `total`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: u64,
    pub newly_satisfied: u64,
    pub already_satisfied: u64,
    pub unchanged_unsatisfied: u64,
    pub newly_unsatisfied: u64,
    /// Records created this run (no record existed before).
    pub created: u64,
    pub skipped_ineligible: u64,
    /// Bound lookup unavailable; entity left untouched.
    pub unresolved: u64,
    pub rewards_granted: u64,
}

impl RunSummary {
    pub fn record(&mut self, transition: Transition) {
        self.total += 1;
        match transition {
            Transition::NewlySatisfied => self.newly_satisfied += 1,
            Transition::AlreadySatisfied => self.already_satisfied += 1,
            Transition::UnchangedUnsatisfied => self.unchanged_unsatisfied += 1,
            Transition::NewlyUnsatisfied => self.newly_unsatisfied += 1,
        }
    }

    /// Every classified entity lands in exactly one transition bucket.
    pub fn is_conserved(&self) -> bool {
        self.total
            == self.newly_satisfied
                + self.already_satisfied
                + self.unchanged_unsatisfied
                + self.newly_unsatisfied
    }

    /// Entities visited in the catalog, whatever their outcome.
    pub fn visited(&self) -> u64 {
        self.total + self.skipped_ineligible + self.unresolved
    }
}
