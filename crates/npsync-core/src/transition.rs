/// Before/after satisfaction of one record within a run. Derived, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Transition {
    /// Unsatisfied or absent before, satisfied after.
    NewlySatisfied,
    /// Satisfied before and after.
    AlreadySatisfied,
    /// Unsatisfied before and after (reverse policies, or a new record left unsatisfied).
    UnchangedUnsatisfied,
    /// Satisfied before, unsatisfied after. Reverse policies only.
    NewlyUnsatisfied,
}

impl Transition {
    /// An absent record counts as `was_satisfied == false`.
    pub fn classify(was_satisfied: bool, now_satisfied: bool) -> Self {
        match (was_satisfied, now_satisfied) {
            (false, true) => Transition::NewlySatisfied,
            (true, true) => Transition::AlreadySatisfied,
            (false, false) => Transition::UnchangedUnsatisfied,
            (true, false) => Transition::NewlyUnsatisfied,
        }
    }
}
