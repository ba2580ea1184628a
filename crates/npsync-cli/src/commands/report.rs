//! Human-readable run summaries. Printed to stdout only after a successful
//! flush; logs go to stderr.

use std::fmt::Write;

use npsync_core::{ItemKind, RewardBundle, RunSummary, TargetPolicy};

/// `rewards` is the bundle granted per newly read side story, or `None` when
/// the run granted nothing.
pub fn subscenario_summary(
    s: &RunSummary,
    policy: TargetPolicy,
    rewards: Option<&RewardBundle>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n✓ Completed processing {} subscenarios", s.total);

    if policy == TargetPolicy::MarkUnread {
        let _ = writeln!(out, "  - Newly marked as unread: {}", s.newly_unsatisfied);
        let _ = writeln!(out, "  - Already unread: {}", s.unchanged_unsatisfied);
        return out;
    }

    let _ = writeln!(out, "  - Newly marked as read: {}", s.newly_satisfied);
    let _ = writeln!(out, "  - Already completed: {}", s.already_satisfied);
    if let Some(bundle) = rewards {
        let n = i64::try_from(s.rewards_granted).unwrap_or(i64::MAX);
        let _ = writeln!(out, "  - Rewards granted: {} subscenarios", s.rewards_granted);
        let _ = writeln!(
            out,
            "    (Total: {} loveca + {} coins)",
            group_thousands(n.saturating_mul(bundle.amount_of(ItemKind::Loveca))),
            group_thousands(n.saturating_mul(bundle.amount_of(ItemKind::GameCoin))),
        );
    }
    out
}

pub fn album_summary(s: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n✓ Completed processing {} cards", s.total);
    let _ = writeln!(out, "  - Newly maxed in album: {}", s.newly_satisfied);
    let _ = writeln!(out, "  - Already maxed: {}", s.already_satisfied);
    let _ = writeln!(out, "  - New album entries: {}", s.created);
    let _ = writeln!(out, "  - Skipped (support cards): {}", s.skipped_ineligible);
    if s.unresolved > 0 {
        let _ = writeln!(out, "  - Skipped (unknown rarity): {}", s.unresolved);
    }
    out
}

/// `20000000` -> `20,000,000`.
fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
