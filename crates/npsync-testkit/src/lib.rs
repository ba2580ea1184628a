//! In-memory collaborators for scenario tests.
//!
//! - [`MemoryCatalog`]: fixed entity lists and rarity table, optional failures.
//! - [`MemoryBackend`]: state backend with all-or-nothing commits, commit
//!   counting and failure injection. Clones share the same store so several
//!   runs can be driven against one user's data.

mod backend;
mod catalog;

pub use backend::{MemoryBackend, Wallet};
pub use catalog::MemoryCatalog;

use npsync_core::{RarityBounds, StagedSession};

/// Fresh session over a shared backend handle.
pub fn session(backend: &MemoryBackend) -> StagedSession<MemoryBackend> {
    StagedSession::new(backend.clone())
}

/// Rarity row with distinct level/affinity caps.
pub fn rarity(rarity: i32, after_love_max: i32) -> RarityBounds {
    RarityBounds {
        rarity,
        before_level_max: 40 + rarity * 10,
        after_level_max: 60 + rarity * 10,
        before_love_max: after_love_max / 2,
        after_love_max,
    }
}
