/// Premium currency granted per newly read side story.
pub const SUBSCENARIO_LOVECA_REWARD_AMOUNT: i64 = 1;

/// Soft currency granted per newly read side story.
pub const SUBSCENARIO_GAME_COIN_REWARD_AMOUNT: i64 = 20_000;

/// Provenance note attached to the premium token of a side-story reward.
pub const SUBSCENARIO_REWARD_COMMENT: &str = "Side story completion reward";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Catalog entity kinds this engine can reconcile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    /// Side-story chapter.
    Subscenario,
    /// Collectible unit (card); its user state lives in the album.
    Unit,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Subscenario => "subscenario",
            EntityKind::Unit => "unit",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific catalog attributes read by this engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityAttrs {
    Subscenario,
    Unit {
        rarity: i32,
        /// Non-zero for support-type units that have no album representation.
        disable_rank_up: i32,
    },
}

/// Immutable catalog definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntity {
    pub entity_id: i64,
    pub attrs: EntityAttrs,
}

impl CatalogEntity {
    pub fn subscenario(entity_id: i64) -> Self {
        Self {
            entity_id,
            attrs: EntityAttrs::Subscenario,
        }
    }

    pub fn unit(entity_id: i64, rarity: i32, disable_rank_up: i32) -> Self {
        Self {
            entity_id,
            attrs: EntityAttrs::Unit {
                rarity,
                disable_rank_up,
            },
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self.attrs {
            EntityAttrs::Subscenario => EntityKind::Subscenario,
            EntityAttrs::Unit { .. } => EntityKind::Unit,
        }
    }

    /// Support-type units carry no album entry.
    pub fn is_support_unit(&self) -> bool {
        matches!(self.attrs, EntityAttrs::Unit { disable_rank_up, .. } if disable_rank_up > 0)
    }

    /// Rarity key for the auxiliary bound table, units only.
    pub fn rarity(&self) -> Option<i32> {
        match self.attrs {
            EntityAttrs::Unit { rarity, .. } => Some(rarity),
            EntityAttrs::Subscenario => None,
        }
    }
}

/// Level and affinity bounds for one unit rarity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RarityBounds {
    pub rarity: i32,
    pub before_level_max: i32,
    pub after_level_max: i32,
    pub before_love_max: i32,
    /// Highest affinity reachable, idolized form.
    pub after_love_max: i32,
}

/// Mutable per-user state fields. The variant always matches the record kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateFields {
    Subscenario {
        completed: bool,
    },
    Album {
        /// Idolized form unlocked.
        rank_max: bool,
        love_max: bool,
        rank_level_max: bool,
        highest_love: i32,
    },
}

impl StateFields {
    /// Unsatisfied initial state used when a record is first created.
    pub fn neutral(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Subscenario => StateFields::Subscenario { completed: false },
            EntityKind::Unit => StateFields::Album {
                rank_max: false,
                love_max: false,
                rank_level_max: false,
                highest_love: 0,
            },
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            StateFields::Subscenario { .. } => EntityKind::Subscenario,
            StateFields::Album { .. } => EntityKind::Unit,
        }
    }

    pub fn is_satisfied(&self) -> bool {
        match *self {
            StateFields::Subscenario { completed } => completed,
            StateFields::Album {
                rank_max,
                love_max,
                rank_level_max,
                ..
            } => rank_max && love_max && rank_level_max,
        }
    }
}

/// One user's progress on one catalog entity. Unique per (user, kind, entity).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserStateRecord {
    pub user_id: UserId,
    pub kind: EntityKind,
    pub entity_id: i64,
    pub fields: StateFields,
}

impl UserStateRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey {
            user_id: self.user_id,
            kind: self.kind,
            entity_id: self.entity_id,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey {
    pub user_id: UserId,
    pub kind: EntityKind,
    pub entity_id: i64,
}

/// Inventory items this engine can grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemKind {
    /// Premium currency token.
    Loveca,
    /// Soft currency.
    GameCoin,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Loveca => "LOVECA",
            ItemKind::GameCoin => "GAME_COIN",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewardItem {
    pub item: ItemKind,
    pub amount: i64,
    pub comment: Option<String>,
}

/// Ordered list of items granted together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewardBundle {
    pub items: Vec<RewardItem>,
}

impl RewardBundle {
    /// Premium token tagged with `comment`, followed by untagged soft currency.
    pub fn currency_pair(loveca: i64, game_coin: i64, comment: impl Into<String>) -> Self {
        Self {
            items: vec![
                RewardItem {
                    item: ItemKind::Loveca,
                    amount: loveca,
                    comment: Some(comment.into()),
                },
                RewardItem {
                    item: ItemKind::GameCoin,
                    amount: game_coin,
                    comment: None,
                },
            ],
        }
    }

    /// The fixed side-story completion bundle.
    pub fn subscenario_default() -> Self {
        Self::currency_pair(
            SUBSCENARIO_LOVECA_REWARD_AMOUNT,
            SUBSCENARIO_GAME_COIN_REWARD_AMOUNT,
            SUBSCENARIO_REWARD_COMMENT,
        )
    }

    /// Sum of amounts for one item kind within a single bundle. Saturates.
    pub fn amount_of(&self, item: ItemKind) -> i64 {
        self.items
            .iter()
            .filter(|i| i.item == item)
            .fold(0i64, |acc, i| acc.saturating_add(i.amount))
    }
}
