use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reward bundle amounts for newly read side stories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSettings {
    pub premium_token_amount: i64,
    pub soft_currency_amount: i64,
    /// Provenance note attached to the premium token.
    pub comment: String,
}

impl Default for RewardSettings {
    fn default() -> Self {
        Self {
            premium_token_amount: 1,
            soft_currency_amount: 20_000,
            comment: "Side story completion reward".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSettings {
    pub rewards: RewardSettings,
    /// Log progress every N processed entities; 0 disables.
    pub progress_every: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            rewards: RewardSettings::default(),
            progress_every: 100,
        }
    }
}

impl RunSettings {
    /// Read typed settings from a merged config. Absent keys keep defaults;
    /// present keys of the wrong type or range fail with CONFIG_INVALID.
    pub fn from_config_json(config_json: &Value) -> Result<Self> {
        let mut s = RunSettings::default();

        if let Some(v) = config_json.pointer("/rewards/premium_token_amount") {
            s.rewards.premium_token_amount = positive_i64(v, "/rewards/premium_token_amount")?;
        }
        if let Some(v) = config_json.pointer("/rewards/soft_currency_amount") {
            s.rewards.soft_currency_amount = positive_i64(v, "/rewards/soft_currency_amount")?;
        }
        if let Some(v) = config_json.pointer("/rewards/comment") {
            let c = v.as_str().map(str::trim).unwrap_or("");
            if c.is_empty() {
                bail!("CONFIG_INVALID /rewards/comment must be a non-empty string");
            }
            s.rewards.comment = c.to_string();
        }
        if let Some(v) = config_json.pointer("/run/progress_every") {
            s.progress_every = match v.as_u64() {
                Some(n) => n,
                None => bail!("CONFIG_INVALID /run/progress_every must be a non-negative integer"),
            };
        }

        Ok(s)
    }
}

fn positive_i64(v: &Value, ptr: &str) -> Result<i64> {
    match v.as_i64() {
        Some(n) if n > 0 => Ok(n),
        _ => bail!("CONFIG_INVALID {} must be a positive integer", ptr),
    }
}
