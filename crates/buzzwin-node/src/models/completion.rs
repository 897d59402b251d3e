//! Ritual completions and the per-user aggregate derived from them.

use buzzwin_karma::RitualStats;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One ritual completed by one user on one calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RitualCompletion {
    pub id: String,
    pub ritual_id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub completed_quietly: bool,
    #[serde(default)]
    pub shared_as_moment_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RitualCompletion {
    pub const PREFIX: &'static str = "completion:";

    /// Key `completion:{user}:{date}:{ritual}`. One key per ritual, user and
    /// day, so a second same-day completion collides.
    pub fn key(user_id: &str, date: NaiveDate, ritual_id: &str) -> String {
        format!("{}{}:{}:{}", Self::PREFIX, user_id, date, ritual_id)
    }

    /// Prefix covering every completion of one user.
    pub fn user_prefix(user_id: &str) -> String {
        format!("{}{}:", Self::PREFIX, user_id)
    }

    pub fn storage_key(&self) -> String {
        Self::key(&self.user_id, self.date, &self.ritual_id)
    }
}

/// Streaks and counters for one user, rebuilt on every completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRitualState {
    pub user_id: String,
    #[serde(flatten)]
    pub stats: RitualStats,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserRitualState {
    pub const PREFIX: &'static str = "state:";

    pub fn key(user_id: &str) -> String {
        format!("{}{}", Self::PREFIX, user_id)
    }

    /// All-zero state for a user with no completions.
    pub fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            stats: RitualStats::default(),
            updated_at: None,
        }
    }
}
