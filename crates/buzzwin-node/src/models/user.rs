//! User profile with karma totals.

use buzzwin_karma::{Award, KarmaAction, KarmaBalance, KarmaBreakdown};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Buzzwin user as seen by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,

    pub display_name: String,

    /// Running karma total
    #[serde(default)]
    pub karma_points: u64,

    /// Points per category; categories missing in older documents read as 0
    #[serde(default)]
    pub karma_breakdown: KarmaBreakdown,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub last_karma_update: Option<DateTime<Utc>>,
}

impl User {
    /// Key prefix for users.
    pub const PREFIX: &'static str = "user:";

    /// Storage key for a user id.
    pub fn key(id: &str) -> String {
        format!("{}{}", Self::PREFIX, id)
    }

    /// Create a user with no karma.
    pub fn new(id: String, display_name: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            display_name,
            karma_points: 0,
            karma_breakdown: KarmaBreakdown::default(),
            created_at: now,
            last_karma_update: None,
        }
    }

    /// Current balance.
    pub fn balance(&self) -> KarmaBalance {
        KarmaBalance::new(self.karma_points, self.karma_breakdown)
    }

    /// Apply a karma action to total and breakdown together.
    pub fn apply_karma(&mut self, action: KarmaAction, now: DateTime<Utc>) -> Award {
        let mut balance = self.balance();
        let award = balance.apply(action);
        self.karma_points = balance.total;
        self.karma_breakdown = balance.breakdown;
        self.last_karma_update = Some(now);
        award
    }
}
