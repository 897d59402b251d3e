//! Karma balances and their categorized breakdown.

use crate::action::{KarmaAction, KarmaCategory};
use serde::{Deserialize, Serialize};

/// Points accumulated per category.
///
/// Every category is always present; missing fields in stored documents
/// deserialize as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KarmaBreakdown {
    pub rituals: u64,
    pub community: u64,
    pub creation: u64,
    pub milestones: u64,
}

impl KarmaBreakdown {
    /// Points in one category.
    pub const fn get(&self, category: KarmaCategory) -> u64 {
        match category {
            KarmaCategory::Rituals => self.rituals,
            KarmaCategory::Community => self.community,
            KarmaCategory::Creation => self.creation,
            KarmaCategory::Milestones => self.milestones,
        }
    }

    fn slot_mut(&mut self, category: KarmaCategory) -> &mut u64 {
        match category {
            KarmaCategory::Rituals => &mut self.rituals,
            KarmaCategory::Community => &mut self.community,
            KarmaCategory::Creation => &mut self.creation,
            KarmaCategory::Milestones => &mut self.milestones,
        }
    }

    /// Add points to one category.
    pub fn add(&mut self, category: KarmaCategory, points: u64) {
        let slot = self.slot_mut(category);
        *slot = slot.saturating_add(points);
    }

    /// Sum across all categories.
    pub fn sum(&self) -> u64 {
        KarmaCategory::ALL
            .into_iter()
            .fold(0u64, |acc, c| acc.saturating_add(self.get(c)))
    }
}

/// A user's karma total plus breakdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KarmaBalance {
    pub total: u64,
    pub breakdown: KarmaBreakdown,
}

/// Outcome of applying one action to a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Award {
    pub action: KarmaAction,
    pub points: u64,
    pub category: KarmaCategory,
    pub new_total: u64,
}

impl KarmaBalance {
    /// Balance from stored fields.
    pub const fn new(total: u64, breakdown: KarmaBreakdown) -> Self {
        Self { total, breakdown }
    }

    /// Apply an action: total and its category grow by the action's points,
    /// every other category is left alone.
    pub fn apply(&mut self, action: KarmaAction) -> Award {
        let points = action.points();
        let category = action.category();
        self.total = self.total.saturating_add(points);
        self.breakdown.add(category, points);
        Award {
            action,
            points,
            category,
            new_total: self.total,
        }
    }
}
