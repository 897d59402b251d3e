//! Ritual membership: who joined a ritual, and its ripple count.

use serde::{Deserialize, Serialize};

/// Membership roster of one ritual definition.
///
/// `ripple_count` tracks roster size. It is stored separately so that
/// documents written before join and leave were kept in lockstep can be
/// detected and repaired with [`Membership::reconcile`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Membership {
    pub joined_by_users: Vec<String>,
    pub ripple_count: u64,
}

impl Membership {
    /// Whether `user_id` is on the roster.
    pub fn contains(&self, user_id: &str) -> bool {
        self.joined_by_users.iter().any(|u| u == user_id)
    }

    /// Add a member. Returns `false` (and changes nothing) if already joined.
    pub fn join(&mut self, user_id: &str) -> bool {
        if self.contains(user_id) {
            return false;
        }
        self.joined_by_users.push(user_id.to_string());
        self.ripple_count = self.ripple_count.saturating_add(1);
        true
    }

    /// Remove a member. Returns `false` (and changes nothing) if not joined.
    pub fn leave(&mut self, user_id: &str) -> bool {
        let before = self.joined_by_users.len();
        self.joined_by_users.retain(|u| u != user_id);
        if self.joined_by_users.len() == before {
            return false;
        }
        self.ripple_count = self.ripple_count.saturating_sub(1);
        true
    }

    /// Drop duplicate roster entries and reset the ripple count to roster
    /// size. Returns `true` if anything changed.
    pub fn reconcile(&mut self) -> bool {
        let mut seen = std::collections::HashSet::new();
        let before = self.joined_by_users.len();
        self.joined_by_users.retain(|u| seen.insert(u.clone()));
        let size = self.joined_by_users.len() as u64;
        let changed = before != self.joined_by_users.len() || self.ripple_count != size;
        self.ripple_count = size;
        changed
    }

    /// Whether the ripple count equals the roster size.
    pub fn is_consistent(&self) -> bool {
        self.ripple_count == self.joined_by_users.len() as u64
    }
}
