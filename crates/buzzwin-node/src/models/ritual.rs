//! Ritual definitions and the owner index.

use buzzwin_karma::{EffortLevel, Membership, RitualScope};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reusable ritual template.
///
/// There is exactly one document per ritual regardless of scope; private
/// rituals are found through [`OwnerIndex`] instead of per-user copies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RitualDefinition {
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: Vec<String>,

    pub effort_level: EffortLevel,

    pub scope: RitualScope,

    /// User who created the ritual
    pub created_by: String,

    /// Roster and ripple count
    #[serde(flatten)]
    pub membership: Membership,

    /// Impact moment this ritual was converted from
    #[serde(default)]
    pub source_moment_id: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl RitualDefinition {
    /// Key prefix for ritual definitions.
    pub const PREFIX: &'static str = "ritual:";

    pub fn key(id: &str) -> String {
        format!("{}{}", Self::PREFIX, id)
    }

    /// Create a ritual whose creator is its first member.
    pub fn new(
        id: String,
        title: String,
        effort_level: EffortLevel,
        scope: RitualScope,
        created_by: String,
        now: DateTime<Utc>,
    ) -> Self {
        let mut membership = Membership::default();
        membership.join(&created_by);
        Self {
            id,
            title,
            description: String::new(),
            tags: Vec::new(),
            effort_level,
            scope,
            created_by,
            membership,
            source_moment_id: None,
            created_at: now,
        }
    }

    /// Whether `user_id` may see this ritual.
    pub fn visible_to(&self, user_id: Option<&str>) -> bool {
        self.scope.is_shared() || user_id == Some(self.created_by.as_str())
    }
}

/// Index entry `owner:{user}:{ritual}` listing rituals a user created.
pub struct OwnerIndex;

impl OwnerIndex {
    pub const PREFIX: &'static str = "owner:";

    pub fn key(user_id: &str, ritual_id: &str) -> String {
        format!("{}{}:{}", Self::PREFIX, user_id, ritual_id)
    }

    pub fn user_prefix(user_id: &str) -> String {
        format!("{}{}:", Self::PREFIX, user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ritual(scope: RitualScope) -> RitualDefinition {
        RitualDefinition::new(
            "r1".into(),
            "Gratitude journal".into(),
            EffortLevel::Minimal,
            scope,
            "alice".into(),
            Utc::now(),
        )
    }

    #[test]
    fn creator_is_first_member() {
        let r = ritual(RitualScope::Public);
        assert!(r.membership.contains("alice"));
        assert_eq!(r.membership.ripple_count, 1);
    }

    #[test]
    fn membership_fields_are_flattened() {
        let json = serde_json::to_value(ritual(RitualScope::Global)).unwrap();
        assert_eq!(json["joinedByUsers"], serde_json::json!(["alice"]));
        assert_eq!(json["rippleCount"], 1);
        assert_eq!(json["effortLevel"], "minimal");
        assert_eq!(json["scope"], "global");
    }

    #[test]
    fn personalized_visible_only_to_owner() {
        let r = ritual(RitualScope::Personalized);
        assert!(r.visible_to(Some("alice")));
        assert!(!r.visible_to(Some("bob")));
        assert!(!r.visible_to(None));
    }

    #[test]
    fn owner_keys_share_user_prefix() {
        assert!(OwnerIndex::key("alice", "r1").starts_with(&OwnerIndex::user_prefix("alice")));
    }
}
