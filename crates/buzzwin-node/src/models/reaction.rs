//! Reactions to real stories.

use buzzwin_karma::ReactionType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One user's reaction to one story. Keyed by story and user, so a user
/// holds at most one reaction per story.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoryReaction {
    pub story_id: String,
    pub user_id: String,
    pub reaction_type: ReactionType,
    pub created_at: DateTime<Utc>,
}

impl StoryReaction {
    pub const PREFIX: &'static str = "reaction:";

    pub fn key(story_id: &str, user_id: &str) -> String {
        format!("{}{}:{}", Self::PREFIX, story_id, user_id)
    }

    pub fn story_prefix(story_id: &str) -> String {
        format!("{}{}:", Self::PREFIX, story_id)
    }
}
