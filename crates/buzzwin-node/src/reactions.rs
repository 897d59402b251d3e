//! Reactions to real stories.

use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::models::{StoryReaction, User};
use buzzwin_karma::{require_id, KarmaAction, ReactionType};
use serde::Serialize;

/// Result of reacting to a story.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReactionOutcome {
    /// Reactions on the story after this one.
    pub reaction_count: usize,
    /// False when the user had already reacted and only the type changed.
    pub first_reaction: bool,
}

impl Ledger {
    /// React to a story. A user holds one reaction per story; reacting
    /// again replaces its type and earns no further karma.
    pub fn react_to_story(&self, story_id: &str, user_id: &str, reaction_type: ReactionType) -> Result<ReactionOutcome> {
        let story_id = require_id("storyId", story_id)?;
        let user_id = require_id("userId", user_id)?;
        let now = self.clock.now();

        let first_reaction = self.storage.transaction(|txn| {
            if !txn.exists(&User::key(user_id))? {
                return Err(Error::NotFound(format!("user {}", user_id)));
            }
            let key = StoryReaction::key(story_id, user_id);
            let (first, created_at) = match txn.get::<StoryReaction>(&key)? {
                Some(existing) if existing.reaction_type == reaction_type => return Ok(false),
                Some(existing) => (false, existing.created_at),
                None => (true, now),
            };
            txn.put(
                &key,
                &StoryReaction {
                    story_id: story_id.to_string(),
                    user_id: user_id.to_string(),
                    reaction_type,
                    created_at,
                },
            )?;
            Ok(first)
        })?;

        if first_reaction {
            tracing::debug!(story_id = %story_id, user_id = %user_id, "New story reaction");
            self.award_best_effort(user_id, KarmaAction::StoryReaction);
        }

        Ok(ReactionOutcome {
            reaction_count: self.storage.list_reactions(story_id)?.len(),
            first_reaction,
        })
    }

    /// All reactions on a story.
    pub fn story_reactions(&self, story_id: &str) -> Result<Vec<StoryReaction>> {
        let story_id = require_id("storyId", story_id)?;
        self.storage.list_reactions(story_id)
    }
}
