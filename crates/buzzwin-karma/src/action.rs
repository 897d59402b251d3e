//! The karma action table.
//!
//! Every action a user can be rewarded for maps to a fixed number of points
//! and exactly one category. The table is closed: unknown tags are rejected
//! at the parse boundary instead of silently scoring zero.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bucket that karma points accumulate into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KarmaCategory {
    /// Completing rituals.
    Rituals,
    /// Joining and reacting to other people's contributions.
    Community,
    /// Authoring rituals and impact moments.
    Creation,
    /// Streak milestones.
    Milestones,
}

impl KarmaCategory {
    /// All categories, in breakdown order.
    pub const ALL: [KarmaCategory; 4] = [
        KarmaCategory::Rituals,
        KarmaCategory::Community,
        KarmaCategory::Creation,
        KarmaCategory::Milestones,
    ];

    /// Wire name of the category.
    pub const fn as_str(self) -> &'static str {
        match self {
            KarmaCategory::Rituals => "rituals",
            KarmaCategory::Community => "community",
            KarmaCategory::Creation => "creation",
            KarmaCategory::Milestones => "milestones",
        }
    }
}

impl fmt::Display for KarmaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discrete, rewardable user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KarmaAction {
    RitualCompletedQuiet,
    RitualCompletedShared,
    RitualCreated,
    RitualJoined,
    #[serde(rename = "streak_milestone_7")]
    StreakMilestone7,
    #[serde(rename = "streak_milestone_30")]
    StreakMilestone30,
    #[serde(rename = "streak_milestone_100")]
    StreakMilestone100,
    ImpactMomentCreated,
    ImpactMomentConverted,
    StoryReaction,
    CommentPosted,
}

impl KarmaAction {
    /// Every action in the table.
    pub const ALL: [KarmaAction; 11] = [
        KarmaAction::RitualCompletedQuiet,
        KarmaAction::RitualCompletedShared,
        KarmaAction::RitualCreated,
        KarmaAction::RitualJoined,
        KarmaAction::StreakMilestone7,
        KarmaAction::StreakMilestone30,
        KarmaAction::StreakMilestone100,
        KarmaAction::ImpactMomentCreated,
        KarmaAction::ImpactMomentConverted,
        KarmaAction::StoryReaction,
        KarmaAction::CommentPosted,
    ];

    /// Points awarded for this action.
    pub const fn points(self) -> u64 {
        match self {
            KarmaAction::RitualCompletedQuiet => 5,
            KarmaAction::RitualCompletedShared => 10,
            KarmaAction::RitualCreated => 15,
            KarmaAction::RitualJoined => 3,
            KarmaAction::StreakMilestone7 => 25,
            KarmaAction::StreakMilestone30 => 100,
            KarmaAction::StreakMilestone100 => 500,
            KarmaAction::ImpactMomentCreated => 10,
            KarmaAction::ImpactMomentConverted => 20,
            KarmaAction::StoryReaction => 2,
            KarmaAction::CommentPosted => 3,
        }
    }

    /// Category the points accumulate into.
    pub const fn category(self) -> KarmaCategory {
        match self {
            KarmaAction::RitualCompletedQuiet | KarmaAction::RitualCompletedShared => {
                KarmaCategory::Rituals
            }
            KarmaAction::RitualCreated
            | KarmaAction::ImpactMomentCreated
            | KarmaAction::ImpactMomentConverted => KarmaCategory::Creation,
            KarmaAction::RitualJoined | KarmaAction::StoryReaction | KarmaAction::CommentPosted => {
                KarmaCategory::Community
            }
            KarmaAction::StreakMilestone7
            | KarmaAction::StreakMilestone30
            | KarmaAction::StreakMilestone100 => KarmaCategory::Milestones,
        }
    }

    /// Wire tag of the action.
    pub const fn as_str(self) -> &'static str {
        match self {
            KarmaAction::RitualCompletedQuiet => "ritual_completed_quiet",
            KarmaAction::RitualCompletedShared => "ritual_completed_shared",
            KarmaAction::RitualCreated => "ritual_created",
            KarmaAction::RitualJoined => "ritual_joined",
            KarmaAction::StreakMilestone7 => "streak_milestone_7",
            KarmaAction::StreakMilestone30 => "streak_milestone_30",
            KarmaAction::StreakMilestone100 => "streak_milestone_100",
            KarmaAction::ImpactMomentCreated => "impact_moment_created",
            KarmaAction::ImpactMomentConverted => "impact_moment_converted",
            KarmaAction::StoryReaction => "story_reaction",
            KarmaAction::CommentPosted => "comment_posted",
        }
    }

    /// Completion award, depending on whether the ritual was shared.
    pub const fn for_completion(completed_quietly: bool) -> Self {
        if completed_quietly {
            KarmaAction::RitualCompletedQuiet
        } else {
            KarmaAction::RitualCompletedShared
        }
    }

    /// Milestone award for reaching exactly `streak` consecutive days.
    pub const fn streak_milestone(streak: u32) -> Option<Self> {
        match streak {
            7 => Some(KarmaAction::StreakMilestone7),
            30 => Some(KarmaAction::StreakMilestone30),
            100 => Some(KarmaAction::StreakMilestone100),
            _ => None,
        }
    }
}

impl fmt::Display for KarmaAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KarmaAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        KarmaAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| Error::UnknownAction(s.to_string()))
    }
}
