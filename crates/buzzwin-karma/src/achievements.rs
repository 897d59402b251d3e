//! Achievement catalogue.
//!
//! Achievements are never stored: they are evaluated on demand from the
//! user's karma total and ritual statistics.

use crate::streak::RitualStats;
use serde::Serialize;

/// The quantity an achievement measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    TotalCompleted(u64),
    LongestStreak(u64),
    KarmaPoints(u64),
}

impl Requirement {
    fn target(self) -> u64 {
        match self {
            Requirement::TotalCompleted(n)
            | Requirement::LongestStreak(n)
            | Requirement::KarmaPoints(n) => n,
        }
    }

    fn measure(self, progress: &Progress) -> u64 {
        match self {
            Requirement::TotalCompleted(_) => progress.total_completed,
            Requirement::LongestStreak(_) => progress.longest_streak,
            Requirement::KarmaPoints(_) => progress.karma_points,
        }
    }
}

/// Static description of one achievement.
#[derive(Debug, Clone, Copy)]
pub struct AchievementDef {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub requirement: Requirement,
}

/// Every achievement, in display order.
pub const CATALOGUE: &[AchievementDef] = &[
    AchievementDef {
        id: "first_ritual",
        title: "First Step",
        description: "Complete your first ritual",
        requirement: Requirement::TotalCompleted(1),
    },
    AchievementDef {
        id: "ritual_regular",
        title: "Ritual Regular",
        description: "Complete 10 rituals",
        requirement: Requirement::TotalCompleted(10),
    },
    AchievementDef {
        id: "ritual_devotee",
        title: "Ritual Devotee",
        description: "Complete 50 rituals",
        requirement: Requirement::TotalCompleted(50),
    },
    AchievementDef {
        id: "week_warrior",
        title: "Week Warrior",
        description: "Keep a 7 day streak",
        requirement: Requirement::LongestStreak(7),
    },
    AchievementDef {
        id: "monthly_master",
        title: "Monthly Master",
        description: "Keep a 30 day streak",
        requirement: Requirement::LongestStreak(30),
    },
    AchievementDef {
        id: "centurion",
        title: "Centurion",
        description: "Keep a 100 day streak",
        requirement: Requirement::LongestStreak(100),
    },
    AchievementDef {
        id: "karma_seedling",
        title: "Karma Seedling",
        description: "Earn 100 karma",
        requirement: Requirement::KarmaPoints(100),
    },
    AchievementDef {
        id: "karma_grove",
        title: "Karma Grove",
        description: "Earn 500 karma",
        requirement: Requirement::KarmaPoints(500),
    },
    AchievementDef {
        id: "karma_forest",
        title: "Karma Forest",
        description: "Earn 1000 karma",
        requirement: Requirement::KarmaPoints(1000),
    },
];

/// Inputs achievements are evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub karma_points: u64,
    pub current_streak: u64,
    pub longest_streak: u64,
    pub total_completed: u64,
}

impl Progress {
    /// Progress from a karma total and ritual stats.
    pub fn new(karma_points: u64, stats: &RitualStats) -> Self {
        Self {
            karma_points,
            current_streak: u64::from(stats.current_streak),
            longest_streak: u64::from(stats.longest_streak.max(stats.current_streak)),
            total_completed: u64::from(stats.total_completed),
        }
    }
}

/// One evaluated achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub unlocked: bool,
    /// Current value, capped at `target`.
    pub progress: u64,
    pub target: u64,
}

/// Evaluated catalogue plus the ids that are unlocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementReport {
    pub achievements: Vec<Achievement>,
    pub unlocked_ids: Vec<&'static str>,
}

/// Evaluate the whole catalogue.
pub fn evaluate(progress: &Progress) -> AchievementReport {
    let achievements: Vec<Achievement> = CATALOGUE
        .iter()
        .map(|def| {
            let target = def.requirement.target();
            let value = def.requirement.measure(progress);
            Achievement {
                id: def.id,
                title: def.title,
                description: def.description,
                unlocked: value >= target,
                progress: value.min(target),
                target,
            }
        })
        .collect();

    let unlocked_ids = achievements
        .iter()
        .filter(|a| a.unlocked)
        .map(|a| a.id)
        .collect();

    AchievementReport {
        achievements,
        unlocked_ids,
    }
}
