//! The karma ledger and the service handle shared by every endpoint.
//!
//! [`Ledger`] wraps storage with the bookkeeping rules from
//! `buzzwin-karma`. Ritual, impact-moment and reaction operations live in
//! their own modules as further `impl Ledger` blocks.

use crate::error::{Error, Result};
use crate::models::User;
use crate::storage::Storage;
use buzzwin_karma::{require_id, Award, KarmaAction, KarmaBreakdown};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Source of "now" and "today" for the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    /// Wall clock, UTC.
    System,
    /// Pinned instant.
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Clock pinned to midday UTC of `date`.
    pub fn on(date: NaiveDate) -> Self {
        Clock::Fixed(date.and_hms_opt(12, 0, 0).unwrap_or_default().and_utc())
    }

    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(at) => *at,
        }
    }

    /// Current calendar date (UTC).
    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Karma total and breakdown for one user.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KarmaSummary {
    pub user_id: String,
    pub total: u64,
    pub breakdown: KarmaBreakdown,
}

/// Per-user result of a bulk award.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AwardOutcome {
    pub user_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Ledger service handle. Cheap to clone.
#[derive(Clone)]
pub struct Ledger {
    pub(crate) storage: Arc<Storage>,
    pub(crate) clock: Clock,
}

impl Ledger {
    pub fn new(storage: Arc<Storage>, clock: Clock) -> Self {
        Self { storage, clock }
    }

    /// Same storage, different clock.
    pub fn with_clock(&self, clock: Clock) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            clock,
        }
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    // --- Users ---

    /// Create a user profile with zero karma.
    pub fn create_user(&self, id: &str, display_name: &str) -> Result<User> {
        let id = require_id("id", id)?;
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(Error::InvalidArgument("displayName is required".into()));
        }

        let user = User::new(id.to_string(), display_name.to_string(), self.clock.now());
        self.storage.transaction(|txn| {
            let key = User::key(id);
            if txn.exists(&key)? {
                return Err(Error::Conflict(format!("user {} already exists", id)));
            }
            txn.put(&key, &user)
        })?;

        tracing::info!(user_id = %id, "Created user");
        Ok(user)
    }

    /// Fetch a user profile.
    pub fn get_user(&self, id: &str) -> Result<User> {
        let id = require_id("userId", id)?;
        self.storage
            .get_user(id)?
            .ok_or_else(|| Error::NotFound(format!("user {}", id)))
    }

    // --- Karma ---

    /// Award karma for one action. Total and breakdown are updated in the
    /// same guarded write, so concurrent awards never lose increments.
    pub fn award_karma(&self, user_id: &str, action: KarmaAction) -> Result<(Award, KarmaSummary)> {
        let user_id = require_id("userId", user_id)?;
        let now = self.clock.now();

        let (award, user) = self.storage.transaction(|txn| {
            let key = User::key(user_id);
            let mut user: User = txn
                .get(&key)?
                .ok_or_else(|| Error::NotFound(format!("user {}", user_id)))?;
            let award = user.apply_karma(action, now);
            txn.put(&key, &user)?;
            Ok((award, user))
        })?;

        tracing::debug!(
            user_id = %user_id,
            action = %action,
            points = award.points,
            total = award.new_total,
            "Awarded karma"
        );

        Ok((
            award,
            KarmaSummary {
                user_id: user.id,
                total: user.karma_points,
                breakdown: user.karma_breakdown,
            },
        ))
    }

    /// Award the same action to several users. One failure does not stop
    /// the others.
    pub fn award_karma_to_multiple(&self, user_ids: &[String], action: KarmaAction) -> Vec<AwardOutcome> {
        user_ids
            .iter()
            .map(|user_id| match self.award_karma(user_id, action) {
                Ok((award, _)) => AwardOutcome {
                    user_id: user_id.clone(),
                    success: true,
                    new_total: Some(award.new_total),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(user_id = %user_id, action = %action, "Karma award failed: {}", e);
                    AwardOutcome {
                        user_id: user_id.clone(),
                        success: false,
                        new_total: None,
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect()
    }

    /// Current karma of a user.
    pub fn get_user_karma(&self, user_id: &str) -> Result<KarmaSummary> {
        let user = self.get_user(user_id)?;
        Ok(KarmaSummary {
            user_id: user.id,
            total: user.karma_points,
            breakdown: user.karma_breakdown,
        })
    }

    /// Award karma as a side effect of another write. Failures are logged
    /// and swallowed; the primary write stands either way.
    pub(crate) fn award_best_effort(&self, user_id: &str, action: KarmaAction) -> Option<Award> {
        match self.award_karma(user_id, action) {
            Ok((award, _)) => Some(award),
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    action = %action,
                    "Side-effect karma award failed: {}",
                    e
                );
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    /// Ledger over a fresh database, pinned to `date`.
    pub(crate) fn ledger_on(date: NaiveDate) -> (TempDir, Ledger) {
        let dir = tempdir().unwrap();
        let storage = Arc::new(Storage::open(dir.path()).unwrap());
        (dir, Ledger::new(storage, Clock::on(date)))
    }

    pub(crate) fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn award_adds_points_to_total_and_category() {
        let (_dir, ledger) = ledger_on(day(2024, 4, 1));
        ledger.create_user("u1", "Ada").unwrap();

        let (award, summary) = ledger.award_karma("u1", KarmaAction::StoryReaction).unwrap();
        assert_eq!(award.points, 2);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.breakdown.community, 2);
        assert_eq!(summary.breakdown.rituals, 0);

        let user = ledger.get_user("u1").unwrap();
        assert!(user.last_karma_update.is_some());
    }

    #[test]
    fn award_validates_user() {
        let (_dir, ledger) = ledger_on(day(2024, 4, 1));
        assert!(matches!(
            ledger.award_karma("", KarmaAction::StoryReaction),
            Err(Error::Domain(buzzwin_karma::Error::InvalidArgument(_)))
        ));
        assert!(matches!(
            ledger.award_karma("ghost", KarmaAction::StoryReaction),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn total_matches_sum_of_awards() {
        let (_dir, ledger) = ledger_on(day(2024, 4, 1));
        ledger.create_user("u1", "Ada").unwrap();

        let actions = [
            KarmaAction::RitualCompletedQuiet,
            KarmaAction::RitualCompletedShared,
            KarmaAction::StreakMilestone7,
            KarmaAction::CommentPosted,
        ];
        for action in actions {
            ledger.award_karma("u1", action).unwrap();
        }

        let karma = ledger.get_user_karma("u1").unwrap();
        assert_eq!(karma.total, 5 + 10 + 25 + 3);
        assert_eq!(karma.breakdown.sum(), karma.total);
    }

    #[test]
    fn fresh_user_has_zero_breakdown() {
        let (_dir, ledger) = ledger_on(day(2024, 4, 1));
        ledger.create_user("u1", "Ada").unwrap();
        let karma = ledger.get_user_karma("u1").unwrap();
        assert_eq!(karma.total, 0);
        assert_eq!(karma.breakdown, KarmaBreakdown::default());
    }

    #[test]
    fn bulk_award_isolates_failures() {
        let (_dir, ledger) = ledger_on(day(2024, 4, 1));
        ledger.create_user("u1", "Ada").unwrap();
        ledger.create_user("u3", "Grace").unwrap();

        let ids = vec!["u1".to_string(), "missing".to_string(), "u3".to_string()];
        let report = ledger.award_karma_to_multiple(&ids, KarmaAction::RitualJoined);

        assert_eq!(report.len(), 3);
        assert!(report[0].success);
        assert!(!report[1].success);
        assert!(report[1].error.is_some());
        assert!(report[2].success);
        assert_eq!(ledger.get_user_karma("u3").unwrap().total, 3);
    }

    #[test]
    fn best_effort_award_swallows_failures() {
        let (_dir, ledger) = ledger_on(day(2024, 4, 1));
        assert!(ledger.award_best_effort("ghost", KarmaAction::ImpactMomentCreated).is_none());
        assert!(ledger.award_best_effort("", KarmaAction::ImpactMomentCreated).is_none());
    }

    #[test]
    fn duplicate_user_is_a_conflict() {
        let (_dir, ledger) = ledger_on(day(2024, 4, 1));
        ledger.create_user("u1", "Ada").unwrap();
        assert!(matches!(ledger.create_user("u1", "Other"), Err(Error::Conflict(_))));
    }

    #[test]
    fn concurrent_awards_are_not_lost() {
        let (_dir, ledger) = ledger_on(day(2024, 4, 1));
        ledger.create_user("u1", "Ada").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        ledger.award_karma("u1", KarmaAction::StoryReaction).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let karma = ledger.get_user_karma("u1").unwrap();
        assert_eq!(karma.total, 8 * 25 * 2);
        assert_eq!(karma.breakdown.community, 8 * 25 * 2);
    }
}
