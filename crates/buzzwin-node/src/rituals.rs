//! Ritual participation registry and ritual completions.
//!
//! - join/leave keep a ritual's roster and ripple count in lockstep
//! - completing a ritual records the completion and the user's rebuilt
//!   streak state in one batch, then awards karma best-effort

use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::models::{
    generate_id, OwnerIndex, RitualCompletion, RitualDefinition, User, UserRitualState,
};
use buzzwin_karma::{
    evaluate_achievements, require_id, AchievementReport, EffortLevel, KarmaAction, Progress,
    RitualScope, RitualStats,
};
use serde::Serialize;

/// Fields for a new ritual definition.
#[derive(Debug, Clone)]
pub struct NewRitual {
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub effort_level: EffortLevel,
    pub scope: RitualScope,
}

/// Result of a join.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JoinOutcome {
    /// False when the user was already a member.
    pub joined: bool,
    pub ripple_count: u64,
}

/// Result of a leave.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeaveOutcome {
    /// False when nothing changed (not a member, or no such ritual).
    pub left: bool,
    pub ripple_count: Option<u64>,
}

/// Result of completing a ritual.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOutcome {
    pub completion: RitualCompletion,
    pub updated_streak: u32,
    pub state: UserRitualState,
    /// Karma points actually awarded, milestones included.
    pub karma_awarded: u64,
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !cleaned.contains(&tag) {
            cleaned.push(tag);
        }
    }
    cleaned
}

impl Ledger {
    // --- Ritual definitions ---

    /// Create a ritual. The creator joins it immediately.
    pub fn create_ritual(&self, new: NewRitual) -> Result<RitualDefinition> {
        self.insert_ritual(new, None)
    }

    pub(crate) fn insert_ritual(
        &self,
        new: NewRitual,
        source_moment_id: Option<String>,
    ) -> Result<RitualDefinition> {
        let user_id = require_id("userId", &new.user_id)?.to_string();
        let title = new.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::InvalidArgument("title is required".into()));
        }

        let now = self.clock.now();
        let id = generate_id(format!("{}:{}", user_id, title).as_bytes());
        let mut ritual = RitualDefinition::new(id, title, new.effort_level, new.scope, user_id.clone(), now);
        ritual.description = new.description.trim().to_string();
        ritual.tags = clean_tags(new.tags);
        ritual.source_moment_id = source_moment_id;

        self.storage.transaction(|txn| {
            if !txn.exists(&User::key(&user_id))? {
                return Err(Error::NotFound(format!("user {}", user_id)));
            }
            txn.put(&RitualDefinition::key(&ritual.id), &ritual)?;
            txn.put_marker(&OwnerIndex::key(&user_id, &ritual.id));
            Ok(())
        })?;

        tracing::info!(ritual_id = %ritual.id, user_id = %user_id, scope = ritual.scope.as_str(), "Created ritual");
        self.award_best_effort(&user_id, KarmaAction::RitualCreated);
        Ok(ritual)
    }

    /// Fetch a ritual definition.
    pub fn get_ritual(&self, ritual_id: &str) -> Result<RitualDefinition> {
        let ritual_id = require_id("ritualId", ritual_id)?;
        self.storage
            .get_ritual(ritual_id)?
            .ok_or_else(|| Error::NotFound(format!("ritual {}", ritual_id)))
    }

    /// Rituals visible to `viewer`, optionally narrowed to one scope.
    pub fn list_rituals(&self, scope: Option<RitualScope>, viewer: Option<&str>) -> Result<Vec<RitualDefinition>> {
        Ok(self
            .storage
            .list_rituals()?
            .into_iter()
            .filter(|r| scope.map_or(true, |s| r.scope == s))
            .filter(|r| r.visible_to(viewer))
            .collect())
    }

    /// Rituals created by a user, private ones included.
    pub fn list_owned_rituals(&self, user_id: &str) -> Result<Vec<RitualDefinition>> {
        let user_id = require_id("userId", user_id)?;
        let mut rituals = Vec::new();
        for id in self.storage.owned_ritual_ids(user_id)? {
            match self.storage.get_ritual(&id)? {
                Some(ritual) => rituals.push(ritual),
                None => tracing::warn!(ritual_id = %id, user_id = %user_id, "Dangling owner index entry"),
            }
        }
        Ok(rituals)
    }

    /// Delete a ritual. Only its creator may do so.
    pub fn delete_ritual(&self, ritual_id: &str, user_id: &str) -> Result<()> {
        let ritual_id = require_id("ritualId", ritual_id)?;
        let user_id = require_id("userId", user_id)?;

        self.storage.transaction(|txn| {
            let ritual: RitualDefinition = txn
                .get(&RitualDefinition::key(ritual_id))?
                .ok_or_else(|| Error::NotFound(format!("ritual {}", ritual_id)))?;
            if ritual.created_by != user_id {
                return Err(Error::Unauthorized(format!(
                    "ritual {} is not owned by {}",
                    ritual_id, user_id
                )));
            }
            txn.delete(&RitualDefinition::key(ritual_id));
            txn.delete(&OwnerIndex::key(&ritual.created_by, ritual_id));
            Ok(())
        })?;

        tracing::info!(ritual_id = %ritual_id, "Deleted ritual");
        Ok(())
    }

    // --- Participation ---

    /// Join a ritual. Joining twice is a no-op.
    pub fn join_ritual(&self, ritual_id: &str, user_id: &str) -> Result<JoinOutcome> {
        let ritual_id = require_id("ritualId", ritual_id)?;
        let user_id = require_id("userId", user_id)?;

        let outcome = self.storage.transaction(|txn| {
            if !txn.exists(&User::key(user_id))? {
                return Err(Error::NotFound(format!("user {}", user_id)));
            }
            let key = RitualDefinition::key(ritual_id);
            let mut ritual: RitualDefinition = txn
                .get(&key)?
                .ok_or_else(|| Error::NotFound(format!("ritual {}", ritual_id)))?;
            if !ritual.visible_to(Some(user_id)) {
                return Err(Error::Unauthorized(format!("ritual {} is private", ritual_id)));
            }

            let joined = ritual.membership.join(user_id);
            if joined {
                txn.put(&key, &ritual)?;
            }
            Ok(JoinOutcome {
                joined,
                ripple_count: ritual.membership.ripple_count,
            })
        })?;

        if outcome.joined {
            tracing::info!(ritual_id = %ritual_id, user_id = %user_id, ripple_count = outcome.ripple_count, "Joined ritual");
            self.award_best_effort(user_id, KarmaAction::RitualJoined);
        }
        Ok(outcome)
    }

    /// Leave a ritual. Leaving a ritual the user is not in, or one that
    /// does not exist, succeeds without changing anything.
    pub fn leave_ritual(&self, ritual_id: &str, user_id: &str) -> Result<LeaveOutcome> {
        let ritual_id = require_id("ritualId", ritual_id)?;
        let user_id = require_id("userId", user_id)?;

        let outcome = self.storage.transaction(|txn| {
            let key = RitualDefinition::key(ritual_id);
            let Some(mut ritual) = txn.get::<RitualDefinition>(&key)? else {
                return Ok(LeaveOutcome {
                    left: false,
                    ripple_count: None,
                });
            };

            let left = ritual.membership.leave(user_id);
            if left {
                txn.put(&key, &ritual)?;
            }
            Ok(LeaveOutcome {
                left,
                ripple_count: Some(ritual.membership.ripple_count),
            })
        })?;

        match outcome.ripple_count {
            None => tracing::debug!(ritual_id = %ritual_id, "Leave on unknown ritual ignored"),
            Some(count) if outcome.left => {
                tracing::info!(ritual_id = %ritual_id, user_id = %user_id, ripple_count = count, "Left ritual")
            }
            Some(_) => {}
        }
        Ok(outcome)
    }

    /// Reset every ripple count to its roster size. Returns how many
    /// rituals were repaired.
    pub fn reconcile_ripple_counts(&self) -> Result<usize> {
        let repaired = self.storage.transaction(|txn| {
            let mut repaired = 0;
            for mut ritual in txn.scan::<RitualDefinition>(RitualDefinition::PREFIX)? {
                if ritual.membership.reconcile() {
                    txn.put(&RitualDefinition::key(&ritual.id), &ritual)?;
                    repaired += 1;
                }
            }
            Ok(repaired)
        })?;

        tracing::info!(repaired, "Reconciled ripple counts");
        Ok(repaired)
    }

    // --- Completions ---

    /// Record today's completion of a ritual.
    pub fn complete_ritual(
        &self,
        user_id: &str,
        ritual_id: &str,
        completed_quietly: bool,
        shared_as_moment_id: Option<String>,
    ) -> Result<CompletionOutcome> {
        let user_id = require_id("userId", user_id)?;
        let ritual_id = require_id("ritualId", ritual_id)?;
        let now = self.clock.now();
        let today = now.date_naive();

        let (completion, state, first_today) = self.storage.transaction(|txn| {
            if !txn.exists(&User::key(user_id))? {
                return Err(Error::NotFound(format!("user {}", user_id)));
            }
            let ritual: RitualDefinition = txn
                .get(&RitualDefinition::key(ritual_id))?
                .ok_or_else(|| Error::NotFound(format!("ritual {}", ritual_id)))?;
            if !ritual.visible_to(Some(user_id)) {
                return Err(Error::Unauthorized(format!("ritual {} is private", ritual_id)));
            }

            let key = RitualCompletion::key(user_id, today, ritual_id);
            if txn.exists(&key)? {
                return Err(Error::Conflict(format!(
                    "ritual {} already completed on {}",
                    ritual_id, today
                )));
            }

            let history: Vec<RitualCompletion> = txn.scan(&RitualCompletion::user_prefix(user_id))?;
            let mut dates: Vec<_> = history.iter().map(|c| c.date).collect();
            let first_today = !dates.contains(&today);
            dates.push(today);

            let previous_longest = txn
                .get::<UserRitualState>(&UserRitualState::key(user_id))?
                .map_or(0, |s| s.stats.longest_streak);

            let completion = RitualCompletion {
                id: generate_id(key.as_bytes()),
                ritual_id: ritual_id.to_string(),
                user_id: user_id.to_string(),
                date: today,
                completed_quietly,
                shared_as_moment_id,
                created_at: now,
            };
            let state = UserRitualState {
                user_id: user_id.to_string(),
                stats: RitualStats::compute(&dates, today, previous_longest),
                updated_at: Some(now),
            };

            txn.put(&key, &completion)?;
            txn.put(&UserRitualState::key(user_id), &state)?;
            Ok((completion, state, first_today))
        })?;

        tracing::info!(
            user_id = %user_id,
            ritual_id = %ritual_id,
            streak = state.stats.current_streak,
            total = state.stats.total_completed,
            "Recorded ritual completion"
        );

        let mut karma_awarded = 0;
        if let Some(award) = self.award_best_effort(user_id, KarmaAction::for_completion(completed_quietly)) {
            karma_awarded += award.points;
        }
        // Milestones fire on the first completion of the day that reaches them.
        if first_today {
            if let Some(milestone) = KarmaAction::streak_milestone(state.stats.current_streak) {
                if let Some(award) = self.award_best_effort(user_id, milestone) {
                    karma_awarded += award.points;
                }
            }
        }

        Ok(CompletionOutcome {
            updated_streak: state.stats.current_streak,
            completion,
            state,
            karma_awarded,
        })
    }

    /// Stored ritual state; all zeros before the first completion.
    pub fn get_ritual_state(&self, user_id: &str) -> Result<UserRitualState> {
        let user_id = require_id("userId", user_id)?;
        Ok(self
            .storage
            .get_ritual_state(user_id)?
            .unwrap_or_else(|| UserRitualState::empty(user_id)))
    }

    /// Completions of a user, newest first.
    pub fn list_completions(&self, user_id: &str) -> Result<Vec<RitualCompletion>> {
        let user_id = require_id("userId", user_id)?;
        let mut completions = self.storage.list_completions(user_id)?;
        completions.reverse();
        Ok(completions)
    }

    /// Rebuild a user's ritual state from their full history.
    pub fn recompute_ritual_state(&self, user_id: &str) -> Result<UserRitualState> {
        let user_id = require_id("userId", user_id)?;
        let now = self.clock.now();

        let state = self.storage.transaction(|txn| {
            let history: Vec<RitualCompletion> = txn.scan(&RitualCompletion::user_prefix(user_id))?;
            let dates: Vec<_> = history.iter().map(|c| c.date).collect();
            let previous_longest = txn
                .get::<UserRitualState>(&UserRitualState::key(user_id))?
                .map_or(0, |s| s.stats.longest_streak);

            let state = UserRitualState {
                user_id: user_id.to_string(),
                stats: RitualStats::compute(&dates, now.date_naive(), previous_longest),
                updated_at: Some(now),
            };
            txn.put(&UserRitualState::key(user_id), &state)?;
            Ok(state)
        })?;

        tracing::info!(user_id = %user_id, streak = state.stats.current_streak, "Recomputed ritual state");
        Ok(state)
    }

    /// Evaluate achievements for a user.
    pub fn achievements(&self, user_id: &str) -> Result<AchievementReport> {
        let user = self.get_user(user_id)?;
        let state = self.get_ritual_state(&user.id)?;
        Ok(evaluate_achievements(&Progress::new(user.karma_points, &state.stats)))
    }
}
