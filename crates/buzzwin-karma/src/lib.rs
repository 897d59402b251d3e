//! Buzzwin Karma Rules
//!
//! Pure bookkeeping rules behind the Buzzwin ledger. Nothing in this crate
//! performs I/O; the node crate loads documents, applies these rules and
//! persists the result.
//!
//! # Karma
//!
//! Every [`KarmaAction`] maps to a fixed point value and one
//! [`KarmaCategory`]. Applying an action to a [`KarmaBalance`] grows the
//! total and that category by the same amount.
//!
//! # Streaks
//!
//! [`RitualStats::compute`] derives current/longest streaks and weekly and
//! monthly counters from the full list of completion dates. The stored
//! longest streak is merged monotonically.
//!
//! # Membership
//!
//! [`Membership`] is a ritual's roster plus its ripple count. Join and leave
//! are idempotent and the count never goes below zero.

mod error;
mod action;
mod ledger;
mod streak;
mod membership;
mod kinds;
pub mod achievements;

pub use error::{require_id, Error, Result};
pub use action::{KarmaAction, KarmaCategory};
pub use ledger::{Award, KarmaBalance, KarmaBreakdown};
pub use streak::{current_streak, distinct_dates, longest_streak, RitualStats};
pub use membership::Membership;
pub use kinds::{EffortLevel, ReactionType, RitualScope};
pub use achievements::{evaluate as evaluate_achievements, AchievementReport, Progress};
