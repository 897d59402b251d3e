//! Small closed vocabularies shared by rituals, moments and reactions.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How much effort a ritual or impact moment takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffortLevel {
    Minimal,
    Moderate,
    Significant,
}

impl FromStr for EffortLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "minimal" => Ok(EffortLevel::Minimal),
            "moderate" => Ok(EffortLevel::Moderate),
            "significant" => Ok(EffortLevel::Significant),
            other => Err(Error::InvalidEffortLevel(other.to_string())),
        }
    }
}

/// Visibility of a ritual definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RitualScope {
    /// Curated, visible to everyone.
    Global,
    /// Private to its creator.
    Personalized,
    /// Created by a user and published.
    Public,
}

impl RitualScope {
    pub const fn as_str(self) -> &'static str {
        match self {
            RitualScope::Global => "global",
            RitualScope::Personalized => "personalized",
            RitualScope::Public => "public",
        }
    }

    /// Whether users other than the creator can discover the ritual.
    pub const fn is_shared(self) -> bool {
        !matches!(self, RitualScope::Personalized)
    }
}

impl FromStr for RitualScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "global" => Ok(RitualScope::Global),
            "personalized" => Ok(RitualScope::Personalized),
            "public" => Ok(RitualScope::Public),
            other => Err(Error::InvalidScope(other.to_string())),
        }
    }
}

/// Reaction a user can leave on a real story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionType {
    Inspired,
    Grateful,
    Moved,
    Hopeful,
}

impl FromStr for ReactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "inspired" => Ok(ReactionType::Inspired),
            "grateful" => Ok(ReactionType::Grateful),
            "moved" => Ok(ReactionType::Moved),
            "hopeful" => Ok(ReactionType::Hopeful),
            other => Err(Error::InvalidReaction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_effort_levels() {
        assert_eq!("moderate".parse::<EffortLevel>(), Ok(EffortLevel::Moderate));
        assert_eq!(
            "heroic".parse::<EffortLevel>(),
            Err(Error::InvalidEffortLevel("heroic".into()))
        );
    }

    #[test]
    fn personalized_rituals_are_private() {
        assert!(RitualScope::Global.is_shared());
        assert!(RitualScope::Public.is_shared());
        assert!(!RitualScope::Personalized.is_shared());
    }

    #[test]
    fn scope_wire_names() {
        for scope in [RitualScope::Global, RitualScope::Personalized, RitualScope::Public] {
            assert_eq!(scope.as_str().parse::<RitualScope>(), Ok(scope));
        }
    }

    #[test]
    fn reaction_types() {
        assert_eq!("grateful".parse::<ReactionType>(), Ok(ReactionType::Grateful));
        assert!("angry".parse::<ReactionType>().is_err());
    }
}
