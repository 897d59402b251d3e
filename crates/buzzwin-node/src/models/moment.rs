//! Impact moments.

use buzzwin_karma::EffortLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post describing a good deed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImpactMoment {
    pub id: String,
    pub user_id: String,
    pub text: String,
    pub tags: Vec<String>,
    pub effort_level: EffortLevel,
    /// Ritual the moment was shared from
    #[serde(default)]
    pub ritual_id: Option<String>,
    #[serde(default)]
    pub anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Ritual created from this moment, once converted
    #[serde(default)]
    pub converted_ritual_id: Option<String>,
}

impl ImpactMoment {
    pub const PREFIX: &'static str = "moment:";

    pub fn key(id: &str) -> String {
        format!("{}{}", Self::PREFIX, id)
    }

    /// Title used when the moment becomes a ritual: the first line, cut at
    /// 80 characters.
    pub fn ritual_title(&self) -> String {
        let first_line = self.text.lines().next().unwrap_or_default().trim();
        first_line.chars().take(80).collect()
    }
}
