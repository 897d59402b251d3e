//! Impact moments: posts about good deeds, and their conversion into
//! rituals.

use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::models::{generate_id, ImpactMoment, RitualDefinition, User};
use crate::rituals::NewRitual;
use buzzwin_karma::{require_id, EffortLevel, KarmaAction, RitualScope};

/// Fields for a new impact moment.
#[derive(Debug, Clone)]
pub struct NewMoment {
    pub user_id: String,
    pub text: String,
    pub tags: Vec<String>,
    pub effort_level: EffortLevel,
    pub ritual_id: Option<String>,
    pub anonymous: bool,
}

/// Partial update of a moment; `None` leaves the field alone.
#[derive(Debug, Clone, Default)]
pub struct MomentPatch {
    pub text: Option<String>,
    pub tags: Option<Vec<String>>,
    pub effort_level: Option<EffortLevel>,
}

fn require_text(text: &str) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::InvalidArgument("text is required".into()));
    }
    Ok(text.to_string())
}

fn require_tags(tags: Vec<String>) -> Result<Vec<String>> {
    let tags: Vec<String> = tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if tags.is_empty() {
        return Err(Error::InvalidArgument("at least one tag is required".into()));
    }
    Ok(tags)
}

fn owned_by(moment: &ImpactMoment, user_id: &str) -> Result<()> {
    if moment.user_id != user_id {
        return Err(Error::Unauthorized(format!(
            "impact moment {} is not owned by {}",
            moment.id, user_id
        )));
    }
    Ok(())
}

impl Ledger {
    /// Publish an impact moment. Karma is awarded best-effort: the moment
    /// is stored even if the award fails.
    pub fn create_moment(&self, new: NewMoment) -> Result<ImpactMoment> {
        let user_id = require_id("userId", &new.user_id)?.to_string();
        let text = require_text(&new.text)?;
        let tags = require_tags(new.tags)?;
        let ritual_id = match new.ritual_id.as_deref().map(str::trim) {
            Some("") | None => None,
            Some(id) => Some(require_id("ritualId", id)?.to_string()),
        };

        let now = self.clock.now();
        let moment = ImpactMoment {
            id: generate_id(format!("{}:{}", user_id, text).as_bytes()),
            user_id,
            text,
            tags,
            effort_level: new.effort_level,
            ritual_id,
            anonymous: new.anonymous,
            created_at: now,
            updated_at: now,
            converted_ritual_id: None,
        };

        self.storage.transaction(|txn| {
            if !txn.exists(&User::key(&moment.user_id))? {
                return Err(Error::NotFound(format!("user {}", moment.user_id)));
            }
            txn.put(&ImpactMoment::key(&moment.id), &moment)
        })?;

        tracing::info!(moment_id = %moment.id, user_id = %moment.user_id, "Created impact moment");
        self.award_best_effort(&moment.user_id, KarmaAction::ImpactMomentCreated);
        Ok(moment)
    }

    pub fn get_moment(&self, moment_id: &str) -> Result<ImpactMoment> {
        let moment_id = require_id("momentId", moment_id)?;
        self.storage
            .get_moment(moment_id)?
            .ok_or_else(|| Error::NotFound(format!("impact moment {}", moment_id)))
    }

    /// Moments newest first, optionally only one author's.
    pub fn list_moments(&self, user_id: Option<&str>) -> Result<Vec<ImpactMoment>> {
        let mut moments: Vec<ImpactMoment> = self
            .storage
            .list_moments()?
            .into_iter()
            .filter(|m| user_id.map_or(true, |u| m.user_id == u))
            .collect();
        moments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(moments)
    }

    /// Edit a moment. Only its author may.
    pub fn update_moment(&self, moment_id: &str, user_id: &str, patch: MomentPatch) -> Result<ImpactMoment> {
        let moment_id = require_id("momentId", moment_id)?;
        let user_id = require_id("userId", user_id)?;
        let text = patch.text.as_deref().map(require_text).transpose()?;
        let tags = patch.tags.map(require_tags).transpose()?;
        let now = self.clock.now();

        self.storage.transaction(|txn| {
            let key = ImpactMoment::key(moment_id);
            let mut moment: ImpactMoment = txn
                .get(&key)?
                .ok_or_else(|| Error::NotFound(format!("impact moment {}", moment_id)))?;
            owned_by(&moment, user_id)?;

            if let Some(text) = text {
                moment.text = text;
            }
            if let Some(tags) = tags {
                moment.tags = tags;
            }
            if let Some(effort_level) = patch.effort_level {
                moment.effort_level = effort_level;
            }
            moment.updated_at = now;
            txn.put(&key, &moment)?;
            Ok(moment)
        })
    }

    /// Delete a moment. Only its author may.
    pub fn delete_moment(&self, moment_id: &str, user_id: &str) -> Result<()> {
        let moment_id = require_id("momentId", moment_id)?;
        let user_id = require_id("userId", user_id)?;

        self.storage.transaction(|txn| {
            let key = ImpactMoment::key(moment_id);
            let moment: ImpactMoment = txn
                .get(&key)?
                .ok_or_else(|| Error::NotFound(format!("impact moment {}", moment_id)))?;
            owned_by(&moment, user_id)?;
            txn.delete(&key);
            Ok(())
        })?;

        tracing::info!(moment_id = %moment_id, "Deleted impact moment");
        Ok(())
    }

    /// Turn a moment into a private ritual owned by its author.
    pub fn convert_moment_to_ritual(&self, moment_id: &str, user_id: &str) -> Result<RitualDefinition> {
        let moment = self.get_moment(moment_id)?;
        let user_id = require_id("userId", user_id)?;
        owned_by(&moment, user_id)?;
        if let Some(existing) = &moment.converted_ritual_id {
            return Err(Error::Conflict(format!(
                "impact moment {} already converted to ritual {}",
                moment.id, existing
            )));
        }

        // Claim the moment first so two conversions cannot both succeed.
        let placeholder = generate_id(moment.id.as_bytes());
        self.storage.transaction(|txn| {
            let key = ImpactMoment::key(&moment.id);
            let mut current: ImpactMoment = txn
                .get(&key)?
                .ok_or_else(|| Error::NotFound(format!("impact moment {}", moment.id)))?;
            if current.converted_ritual_id.is_some() {
                return Err(Error::Conflict(format!("impact moment {} already converted", moment.id)));
            }
            current.converted_ritual_id = Some(placeholder.clone());
            txn.put(&key, &current)
        })?;

        let ritual = match self.insert_ritual(
            NewRitual {
                user_id: user_id.to_string(),
                title: moment.ritual_title(),
                description: moment.text.clone(),
                tags: moment.tags.clone(),
                effort_level: moment.effort_level,
                scope: RitualScope::Personalized,
            },
            Some(moment.id.clone()),
        ) {
            Ok(ritual) => ritual,
            Err(e) => {
                self.release_conversion(&moment.id, &placeholder);
                return Err(e);
            }
        };

        self.storage.transaction(|txn| {
            let key = ImpactMoment::key(&moment.id);
            if let Some(mut current) = txn.get::<ImpactMoment>(&key)? {
                current.converted_ritual_id = Some(ritual.id.clone());
                txn.put(&key, &current)?;
            }
            Ok(())
        })?;

        tracing::info!(moment_id = %moment.id, ritual_id = %ritual.id, "Converted impact moment to ritual");
        self.award_best_effort(user_id, KarmaAction::ImpactMomentConverted);
        Ok(ritual)
    }

    fn release_conversion(&self, moment_id: &str, placeholder: &str) {
        let released = self.storage.transaction(|txn| {
            let key = ImpactMoment::key(moment_id);
            if let Some(mut current) = txn.get::<ImpactMoment>(&key)? {
                if current.converted_ritual_id.as_deref() == Some(placeholder) {
                    current.converted_ritual_id = None;
                    txn.put(&key, &current)?;
                }
            }
            Ok(())
        });
        if let Err(e) = released {
            tracing::error!(moment_id = %moment_id, "Failed to release conversion claim: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::{day, ledger_on};

    fn new_moment(user_id: &str) -> NewMoment {
        NewMoment {
            user_id: user_id.into(),
            text: "Helped a stranger fix a flat tyre".into(),
            tags: vec!["kindness".into()],
            effort_level: EffortLevel::Moderate,
            ritual_id: None,
            anonymous: false,
        }
    }

    #[test]
    fn create_awards_karma() {
        let (_dir, ledger) = ledger_on(day(2024, 6, 1));
        ledger.create_user("alice", "Alice").unwrap();

        let moment = ledger.create_moment(new_moment("alice")).unwrap();
        assert_eq!(ledger.get_moment(&moment.id).unwrap(), moment);
        assert_eq!(ledger.get_user_karma("alice").unwrap().breakdown.creation, 10);
    }

    #[test]
    fn create_survives_failed_karma_award() {
        let (_dir, ledger) = ledger_on(day(2024, 6, 1));
        // Profile exists but cannot be decoded, so the award step fails.
        ledger
            .storage()
            .transaction(|txn| txn.put(&User::key("alice"), &"not a user profile"))
            .unwrap();
        assert!(ledger.get_user("alice").is_err());

        let moment = ledger.create_moment(new_moment("alice")).unwrap();
        assert_eq!(ledger.get_moment(&moment.id).unwrap(), moment);
        assert_eq!(ledger.list_moments(Some("alice")).unwrap().len(), 1);
    }

    #[test]
    fn create_validates_fields() {
        let (_dir, ledger) = ledger_on(day(2024, 6, 1));
        ledger.create_user("alice", "Alice").unwrap();

        let mut empty_text = new_moment("alice");
        empty_text.text = " ".into();
        assert!(matches!(ledger.create_moment(empty_text), Err(Error::InvalidArgument(_))));

        let mut no_tags = new_moment("alice");
        no_tags.tags = vec!["  ".into()];
        assert!(matches!(ledger.create_moment(no_tags), Err(Error::InvalidArgument(_))));

        assert!(matches!(ledger.create_moment(new_moment("ghost")), Err(Error::NotFound(_))));
    }

    #[test]
    fn only_author_can_edit_or_delete() {
        let (_dir, ledger) = ledger_on(day(2024, 6, 1));
        ledger.create_user("alice", "Alice").unwrap();
        let moment = ledger.create_moment(new_moment("alice")).unwrap();

        let patch = MomentPatch {
            text: Some("Edited".into()),
            ..MomentPatch::default()
        };
        assert!(matches!(
            ledger.update_moment(&moment.id, "bob", patch.clone()),
            Err(Error::Unauthorized(_))
        ));
        assert!(matches!(ledger.delete_moment(&moment.id, "bob"), Err(Error::Unauthorized(_))));

        let updated = ledger.update_moment(&moment.id, "alice", patch).unwrap();
        assert_eq!(updated.text, "Edited");
        assert_eq!(updated.tags, moment.tags);

        ledger.delete_moment(&moment.id, "alice").unwrap();
        assert!(matches!(ledger.get_moment(&moment.id), Err(Error::NotFound(_))));
    }

    #[test]
    fn list_filters_by_author() {
        let (_dir, ledger) = ledger_on(day(2024, 6, 1));
        ledger.create_user("alice", "Alice").unwrap();
        ledger.create_user("bob", "Bob").unwrap();
        ledger.create_moment(new_moment("alice")).unwrap();
        ledger.create_moment(new_moment("bob")).unwrap();

        assert_eq!(ledger.list_moments(None).unwrap().len(), 2);
        let bobs = ledger.list_moments(Some("bob")).unwrap();
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].user_id, "bob");
    }

    #[test]
    fn convert_creates_private_ritual_once() {
        let (_dir, ledger) = ledger_on(day(2024, 6, 1));
        ledger.create_user("alice", "Alice").unwrap();
        let moment = ledger.create_moment(new_moment("alice")).unwrap();

        let ritual = ledger.convert_moment_to_ritual(&moment.id, "alice").unwrap();
        assert_eq!(ritual.scope, RitualScope::Personalized);
        assert_eq!(ritual.title, "Helped a stranger fix a flat tyre");
        assert_eq!(ritual.source_moment_id.as_deref(), Some(moment.id.as_str()));
        assert_eq!(
            ledger.get_moment(&moment.id).unwrap().converted_ritual_id,
            Some(ritual.id.clone())
        );
        assert_eq!(ledger.list_owned_rituals("alice").unwrap().len(), 1);

        // moment 10 + ritual created 15 + converted 20
        assert_eq!(ledger.get_user_karma("alice").unwrap().breakdown.creation, 45);

        assert!(matches!(
            ledger.convert_moment_to_ritual(&moment.id, "alice"),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn convert_requires_author() {
        let (_dir, ledger) = ledger_on(day(2024, 6, 1));
        ledger.create_user("alice", "Alice").unwrap();
        ledger.create_user("bob", "Bob").unwrap();
        let moment = ledger.create_moment(new_moment("alice")).unwrap();

        assert!(matches!(
            ledger.convert_moment_to_ritual(&moment.id, "bob"),
            Err(Error::Unauthorized(_))
        ));
        assert!(ledger.get_moment(&moment.id).unwrap().converted_ritual_id.is_none());
    }
}
