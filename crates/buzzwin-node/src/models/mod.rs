//! Document models stored by the node.
//!
//! # Documents
//!
//! - [`User`] - profile plus karma total and breakdown
//! - [`RitualDefinition`] - shared ritual template with its membership roster
//! - [`RitualCompletion`] - one ritual completed by one user on one date
//! - [`UserRitualState`] - streak and counter aggregate per user
//! - [`ImpactMoment`] - a post describing a good deed
//! - [`StoryReaction`] - one user's reaction to a real story
//!
//! Each model owns its key layout (`PREFIX` plus a `key` function).

mod user;
mod ritual;
mod completion;
mod moment;
mod reaction;

pub use user::User;
pub use ritual::{OwnerIndex, RitualDefinition};
pub use completion::{RitualCompletion, UserRitualState};
pub use moment::ImpactMoment;
pub use reaction::StoryReaction;

/// Generate a document id from content plus a random nonce.
pub fn generate_id(content: &[u8]) -> String {
    let nonce: [u8; 16] = rand::random();
    let mut hasher = blake3::Hasher::new();
    hasher.update(content);
    hasher.update(&nonce);
    hex::encode(&hasher.finalize().as_bytes()[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_for_same_content() {
        let a = generate_id(b"Morning walk");
        let b = generate_id(b"Morning walk");
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(!a.contains(':'));
    }
}
