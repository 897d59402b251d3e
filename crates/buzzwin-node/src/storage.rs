//! Persistent storage using RocksDB.
//!
//! Documents are JSON values under prefixed string keys. Reads go straight
//! to the database. Every read-modify-write goes through
//! [`Storage::transaction`], which serializes writers and commits the
//! staged writes as a single `WriteBatch`.

use crate::error::{Error, Result};
use crate::models::{
    ImpactMoment, OwnerIndex, RitualCompletion, RitualDefinition, StoryReaction, User,
    UserRitualState,
};
use rocksdb::{Options, WriteBatch, DB};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Mutex;

/// Storage backend for ledger data.
pub struct Storage {
    db: DB,
    write_lock: Mutex<()>,
}

/// Staged writes of one transaction.
///
/// Reads observe committed state only; stage writes after the reads they
/// depend on.
pub struct Txn<'a> {
    storage: &'a Storage,
    batch: WriteBatch,
}

impl Txn<'_> {
    /// Read a committed document.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.storage.get_json(key)
    }

    /// Whether a committed key exists.
    pub fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.storage.db.get_pinned(key.as_bytes())?.is_some())
    }

    /// Scan committed documents under a prefix.
    pub fn scan<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>> {
        self.storage.scan_json(prefix)
    }

    /// Stage a document write.
    pub fn put<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_vec(value)?;
        self.batch.put(key.as_bytes(), value);
        Ok(())
    }

    /// Stage a marker key with an empty value.
    pub fn put_marker(&mut self, key: &str) {
        self.batch.put(key.as_bytes(), b"");
    }

    /// Stage a delete.
    pub fn delete(&mut self, key: &str) {
        self.batch.delete(key.as_bytes());
    }
}

impl Storage {
    /// Open or create storage at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        Ok(Self {
            db,
            write_lock: Mutex::new(()),
        })
    }

    /// Run `f` with exclusive write access and commit its staged writes
    /// atomically. Nothing is written if `f` returns an error.
    ///
    /// Transactions must not nest.
    pub fn transaction<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Txn<'_>) -> Result<R>,
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| Error::Storage("write lock poisoned".into()))?;

        let mut txn = Txn {
            storage: self,
            batch: WriteBatch::default(),
        };
        let result = f(&mut txn)?;
        if !txn.batch.is_empty() {
            self.db.write(txn.batch)?;
        }
        Ok(result)
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.db.get_pinned(key.as_bytes())? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    fn scan_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix = prefix.as_bytes();
        let mut keys = Vec::new();

        for item in self.db.prefix_iterator(prefix) {
            let (key, _) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            keys.push(String::from_utf8_lossy(&key).into_owned());
        }

        Ok(keys)
    }

    fn scan_json<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>> {
        let prefix = prefix.as_bytes();
        let mut docs = Vec::new();

        for item in self.db.prefix_iterator(prefix) {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            docs.push(serde_json::from_slice(&value)?);
        }

        Ok(docs)
    }

    // --- Users ---

    /// Get a user by ID.
    pub fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.get_json(&User::key(id))
    }

    /// List all users.
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.scan_json(User::PREFIX)
    }

    // --- Rituals ---

    /// Get a ritual definition by ID.
    pub fn get_ritual(&self, id: &str) -> Result<Option<RitualDefinition>> {
        self.get_json(&RitualDefinition::key(id))
    }

    /// List all ritual definitions.
    pub fn list_rituals(&self) -> Result<Vec<RitualDefinition>> {
        self.scan_json(RitualDefinition::PREFIX)
    }

    /// IDs of rituals created by a user.
    pub fn owned_ritual_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let prefix = OwnerIndex::user_prefix(user_id);
        Ok(self
            .scan_keys(&prefix)?
            .into_iter()
            .filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
            .collect())
    }

    // --- Completions ---

    /// All completions of a user, oldest first.
    pub fn list_completions(&self, user_id: &str) -> Result<Vec<RitualCompletion>> {
        self.scan_json(&RitualCompletion::user_prefix(user_id))
    }

    /// Stored ritual state of a user.
    pub fn get_ritual_state(&self, user_id: &str) -> Result<Option<UserRitualState>> {
        self.get_json(&UserRitualState::key(user_id))
    }

    // --- Impact moments ---

    pub fn get_moment(&self, id: &str) -> Result<Option<ImpactMoment>> {
        self.get_json(&ImpactMoment::key(id))
    }

    pub fn list_moments(&self) -> Result<Vec<ImpactMoment>> {
        self.scan_json(ImpactMoment::PREFIX)
    }

    // --- Story reactions ---

    /// Reactions on one story.
    pub fn list_reactions(&self, story_id: &str) -> Result<Vec<StoryReaction>> {
        self.scan_json(&StoryReaction::story_prefix(story_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buzzwin_karma::{EffortLevel, RitualScope};
    use chrono::{NaiveDate, Utc};
    use tempfile::tempdir;

    #[test]
    fn transaction_roundtrip() {
        let dir = tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();

        let user = User::new("u1".into(), "Ada".into(), Utc::now());
        storage
            .transaction(|txn| txn.put(&User::key(&user.id), &user))
            .unwrap();

        assert_eq!(storage.get_user("u1").unwrap(), Some(user));
        assert_eq!(storage.get_user("u2").unwrap(), None);
    }

    #[test]
    fn failed_transaction_writes_nothing() {
        let dir = tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();

        let result: Result<()> = storage.transaction(|txn| {
            let user = User::new("u1".into(), "Ada".into(), Utc::now());
            txn.put(&User::key("u1"), &user)?;
            Err(Error::Conflict("abort".into()))
        });

        assert!(result.is_err());
        assert!(storage.get_user("u1").unwrap().is_none());
    }

    #[test]
    fn prefix_scans_do_not_leak_between_users() {
        let dir = tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();

        storage
            .transaction(|txn| {
                for user in ["u1", "u10", "u2"] {
                    let completion = RitualCompletion {
                        id: format!("c-{}", user),
                        ritual_id: "r1".into(),
                        user_id: user.into(),
                        date,
                        completed_quietly: true,
                        shared_as_moment_id: None,
                        created_at: Utc::now(),
                    };
                    txn.put(&completion.storage_key(), &completion)?;
                }
                Ok(())
            })
            .unwrap();

        let u1 = storage.list_completions("u1").unwrap();
        assert_eq!(u1.len(), 1);
        assert_eq!(u1[0].user_id, "u1");
    }

    #[test]
    fn owner_index_lists_ritual_ids() {
        let dir = tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();

        storage
            .transaction(|txn| {
                for id in ["r1", "r2"] {
                    let ritual = RitualDefinition::new(
                        id.into(),
                        "Walk".into(),
                        EffortLevel::Moderate,
                        RitualScope::Personalized,
                        "alice".into(),
                        Utc::now(),
                    );
                    txn.put(&RitualDefinition::key(id), &ritual)?;
                    txn.put_marker(&OwnerIndex::key("alice", id));
                }
                Ok(())
            })
            .unwrap();

        assert_eq!(storage.owned_ritual_ids("alice").unwrap(), vec!["r1", "r2"]);
        assert!(storage.owned_ritual_ids("bob").unwrap().is_empty());
        assert_eq!(storage.list_rituals().unwrap().len(), 2);
    }
}
