//! Operator Identity
//!
//! The persistent operator profile. The core never talks to a concrete
//! storage mechanism directly: it reads and writes one serialized blob
//! through an opaque [`KeyValueStore`] collaborator under a fixed key, the
//! way the hosting shell's storage (browser local storage, a settings file)
//! behaves. The profile outlives any single session.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Fixed key the serialized profile lives under.
pub const PROFILE_KEY: &str = "aion_user_profile";

/// Display name used until the operator saves one.
pub const DEFAULT_OPERATOR_NAME: &str = "Guest Operator";

/// Operator profile: display name plus an avatar reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub name: String,
    /// Avatar image URL; empty when unset
    #[serde(default)]
    pub avatar: String,
}

impl Default for UserIdentity {
    fn default() -> Self {
        Self {
            name: DEFAULT_OPERATOR_NAME.to_string(),
            avatar: String::new(),
        }
    }
}

/// Opaque blob store the host application provides.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, IdentityError>;
    fn put(&self, key: &str, value: &str) -> Result<(), IdentityError>;
}

/// File-backed store: one JSON blob per key inside a data directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Default data directory for the crate.
    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|p| p.join("aion-link"))
            .unwrap_or_else(|| PathBuf::from("./aion_data"))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, IdentityError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(IdentityError::Io(e)),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<(), IdentityError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

/// In-memory store, used by tests and embedders without a filesystem.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, IdentityError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), IdentityError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads and writes the operator profile through a [`KeyValueStore`].
pub struct IdentityVault {
    store: Arc<dyn KeyValueStore>,
}

impl IdentityVault {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the saved profile.
    ///
    /// A missing or corrupt blob degrades to the default identity; load
    /// never fails the caller.
    pub fn load(&self) -> UserIdentity {
        match self.store.get(PROFILE_KEY) {
            Ok(Some(blob)) => match serde_json::from_str(&blob) {
                Ok(identity) => identity,
                Err(e) => {
                    tracing::warn!(error = %e, "saved profile is corrupt, using defaults");
                    UserIdentity::default()
                }
            },
            Ok(None) => UserIdentity::default(),
            Err(e) => {
                tracing::warn!(error = %e, "profile store unavailable, using defaults");
                UserIdentity::default()
            }
        }
    }

    /// Persist the profile under the fixed key.
    pub fn save(&self, identity: &UserIdentity) -> Result<(), IdentityError> {
        let blob = serde_json::to_string(identity)?;
        self.store.put(PROFILE_KEY, &blob)
    }
}

/// Errors that can occur in the identity layer
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_identity_is_the_guest_operator() {
        let identity = UserIdentity::default();
        assert_eq!(identity.name, "Guest Operator");
        assert!(identity.avatar.is_empty());
    }

    #[test]
    fn memory_store_round_trip() {
        let vault = IdentityVault::new(Arc::new(MemoryStore::new()));

        let identity = UserIdentity {
            name: "Razz".to_string(),
            avatar: "https://cdn.test/razz.png".to_string(),
        };
        vault.save(&identity).unwrap();

        // A fresh vault over the same store sees the identical pair
        assert_eq!(vault.load(), identity);
    }

    #[test]
    fn file_store_round_trip_across_vaults() {
        let dir = tempfile::tempdir().unwrap();

        let identity = UserIdentity {
            name: "Operator One".to_string(),
            avatar: String::new(),
        };

        {
            let vault = IdentityVault::new(Arc::new(FileStore::new(dir.path())));
            vault.save(&identity).unwrap();
        }

        // New activation, same store location
        let vault = IdentityVault::new(Arc::new(FileStore::new(dir.path())));
        assert_eq!(vault.load(), identity);
    }

    #[test]
    fn missing_profile_degrades_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let vault = IdentityVault::new(Arc::new(FileStore::new(dir.path())));
        assert_eq!(vault.load(), UserIdentity::default());
    }

    #[test]
    fn corrupt_profile_degrades_to_default() {
        let store = Arc::new(MemoryStore::new());
        store.put(PROFILE_KEY, "{{ not json").unwrap();

        let vault = IdentityVault::new(store);
        assert_eq!(vault.load(), UserIdentity::default());
    }

    #[test]
    fn avatar_field_is_optional_in_saved_blobs() {
        let store = Arc::new(MemoryStore::new());
        store.put(PROFILE_KEY, r#"{"name": "Minimal"}"#).unwrap();

        let vault = IdentityVault::new(store);
        let identity = vault.load();
        assert_eq!(identity.name, "Minimal");
        assert!(identity.avatar.is_empty());
    }
}
