//! In-memory reference implementation of [`PreferenceStore`].
//!
//! This backend is deterministic and test-friendly. The CLI persists its user
//! values as a JSON [`PrefSnapshot`] between runs.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::traits::{validate_key, PreferenceStore};
use crate::value::PrefValue;
use crate::{StoreError, StoreResult};

const SNAPSHOT_VERSION: u32 = 1;

/// In-memory preference store with separate default and user layers.
#[derive(Default)]
pub struct InMemoryPreferenceStore {
    defaults: RwLock<BTreeMap<String, PrefValue>>,
    user: RwLock<BTreeMap<String, PrefValue>>,
}

/// Serialized form of a store's user values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrefSnapshot {
    pub version: u32,
    #[serde(default)]
    pub prefs: BTreeMap<String, PrefValue>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store whose default layer holds `defaults`.
    pub fn with_defaults<I, K>(defaults: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = (K, PrefValue)>,
        K: Into<String>,
    {
        let store = Self::new();
        for (key, value) in defaults {
            store.set_default(&key.into(), value)?;
        }
        Ok(store)
    }

    /// Install or replace a default value.
    pub fn set_default(&self, key: &str, value: PrefValue) -> StoreResult<()> {
        validate_key(key)?;
        let mut guard = self
            .defaults
            .write()
            .map_err(|_| StoreError::Backend("defaults lock poisoned".to_string()))?;
        guard.insert(key.to_string(), value);
        Ok(())
    }

    /// Copy of every user value, keyed by full key.
    pub fn user_values(&self) -> StoreResult<BTreeMap<String, PrefValue>> {
        let guard = self
            .user
            .read()
            .map_err(|_| StoreError::Backend("user lock poisoned".to_string()))?;
        Ok(guard.clone())
    }

    /// Replace every user value with the contents of `snapshot`.
    pub fn restore(&self, snapshot: PrefSnapshot) -> StoreResult<()> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::Serialization(format!(
                "unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }
        for key in snapshot.prefs.keys() {
            validate_key(key)?;
        }
        let mut guard = self
            .user
            .write()
            .map_err(|_| StoreError::Backend("user lock poisoned".to_string()))?;
        *guard = snapshot.prefs;
        Ok(())
    }

    pub fn snapshot(&self) -> StoreResult<PrefSnapshot> {
        Ok(PrefSnapshot {
            version: SNAPSHOT_VERSION,
            prefs: self.user_values()?,
        })
    }

    /// Load user values from a JSON snapshot file. A missing file yields an
    /// empty user layer.
    pub fn load_json(&self, path: &Path) -> StoreResult<()> {
        if !path.exists() {
            debug!(path = %path.display(), "No preference snapshot, starting empty");
            return Ok(());
        }
        let raw = std::fs::read_to_string(path)?;
        let snapshot: PrefSnapshot = serde_json::from_str(&raw)?;
        debug!(
            path = %path.display(),
            prefs = snapshot.prefs.len(),
            "Loaded preference snapshot"
        );
        self.restore(snapshot)
    }

    /// Write user values to `path` as a JSON snapshot.
    pub fn save_json(&self, path: &Path) -> StoreResult<()> {
        let snapshot = self.snapshot()?;
        let raw = serde_json::to_string_pretty(&snapshot)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, raw)?;
        debug!(
            path = %path.display(),
            prefs = snapshot.prefs.len(),
            "Saved preference snapshot"
        );
        Ok(())
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn get(&self, key: &str) -> StoreResult<Option<PrefValue>> {
        validate_key(key)?;
        let user = self
            .user
            .read()
            .map_err(|_| StoreError::Backend("user lock poisoned".to_string()))?;
        if let Some(value) = user.get(key) {
            return Ok(Some(value.clone()));
        }
        let defaults = self
            .defaults
            .read()
            .map_err(|_| StoreError::Backend("defaults lock poisoned".to_string()))?;
        Ok(defaults.get(key).cloned())
    }

    fn set(&self, key: &str, value: PrefValue) -> StoreResult<()> {
        validate_key(key)?;
        let mut guard = self
            .user
            .write()
            .map_err(|_| StoreError::Backend("user lock poisoned".to_string()))?;
        guard.insert(key.to_string(), value);
        Ok(())
    }

    fn clear(&self, key: &str) -> StoreResult<()> {
        validate_key(key)?;
        let mut guard = self
            .user
            .write()
            .map_err(|_| StoreError::Backend("user lock poisoned".to_string()))?;
        guard.remove(key);
        Ok(())
    }

    fn has_user_value(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        let guard = self
            .user
            .read()
            .map_err(|_| StoreError::Backend("user lock poisoned".to_string()))?;
        Ok(guard.contains_key(key))
    }

    fn list_child_keys(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let user = self
            .user
            .read()
            .map_err(|_| StoreError::Backend("user lock poisoned".to_string()))?;
        let defaults = self
            .defaults
            .read()
            .map_err(|_| StoreError::Backend("defaults lock poisoned".to_string()))?;

        let mut children = user
            .keys()
            .chain(defaults.keys())
            .filter_map(|key| key.strip_prefix(prefix))
            .filter(|suffix| !suffix.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();
        children.sort();
        children.dedup();
        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_value_shadows_default() {
        let store =
            InMemoryPreferenceStore::with_defaults([("network.proxy.socks_port", PrefValue::Int(9050))])
                .unwrap();
        assert_eq!(store.get_int("network.proxy.socks_port").unwrap(), Some(9050));
        assert!(!store.has_user_value("network.proxy.socks_port").unwrap());

        store.set_int("network.proxy.socks_port", 9150).unwrap();
        assert_eq!(store.get_int("network.proxy.socks_port").unwrap(), Some(9150));
        assert!(store.has_user_value("network.proxy.socks_port").unwrap());

        store.clear("network.proxy.socks_port").unwrap();
        assert_eq!(store.get_int("network.proxy.socks_port").unwrap(), Some(9050));
        assert_eq!(store.user_value("network.proxy.socks_port").unwrap(), None);
    }

    #[test]
    fn typed_get_rejects_wrong_kind() {
        let store = InMemoryPreferenceStore::new();
        store.set_string("network.proxy.socks_port", "9050").unwrap();
        let err = store.get_int("network.proxy.socks_port").unwrap_err();
        assert!(matches!(err, StoreError::TypeMismatch { .. }));
    }

    #[test]
    fn list_child_keys_strips_prefix() {
        let store = InMemoryPreferenceStore::new();
        store.set_int("ext.custom.network.proxy.socks_port", 1).unwrap();
        store.set_bool("ext.custom.mail.server.default.use_idle", true).unwrap();
        store.set_bool("ext.startup_folder", true).unwrap();

        let children = store.list_child_keys("ext.custom.").unwrap();
        assert_eq!(
            children,
            vec![
                "mail.server.default.use_idle".to_string(),
                "network.proxy.socks_port".to_string(),
            ]
        );
    }

    #[test]
    fn clearing_unset_key_is_noop() {
        let store = InMemoryPreferenceStore::new();
        store.clear("network.proxy.http").unwrap();
        assert_eq!(store.get("network.proxy.http").unwrap(), None);
    }

    #[test]
    fn json_snapshot_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let store = InMemoryPreferenceStore::new();
        store.set_string("network.proxy.socks", "10.0.0.1").unwrap();
        store.set_int("network.proxy.socks_port", 9150).unwrap();
        store.set_bool("mail.server.default.use_idle", false).unwrap();
        store.save_json(&path).unwrap();

        let restored = InMemoryPreferenceStore::new();
        restored.load_json(&path).unwrap();
        assert_eq!(restored.user_values().unwrap(), store.user_values().unwrap());
    }

    #[test]
    fn missing_snapshot_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = InMemoryPreferenceStore::new();
        store.load_json(&dir.path().join("absent.json")).unwrap();
        assert!(store.user_values().unwrap().is_empty());
    }

    #[test]
    fn rejects_unknown_snapshot_version() {
        let store = InMemoryPreferenceStore::new();
        let err = store
            .restore(PrefSnapshot {
                version: 99,
                prefs: BTreeMap::new(),
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
