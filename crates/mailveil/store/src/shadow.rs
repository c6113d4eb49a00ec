use std::collections::BTreeSet;

use tracing::debug;

use crate::batch::WriteBatch;
use crate::traits::PreferenceStore;
use crate::value::PrefValue;
use crate::StoreResult;

/// A sub-tree of the store that mirrors live keys under a separate root.
///
/// Names passed to a `ShadowBranch` are *live* key names; the branch prefixes
/// them with its root. Enumeration always walks the store, so keys added to
/// the live layout get shadow parity without an allow-list.
pub struct ShadowBranch<'a, S: PreferenceStore + ?Sized> {
    store: &'a S,
    root: &'a str,
}

impl<'a, S: PreferenceStore + ?Sized> ShadowBranch<'a, S> {
    /// `root` must end with a dot, e.g. `extensions.mailveil.custom.`.
    pub fn new(store: &'a S, root: &'a str) -> Self {
        Self { store, root }
    }

    pub fn root(&self) -> &str {
        self.root
    }

    /// Full store key for the live key `name`.
    pub fn key_for(&self, name: &str) -> String {
        format!("{}{}", self.root, name)
    }

    /// Every live key name currently shadowed.
    ///
    /// Only user values count: host defaults under the root cannot be
    /// cleared, so they are never reported as shadow state.
    pub fn list_keys(&self) -> StoreResult<BTreeSet<String>> {
        let mut keys = BTreeSet::new();
        for name in self.store.list_child_keys(self.root)? {
            if self.store.has_user_value(&self.key_for(&name))? {
                keys.insert(name);
            }
        }
        Ok(keys)
    }

    pub fn get(&self, name: &str) -> StoreResult<Option<PrefValue>> {
        self.store.user_value(&self.key_for(name))
    }

    pub fn set(&self, name: &str, value: PrefValue) -> StoreResult<()> {
        self.store.set(&self.key_for(name), value)
    }

    pub fn has_user_value(&self, name: &str) -> StoreResult<bool> {
        self.store.has_user_value(&self.key_for(name))
    }

    /// Remove every key under the shadow root. Returns how many were cleared.
    pub fn clear_all(&self) -> StoreResult<usize> {
        let keys = self.list_keys()?;
        for name in &keys {
            self.store.clear(&self.key_for(name))?;
        }
        debug!(root = self.root, cleared = keys.len(), "Cleared shadow branch");
        Ok(keys.len())
    }

    /// Queue a clear of every key under the shadow root onto `batch`.
    ///
    /// Returns the live names that will be cleared.
    pub fn stage_clear_all(&self, batch: &mut WriteBatch) -> StoreResult<BTreeSet<String>> {
        let keys = self.list_keys()?;
        for name in &keys {
            batch.clear(self.key_for(name));
        }
        Ok(keys)
    }
}
