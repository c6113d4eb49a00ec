use crate::value::{PrefType, PrefValue};
use crate::{StoreError, StoreResult};

/// Hierarchical preference store consumed by the reconciliation engine.
///
/// Keys are dot-separated strings. A key may carry a *default* value supplied
/// by the host and a *user* value written through this interface; `get`
/// returns the user value when present and falls back to the default.
/// `clear` removes only the user value.
pub trait PreferenceStore: Send + Sync {
    /// Read the effective value for `key`.
    fn get(&self, key: &str) -> StoreResult<Option<PrefValue>>;

    /// Write a user value for `key`.
    fn set(&self, key: &str, value: PrefValue) -> StoreResult<()>;

    /// Remove the user value for `key`. Clearing an unset key is not an error.
    fn clear(&self, key: &str) -> StoreResult<()>;

    /// Whether `key` carries a user value (as opposed to a default or nothing).
    fn has_user_value(&self, key: &str) -> StoreResult<bool>;

    /// List the key suffixes found under `prefix`, sorted and deduplicated.
    ///
    /// For `prefix = "a.b."` and stored keys `a.b.c` and `a.b.d.e`, returns
    /// `["c", "d.e"]`.
    fn list_child_keys(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// The user value for `key`, ignoring defaults.
    fn user_value(&self, key: &str) -> StoreResult<Option<PrefValue>> {
        if self.has_user_value(key)? {
            self.get(key)
        } else {
            Ok(None)
        }
    }

    fn get_bool(&self, key: &str) -> StoreResult<Option<bool>> {
        typed(key, self.get(key)?, PrefType::Bool, |v| v.as_bool())
    }

    fn get_int(&self, key: &str) -> StoreResult<Option<i64>> {
        typed(key, self.get(key)?, PrefType::Int, |v| v.as_int())
    }

    fn get_string(&self, key: &str) -> StoreResult<Option<String>> {
        typed(key, self.get(key)?, PrefType::String, |v| {
            v.as_str().map(str::to_string)
        })
    }

    /// Typed user-layer reads; host defaults are ignored.
    fn user_bool(&self, key: &str) -> StoreResult<Option<bool>> {
        typed(key, self.user_value(key)?, PrefType::Bool, |v| v.as_bool())
    }

    fn user_int(&self, key: &str) -> StoreResult<Option<i64>> {
        typed(key, self.user_value(key)?, PrefType::Int, |v| v.as_int())
    }

    fn user_string(&self, key: &str) -> StoreResult<Option<String>> {
        typed(key, self.user_value(key)?, PrefType::String, |v| {
            v.as_str().map(str::to_string)
        })
    }

    fn set_bool(&self, key: &str, value: bool) -> StoreResult<()> {
        self.set(key, PrefValue::Bool(value))
    }

    fn set_int(&self, key: &str, value: i64) -> StoreResult<()> {
        self.set(key, PrefValue::Int(value))
    }

    fn set_string(&self, key: &str, value: &str) -> StoreResult<()> {
        self.set(key, PrefValue::String(value.to_string()))
    }
}

fn typed<T>(
    key: &str,
    value: Option<PrefValue>,
    expected: PrefType,
    extract: impl FnOnce(&PrefValue) -> Option<T>,
) -> StoreResult<Option<T>> {
    match value {
        None => Ok(None),
        Some(value) => extract(&value)
            .map(Some)
            .ok_or_else(|| StoreError::TypeMismatch {
                key: key.to_string(),
                expected,
                found: value.pref_type(),
            }),
    }
}

/// Reject keys the host preference service would not accept.
///
/// A key is non-empty, has no leading, trailing or doubled dots, and
/// contains no whitespace.
pub fn validate_key(key: &str) -> StoreResult<()> {
    let malformed = key.is_empty()
        || key.starts_with('.')
        || key.ends_with('.')
        || key.contains("..")
        || key.chars().any(char::is_whitespace);
    if malformed {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}
