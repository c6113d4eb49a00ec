use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::error::BatchError;
use crate::traits::PreferenceStore;
use crate::value::PrefValue;

/// One staged store mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteOp {
    Set { key: String, value: PrefValue },
    Clear { key: String },
}

impl WriteOp {
    pub fn key(&self) -> &str {
        match self {
            WriteOp::Set { key, .. } | WriteOp::Clear { key } => key,
        }
    }
}

/// An ordered list of store mutations committed as a unit.
///
/// Nothing touches the store until [`commit`](WriteBatch::commit). If a write
/// fails mid-way, every key the batch touches is restored to the user value it
/// held before the commit started.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PrefValue>) -> &mut Self {
        self.ops.push(WriteOp::Set {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn clear(&mut self, key: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::Clear { key: key.into() });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Every key mentioned by the batch.
    pub fn touched_keys(&self) -> BTreeSet<String> {
        self.ops.iter().map(|op| op.key().to_string()).collect()
    }

    /// The user-value state the batch leaves behind, keyed by full key.
    /// `None` means the key ends up cleared.
    pub fn final_values(&self) -> BTreeMap<String, Option<PrefValue>> {
        let mut out = BTreeMap::new();
        for op in &self.ops {
            match op {
                WriteOp::Set { key, value } => {
                    out.insert(key.clone(), Some(value.clone()));
                }
                WriteOp::Clear { key } => {
                    out.insert(key.clone(), None);
                }
            }
        }
        out
    }

    /// Apply every op in order. Returns the number of ops applied.
    pub fn commit<S: PreferenceStore + ?Sized>(&self, store: &S) -> Result<usize, BatchError> {
        let mut prior = Vec::new();
        for key in self.touched_keys() {
            let value = store.user_value(&key).map_err(BatchError::Snapshot)?;
            prior.push((key, value));
        }

        let total = self.ops.len();
        for (index, op) in self.ops.iter().enumerate() {
            let result = match op {
                WriteOp::Set { key, value } => store.set(key, value.clone()),
                WriteOp::Clear { key } => store.clear(key),
            };
            if let Err(cause) = result {
                warn!(
                    index,
                    total,
                    key = op.key(),
                    error = %cause,
                    "Preference write failed, rolling back batch"
                );
                return Err(match restore(store, &prior) {
                    Ok(()) => BatchError::Aborted {
                        index,
                        total,
                        cause,
                    },
                    Err(rollback) => BatchError::RollbackFailed {
                        index,
                        total,
                        cause,
                        rollback,
                    },
                });
            }
        }

        debug!(ops = total, "Committed preference batch");
        Ok(total)
    }
}

impl Extend<WriteOp> for WriteBatch {
    fn extend<T: IntoIterator<Item = WriteOp>>(&mut self, iter: T) {
        self.ops.extend(iter);
    }
}

fn restore<S: PreferenceStore + ?Sized>(
    store: &S,
    prior: &[(String, Option<PrefValue>)],
) -> crate::StoreResult<()> {
    for (key, value) in prior.iter().rev() {
        match value {
            Some(value) => store.set(key, value.clone())?,
            None => store.clear(key)?,
        }
    }
    Ok(())
}
