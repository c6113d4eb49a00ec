use std::sync::{Arc, Mutex, MutexGuard};

use mailveil_profiles::ProfileSelection;

use crate::engine::{AppliedProfile, ReconciliationEngine, ReconciliationPlan};
use crate::error::{EngineError, EngineResult};

/// A [`ReconciliationEngine`] shared between threads.
///
/// Applies are serialized: two concurrent selections never interleave their
/// writes, so the store always ends in the state of one complete apply.
#[derive(Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<ReconciliationEngine>>,
}

impl SharedEngine {
    pub fn new(engine: ReconciliationEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    fn lock(&self) -> EngineResult<MutexGuard<'_, ReconciliationEngine>> {
        self.inner.lock().map_err(|_| EngineError::Poisoned)
    }

    pub fn apply(&self, selection: &ProfileSelection) -> EngineResult<AppliedProfile> {
        self.lock()?.apply(selection)
    }

    /// Preview the writes for `selection`.
    ///
    /// The plan reflects the store at the time of the call; another thread may
    /// apply before it is used. Pass it to [`commit`](Self::commit), never to
    /// the inner engine.
    pub fn plan(&self, selection: &ProfileSelection) -> EngineResult<ReconciliationPlan> {
        self.lock()?.plan(selection)
    }

    /// Commit the selection behind a previewed plan.
    ///
    /// The plan is recomputed under the lock so the shadow wipe covers every
    /// key present at commit time.
    pub fn commit(&self, plan: ReconciliationPlan) -> EngineResult<AppliedProfile> {
        let engine = self.lock()?;
        let fresh = engine.plan(&plan.selection)?;
        engine.commit(fresh)
    }

    /// Run `f` with the engine locked.
    pub fn with<R>(&self, f: impl FnOnce(&ReconciliationEngine) -> R) -> EngineResult<R> {
        let guard = self.lock()?;
        Ok(f(&guard))
    }
}
