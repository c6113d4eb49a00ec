use std::collections::BTreeSet;
use std::sync::Arc;

use mailveil_profiles::{
    keyserver_args, AnonymizationVariant, Channel, Field, KeyLayout, LiveConfiguration, LiveUpdate,
    ProfileKind, ProfileSelection, ProxyEndpoint, ProxyMode, ShadowConfiguration,
};
use mailveil_store::{PreferenceStore, ShadowBranch, WriteBatch};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::collaborators::{Localizer, StatusPanel};
use crate::error::EngineResult;
use crate::privacy::PrivacyToggleReconciler;

/// Every write one selection implies, computed without touching the store.
#[derive(Clone, Debug)]
pub struct ReconciliationPlan {
    pub selection: ProfileSelection,
    /// Changes to keys the rest of the client reads
    pub live: LiveUpdate,
    /// The complete shadow tree after commit
    pub shadow: ShadowConfiguration,
    /// Shadow keys present before the commit, all of which are wiped
    pub stale_shadow_keys: BTreeSet<String>,
    /// Ordered store operations
    pub batch: WriteBatch,
}

/// Outcome of a committed reconciliation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppliedProfile {
    pub kind: ProfileKind,
    pub variant: Option<AnonymizationVariant>,
    pub label: String,
    pub writes: usize,
}

/// Computes and commits live/shadow writes for a profile selection.
///
/// The engine is a function of (store state, selection): it never reads the
/// active profile back from the store while planning.
pub struct ReconciliationEngine {
    store: Arc<dyn PreferenceStore>,
    localizer: Arc<dyn Localizer>,
    status: Option<Arc<dyn StatusPanel>>,
    layout: KeyLayout,
    privacy: PrivacyToggleReconciler,
}

impl ReconciliationEngine {
    pub fn new(
        store: Arc<dyn PreferenceStore>,
        localizer: Arc<dyn Localizer>,
        layout: KeyLayout,
    ) -> Self {
        Self {
            store,
            localizer,
            status: None,
            layout,
            privacy: PrivacyToggleReconciler,
        }
    }

    /// Push the label to a status area after each successful apply.
    pub fn with_status_panel(mut self, status: Arc<dyn StatusPanel>) -> Self {
        self.status = Some(status);
        self
    }

    pub fn layout(&self) -> &KeyLayout {
        &self.layout
    }

    pub fn store(&self) -> &Arc<dyn PreferenceStore> {
        &self.store
    }

    fn shadow_branch(&self) -> ShadowBranch<'_, dyn PreferenceStore> {
        ShadowBranch::new(self.store.as_ref(), self.layout.shadow_root())
    }

    /// Validate `selection` and compute its writes.
    ///
    /// Invalid selections fail here, before any store access.
    pub fn plan(&self, selection: &ProfileSelection) -> EngineResult<ReconciliationPlan> {
        selection.validate()?;

        let kind = selection.kind;
        let mut live = LiveUpdate {
            proxy_mode: Field::Set(ProxyMode::Manual),
            ..LiveUpdate::default()
        };
        let mut shadow = ShadowConfiguration::default();

        match kind {
            ProfileKind::Tor => {
                live.generic = Field::Set(ProxyEndpoint::tor());
                live.secure = Field::Clear;
                live.relay = Field::Clear;
            }
            ProfileKind::AnonymizationService => match selection.effective_variant() {
                Some(AnonymizationVariant::UserDefined) => {
                    // Endpoints for user-defined relays are owned by the account dialog.
                }
                _ => {
                    let relay = ProxyEndpoint::builtin_relay();
                    for channel in Channel::ALL {
                        *live.endpoint_mut(channel) = Field::Set(relay.clone());
                        *shadow.endpoint_mut(channel) = Some(relay.clone());
                    }
                }
            },
            ProfileKind::Custom => {
                // validate() guarantees the endpoint.
                let endpoint = selection.endpoint.clone().unwrap_or_else(ProxyEndpoint::tor);
                live.generic = Field::Set(endpoint.clone());
                live.secure = Field::Clear;
                live.relay = Field::Clear;
                shadow.generic = Some(endpoint);
            }
            ProfileKind::Transparent => {
                live.proxy_mode = Field::Set(ProxyMode::Direct);
                shadow.proxy_mode = Some(ProxyMode::Direct);
            }
        }

        live.kind = Field::Set(kind);
        if let Some(variant) = selection.effective_variant() {
            live.variant = Field::Set(variant);
        }

        self.privacy
            .reconcile(&selection.toggles, &mut live, &mut shadow);

        if let Some(args) = keyserver_args(kind, selection.toggles.hide_key_id) {
            live.keyserver_args = Field::Set(args.clone());
            shadow.keyserver_args = Some(args);
        }

        live.label = Field::Set(self.label_for(kind));

        let mut batch = WriteBatch::new();
        let stale_shadow_keys = self.shadow_branch().stage_clear_all(&mut batch)?;
        live.stage(&self.layout, &mut batch);
        shadow.stage(&self.layout, &mut batch);

        debug!(
            kind = %kind,
            stale_shadow_keys = stale_shadow_keys.len(),
            ops = batch.len(),
            "Planned profile reconciliation"
        );

        Ok(ReconciliationPlan {
            selection: selection.clone(),
            live,
            shadow,
            stale_shadow_keys,
            batch,
        })
    }

    /// Plan and commit `selection`.
    ///
    /// Re-applying the active selection runs the full wipe-then-write sequence.
    pub fn apply(&self, selection: &ProfileSelection) -> EngineResult<AppliedProfile> {
        let plan = self.plan(selection)?;
        self.commit(plan)
    }

    /// Commit a plan produced by [`plan`](Self::plan).
    pub fn commit(&self, plan: ReconciliationPlan) -> EngineResult<AppliedProfile> {
        let writes = plan.batch.commit(self.store.as_ref())?;

        let label = plan
            .live
            .label
            .as_set()
            .cloned()
            .unwrap_or_else(|| plan.selection.kind.fallback_label().to_string());
        if let Some(status) = &self.status {
            status.set_label(&label);
        }

        let applied = AppliedProfile {
            kind: plan.selection.kind,
            variant: plan.selection.effective_variant(),
            label,
            writes,
        };
        info!(
            kind = %applied.kind,
            variant = ?applied.variant,
            writes,
            "Applied anonymization profile"
        );
        Ok(applied)
    }

    /// Flip idle polling outside a profile switch, live and shadow.
    pub fn set_idle_polling(&self, enabled: bool) -> EngineResult<()> {
        let mut live = LiveUpdate::default();
        let mut shadow = ShadowConfiguration::default();
        self.privacy.idle_polling(enabled, &mut live, &mut shadow);
        self.commit_partial(&live, &shadow)?;
        info!(enabled, "Updated server idle polling");
        Ok(())
    }

    /// Flip last-folder restore outside a profile switch, live only.
    pub fn set_restore_last_folder(&self, enabled: bool) -> EngineResult<()> {
        let mut live = LiveUpdate::default();
        self.privacy.restore_last_folder(enabled, &mut live);
        self.commit_partial(&live, &ShadowConfiguration::default())?;
        info!(enabled, "Updated startup folder restore");
        Ok(())
    }

    fn commit_partial(&self, live: &LiveUpdate, shadow: &ShadowConfiguration) -> EngineResult<()> {
        let mut batch = WriteBatch::new();
        live.stage(&self.layout, &mut batch);
        shadow.stage(&self.layout, &mut batch);
        batch.commit(self.store.as_ref())?;
        Ok(())
    }

    /// Drop every remembered per-profile value.
    pub fn forget_shadow(&self) -> EngineResult<usize> {
        let cleared = self.shadow_branch().clear_all()?;
        info!(cleared, "Forgot remembered profile values");
        Ok(cleared)
    }

    pub fn read_live(&self) -> EngineResult<LiveConfiguration> {
        Ok(LiveConfiguration::read(self.store.as_ref(), &self.layout)?)
    }

    pub fn read_shadow(&self) -> EngineResult<ShadowConfiguration> {
        Ok(ShadowConfiguration::read(self.store.as_ref(), &self.layout)?)
    }

    /// Live key names currently present in the shadow tree.
    pub fn shadow_keys(&self) -> EngineResult<BTreeSet<String>> {
        Ok(self.shadow_branch().list_keys()?)
    }

    fn label_for(&self, kind: ProfileKind) -> String {
        match self.localizer.lookup(kind.label_message_id()) {
            Some(label) => label,
            None => {
                warn!(
                    message_id = kind.label_message_id(),
                    "Label missing from localizer, using fallback"
                );
                kind.fallback_label().to_string()
            }
        }
    }
}
