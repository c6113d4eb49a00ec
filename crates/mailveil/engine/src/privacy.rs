use mailveil_profiles::{Field, LiveUpdate, PrivacyToggles, ShadowConfiguration};

/// Folds the profile-independent privacy toggles into a reconciliation.
///
/// Idle polling is written live and shadowed. The startup-folder flag is
/// live-only because it is not profile-scoped. `hide_key_id` is persisted for
/// the next load; its effect on the keyserver arguments is computed by the
/// engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrivacyToggleReconciler;

impl PrivacyToggleReconciler {
    pub fn reconcile(
        &self,
        toggles: &PrivacyToggles,
        live: &mut LiveUpdate,
        shadow: &mut ShadowConfiguration,
    ) {
        self.idle_polling(toggles.use_server_idle_polling, live, shadow);
        self.restore_last_folder(toggles.restore_last_folder, live);
        live.hide_key_id = Field::Set(toggles.hide_key_id);
    }

    pub fn idle_polling(
        &self,
        enabled: bool,
        live: &mut LiveUpdate,
        shadow: &mut ShadowConfiguration,
    ) {
        live.use_idle = Field::Set(enabled);
        shadow.use_idle = Some(enabled);
    }

    pub fn restore_last_folder(&self, enabled: bool, live: &mut LiveUpdate) {
        live.startup_folder = Field::Set(enabled);
    }
}
