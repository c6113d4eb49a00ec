//! # mailveil-engine
//!
//! Profile reconciliation for a mail client's anonymization settings.
//!
//! Given a [`ProfileSelection`](mailveil_profiles::ProfileSelection), the
//! [`ReconciliationEngine`] computes every write the selection implies for the
//! live tree (what the client reads right now) and the shadow tree (what is
//! remembered per profile), then commits them as one batch:
//!
//! 1. force manual proxy handling so no channel inherits the system proxy
//! 2. wipe every key under the shadow root
//! 3. write the kind-specific endpoints, live and shadow
//! 4. remember the selected kind (and relay variant)
//! 5. apply the privacy toggles
//! 6. write the keyserver argument string for the final kind/toggle pair
//!
//! Invalid selections are rejected before the store is touched. A failing
//! write rolls back every key the batch touched.
//!
//! [`ProfilePanel`] wraps the engine with the settings-panel entry points
//! (`on_load`, `on_accept`, `test_settings`) and the host collaborators they
//! need. [`SharedEngine`] serializes `apply` calls across threads.

pub mod collaborators;
pub mod engine;
pub mod error;
pub mod panel;
pub mod privacy;
pub mod settings;
pub mod shared;

pub use collaborators::{
    Account, AccountDialog, AccountDirectory, BrowserTab, Localizer, MessageBundle, PromptAnswer,
    StaticAccountDirectory, StatusPanel, UserPrompt,
};
pub use engine::{AppliedProfile, ReconciliationEngine, ReconciliationPlan};
pub use error::{EngineError, EngineResult};
pub use panel::{FieldStates, PanelDeps, PanelForm, ProfilePanel};
pub use privacy::PrivacyToggleReconciler;
pub use settings::{BranchConfig, EngineConfig, LoggingConfig, TestUrlConfig};
pub use shared::SharedEngine;
