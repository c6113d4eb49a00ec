//! Settings-panel façade.
//!
//! [`ProfilePanel`] is what a UI layer binds to: it gates opening behind the
//! warning prompt, populates the form from the store, and forwards accepted
//! selections to the [`ReconciliationEngine`].

use std::sync::Arc;

use mailveil_profiles::{
    keys, AnonymizationVariant, PrivacyToggles, ProfileKind, ProfileSelection, ProxyEndpoint,
};
use mailveil_store::PreferenceStore;
use serde::Serialize;
use tracing::{debug, info};

use crate::collaborators::{
    Account, AccountDialog, AccountDirectory, BrowserTab, Localizer, StatusPanel, UserPrompt,
};
use crate::engine::{AppliedProfile, ReconciliationEngine};
use crate::error::{EngineError, EngineResult};
use crate::settings::{EngineConfig, TestUrlConfig};

const PROMPT_TITLE: &str = "mailveil.prompt.title";
const PROMPT_BODY: &str = "mailveil.prompt.body";
const PROMPT_REMEMBER: &str = "mailveil.prompt.remember";

/// Host capabilities the panel needs.
#[derive(Clone)]
pub struct PanelDeps {
    pub store: Arc<dyn PreferenceStore>,
    pub localizer: Arc<dyn Localizer>,
    pub accounts: Arc<dyn AccountDirectory>,
    pub account_dialog: Arc<dyn AccountDialog>,
    pub prompt: Arc<dyn UserPrompt>,
    pub browser: Arc<dyn BrowserTab>,
    pub status: Option<Arc<dyn StatusPanel>>,
}

/// Which form controls accept input for a kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FieldStates {
    pub endpoint_editable: bool,
    pub variant_selectable: bool,
}

impl FieldStates {
    pub fn for_kind(kind: ProfileKind) -> Self {
        Self {
            endpoint_editable: kind.has_user_endpoint(),
            variant_selectable: kind == ProfileKind::AnonymizationService,
        }
    }
}

/// Form population produced by [`ProfilePanel::on_load`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PanelForm {
    pub kind: ProfileKind,
    pub variant: Option<AnonymizationVariant>,
    pub endpoint: Option<ProxyEndpoint>,
    pub toggles: PrivacyToggles,
    pub fields: FieldStates,
    pub accounts: Vec<Account>,
}

impl PanelForm {
    /// The selection that re-applies exactly what the form shows.
    pub fn selection(&self) -> ProfileSelection {
        ProfileSelection {
            kind: self.kind,
            variant: self.variant,
            endpoint: self.endpoint.clone(),
            toggles: self.toggles,
        }
    }
}

pub struct ProfilePanel {
    engine: ReconciliationEngine,
    localizer: Arc<dyn Localizer>,
    accounts: Arc<dyn AccountDirectory>,
    account_dialog: Arc<dyn AccountDialog>,
    browser: Arc<dyn BrowserTab>,
    test_urls: TestUrlConfig,
}

impl ProfilePanel {
    /// Open the panel, asking the warning prompt first when it is enabled.
    ///
    /// Returns `Ok(None)` when the user declines; nothing is written then.
    pub fn open(config: &EngineConfig, deps: PanelDeps) -> EngineResult<Option<Self>> {
        let layout = config.layout();
        let warn_key = layout.pref(keys::pref::WARN);

        if deps.store.get_bool(&warn_key)?.unwrap_or(true) {
            let answer = deps.prompt.confirm_with_dont_ask_again(
                &deps.localizer.require(PROMPT_TITLE)?,
                &deps.localizer.require(PROMPT_BODY)?,
                &deps.localizer.require(PROMPT_REMEMBER)?,
            )?;
            if !answer.accepted {
                info!("Anonymization settings declined at warning prompt");
                return Ok(None);
            }
            if answer.dont_ask_again {
                deps.store.set_bool(&warn_key, false)?;
                debug!(key = %warn_key, "Warning prompt disabled");
            }
        }

        let mut engine = ReconciliationEngine::new(deps.store, deps.localizer.clone(), layout);
        if let Some(status) = deps.status {
            engine = engine.with_status_panel(status);
        }

        Ok(Some(Self {
            engine,
            localizer: deps.localizer,
            accounts: deps.accounts,
            account_dialog: deps.account_dialog,
            browser: deps.browser,
            test_urls: config.test_urls.clone(),
        }))
    }

    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    /// Read the store into a form.
    pub fn on_load(&self) -> EngineResult<PanelForm> {
        for kind in ProfileKind::ALL {
            self.localizer.require(kind.label_message_id())?;
        }

        let live = self.engine.read_live()?;
        let shadow = self.engine.read_shadow()?;
        let kind = live.kind.unwrap_or(ProfileKind::Tor);

        let endpoint = match kind {
            ProfileKind::Tor => Some(ProxyEndpoint::tor()),
            ProfileKind::Custom => shadow.generic.or(live.generic),
            ProfileKind::AnonymizationService | ProfileKind::Transparent => live.generic,
        };
        let variant = (kind == ProfileKind::AnonymizationService)
            .then(|| live.variant.unwrap_or_default());

        let idle_key = self.engine.layout().shadow(keys::USE_IDLE);
        let use_server_idle_polling = if self.engine.store().has_user_value(&idle_key)? {
            shadow.use_idle.unwrap_or(false)
        } else {
            false
        };

        let form = PanelForm {
            kind,
            variant,
            endpoint,
            toggles: PrivacyToggles {
                use_server_idle_polling,
                restore_last_folder: live.startup_folder.unwrap_or(false),
                hide_key_id: live.hide_key_id.unwrap_or(false),
            },
            fields: FieldStates::for_kind(kind),
            accounts: self.accounts()?,
        };
        debug!(kind = %form.kind, accounts = form.accounts.len(), "Loaded panel form");
        Ok(form)
    }

    pub fn on_accept(&self, selection: &ProfileSelection) -> EngineResult<AppliedProfile> {
        self.engine.apply(selection)
    }

    /// Accept, then open the check page for the applied profile.
    ///
    /// Returns the URL that was opened.
    pub fn test_settings(&self, selection: &ProfileSelection) -> EngineResult<String> {
        self.on_accept(selection)?;
        let url = self.test_url_for(selection).to_string();
        self.browser.open(&url)?;
        info!(url = %url, "Opened anonymization check page");
        Ok(url)
    }

    pub fn test_url_for(&self, selection: &ProfileSelection) -> &str {
        match (selection.kind, selection.effective_variant()) {
            (ProfileKind::AnonymizationService, Some(AnonymizationVariant::BuiltinRelay)) => {
                &self.test_urls.service
            }
            _ => &self.test_urls.default,
        }
    }

    /// Mail accounts, without local pseudo-accounts.
    pub fn accounts(&self) -> EngineResult<Vec<Account>> {
        Ok(self
            .accounts
            .list_accounts()?
            .into_iter()
            .filter(|account| !account.is_local())
            .collect())
    }

    /// Hand an account to the per-account dialog.
    pub fn select_account(&self, key: &str) -> EngineResult<()> {
        let account = self
            .accounts()?
            .into_iter()
            .find(|account| account.key == key)
            .ok_or_else(|| EngineError::UnknownAccount(key.to_string()))?;
        self.account_dialog.configure(&account)
    }
}
