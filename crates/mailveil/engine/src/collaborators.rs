//! Host collaborators consumed by the engine and panel.
//!
//! Each is a narrow capability trait injected at construction so the engine
//! can run against in-memory fakes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Localized string lookup.
pub trait Localizer: Send + Sync {
    fn lookup(&self, message_id: &str) -> Option<String>;

    /// Like [`lookup`](Localizer::lookup), but a missing id is an error.
    fn require(&self, message_id: &str) -> EngineResult<String> {
        self.lookup(message_id)
            .ok_or_else(|| EngineError::LocalizationMissing(message_id.to_string()))
    }
}

/// A configured mail account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub key: String,
    pub display_name: String,
    /// Incoming server type, e.g. `imap`, `pop3`, or `none` for local folders
    pub server_type: String,
}

impl Account {
    pub fn new(
        key: impl Into<String>,
        display_name: impl Into<String>,
        server_type: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            server_type: server_type.into(),
        }
    }

    /// The local-folders pseudo-account has no incoming server.
    pub fn is_local(&self) -> bool {
        self.server_type.eq_ignore_ascii_case("none")
    }
}

/// Enumerates the client's mail accounts.
pub trait AccountDirectory: Send + Sync {
    fn list_accounts(&self) -> EngineResult<Vec<Account>>;
}

/// Per-account settings dialog (user-defined relays are configured here).
pub trait AccountDialog: Send + Sync {
    fn configure(&self, account: &Account) -> EngineResult<()>;
}

/// Answer to the "are you sure" prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PromptAnswer {
    pub accepted: bool,
    /// The "don't ask again" box was ticked
    pub dont_ask_again: bool,
}

/// Modal confirmation with a "don't ask again" checkbox.
pub trait UserPrompt: Send + Sync {
    fn confirm_with_dont_ask_again(
        &self,
        title: &str,
        body: &str,
        remember_label: &str,
    ) -> EngineResult<PromptAnswer>;
}

/// Opens a page in a browser tab.
pub trait BrowserTab: Send + Sync {
    fn open(&self, url: &str) -> EngineResult<()>;
}

/// Shows the active profile label in the client's status area.
pub trait StatusPanel: Send + Sync {
    fn set_label(&self, label: &str);
}

/// In-memory message catalog.
#[derive(Clone, Debug, Default)]
pub struct MessageBundle {
    messages: HashMap<String, String>,
}

impl MessageBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message id the engine and panel look up, in English.
    pub fn english() -> Self {
        let mut bundle = Self::new();
        for (id, text) in [
            ("mailveil.enabled.tor", "Mailveil: Tor enabled"),
            (
                "mailveil.enabled.service",
                "Mailveil: anonymization service enabled",
            ),
            ("mailveil.enabled.custom", "Mailveil: custom proxy enabled"),
            (
                "mailveil.enabled.transparent",
                "Mailveil: transparent anonymization enabled",
            ),
            ("mailveil.prompt.title", "Advanced anonymization settings"),
            (
                "mailveil.prompt.body",
                "Changing these settings can weaken the anonymity of your email. \
                 Only continue if you understand what each option does.",
            ),
            ("mailveil.prompt.remember", "Do not show this warning again"),
        ] {
            bundle.insert(id, text);
        }
        bundle
    }

    pub fn insert(&mut self, id: impl Into<String>, text: impl Into<String>) -> &mut Self {
        self.messages.insert(id.into(), text.into());
        self
    }

    pub fn remove(&mut self, id: &str) -> Option<String> {
        self.messages.remove(id)
    }
}

impl Localizer for MessageBundle {
    fn lookup(&self, message_id: &str) -> Option<String> {
        self.messages.get(message_id).cloned()
    }
}

/// Fixed account list.
#[derive(Clone, Debug, Default)]
pub struct StaticAccountDirectory {
    accounts: Vec<Account>,
}

impl StaticAccountDirectory {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }
}

impl AccountDirectory for StaticAccountDirectory {
    fn list_accounts(&self) -> EngineResult<Vec<Account>> {
        Ok(self.accounts.clone())
    }
}
