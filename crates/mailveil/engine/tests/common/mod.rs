#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use mailveil_engine::{
    Account, AccountDialog, BrowserTab, EngineConfig, EngineError, EngineResult, MessageBundle,
    PanelDeps, PromptAnswer, ReconciliationEngine, StaticAccountDirectory, StatusPanel,
    UserPrompt,
};
use mailveil_store::{InMemoryPreferenceStore, PrefValue, PreferenceStore, StoreError, StoreResult};

#[derive(Default)]
pub struct RecordingBrowser {
    pub opened: Mutex<Vec<String>>,
}

impl BrowserTab for RecordingBrowser {
    fn open(&self, url: &str) -> EngineResult<()> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

pub struct ScriptedPrompt {
    pub answer: PromptAnswer,
    pub asked: Mutex<Vec<(String, String, String)>>,
}

impl ScriptedPrompt {
    pub fn answering(accepted: bool, dont_ask_again: bool) -> Self {
        Self {
            answer: PromptAnswer {
                accepted,
                dont_ask_again,
            },
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn times_asked(&self) -> usize {
        self.asked.lock().unwrap().len()
    }
}

impl UserPrompt for ScriptedPrompt {
    fn confirm_with_dont_ask_again(
        &self,
        title: &str,
        body: &str,
        remember_label: &str,
    ) -> EngineResult<PromptAnswer> {
        self.asked.lock().unwrap().push((
            title.to_string(),
            body.to_string(),
            remember_label.to_string(),
        ));
        Ok(self.answer)
    }
}

#[derive(Default)]
pub struct RecordingDialog {
    pub configured: Mutex<Vec<String>>,
}

impl AccountDialog for RecordingDialog {
    fn configure(&self, account: &Account) -> EngineResult<()> {
        self.configured.lock().unwrap().push(account.key.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingStatus {
    pub labels: Mutex<Vec<String>>,
}

impl StatusPanel for RecordingStatus {
    fn set_label(&self, label: &str) {
        self.labels.lock().unwrap().push(label.to_string());
    }
}

/// Wraps an in-memory store and fails every write to one key.
pub struct FailingStore {
    pub inner: InMemoryPreferenceStore,
    pub fail_key: String,
}

impl FailingStore {
    pub fn new(fail_key: impl Into<String>) -> Self {
        Self {
            inner: InMemoryPreferenceStore::new(),
            fail_key: fail_key.into(),
        }
    }
}

impl PreferenceStore for FailingStore {
    fn get(&self, key: &str) -> StoreResult<Option<PrefValue>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: PrefValue) -> StoreResult<()> {
        if key == self.fail_key {
            return Err(StoreError::Backend(format!("write to {key} rejected")));
        }
        self.inner.set(key, value)
    }

    fn clear(&self, key: &str) -> StoreResult<()> {
        self.inner.clear(key)
    }

    fn has_user_value(&self, key: &str) -> StoreResult<bool> {
        self.inner.has_user_value(key)
    }

    fn list_child_keys(&self, prefix: &str) -> StoreResult<Vec<String>> {
        self.inner.list_child_keys(prefix)
    }
}

pub fn engine_over(store: Arc<dyn PreferenceStore>) -> ReconciliationEngine {
    ReconciliationEngine::new(
        store,
        Arc::new(MessageBundle::english()),
        EngineConfig::default().layout(),
    )
}

pub fn accounts() -> Vec<Account> {
    vec![
        Account::new("account1", "alice@example.org", "imap"),
        Account::new("account2", "Local Folders", "none"),
        Account::new("account3", "bob@example.net", "pop3"),
    ]
}

pub struct Harness {
    pub store: Arc<InMemoryPreferenceStore>,
    pub browser: Arc<RecordingBrowser>,
    pub prompt: Arc<ScriptedPrompt>,
    pub dialog: Arc<RecordingDialog>,
    pub status: Arc<RecordingStatus>,
}

impl Harness {
    pub fn new(prompt: ScriptedPrompt) -> Self {
        Self {
            store: Arc::new(InMemoryPreferenceStore::new()),
            browser: Arc::new(RecordingBrowser::default()),
            prompt: Arc::new(prompt),
            dialog: Arc::new(RecordingDialog::default()),
            status: Arc::new(RecordingStatus::default()),
        }
    }

    pub fn deps(&self, localizer: MessageBundle) -> PanelDeps {
        PanelDeps {
            store: self.store.clone(),
            localizer: Arc::new(localizer),
            accounts: Arc::new(StaticAccountDirectory::new(accounts())),
            account_dialog: self.dialog.clone(),
            prompt: self.prompt.clone(),
            browser: self.browser.clone(),
            status: Some(self.status.clone()),
        }
    }
}

pub fn is_localization_missing(err: &EngineError, id: &str) -> bool {
    matches!(err, EngineError::LocalizationMissing(missing) if missing == id)
}
