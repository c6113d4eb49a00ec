//! Terminal implementations of the engine's host collaborators.

use dialoguer::Confirm;
use mailveil_engine::{
    Account, AccountDialog, BrowserTab, EngineError, EngineResult, PromptAnswer, UserPrompt,
};
use tracing::info;

/// Warning prompt on the terminal, or an automatic yes with `--yes`.
pub struct TerminalPrompt {
    assume_yes: bool,
}

impl TerminalPrompt {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl UserPrompt for TerminalPrompt {
    fn confirm_with_dont_ask_again(
        &self,
        title: &str,
        body: &str,
        remember_label: &str,
    ) -> EngineResult<PromptAnswer> {
        if self.assume_yes {
            return Ok(PromptAnswer {
                accepted: true,
                dont_ask_again: false,
            });
        }

        eprintln!("{title}\n\n{body}\n");
        let accepted = Confirm::new()
            .with_prompt("Continue?")
            .default(false)
            .interact()
            .unwrap_or(false);
        if !accepted {
            return Ok(PromptAnswer {
                accepted,
                dont_ask_again: false,
            });
        }

        let dont_ask_again = Confirm::new()
            .with_prompt(remember_label)
            .default(false)
            .interact()
            .unwrap_or(false);
        Ok(PromptAnswer {
            accepted,
            dont_ask_again,
        })
    }
}

/// There is no browser on the terminal; the URL is reported instead.
pub struct ReportingBrowser;

impl BrowserTab for ReportingBrowser {
    fn open(&self, url: &str) -> EngineResult<()> {
        info!(url, "Check page ready");
        Ok(())
    }
}

pub struct NoAccountDialog;

impl AccountDialog for NoAccountDialog {
    fn configure(&self, account: &Account) -> EngineResult<()> {
        Err(EngineError::Collaborator(format!(
            "account settings for {} cannot be edited from the terminal",
            account.key
        )))
    }
}
