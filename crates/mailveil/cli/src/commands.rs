//! Subcommand implementations.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use mailveil_engine::{
    EngineConfig, MessageBundle, PanelDeps, ProfilePanel, StaticAccountDirectory,
};
use mailveil_profiles::{
    keyserver_args, AnonymizationVariant, PrivacyToggles, ProfileKind, ProfileSelection,
    ProxyEndpoint,
};
use mailveil_store::InMemoryPreferenceStore;
use tracing::{debug, info};

use crate::error::{CliError, CliResult};
use crate::host::{NoAccountDialog, ReportingBrowser, TerminalPrompt};
use crate::output::{self, OutputFormat};

/// Profile selection as given on the command line.
#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Profile kind (tor, service, custom, transparent)
    #[arg(long)]
    pub kind: ProfileKind,

    /// Relay variant for the anonymization service (builtin, user-defined)
    #[arg(long)]
    pub variant: Option<AnonymizationVariant>,

    /// Proxy host for the custom profile
    #[arg(long, requires = "port")]
    pub host: Option<String>,

    /// Proxy port for the custom profile
    #[arg(long, requires = "host")]
    pub port: Option<u16>,

    /// Let the server push new mail (IMAP IDLE)
    #[arg(long)]
    pub idle: bool,

    /// Reopen the last folder on startup
    #[arg(long)]
    pub restore_folder: bool,

    /// Strip recipient key ids from encrypted mail
    #[arg(long)]
    pub hide_key_id: bool,
}

impl SelectionArgs {
    pub fn to_selection(&self) -> CliResult<ProfileSelection> {
        if self.variant.is_some() && self.kind != ProfileKind::AnonymizationService {
            return Err(CliError::InvalidInput(format!(
                "--variant only applies to the service profile, not {}",
                self.kind
            )));
        }
        let endpoint = match (&self.host, self.port) {
            (Some(host), Some(port)) => Some(ProxyEndpoint::new(host.clone(), port)),
            _ => None,
        };
        if endpoint.is_some() && !self.kind.has_user_endpoint() {
            return Err(CliError::InvalidInput(format!(
                "--host/--port only apply to the custom profile, not {}",
                self.kind
            )));
        }

        Ok(ProfileSelection {
            kind: self.kind,
            variant: self.variant,
            endpoint,
            toggles: PrivacyToggles {
                use_server_idle_polling: self.idle,
                restore_last_folder: self.restore_folder,
                hide_key_id: self.hide_key_id,
            },
        })
    }
}

/// Everything a panel-backed command needs.
pub struct Context {
    pub config: EngineConfig,
    pub prefs: PathBuf,
    pub assume_yes: bool,
    pub format: OutputFormat,
}

/// A panel over the preference file, plus the store to save back.
struct Session {
    store: Arc<InMemoryPreferenceStore>,
    panel: ProfilePanel,
}

impl Context {
    fn open(&self) -> CliResult<Option<Session>> {
        let store = Arc::new(InMemoryPreferenceStore::new());
        store.load_json(&self.prefs)?;

        let deps = PanelDeps {
            store: store.clone(),
            localizer: Arc::new(MessageBundle::english()),
            accounts: Arc::new(StaticAccountDirectory::new(Vec::new())),
            account_dialog: Arc::new(NoAccountDialog),
            prompt: Arc::new(TerminalPrompt::new(self.assume_yes)),
            browser: Arc::new(ReportingBrowser),
            status: None,
        };
        let Some(panel) = ProfilePanel::open(&self.config, deps)? else {
            output::print_error("Aborted");
            return Ok(None);
        };
        // Persist a "don't ask again" answer even if the command fails later.
        self.save(&store)?;
        Ok(Some(Session { store, panel }))
    }

    fn save(&self, store: &InMemoryPreferenceStore) -> CliResult<()> {
        store.save_json(&self.prefs)?;
        debug!(path = %self.prefs.display(), "Saved preferences");
        Ok(())
    }
}

pub fn show(ctx: &Context) -> CliResult<()> {
    let Some(session) = ctx.open()? else {
        return Ok(());
    };
    let form = session.panel.on_load()?;
    output::print_form(&form, ctx.format)
}

pub fn apply(ctx: &Context, args: &SelectionArgs, dry_run: bool) -> CliResult<()> {
    let selection = args.to_selection()?;
    let Some(session) = ctx.open()? else {
        return Ok(());
    };

    if dry_run {
        let plan = session.panel.engine().plan(&selection)?;
        return output::print_plan(&plan, ctx.format);
    }

    let applied = session.panel.on_accept(&selection)?;
    ctx.save(&session.store)?;
    output::print_applied(&applied, ctx.format)
}

pub fn test(ctx: &Context, args: &SelectionArgs) -> CliResult<()> {
    let selection = args.to_selection()?;
    let Some(session) = ctx.open()? else {
        return Ok(());
    };
    let url = session.panel.test_settings(&selection)?;
    ctx.save(&session.store)?;
    output::print_line(&url, ctx.format)
}

pub fn forget(ctx: &Context) -> CliResult<()> {
    let Some(session) = ctx.open()? else {
        return Ok(());
    };
    let cleared = session.panel.engine().forget_shadow()?;
    ctx.save(&session.store)?;
    match ctx.format {
        OutputFormat::Json => output::print_json(&serde_json::json!({ "cleared": cleared })),
        OutputFormat::Text => {
            output::print_success(&format!("Forgot {cleared} remembered values"));
            Ok(())
        }
    }
}

/// Print the keyserver arguments without touching any preference file.
pub fn keyserver(kind: ProfileKind, hide_key_id: bool, format: OutputFormat) -> CliResult<()> {
    match keyserver_args(kind, hide_key_id) {
        Some(args) => output::print_line(&args, format),
        None => {
            info!(kind = %kind, "Profile does not route keyserver traffic");
            match format {
                OutputFormat::Json => output::print_json(&serde_json::Value::Null),
                OutputFormat::Text => Ok(()),
            }
        }
    }
}

