//! Engine configuration.
//!
//! Layered with the `config` crate: built-in defaults, then an optional file,
//! then `MAILVEIL_`-prefixed environment variables (nested keys separated by
//! `__`, e.g. `MAILVEIL_BRANCHES__SHADOW_ROOT`).

use std::path::Path;

use mailveil_profiles::{keys, Channel, KeyLayout};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Preference roots
    #[serde(default)]
    pub branches: BranchConfig,

    /// Pages opened by "test settings"
    #[serde(default)]
    pub test_urls: TestUrlConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            branches: BranchConfig::default(),
            test_urls: TestUrlConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Where engine-owned keys live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchConfig {
    /// Root of the remembered selection, privacy flags, label and warn flag
    #[serde(default = "default_pref_root")]
    pub pref_root: String,

    /// Root of the shadow tree
    #[serde(default = "default_shadow_root")]
    pub shadow_root: String,
}

impl Default for BranchConfig {
    fn default() -> Self {
        Self {
            pref_root: default_pref_root(),
            shadow_root: default_shadow_root(),
        }
    }
}

/// Check pages for "test settings".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestUrlConfig {
    /// Opened for the built-in anonymization relay
    #[serde(default = "default_service_test_url")]
    pub service: String,

    /// Opened for every other profile
    #[serde(default = "default_test_url")]
    pub default: String,
}

impl Default for TestUrlConfig {
    fn default() -> Self {
        Self {
            service: default_service_test_url(),
            default: default_test_url(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_pref_root() -> String {
    "extensions.mailveil.".to_string()
}

fn default_shadow_root() -> String {
    "extensions.mailveil.custom.".to_string()
}

fn default_service_test_url() -> String {
    "https://ip-check.info/tb.php?lang=en".to_string()
}

fn default_test_url() -> String {
    "https://check.torproject.org/".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl EngineConfig {
    /// Load configuration from defaults, an optional file, and the environment.
    pub fn load(path: Option<&Path>) -> EngineResult<Self> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&EngineConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("MAILVEIL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject roots that would let the shadow wipe reach live or pref keys.
    pub fn validate(&self) -> EngineResult<()> {
        let BranchConfig {
            pref_root,
            shadow_root,
        } = &self.branches;

        for (name, root) in [("pref_root", pref_root), ("shadow_root", shadow_root)] {
            if root.is_empty() || !root.ends_with('.') || root.starts_with('.') {
                return Err(EngineError::Config(format!(
                    "{name} must be a non-empty, dot-terminated prefix, got {root:?}"
                )));
            }
            if root.chars().any(char::is_whitespace) || root.contains("..") {
                return Err(EngineError::Config(format!(
                    "{name} is not a valid preference prefix: {root:?}"
                )));
            }
        }

        if pref_root == shadow_root {
            return Err(EngineError::Config(
                "pref_root and shadow_root must differ".to_string(),
            ));
        }

        let layout = self.layout();
        let owned = live_keys()
            .into_iter()
            .map(str::to_string)
            .chain(pref_suffixes().into_iter().map(|suffix| layout.pref(suffix)));
        for key in owned {
            if key.starts_with(shadow_root.as_str()) {
                return Err(EngineError::Config(format!(
                    "shadow_root {shadow_root:?} would cover key {key:?}"
                )));
            }
        }

        if self.test_urls.service.is_empty() || self.test_urls.default.is_empty() {
            return Err(EngineError::Config("test URLs must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn layout(&self) -> KeyLayout {
        KeyLayout::new(
            self.branches.pref_root.clone(),
            self.branches.shadow_root.clone(),
        )
    }
}

fn live_keys() -> Vec<&'static str> {
    let mut out = vec![keys::PROXY_TYPE, keys::KEYSERVER_ARGS, keys::USE_IDLE];
    for channel in Channel::ALL {
        out.push(channel.host_key());
        out.push(channel.port_key());
    }
    out
}

fn pref_suffixes() -> [&'static str; 6] {
    [
        keys::pref::KIND,
        keys::pref::VARIANT,
        keys::pref::STARTUP_FOLDER,
        keys::pref::HIDE_KEY_ID,
        keys::pref::LABEL,
        keys::pref::WARN,
    ]
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.branches.pref_root, "extensions.mailveil.");
        assert_eq!(config.branches.shadow_root, "extensions.mailveil.custom.");
        assert_eq!(config.test_urls.default, "https://check.torproject.org/");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_layout_from_branches() {
        let layout = EngineConfig::default().layout();
        assert_eq!(layout.pref(keys::pref::WARN), "extensions.mailveil.warn");
    }

    #[test]
    fn test_rejects_unterminated_root() {
        let mut config = EngineConfig::default();
        config.branches.shadow_root = "extensions.mailveil.custom".into();
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_rejects_shadow_root_covering_live_keys() {
        let mut config = EngineConfig::default();
        config.branches.shadow_root = "network.".into();
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));

        let mut config = EngineConfig::default();
        config.branches.shadow_root = "extensions.".into();
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[branches]\nshadow_root = \"extensions.mailveil.saved.\"\n\n[logging]\njson = true"
        )
        .unwrap();

        let config = EngineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.branches.shadow_root, "extensions.mailveil.saved.");
        assert_eq!(config.branches.pref_root, "extensions.mailveil.");
        assert!(config.logging.json);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = EngineConfig::load(None).unwrap();
        assert_eq!(config.test_urls, TestUrlConfig::default());
    }
}
