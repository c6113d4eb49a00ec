use serde::{Deserialize, Serialize};

/// Live keys read by the rest of the mail client.
pub mod keys {
    pub const PROXY_TYPE: &str = "network.proxy.type";
    pub const SOCKS_HOST: &str = "network.proxy.socks";
    pub const SOCKS_PORT: &str = "network.proxy.socks_port";
    pub const SSL_HOST: &str = "network.proxy.ssl";
    pub const SSL_PORT: &str = "network.proxy.ssl_port";
    pub const HTTP_HOST: &str = "network.proxy.http";
    pub const HTTP_PORT: &str = "network.proxy.http_port";
    pub const KEYSERVER_ARGS: &str = "extensions.enigmail.agentAdditionalParam";
    pub const USE_IDLE: &str = "mail.server.default.use_idle";

    /// Suffixes under the pref root.
    pub mod pref {
        pub const KIND: &str = "proxy";
        pub const VARIANT: &str = "proxy.type";
        pub const STARTUP_FOLDER: &str = "startup_folder";
        pub const HIDE_KEY_ID: &str = "enigmail.throwkeyid";
        pub const LABEL: &str = "label";
        pub const WARN: &str = "warn";
    }
}

/// Outbound proxy channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// SOCKS, used by every protocol unless overridden
    Generic,
    /// TLS-specific override
    Secure,
    /// Plain HTTP relay override
    Relay,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Generic, Channel::Secure, Channel::Relay];

    pub fn host_key(self) -> &'static str {
        match self {
            Channel::Generic => keys::SOCKS_HOST,
            Channel::Secure => keys::SSL_HOST,
            Channel::Relay => keys::HTTP_HOST,
        }
    }

    pub fn port_key(self) -> &'static str {
        match self {
            Channel::Generic => keys::SOCKS_PORT,
            Channel::Secure => keys::SSL_PORT,
            Channel::Relay => keys::HTTP_PORT,
        }
    }
}

/// Where the engine's keys live in the flat store.
///
/// Live client keys use their fixed names; engine-private keys sit under
/// `pref_root`; the shadow tree mirrors live key names under `shadow_root`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyLayout {
    pref_root: String,
    shadow_root: String,
}

impl Default for KeyLayout {
    fn default() -> Self {
        Self::new("extensions.mailveil.", "extensions.mailveil.custom.")
    }
}

impl KeyLayout {
    pub fn new(pref_root: impl Into<String>, shadow_root: impl Into<String>) -> Self {
        Self {
            pref_root: pref_root.into(),
            shadow_root: shadow_root.into(),
        }
    }

    pub fn pref_root(&self) -> &str {
        &self.pref_root
    }

    pub fn shadow_root(&self) -> &str {
        &self.shadow_root
    }

    /// Full key for an engine-private suffix, e.g. `pref(keys::pref::KIND)`.
    pub fn pref(&self, suffix: &str) -> String {
        format!("{}{}", self.pref_root, suffix)
    }

    /// Full shadow key mirroring the live key `live`.
    pub fn shadow(&self, live: &str) -> String {
        format!("{}{}", self.shadow_root, live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_keys() {
        let layout = KeyLayout::default();
        assert_eq!(layout.pref(keys::pref::KIND), "extensions.mailveil.proxy");
        assert_eq!(
            layout.shadow(keys::SOCKS_PORT),
            "extensions.mailveil.custom.network.proxy.socks_port"
        );
    }

    #[test]
    fn channels_map_to_distinct_keys() {
        let mut seen = std::collections::HashSet::new();
        for channel in Channel::ALL {
            assert!(seen.insert(channel.host_key()));
            assert!(seen.insert(channel.port_key()));
        }
    }
}
