use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, ProfileResult};
use crate::keyserver::KeyserverPolicy;

/// Local Tor SOCKS listener.
pub const TOR_SOCKS_ENDPOINT: (&str, u16) = ("127.0.0.1", 9050);

/// Local listener of the built-in anonymization relay.
pub const BUILTIN_RELAY_ENDPOINT: (&str, u16) = ("127.0.0.1", 4001);

/// The top-level anonymization strategy.
///
/// Exactly one kind is active at a time. The discriminant is the index
/// persisted in the preference store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileKind {
    /// Route through the local Tor SOCKS port
    Tor,
    /// Route through an anonymization relay
    AnonymizationService,
    /// User-supplied SOCKS endpoint
    Custom,
    /// No in-client proxy, anonymized by the OS/network
    Transparent,
}

impl ProfileKind {
    pub const ALL: [ProfileKind; 4] = [
        ProfileKind::Tor,
        ProfileKind::AnonymizationService,
        ProfileKind::Custom,
        ProfileKind::Transparent,
    ];

    pub fn index(self) -> i64 {
        match self {
            ProfileKind::Tor => 0,
            ProfileKind::AnonymizationService => 1,
            ProfileKind::Custom => 2,
            ProfileKind::Transparent => 3,
        }
    }

    pub fn from_index(index: i64) -> ProfileResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.index() == index)
            .ok_or(ProfileError::UnknownKind(index))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProfileKind::Tor => "tor",
            ProfileKind::AnonymizationService => "service",
            ProfileKind::Custom => "custom",
            ProfileKind::Transparent => "transparent",
        }
    }

    /// Message id of the status label shown once this kind is active.
    pub fn label_message_id(self) -> &'static str {
        match self {
            ProfileKind::Tor => "mailveil.enabled.tor",
            ProfileKind::AnonymizationService => "mailveil.enabled.service",
            ProfileKind::Custom => "mailveil.enabled.custom",
            ProfileKind::Transparent => "mailveil.enabled.transparent",
        }
    }

    /// Label used when the localized string cannot be found.
    pub fn fallback_label(self) -> &'static str {
        match self {
            ProfileKind::Tor => "Tor enabled",
            ProfileKind::AnonymizationService => "Anonymization service enabled",
            ProfileKind::Custom => "Custom proxy enabled",
            ProfileKind::Transparent => "Transparent anonymization enabled",
        }
    }

    /// Keyserver routing policy implied by this kind, if any.
    ///
    /// Custom profiles are assumed Tor-routed for keyserver traffic.
    /// Transparent profiles imply no keyserver routing.
    pub fn keyserver_policy(self) -> Option<KeyserverPolicy> {
        match self {
            ProfileKind::Tor | ProfileKind::Custom => Some(KeyserverPolicy::Tor),
            ProfileKind::AnonymizationService => Some(KeyserverPolicy::AnonymizationService),
            ProfileKind::Transparent => None,
        }
    }

    /// Whether the user edits the proxy endpoint for this kind.
    pub fn has_user_endpoint(self) -> bool {
        matches!(self, ProfileKind::Custom)
    }
}

impl std::fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProfileKind {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tor" => Ok(ProfileKind::Tor),
            "service" | "anonymization-service" => Ok(ProfileKind::AnonymizationService),
            "custom" => Ok(ProfileKind::Custom),
            "transparent" => Ok(ProfileKind::Transparent),
            _ => Err(ProfileError::UnknownKindName(s.to_string())),
        }
    }
}

/// Sub-variant of [`ProfileKind::AnonymizationService`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnonymizationVariant {
    /// The relay shipped with the client, fixed endpoint
    #[default]
    BuiltinRelay,
    /// A relay configured per account by the user
    UserDefined,
}

impl AnonymizationVariant {
    pub fn index(self) -> i64 {
        match self {
            AnonymizationVariant::BuiltinRelay => 0,
            AnonymizationVariant::UserDefined => 1,
        }
    }

    pub fn from_index(index: i64) -> ProfileResult<Self> {
        match index {
            0 => Ok(AnonymizationVariant::BuiltinRelay),
            1 => Ok(AnonymizationVariant::UserDefined),
            other => Err(ProfileError::UnknownVariant(other)),
        }
    }
}

impl std::str::FromStr for AnonymizationVariant {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "builtin" | "builtin-relay" => Ok(AnonymizationVariant::BuiltinRelay),
            "user-defined" | "user" => Ok(AnonymizationVariant::UserDefined),
            _ => Err(ProfileError::UnknownVariantName(s.to_string())),
        }
    }
}

/// A SOCKS/HTTP proxy listener.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProxyEndpoint {
    pub host: String,
    pub port: u16,
}

impl ProxyEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn tor() -> Self {
        Self::new(TOR_SOCKS_ENDPOINT.0, TOR_SOCKS_ENDPOINT.1)
    }

    pub fn builtin_relay() -> Self {
        Self::new(BUILTIN_RELAY_ENDPOINT.0, BUILTIN_RELAY_ENDPOINT.1)
    }

    /// Build from raw store values, rejecting ports outside `1..=65535`.
    pub fn from_parts(host: impl Into<String>, port: i64) -> ProfileResult<Self> {
        let host = host.into();
        let port_u16 = u16::try_from(port).map_err(|_| ProfileError::InvalidEndpoint {
            host: host.clone(),
            port,
            reason: "port out of range".into(),
        })?;
        let endpoint = Self::new(host, port_u16);
        endpoint.validate()?;
        Ok(endpoint)
    }

    /// Syntactic validity: non-empty host without whitespace, non-zero port.
    pub fn validate(&self) -> ProfileResult<()> {
        let reason = if self.host.trim().is_empty() {
            Some("host is empty")
        } else if self.host.chars().any(char::is_whitespace) {
            Some("host contains whitespace")
        } else if self.port == 0 {
            Some("port must be non-zero")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(ProfileError::InvalidEndpoint {
                host: self.host.clone(),
                port: i64::from(self.port),
                reason: reason.into(),
            }),
            None => Ok(()),
        }
    }
}

impl std::fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Privacy switches that apply regardless of the selected profile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacyToggles {
    /// Keep IMAP IDLE connections open to the server
    pub use_server_idle_polling: bool,
    /// Reopen the last accessed folder on startup
    pub restore_last_folder: bool,
    /// Strip recipient key ids from encrypted messages
    pub hide_key_id: bool,
}

/// What the user asked for when accepting the panel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSelection {
    pub kind: ProfileKind,
    #[serde(default)]
    pub variant: Option<AnonymizationVariant>,
    #[serde(default)]
    pub endpoint: Option<ProxyEndpoint>,
    #[serde(default)]
    pub toggles: PrivacyToggles,
}

impl ProfileSelection {
    pub fn new(kind: ProfileKind) -> Self {
        Self {
            kind,
            variant: None,
            endpoint: None,
            toggles: PrivacyToggles::default(),
        }
    }

    pub fn tor() -> Self {
        Self::new(ProfileKind::Tor)
    }

    pub fn service(variant: Option<AnonymizationVariant>) -> Self {
        Self {
            variant,
            ..Self::new(ProfileKind::AnonymizationService)
        }
    }

    pub fn custom(endpoint: ProxyEndpoint) -> Self {
        Self {
            endpoint: Some(endpoint),
            ..Self::new(ProfileKind::Custom)
        }
    }

    pub fn transparent() -> Self {
        Self::new(ProfileKind::Transparent)
    }

    pub fn with_toggles(mut self, toggles: PrivacyToggles) -> Self {
        self.toggles = toggles;
        self
    }

    /// Parse raw store/UI indices into a selection.
    pub fn from_indices(
        kind: i64,
        variant: Option<i64>,
        endpoint: Option<ProxyEndpoint>,
        toggles: PrivacyToggles,
    ) -> ProfileResult<Self> {
        let kind = ProfileKind::from_index(kind)?;
        let variant = match kind {
            ProfileKind::AnonymizationService => {
                variant.map(AnonymizationVariant::from_index).transpose()?
            }
            _ => None,
        };
        Ok(Self {
            kind,
            variant,
            endpoint,
            toggles,
        })
    }

    /// The variant that takes effect: absent means the built-in relay.
    /// `None` for kinds other than the anonymization service.
    pub fn effective_variant(&self) -> Option<AnonymizationVariant> {
        match self.kind {
            ProfileKind::AnonymizationService => Some(self.variant.unwrap_or_default()),
            _ => None,
        }
    }

    /// Check the selection can be applied without touching the store.
    pub fn validate(&self) -> ProfileResult<()> {
        if self.kind == ProfileKind::Custom {
            let endpoint = self
                .endpoint
                .as_ref()
                .ok_or(ProfileError::MissingEndpoint)?;
            endpoint.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_index_roundtrip() {
        for kind in ProfileKind::ALL {
            assert_eq!(ProfileKind::from_index(kind.index()).unwrap(), kind);
        }
        assert_eq!(
            ProfileKind::from_index(4),
            Err(ProfileError::UnknownKind(4))
        );
        assert_eq!(
            ProfileKind::from_index(-1),
            Err(ProfileError::UnknownKind(-1))
        );
    }

    #[test]
    fn variant_index_roundtrip() {
        assert_eq!(
            AnonymizationVariant::from_index(0).unwrap(),
            AnonymizationVariant::BuiltinRelay
        );
        assert_eq!(
            AnonymizationVariant::from_index(1).unwrap(),
            AnonymizationVariant::UserDefined
        );
        assert_eq!(
            AnonymizationVariant::from_index(2),
            Err(ProfileError::UnknownVariant(2))
        );
    }

    #[test]
    fn kind_parses_cli_names() {
        assert_eq!("tor".parse::<ProfileKind>().unwrap(), ProfileKind::Tor);
        assert_eq!(
            "Service".parse::<ProfileKind>().unwrap(),
            ProfileKind::AnonymizationService
        );
        assert!("socks".parse::<ProfileKind>().is_err());
    }

    #[test]
    fn custom_requires_endpoint() {
        let mut selection = ProfileSelection::new(ProfileKind::Custom);
        assert_eq!(selection.validate(), Err(ProfileError::MissingEndpoint));

        selection.endpoint = Some(ProxyEndpoint::new("10.0.0.1", 9150));
        assert!(selection.validate().is_ok());
    }

    #[test]
    fn endpoint_validation() {
        assert!(ProxyEndpoint::new("", 9050).validate().is_err());
        assert!(ProxyEndpoint::new("bad host", 9050).validate().is_err());
        assert!(ProxyEndpoint::new("127.0.0.1", 0).validate().is_err());
        assert!(ProxyEndpoint::from_parts("127.0.0.1", 70000).is_err());
        assert_eq!(
            ProxyEndpoint::from_parts("127.0.0.1", 9050).unwrap(),
            ProxyEndpoint::tor()
        );
    }

    #[test]
    fn absent_variant_means_builtin_relay() {
        assert_eq!(
            ProfileSelection::service(None).effective_variant(),
            Some(AnonymizationVariant::BuiltinRelay)
        );
        assert_eq!(ProfileSelection::tor().effective_variant(), None);
    }

    #[test]
    fn from_indices_ignores_variant_outside_service() {
        let selection =
            ProfileSelection::from_indices(0, Some(5), None, PrivacyToggles::default()).unwrap();
        assert_eq!(selection.kind, ProfileKind::Tor);
        assert_eq!(selection.variant, None);

        let err = ProfileSelection::from_indices(1, Some(5), None, PrivacyToggles::default())
            .unwrap_err();
        assert_eq!(err, ProfileError::UnknownVariant(5));
    }

    #[test]
    fn only_transparent_lacks_keyserver_policy() {
        assert_eq!(ProfileKind::Tor.keyserver_policy(), Some(KeyserverPolicy::Tor));
        assert_eq!(ProfileKind::Custom.keyserver_policy(), Some(KeyserverPolicy::Tor));
        assert_eq!(
            ProfileKind::AnonymizationService.keyserver_policy(),
            Some(KeyserverPolicy::AnonymizationService)
        );
        assert_eq!(ProfileKind::Transparent.keyserver_policy(), None);
    }

    #[test]
    fn selection_serialization_roundtrip() {
        let selection = ProfileSelection::custom(ProxyEndpoint::new("10.0.0.1", 9150))
            .with_toggles(PrivacyToggles {
                use_server_idle_polling: true,
                restore_last_folder: false,
                hide_key_id: true,
            });
        let json = serde_json::to_string(&selection).unwrap();
        assert!(json.contains("\"custom\""));
        let restored: ProfileSelection = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, selection);
    }
}
