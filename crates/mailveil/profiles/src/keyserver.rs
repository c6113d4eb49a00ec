//! OpenPGP keyserver argument strings.
//!
//! The OpenPGP agent is invoked with an extra-arguments string that decides
//! how it reaches key distribution servers. Each anonymization network has
//! its own policy; the output is compared byte-for-byte by the downstream
//! tool, so flag order is fixed.

use serde::{Deserialize, Serialize};

use crate::catalog::ProfileKind;

const NO_EMIT_VERSION: &str = "--no-emit-version";
const NO_COMMENTS: &str = "--no-comments";
const THROW_KEYIDS: &str = "--throw-keyids";
const DISPLAY_CHARSET: &str = "--display-charset utf-8";

const TOR_KEYSERVER_TAIL: &str = "--keyserver-options no-auto-key-retrieve,no-try-dns-srv,http-proxy=http://127.0.0.1:8118 --keyserver hkp://2eghzlv2wwcq7u7y.onion";
const SERVICE_KEYSERVER_TAIL: &str =
    "--keyserver-options no-auto-key-retrieve,no-try-dns-srv,http-proxy=http://127.0.0.1:4001";

/// Keyserver routing policy, one per anonymization network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyserverPolicy {
    /// Through the Tor HTTP bridge to the onion keyserver
    Tor,
    /// Through the anonymization relay's HTTP proxy
    AnonymizationService,
}

impl KeyserverPolicy {
    fn tail(self) -> &'static str {
        match self {
            KeyserverPolicy::Tor => TOR_KEYSERVER_TAIL,
            KeyserverPolicy::AnonymizationService => SERVICE_KEYSERVER_TAIL,
        }
    }

    /// Individual argument groups in the order they are emitted.
    pub fn arguments(self, hide_key_id: bool) -> Vec<&'static str> {
        let mut args = vec![NO_EMIT_VERSION, NO_COMMENTS];
        if hide_key_id {
            args.push(THROW_KEYIDS);
        }
        args.push(DISPLAY_CHARSET);
        args.push(self.tail());
        args
    }

    /// The space-joined argument string.
    pub fn build(self, hide_key_id: bool) -> String {
        self.arguments(hide_key_id).join(" ")
    }
}

/// Keyserver argument string for `kind`, or `None` for kinds that imply no
/// keyserver routing.
pub fn keyserver_args(kind: ProfileKind, hide_key_id: bool) -> Option<String> {
    kind.keyserver_policy()
        .map(|policy| policy.build(hide_key_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tor_policy_exact() {
        assert_eq!(
            KeyserverPolicy::Tor.build(false),
            "--no-emit-version --no-comments --display-charset utf-8 \
             --keyserver-options no-auto-key-retrieve,no-try-dns-srv,http-proxy=http://127.0.0.1:8118 \
             --keyserver hkp://2eghzlv2wwcq7u7y.onion"
        );
        assert_eq!(
            KeyserverPolicy::Tor.build(true),
            "--no-emit-version --no-comments --throw-keyids --display-charset utf-8 \
             --keyserver-options no-auto-key-retrieve,no-try-dns-srv,http-proxy=http://127.0.0.1:8118 \
             --keyserver hkp://2eghzlv2wwcq7u7y.onion"
        );
    }

    #[test]
    fn service_policy_exact() {
        assert_eq!(
            KeyserverPolicy::AnonymizationService.build(false),
            "--no-emit-version --no-comments --display-charset utf-8 \
             --keyserver-options no-auto-key-retrieve,no-try-dns-srv,http-proxy=http://127.0.0.1:4001"
        );
        assert_eq!(
            KeyserverPolicy::AnonymizationService.build(true),
            "--no-emit-version --no-comments --throw-keyids --display-charset utf-8 \
             --keyserver-options no-auto-key-retrieve,no-try-dns-srv,http-proxy=http://127.0.0.1:4001"
        );
    }

    #[test]
    fn custom_uses_tor_policy() {
        assert_eq!(
            keyserver_args(ProfileKind::Custom, true),
            keyserver_args(ProfileKind::Tor, true)
        );
    }

    #[test]
    fn transparent_has_no_arguments() {
        assert_eq!(keyserver_args(ProfileKind::Transparent, false), None);
        assert_eq!(keyserver_args(ProfileKind::Transparent, true), None);
    }
}
