//! # mailveil-profiles
//!
//! Network-anonymization profiles for a mail client, and the typed shape of
//! the preference key space they drive.
//!
//! ## Profile Kinds
//!
//! - **Tor**: route everything through the local Tor SOCKS port
//!   (`127.0.0.1:9050`)
//! - **AnonymizationService**: route through an anonymization relay; the
//!   built-in relay listens on `127.0.0.1:4001`, user-defined relays are
//!   configured elsewhere
//! - **Custom**: a user-supplied SOCKS endpoint, keyserver traffic treated as
//!   Tor-routed
//! - **Transparent**: no in-client proxy; anonymization happens at the
//!   OS/network layer
//!
//! ## Key Space
//!
//! Every key the engine owns lives either in the *live* tree (read by the rest
//! of the client) or the *shadow* tree (a mirror under a separate root used to
//! remember per-profile values). [`LiveUpdate`] and [`ShadowConfiguration`]
//! are the typed records; [`KeyLayout`] maps them onto flat keys.

pub mod catalog;
pub mod error;
pub mod keyserver;
pub mod layout;
pub mod records;

pub use catalog::{
    AnonymizationVariant, PrivacyToggles, ProfileKind, ProfileSelection, ProxyEndpoint,
    BUILTIN_RELAY_ENDPOINT, TOR_SOCKS_ENDPOINT,
};
pub use error::{ProfileError, ProfileResult, RecordError};
pub use keyserver::{keyserver_args, KeyserverPolicy};
pub use layout::{keys, Channel, KeyLayout};
pub use records::{Field, LiveConfiguration, LiveUpdate, ProxyMode, ShadowConfiguration};
