//! Typed records for the live and shadow trees, and their mapping onto flat
//! preference keys.

use std::collections::BTreeSet;

use mailveil_store::{PreferenceStore, WriteBatch};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{AnonymizationVariant, ProfileKind, ProxyEndpoint};
use crate::error::RecordError;
use crate::layout::{keys, Channel, KeyLayout};

/// How the client picks an outbound proxy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyMode {
    /// No in-client proxy
    Direct,
    /// Use the configured channel endpoints, never the OS proxy
    Manual,
    /// Any other host mode (PAC, auto-detect, system); never written here
    Other(i64),
}

impl ProxyMode {
    pub fn index(self) -> i64 {
        match self {
            ProxyMode::Direct => 0,
            ProxyMode::Manual => 1,
            ProxyMode::Other(index) => index,
        }
    }

    pub fn from_index(index: i64) -> Self {
        match index {
            0 => ProxyMode::Direct,
            1 => ProxyMode::Manual,
            other => ProxyMode::Other(other),
        }
    }
}

/// A pending change to one logical field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Field<T> {
    /// Leave whatever the store holds
    #[default]
    Keep,
    /// Write this value
    Set(T),
    /// Drop the user value so the host default applies
    Clear,
}

impl<T> Field<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Field::Keep)
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Field::Set(value) => Some(value),
            _ => None,
        }
    }
}

/// Changes to the live tree produced by one reconciliation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LiveUpdate {
    pub proxy_mode: Field<ProxyMode>,
    pub generic: Field<ProxyEndpoint>,
    pub secure: Field<ProxyEndpoint>,
    pub relay: Field<ProxyEndpoint>,
    pub keyserver_args: Field<String>,
    pub use_idle: Field<bool>,
    pub startup_folder: Field<bool>,
    pub hide_key_id: Field<bool>,
    pub kind: Field<ProfileKind>,
    pub variant: Field<AnonymizationVariant>,
    pub label: Field<String>,
}

impl LiveUpdate {
    pub fn endpoint_mut(&mut self, channel: Channel) -> &mut Field<ProxyEndpoint> {
        match channel {
            Channel::Generic => &mut self.generic,
            Channel::Secure => &mut self.secure,
            Channel::Relay => &mut self.relay,
        }
    }

    pub fn endpoint(&self, channel: Channel) -> &Field<ProxyEndpoint> {
        match channel {
            Channel::Generic => &self.generic,
            Channel::Secure => &self.secure,
            Channel::Relay => &self.relay,
        }
    }

    /// Append the writes for every non-`Keep` field to `batch`.
    pub fn stage(&self, layout: &KeyLayout, batch: &mut WriteBatch) {
        stage_field(batch, keys::PROXY_TYPE.to_string(), &self.proxy_mode, |m| {
            m.index().into()
        });
        for channel in Channel::ALL {
            stage_endpoint(
                batch,
                channel.host_key().to_string(),
                channel.port_key().to_string(),
                self.endpoint(channel),
            );
        }
        stage_field(batch, keys::KEYSERVER_ARGS.to_string(), &self.keyserver_args, |s| {
            s.clone().into()
        });
        stage_field(batch, keys::USE_IDLE.to_string(), &self.use_idle, |b| (*b).into());
        stage_field(
            batch,
            layout.pref(keys::pref::STARTUP_FOLDER),
            &self.startup_folder,
            |b| (*b).into(),
        );
        stage_field(
            batch,
            layout.pref(keys::pref::HIDE_KEY_ID),
            &self.hide_key_id,
            |b| (*b).into(),
        );
        stage_field(batch, layout.pref(keys::pref::KIND), &self.kind, |k| {
            k.index().into()
        });
        stage_field(batch, layout.pref(keys::pref::VARIANT), &self.variant, |v| {
            v.index().into()
        });
        stage_field(batch, layout.pref(keys::pref::LABEL), &self.label, |s| {
            s.clone().into()
        });
    }
}

fn stage_field<T>(
    batch: &mut WriteBatch,
    key: String,
    field: &Field<T>,
    encode: impl FnOnce(&T) -> mailveil_store::PrefValue,
) {
    match field {
        Field::Keep => {}
        Field::Set(value) => {
            batch.set(key, encode(value));
        }
        Field::Clear => {
            batch.clear(key);
        }
    }
}

fn stage_endpoint(
    batch: &mut WriteBatch,
    host_key: String,
    port_key: String,
    field: &Field<ProxyEndpoint>,
) {
    match field {
        Field::Keep => {}
        Field::Set(endpoint) => {
            batch.set(host_key, endpoint.host.as_str());
            batch.set(port_key, endpoint.port);
        }
        Field::Clear => {
            batch.clear(host_key);
            batch.clear(port_key);
        }
    }
}

/// What the rest of the client currently sees.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveConfiguration {
    pub proxy_mode: Option<ProxyMode>,
    pub generic: Option<ProxyEndpoint>,
    pub secure: Option<ProxyEndpoint>,
    pub relay: Option<ProxyEndpoint>,
    pub keyserver_args: Option<String>,
    pub use_idle: Option<bool>,
    pub startup_folder: Option<bool>,
    pub hide_key_id: Option<bool>,
    pub kind: Option<ProfileKind>,
    pub variant: Option<AnonymizationVariant>,
    pub label: Option<String>,
}

impl LiveConfiguration {
    pub fn read<S: PreferenceStore + ?Sized>(
        store: &S,
        layout: &KeyLayout,
    ) -> Result<Self, RecordError> {
        Ok(Self {
            proxy_mode: store.get_int(keys::PROXY_TYPE)?.map(ProxyMode::from_index),
            generic: read_endpoint(store, keys::SOCKS_HOST, keys::SOCKS_PORT)?,
            secure: read_endpoint(store, keys::SSL_HOST, keys::SSL_PORT)?,
            relay: read_endpoint(store, keys::HTTP_HOST, keys::HTTP_PORT)?,
            keyserver_args: store.get_string(keys::KEYSERVER_ARGS)?,
            use_idle: store.get_bool(keys::USE_IDLE)?,
            startup_folder: store.get_bool(&layout.pref(keys::pref::STARTUP_FOLDER))?,
            hide_key_id: store.get_bool(&layout.pref(keys::pref::HIDE_KEY_ID))?,
            kind: store
                .get_int(&layout.pref(keys::pref::KIND))?
                .map(ProfileKind::from_index)
                .transpose()?,
            variant: store
                .get_int(&layout.pref(keys::pref::VARIANT))?
                .map(AnonymizationVariant::from_index)
                .transpose()?,
            label: store.get_string(&layout.pref(keys::pref::LABEL))?,
        })
    }

    pub fn endpoint(&self, channel: Channel) -> Option<&ProxyEndpoint> {
        match channel {
            Channel::Generic => self.generic.as_ref(),
            Channel::Secure => self.secure.as_ref(),
            Channel::Relay => self.relay.as_ref(),
        }
    }
}

/// Per-profile values remembered under the shadow root.
///
/// Only `Some` fields are written, so the record's key set is exactly the set
/// of shadow keys present after a reconciliation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowConfiguration {
    pub proxy_mode: Option<ProxyMode>,
    pub generic: Option<ProxyEndpoint>,
    pub secure: Option<ProxyEndpoint>,
    pub relay: Option<ProxyEndpoint>,
    pub keyserver_args: Option<String>,
    pub use_idle: Option<bool>,
}

impl ShadowConfiguration {
    pub fn endpoint_mut(&mut self, channel: Channel) -> &mut Option<ProxyEndpoint> {
        match channel {
            Channel::Generic => &mut self.generic,
            Channel::Secure => &mut self.secure,
            Channel::Relay => &mut self.relay,
        }
    }

    pub fn endpoint(&self, channel: Channel) -> Option<&ProxyEndpoint> {
        match channel {
            Channel::Generic => self.generic.as_ref(),
            Channel::Secure => self.secure.as_ref(),
            Channel::Relay => self.relay.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.live_keys().is_empty()
    }

    /// Live key names this record occupies in the shadow tree.
    pub fn live_keys(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        if self.proxy_mode.is_some() {
            out.insert(keys::PROXY_TYPE.to_string());
        }
        for channel in Channel::ALL {
            if self.endpoint(channel).is_some() {
                out.insert(channel.host_key().to_string());
                out.insert(channel.port_key().to_string());
            }
        }
        if self.keyserver_args.is_some() {
            out.insert(keys::KEYSERVER_ARGS.to_string());
        }
        if self.use_idle.is_some() {
            out.insert(keys::USE_IDLE.to_string());
        }
        out
    }

    pub fn stage(&self, layout: &KeyLayout, batch: &mut WriteBatch) {
        if let Some(mode) = self.proxy_mode {
            batch.set(layout.shadow(keys::PROXY_TYPE), mode.index());
        }
        for channel in Channel::ALL {
            if let Some(endpoint) = self.endpoint(channel) {
                batch.set(layout.shadow(channel.host_key()), endpoint.host.as_str());
                batch.set(layout.shadow(channel.port_key()), endpoint.port);
            }
        }
        if let Some(args) = &self.keyserver_args {
            batch.set(layout.shadow(keys::KEYSERVER_ARGS), args.as_str());
        }
        if let Some(idle) = self.use_idle {
            batch.set(layout.shadow(keys::USE_IDLE), idle);
        }
    }

    pub fn read<S: PreferenceStore + ?Sized>(
        store: &S,
        layout: &KeyLayout,
    ) -> Result<Self, RecordError> {
        // Host defaults under the shadow root are not remembered values.
        let shadow = |live: &str| layout.shadow(live);
        let mut record = Self {
            proxy_mode: store
                .user_int(&shadow(keys::PROXY_TYPE))?
                .map(ProxyMode::from_index),
            keyserver_args: store.user_string(&shadow(keys::KEYSERVER_ARGS))?,
            use_idle: store.user_bool(&shadow(keys::USE_IDLE))?,
            ..Self::default()
        };
        for channel in Channel::ALL {
            let host_key = shadow(channel.host_key());
            let port_key = shadow(channel.port_key());
            *record.endpoint_mut(channel) = endpoint_from_parts(
                &host_key,
                &port_key,
                store.user_string(&host_key)?,
                store.user_int(&port_key)?,
            )?;
        }
        Ok(record)
    }
}

fn read_endpoint<S: PreferenceStore + ?Sized>(
    store: &S,
    host_key: &str,
    port_key: &str,
) -> Result<Option<ProxyEndpoint>, RecordError> {
    endpoint_from_parts(
        host_key,
        port_key,
        store.get_string(host_key)?,
        store.get_int(port_key)?,
    )
}

fn endpoint_from_parts(
    host_key: &str,
    port_key: &str,
    host: Option<String>,
    port: Option<i64>,
) -> Result<Option<ProxyEndpoint>, RecordError> {
    match (host, port) {
        (Some(host), Some(port)) => Ok(Some(ProxyEndpoint::from_parts(host, port)?)),
        (None, None) => Ok(None),
        (host, port) => {
            debug!(host_key, port_key, ?host, ?port, "Ignoring half-set endpoint");
            Ok(None)
        }
    }
}
