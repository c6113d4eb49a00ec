//! Mailveil preference storage.
//!
//! This crate defines the storage contract the profile reconciliation engine
//! consumes:
//! - a typed get/set/clear preference store over a dot-separated key space
//! - a shadow branch mirroring live keys under a separate root
//! - staged write batches that commit as a unit and roll back on failure
//!
//! Design stance:
//! - The host's preference service is the source of truth; this crate only
//!   describes how to talk to it.
//! - The in-memory backend is the reference implementation used by tests and
//!   the CLI (persisted as a JSON snapshot).

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod batch;
mod error;
pub mod memory;
mod shadow;
mod traits;
mod value;

pub use batch::{WriteBatch, WriteOp};
pub use error::{BatchError, StoreError, StoreResult};
pub use memory::{InMemoryPreferenceStore, PrefSnapshot};
pub use shadow::ShadowBranch;
pub use traits::{validate_key, PreferenceStore};
pub use value::{PrefType, PrefValue};
