//! Authoritative town controller for Covey Town.
//!
//! A town tracks its players, the wild pokemon roaming it, and the
//! conversation areas players gather in. Every change is pushed to the
//! town's listeners in the order it was applied. A per-town progress
//! tracker unlocks rarer species as the town gets busier.
//!
//! # Modules
//!
//! - [`controller`] -- [`TownController`] task and the [`TownHandle`] API
//! - [`area`] -- Conversation area registry and overlap rules
//! - [`listener`] -- [`TownListener`] seam and the broadcast adapter
//! - [`credentials`] -- Video credential issuance
//! - [`spawn_regions`] -- Where wild pokemon may appear
//! - [`config`] -- `covey-config.yaml` loading
//! - [`error`] -- [`TownError`]

pub mod area;
pub mod config;
pub mod controller;
pub mod credentials;
pub mod error;
pub mod listener;
pub mod spawn_regions;
mod town;

pub use area::{AreaRegistry, AreaRejection};
pub use config::{ConfigError, LoggingConfig, ServerConfig, SpeciesBackend, SpeciesConfig, TownConfig};
pub use controller::{TownController, TownHandle};
pub use credentials::{CredentialError, CredentialIssuer, LocalCredentialIssuer};
pub use error::TownError;
pub use listener::{BROADCAST_CAPACITY, BroadcastListener, TownListener, TracingListener};
