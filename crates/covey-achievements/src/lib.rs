//! Achievements and spawn selection for Covey Town.
//!
//! Each town owns one [`ProgressTracker`]. The town controller records
//! events as they happen; the tracker decides which species the next spawn
//! tick produces.
//!
//! # Modules
//!
//! - [`tracker`] -- [`ProgressTracker`] and the [`ProgressListener`] seam
//! - [`catalog`] -- The default achievement list
//! - [`rarity`] -- Spawn weights and the always-available species

pub mod catalog;
pub mod rarity;
pub mod tracker;

pub use catalog::default_achievements;
pub use rarity::{ALWAYS_AVAILABLE, spawn_weight};
pub use tracker::{ProgressListener, ProgressTracker};
