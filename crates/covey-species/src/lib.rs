//! Species catalog for Covey Town.
//!
//! Resolves species descriptors through a pluggable [`SpeciesSource`],
//! caches them for the life of the process, and builds individual
//! [`Pokemon`](covey_types::Pokemon) values with sampled move sets.
//!
//! # Modules
//!
//! - [`catalog`] -- [`SpeciesCatalog`] cache and the pokemon factory
//! - [`source`] -- Lookup backends (HTTP and in-memory)
//! - [`error`] -- [`SpeciesError`]

pub mod catalog;
pub mod error;
pub mod source;

pub use catalog::{MAX_MOVES, SpeciesCatalog, materialize};
pub use error::SpeciesError;
pub use source::{FixtureSource, PokeApiSource, SpeciesSource, parse_descriptor};
