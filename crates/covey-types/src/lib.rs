//! Shared type definitions for the Covey Town service.
//!
//! Every crate in the workspace speaks in these types. They are plain serde
//! records with `TypeScript` bindings generated by `ts-rs` for the frontend.
//!
//! # Modules
//!
//! - [`ids`] -- Identifier newtypes for players, pokemon, listeners, towns, sessions
//! - [`enums`] -- Closed name sets (species, trainers, types) and achievement keys
//! - [`structs`] -- Players, pokemon, conversation areas, achievements, town views
//! - [`events`] -- Serializable town events for transport layers

pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;

pub use enums::{
    AchievementCategory, AchievementKey, Direction, SpeciesName, SpeciesType, TrainerName,
};
pub use events::TownEvent;
pub use ids::{ListenerId, PlayerId, PokemonId, SessionToken, TownId};
pub use structs::{
    Achievement, AchievementCounts, AchievementList, BoundingBox, ChatMessage, ConversationArea,
    Player, PlayerLocation, PlayerSession, Pokemon, PokemonLocation, SpeciesDescriptor,
    TownSnapshot, TownSummary,
};
