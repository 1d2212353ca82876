//! Core records exchanged between the town controller and its collaborators.
//!
//! Covers players, pokemon, conversation areas, sessions, chat messages,
//! achievements, and the read-only town snapshots handed to callers.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{
    AchievementCategory, AchievementKey, Direction, SpeciesName, SpeciesType, TrainerName,
};
use crate::ids::{PlayerId, PokemonId, SessionToken, TownId};

// ---------------------------------------------------------------------------
// Locations and geometry
// ---------------------------------------------------------------------------

/// Where a player is and what they are doing on the map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PlayerLocation {
    /// Horizontal map coordinate.
    pub x: f64,
    /// Vertical map coordinate.
    pub y: f64,
    /// Sprite facing.
    pub rotation: Direction,
    /// Whether the walk animation is playing.
    pub moving: bool,
    /// Label of the conversation area the client says it is standing in.
    pub conversation_label: Option<String>,
}

/// Where a pokemon is drawn and whether it still belongs to the wild.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PokemonLocation {
    /// Horizontal map coordinate.
    pub x: f64,
    /// Vertical map coordinate.
    pub y: f64,
    /// `true` until a player catches the pokemon.
    pub is_wild: bool,
    /// Sprite facing.
    pub direction: Direction,
}

/// Axis-aligned rectangle given by its center and extent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BoundingBox {
    /// Center x.
    pub x: f64,
    /// Center y.
    pub y: f64,
    /// Full width.
    pub width: f64,
    /// Full height.
    pub height: f64,
}

impl BoundingBox {
    /// Create a box from its center and extent.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Corner coordinates as `(x1, y1, x2, y2)`, top-left then bottom-right.
    pub fn corners(&self) -> (f64, f64, f64, f64) {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        (
            self.x - half_w,
            self.y - half_h,
            self.x + half_w,
            self.y + half_h,
        )
    }

    /// Whether two boxes share any area.
    ///
    /// Boxes that only touch along an edge do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        let (ax1, ay1, ax2, ay2) = self.corners();
        let (bx1, by1, bx2, by2) = other.corners();
        let apart = ax1 >= bx2 || bx1 >= ax2 || ay1 >= by2 || by1 >= ay2;
        !apart
    }

    /// Whether a point lies strictly inside the box.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let (x1, y1, x2, y2) = self.corners();
        x > x1 && x < x2 && y > y1 && y < y2
    }
}

// ---------------------------------------------------------------------------
// Species and pokemon
// ---------------------------------------------------------------------------

/// Immutable descriptive data for one species, as learned from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SpeciesDescriptor {
    /// Species name.
    pub name: SpeciesName,
    /// Default front sprite.
    #[serde(rename = "spriteURL")]
    pub sprite_url: String,
    /// Primary elemental type.
    pub type1: SpeciesType,
    /// Secondary elemental type, if any.
    pub type2: Option<SpeciesType>,
    /// Every move the species can learn.
    pub moves: Vec<String>,
}

/// A single pokemon, either roaming the town or owned by a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Pokemon {
    /// Unique identifier.
    #[serde(rename = "_id")]
    pub id: PokemonId,
    /// Species data shared by every pokemon of this kind.
    pub species: SpeciesDescriptor,
    /// Current map position and wild flag.
    pub location: PokemonLocation,
    /// Up to four moves picked when the pokemon was created.
    pub moves: Vec<String>,
}

impl Pokemon {
    /// Species name of this pokemon.
    pub const fn name(&self) -> SpeciesName {
        self.species.name
    }

    /// Whether the pokemon is still wild.
    pub const fn is_wild(&self) -> bool {
        self.location.is_wild
    }
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// A user connected to a town.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Player {
    /// Unique identifier.
    #[serde(rename = "_id")]
    pub id: PlayerId,
    /// Display name. Not guaranteed unique within a town.
    #[serde(rename = "_userName")]
    pub user_name: String,
    /// Sprite set.
    pub trainer_name: TrainerName,
    /// Current location.
    pub location: PlayerLocation,
    /// Owned pokemon; index 0 is the selected one.
    pub pokemon: Vec<Pokemon>,
    /// Label of the conversation area the player occupies.
    pub active_conversation_area: Option<String>,
}

impl Player {
    /// Create a new player standing at the origin with no pokemon.
    pub fn new(user_name: impl Into<String>, trainer_name: TrainerName) -> Self {
        Self {
            id: PlayerId::new(),
            user_name: user_name.into(),
            trainer_name,
            location: PlayerLocation::default(),
            pokemon: Vec::new(),
            active_conversation_area: None,
        }
    }

    /// Whether the player's coordinates lie strictly inside `area`.
    pub fn is_within(&self, area: &BoundingBox) -> bool {
        area.contains(self.location.x, self.location.y)
    }

    /// Add a freshly caught pokemon and make it the selected one.
    pub fn add_pokemon(&mut self, pokemon: Pokemon) {
        self.pokemon.insert(0, pokemon);
    }

    /// Remove an owned pokemon, returning it if the player had it.
    pub fn remove_pokemon(&mut self, id: PokemonId) -> Option<Pokemon> {
        let index = self.pokemon.iter().position(|p| p.id == id)?;
        Some(self.pokemon.remove(index))
    }

    /// Move an owned pokemon to the front of the list.
    ///
    /// Returns `false` if the player does not own it or it is already selected.
    pub fn select_pokemon(&mut self, id: PokemonId) -> bool {
        match self.pokemon.iter().position(|p| p.id == id) {
            Some(0) | None => false,
            Some(index) => {
                let selected = self.pokemon.remove(index);
                self.pokemon.insert(0, selected);
                true
            }
        }
    }
}

/// The credential binding one connection to one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PlayerSession {
    /// Opaque token presented by the client on every request.
    pub session_token: SessionToken,
    /// The player this session belongs to.
    pub player_id: PlayerId,
    /// Video credential issued for this player.
    pub video_token: String,
}

// ---------------------------------------------------------------------------
// Conversation areas and chat
// ---------------------------------------------------------------------------

/// A labelled rectangle where nearby players share a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ConversationArea {
    /// Unique label within the town.
    pub label: String,
    /// What the conversation is about. Never empty once accepted.
    pub topic: String,
    /// Region covered by the area.
    pub bounding_box: BoundingBox,
    /// Players currently inside.
    #[serde(rename = "occupantsByID")]
    pub occupants_by_id: BTreeSet<PlayerId>,
}

impl ConversationArea {
    /// Create an area with no occupants.
    pub fn new(label: impl Into<String>, topic: impl Into<String>, bounding_box: BoundingBox) -> Self {
        Self {
            label: label.into(),
            topic: topic.into(),
            bounding_box,
            occupants_by_id: BTreeSet::new(),
        }
    }
}

/// A chat message relayed to every listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ChatMessage {
    /// Display name of the sender.
    pub author: String,
    /// Message id assigned by the chat service.
    pub sid: String,
    /// Message text.
    pub body: String,
    /// When the message was written.
    pub date_created: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Achievements
// ---------------------------------------------------------------------------

/// One milestone tracked by a town.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Achievement {
    /// Which event counter this achievement watches.
    #[serde(rename = "type")]
    pub category: AchievementCategory,
    /// Set once the counter reaches the threshold. Never reset.
    pub completed: bool,
    /// Species unlocked for spawning when completed.
    pub pokemon_name: Vec<SpeciesName>,
    /// Counter value required for completion.
    pub threshold: u64,
}

/// Every achievement in a town, keyed by display name.
pub type AchievementList = BTreeMap<AchievementKey, Achievement>;

/// Running totals of each counted event kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct AchievementCounts {
    /// Players that have joined.
    pub players: u64,
    /// Movement updates received.
    pub moves: u64,
    /// Conversation areas created.
    pub conversation_areas: u64,
    /// Chat messages sent.
    pub chats: u64,
    /// Pokemon caught.
    pub pokemon: u64,
}

impl AchievementCounts {
    /// Current value of one counter.
    pub const fn get(&self, category: AchievementCategory) -> u64 {
        match category {
            AchievementCategory::Players => self.players,
            AchievementCategory::Moves => self.moves,
            AchievementCategory::ConversationAreas => self.conversation_areas,
            AchievementCategory::Chats => self.chats,
            AchievementCategory::Pokemon => self.pokemon,
        }
    }

    /// Bump one counter by one, saturating at `u64::MAX`.
    pub const fn increment(&mut self, category: AchievementCategory) {
        let slot = match category {
            AchievementCategory::Players => &mut self.players,
            AchievementCategory::Moves => &mut self.moves,
            AchievementCategory::ConversationAreas => &mut self.conversation_areas,
            AchievementCategory::Chats => &mut self.chats,
            AchievementCategory::Pokemon => &mut self.pokemon,
        };
        *slot = slot.saturating_add(1);
    }
}

// ---------------------------------------------------------------------------
// Town views
// ---------------------------------------------------------------------------

/// Listing entry for a town, as shown in the town picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct TownSummary {
    /// Town identifier.
    #[serde(rename = "coveyTownID")]
    pub town_id: TownId,
    /// Human-readable name.
    pub friendly_name: String,
    /// Players currently connected.
    pub current_occupancy: u32,
    /// Maximum number of players.
    pub maximum_occupancy: u32,
    /// Whether the town appears in public listings.
    pub is_publicly_listed: bool,
}

/// Read-only copy of everything a new client needs to render a town.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct TownSnapshot {
    /// Listing information.
    pub summary: TownSummary,
    /// Connected players.
    pub players: Vec<Player>,
    /// Wild pokemon currently on the map.
    pub pokemon: Vec<Pokemon>,
    /// Active conversation areas.
    pub conversation_areas: Vec<ConversationArea>,
    /// Achievement list with completion flags.
    pub achievements: AchievementList,
    /// Event counters.
    pub counts: AchievementCounts,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pokemon(name: SpeciesName) -> Pokemon {
        Pokemon {
            id: PokemonId::new(),
            species: SpeciesDescriptor {
                name,
                sprite_url: String::new(),
                type1: SpeciesType::Normal,
                type2: None,
                moves: Vec::new(),
            },
            location: PokemonLocation::default(),
            moves: Vec::new(),
        }
    }

    #[test]
    fn overlapping_boxes_are_detected() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 10.0, 10.0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let right = BoundingBox::new(10.0, 0.0, 10.0, 10.0);
        let below = BoundingBox::new(0.0, 10.0, 10.0, 10.0);
        assert!(!a.overlaps(&right));
        assert!(!a.overlaps(&below));
    }

    #[test]
    fn nested_box_overlaps() {
        let outer = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let inner = BoundingBox::new(1.0, 1.0, 2.0, 2.0);
        assert!(outer.overlaps(&inner));
    }

    #[test]
    fn containment_is_strict() {
        let area = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(area.contains(0.0, 0.0));
        assert!(area.contains(4.9, -4.9));
        assert!(!area.contains(5.0, 0.0));
        assert!(!area.contains(100.0, 100.0));
    }

    #[test]
    fn caught_pokemon_becomes_selected() {
        let mut player = Player::new("ash", TrainerName::default());
        let first = pokemon(SpeciesName::Piplup);
        let second = pokemon(SpeciesName::Turtwig);
        let second_id = second.id;
        player.add_pokemon(first);
        player.add_pokemon(second);
        assert_eq!(player.pokemon.first().map(|p| p.id), Some(second_id));
    }

    #[test]
    fn select_pokemon_moves_to_front() {
        let mut player = Player::new("ash", TrainerName::Dawn);
        let first = pokemon(SpeciesName::Piplup);
        let first_id = first.id;
        player.add_pokemon(first);
        player.add_pokemon(pokemon(SpeciesName::Chimchar));

        assert!(player.select_pokemon(first_id));
        assert_eq!(player.pokemon.first().map(|p| p.id), Some(first_id));
        // Already selected.
        assert!(!player.select_pokemon(first_id));
        // Not owned.
        assert!(!player.select_pokemon(PokemonId::new()));
    }

    #[test]
    fn remove_pokemon_returns_owned_only() {
        let mut player = Player::new("ash", TrainerName::Lucas);
        let owned = pokemon(SpeciesName::Eevee);
        let owned_id = owned.id;
        player.add_pokemon(owned);
        assert!(player.remove_pokemon(PokemonId::new()).is_none());
        assert_eq!(player.remove_pokemon(owned_id).map(|p| p.id), Some(owned_id));
        assert!(player.pokemon.is_empty());
    }

    #[test]
    fn counts_increment_per_category() {
        let mut counts = AchievementCounts::default();
        counts.increment(AchievementCategory::Chats);
        counts.increment(AchievementCategory::Chats);
        counts.increment(AchievementCategory::Players);
        assert_eq!(counts.get(AchievementCategory::Chats), 2);
        assert_eq!(counts.get(AchievementCategory::Players), 1);
        assert_eq!(counts.get(AchievementCategory::Moves), 0);
    }
}
