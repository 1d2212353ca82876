//! Serializable town events for transport layers.
//!
//! Each variant mirrors one listener callback. The `type` tag carries the
//! callback name so clients can dispatch on it without inspecting fields.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::structs::{
    AchievementCounts, AchievementList, ChatMessage, ConversationArea, Player, Pokemon,
};

/// Something that happened in a town, in the order it was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum TownEvent {
    /// A player joined.
    PlayerJoined {
        /// The new player.
        player: Box<Player>,
    },
    /// A player reported a new location.
    PlayerMoved {
        /// The player after the move.
        player: Box<Player>,
    },
    /// A player left.
    PlayerDisconnected {
        /// The player as they were when they left.
        player: Box<Player>,
    },
    /// The town is shutting down.
    TownDestroyed,
    /// A conversation area was created or its occupants changed.
    ConversationAreaUpdated {
        /// The area after the change.
        area: ConversationArea,
    },
    /// A conversation area lost its last occupant.
    ConversationAreaDestroyed {
        /// The area as it was when destroyed.
        area: ConversationArea,
    },
    /// A chat message was sent.
    ChatMessage {
        /// The message.
        message: ChatMessage,
    },
    /// A wild pokemon appeared.
    PokemonSpawned {
        /// The new pokemon.
        pokemon: Box<Pokemon>,
    },
    /// A wild pokemon was caught or expired.
    PokemonRemoved {
        /// The pokemon that left the map.
        pokemon: Box<Pokemon>,
    },
    /// A player's pokemon list changed.
    PlayerPokemonUpdated {
        /// The player after the change.
        player: Box<Player>,
    },
    /// An achievement was newly completed.
    AchievementsUpdated {
        /// Every achievement with its completion flag.
        achievements: AchievementList,
    },
    /// Event counters changed.
    CountsUpdated {
        /// Current counters.
        counts: AchievementCounts,
    },
}

impl TownEvent {
    /// Short name of the event kind, used in logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PlayerJoined { .. } => "playerJoined",
            Self::PlayerMoved { .. } => "playerMoved",
            Self::PlayerDisconnected { .. } => "playerDisconnected",
            Self::TownDestroyed => "townDestroyed",
            Self::ConversationAreaUpdated { .. } => "conversationAreaUpdated",
            Self::ConversationAreaDestroyed { .. } => "conversationAreaDestroyed",
            Self::ChatMessage { .. } => "chatMessage",
            Self::PokemonSpawned { .. } => "pokemonSpawned",
            Self::PokemonRemoved { .. } => "pokemonRemoved",
            Self::PlayerPokemonUpdated { .. } => "playerPokemonUpdated",
            Self::AchievementsUpdated { .. } => "achievementsUpdated",
            Self::CountsUpdated { .. } => "countsUpdated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::TrainerName;

    #[test]
    fn events_are_tagged_with_their_kind() {
        let event = TownEvent::PlayerJoined {
            player: Box::new(Player::new("misty", TrainerName::Misty)),
        };
        let json = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(json.get("type").and_then(|v| v.as_str()), Some(event.kind()));
        assert_eq!(
            json.pointer("/player/_userName").and_then(|v| v.as_str()),
            Some("misty")
        );
    }

    #[test]
    fn unit_event_serializes_to_tag_only() {
        let json = serde_json::to_string(&TownEvent::TownDestroyed).unwrap_or_default();
        assert_eq!(json, r#"{"type":"townDestroyed"}"#);
    }
}
