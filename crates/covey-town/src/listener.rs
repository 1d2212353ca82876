//! Town event subscribers.
//!
//! A town keeps an ordered list of [`TownListener`]s and calls each one
//! synchronously, in registration order, after every state change. Methods
//! default to no-ops so a listener only implements what it cares about.
//!
//! [`BroadcastListener`] turns callbacks into [`TownEvent`] values on a
//! `tokio` broadcast channel, which is how transport layers consume a town.

use covey_achievements::ProgressListener;
use covey_types::{
    AchievementCounts, AchievementList, ChatMessage, ConversationArea, ListenerId, Player, Pokemon,
    TownEvent,
};
use tokio::sync::broadcast;

/// Capacity of a [`BroadcastListener`] channel.
///
/// A subscriber that falls further behind receives
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest event.
pub const BROADCAST_CAPACITY: usize = 256;

/// Receives every state change of one town.
///
/// Callbacks run inside the town's controller task. A listener that needs
/// to act on the town must do so through a
/// [`TownHandle`](crate::controller::TownHandle), never by blocking here.
pub trait TownListener: Send {
    /// A player joined.
    fn player_joined(&mut self, _player: &Player) {}

    /// A player reported a new location.
    fn player_moved(&mut self, _player: &Player) {}

    /// A player left.
    fn player_disconnected(&mut self, _player: &Player) {}

    /// The town is shutting down. No further callbacks follow.
    fn town_destroyed(&mut self) {}

    /// A conversation area was created or its occupants changed.
    fn conversation_area_updated(&mut self, _area: &ConversationArea) {}

    /// A conversation area lost its last occupant and is gone.
    fn conversation_area_destroyed(&mut self, _area: &ConversationArea) {}

    /// A chat message was sent.
    fn chat_message(&mut self, _message: &ChatMessage) {}

    /// A wild pokemon appeared.
    fn pokemon_spawned(&mut self, _pokemon: &Pokemon) {}

    /// A wild pokemon was caught or fled.
    fn pokemon_removed(&mut self, _pokemon: &Pokemon) {}

    /// A player's pokemon list changed.
    fn player_pokemon_updated(&mut self, _player: &Player) {}
}

/// Registered listeners of one town, in registration order.
#[derive(Default)]
pub(crate) struct Listeners {
    entries: Vec<(ListenerId, Box<dyn TownListener>)>,
}

impl Listeners {
    /// Append a listener and return its handle.
    pub(crate) fn add(&mut self, listener: Box<dyn TownListener>) -> ListenerId {
        let id = ListenerId::new();
        self.entries.push((id, listener));
        id
    }

    /// Drop a listener. Unknown ids are ignored.
    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| *existing != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Invoke `f` on every listener in registration order.
    pub(crate) fn notify(&mut self, mut f: impl FnMut(&mut dyn TownListener)) {
        for (_, listener) in &mut self.entries {
            f(listener.as_mut());
        }
    }
}

/// Forwards every callback onto a broadcast channel as a [`TownEvent`].
///
/// Also implements [`ProgressListener`], so the same channel can carry
/// achievement and counter updates.
#[derive(Debug, Clone)]
pub struct BroadcastListener {
    tx: broadcast::Sender<TownEvent>,
}

impl Default for BroadcastListener {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastListener {
    /// Create a listener with a fresh channel.
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    /// Subscribe to events sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<TownEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn forward(&self, event: TownEvent) {
        let kind = event.kind();
        // No subscribers is not an error.
        let delivered = self.tx.send(event).unwrap_or(0);
        tracing::trace!(kind, delivered, "Town event broadcast");
    }
}

impl TownListener for BroadcastListener {
    fn player_joined(&mut self, player: &Player) {
        self.forward(TownEvent::PlayerJoined {
            player: Box::new(player.clone()),
        });
    }

    fn player_moved(&mut self, player: &Player) {
        self.forward(TownEvent::PlayerMoved {
            player: Box::new(player.clone()),
        });
    }

    fn player_disconnected(&mut self, player: &Player) {
        self.forward(TownEvent::PlayerDisconnected {
            player: Box::new(player.clone()),
        });
    }

    fn town_destroyed(&mut self) {
        self.forward(TownEvent::TownDestroyed);
    }

    fn conversation_area_updated(&mut self, area: &ConversationArea) {
        self.forward(TownEvent::ConversationAreaUpdated { area: area.clone() });
    }

    fn conversation_area_destroyed(&mut self, area: &ConversationArea) {
        self.forward(TownEvent::ConversationAreaDestroyed { area: area.clone() });
    }

    fn chat_message(&mut self, message: &ChatMessage) {
        self.forward(TownEvent::ChatMessage {
            message: message.clone(),
        });
    }

    fn pokemon_spawned(&mut self, pokemon: &Pokemon) {
        self.forward(TownEvent::PokemonSpawned {
            pokemon: Box::new(pokemon.clone()),
        });
    }

    fn pokemon_removed(&mut self, pokemon: &Pokemon) {
        self.forward(TownEvent::PokemonRemoved {
            pokemon: Box::new(pokemon.clone()),
        });
    }

    fn player_pokemon_updated(&mut self, player: &Player) {
        self.forward(TownEvent::PlayerPokemonUpdated {
            player: Box::new(player.clone()),
        });
    }
}

impl ProgressListener for BroadcastListener {
    fn achievements_updated(&mut self, achievements: &AchievementList) {
        self.forward(TownEvent::AchievementsUpdated {
            achievements: achievements.clone(),
        });
    }

    fn counts_updated(&mut self, counts: &AchievementCounts) {
        self.forward(TownEvent::CountsUpdated { counts: *counts });
    }
}

/// Logs every callback at `debug`.
#[derive(Debug, Clone, Default)]
pub struct TracingListener {
    town: String,
}

impl TracingListener {
    /// Create a listener that tags its log lines with `town`.
    pub fn new(town: impl Into<String>) -> Self {
        Self { town: town.into() }
    }
}

impl TownListener for TracingListener {
    fn player_joined(&mut self, player: &Player) {
        tracing::debug!(town = %self.town, player = %player.id, name = %player.user_name, "Player joined");
    }

    fn player_disconnected(&mut self, player: &Player) {
        tracing::debug!(town = %self.town, player = %player.id, "Player disconnected");
    }

    fn town_destroyed(&mut self) {
        tracing::debug!(town = %self.town, "Town destroyed");
    }

    fn conversation_area_updated(&mut self, area: &ConversationArea) {
        tracing::debug!(
            town = %self.town,
            label = %area.label,
            occupants = area.occupants_by_id.len(),
            "Conversation area updated"
        );
    }

    fn conversation_area_destroyed(&mut self, area: &ConversationArea) {
        tracing::debug!(town = %self.town, label = %area.label, "Conversation area destroyed");
    }

    fn chat_message(&mut self, message: &ChatMessage) {
        tracing::debug!(town = %self.town, author = %message.author, "Chat message");
    }

    fn pokemon_spawned(&mut self, pokemon: &Pokemon) {
        tracing::debug!(
            town = %self.town,
            pokemon = %pokemon.id,
            species = %pokemon.name(),
            x = pokemon.location.x,
            y = pokemon.location.y,
            "Pokemon spawned"
        );
    }

    fn pokemon_removed(&mut self, pokemon: &Pokemon) {
        tracing::debug!(town = %self.town, pokemon = %pokemon.id, "Pokemon removed");
    }

    fn player_pokemon_updated(&mut self, player: &Player) {
        tracing::debug!(
            town = %self.town,
            player = %player.id,
            owned = player.pokemon.len(),
            "Player pokemon updated"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use covey_types::TrainerName;

    use super::*;

    #[tokio::test]
    async fn broadcast_forwards_in_order() {
        let mut listener = BroadcastListener::new();
        let mut rx = listener.subscribe();
        let player = Player::new("brock", TrainerName::Byron);

        listener.player_joined(&player);
        listener.town_destroyed();

        assert!(matches!(rx.recv().await.unwrap(), TownEvent::PlayerJoined { .. }));
        assert_eq!(rx.recv().await.unwrap(), TownEvent::TownDestroyed);
    }

    #[test]
    fn broadcast_without_subscribers_is_silent() {
        let mut listener = BroadcastListener::new();
        assert_eq!(listener.receiver_count(), 0);
        listener.counts_updated(&AchievementCounts::default());
    }
}
