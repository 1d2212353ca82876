//! Synchronous state of one town.
//!
//! [`TownState`] holds everything a town owns and applies each operation
//! atomically: validation, mutation, listener fan-out, then progress
//! recording. It knows nothing about tasks or timers; the controller in
//! [`crate::controller`] drives it from a single task.

use std::collections::BTreeMap;

use covey_achievements::{ProgressListener, ProgressTracker};
use covey_types::{
    ChatMessage, ConversationArea, ListenerId, Player, PlayerId, PlayerLocation, PlayerSession,
    Pokemon, PokemonId, SessionToken, TownId, TownSnapshot, TownSummary,
};

use crate::area::{AreaRegistry, Departure};
use crate::error::TownError;
use crate::listener::{Listeners, TownListener};

/// Identity and limits of a town, fixed at creation except where noted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TownIdentity {
    pub(crate) town_id: TownId,
    /// Renamable.
    pub(crate) friendly_name: String,
    /// Toggleable.
    pub(crate) publicly_listed: bool,
    pub(crate) capacity: u32,
}

pub(crate) struct TownState {
    identity: TownIdentity,
    players: BTreeMap<PlayerId, Player>,
    sessions: BTreeMap<SessionToken, PlayerSession>,
    pokemon: BTreeMap<PokemonId, Pokemon>,
    areas: AreaRegistry,
    listeners: Listeners,
    tracker: ProgressTracker,
}

impl TownState {
    pub(crate) fn new(identity: TownIdentity, tracker: ProgressTracker) -> Self {
        Self {
            identity,
            players: BTreeMap::new(),
            sessions: BTreeMap::new(),
            pokemon: BTreeMap::new(),
            areas: AreaRegistry::new(),
            listeners: Listeners::default(),
            tracker,
        }
    }

    pub(crate) const fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    // -----------------------------------------------------------------------
    // Players and sessions
    // -----------------------------------------------------------------------

    /// Register a player with an already issued video credential.
    pub(crate) fn join(
        &mut self,
        player: Player,
        video_token: String,
    ) -> Result<PlayerSession, TownError> {
        if self.players.contains_key(&player.id) {
            return Err(TownError::AlreadyJoined { player: player.id });
        }
        if self.occupancy() >= self.identity.capacity {
            return Err(TownError::AtCapacity {
                capacity: self.identity.capacity,
            });
        }

        let session = PlayerSession {
            session_token: SessionToken::generate(),
            player_id: player.id,
            video_token,
        };
        self.sessions
            .insert(session.session_token.clone(), session.clone());
        let player: &Player = self.players.entry(player.id).or_insert(player);

        tracing::info!(
            town = %self.identity.town_id,
            player = %player.id,
            name = %player.user_name,
            "Player joined"
        );
        self.listeners.notify(|l| l.player_joined(player));
        self.tracker.record_player_joined();
        Ok(session)
    }

    /// Remove the session and its player. Unknown tokens are ignored.
    pub(crate) fn leave(&mut self, token: &SessionToken) -> bool {
        let Some(session) = self.sessions.remove(token) else {
            return false;
        };
        let Some(player) = self.players.remove(&session.player_id) else {
            return false;
        };

        if let Some(label) = player.active_conversation_area.as_deref() {
            self.depart_area(label, player.id);
        }

        tracing::info!(town = %self.identity.town_id, player = %player.id, "Player left");
        self.listeners.notify(|l| l.player_disconnected(&player));
        true
    }

    pub(crate) fn session(&self, token: &SessionToken) -> Option<PlayerSession> {
        self.sessions.get(token).cloned()
    }

    pub(crate) fn occupancy(&self) -> u32 {
        u32::try_from(self.players.len()).unwrap_or(u32::MAX)
    }

    /// Apply a location update. Area membership follows the declared label.
    pub(crate) fn update_location(&mut self, player_id: PlayerId, location: PlayerLocation) -> bool {
        let Some(player) = self.players.get_mut(&player_id) else {
            return false;
        };
        let previous = player.active_conversation_area.clone();
        let declared = location
            .conversation_label
            .clone()
            .filter(|label| self.areas.contains(label));
        player.location = location;
        player.active_conversation_area.clone_from(&declared);

        if declared != previous {
            if let Some(label) = previous.as_deref() {
                self.depart_area(label, player_id);
            }
            if let Some(label) = declared.as_deref()
                && let Some(area) = self.areas.add_occupant(label, player_id)
            {
                self.listeners.notify(|l| l.conversation_area_updated(area));
            }
        }

        if let Some(player) = self.players.get(&player_id) {
            self.listeners.notify(|l| l.player_moved(player));
        }
        self.tracker.record_move();
        true
    }

    // -----------------------------------------------------------------------
    // Conversation areas
    // -----------------------------------------------------------------------

    /// Register a new conversation area and seed it with every player
    /// standing inside it. Returns `false` if the area is refused.
    pub(crate) fn create_area(&mut self, mut area: ConversationArea) -> bool {
        area.occupants_by_id.clear();
        if let Err(rejection) = self.areas.check(&area) {
            tracing::debug!(
                town = %self.identity.town_id,
                label = %area.label,
                %rejection,
                "Conversation area refused"
            );
            return false;
        }

        let inside: Vec<(PlayerId, Option<String>)> = self
            .players
            .values()
            .filter(|p| p.is_within(&area.bounding_box))
            .map(|p| (p.id, p.active_conversation_area.clone()))
            .collect();

        for (player_id, previous) in &inside {
            if let Some(label) = previous.as_deref() {
                self.depart_area(label, *player_id);
            }
            if let Some(player) = self.players.get_mut(player_id) {
                player.active_conversation_area = Some(area.label.clone());
            }
            area.occupants_by_id.insert(*player_id);
        }

        match self.areas.insert(area) {
            Ok(area) => {
                tracing::info!(
                    town = %self.identity.town_id,
                    label = %area.label,
                    occupants = area.occupants_by_id.len(),
                    "Conversation area created"
                );
                self.listeners.notify(|l| l.conversation_area_updated(area));
            }
            Err(rejection) => {
                // Departures above cannot make a checked area invalid.
                tracing::warn!(town = %self.identity.town_id, %rejection, "Conversation area lost");
                return false;
            }
        }
        self.tracker.record_conversation_area();
        true
    }

    fn depart_area(&mut self, label: &str, player_id: PlayerId) {
        match self.areas.remove_occupant(label, player_id) {
            Some(Departure::Updated(area)) => {
                self.listeners.notify(|l| l.conversation_area_updated(area));
            }
            Some(Departure::Destroyed(area)) => {
                tracing::info!(town = %self.identity.town_id, label = %area.label, "Conversation area emptied");
                self.listeners
                    .notify(|l| l.conversation_area_destroyed(&area));
            }
            None => {}
        }
    }

    // -----------------------------------------------------------------------
    // Chat
    // -----------------------------------------------------------------------

    pub(crate) fn send_chat(&mut self, message: &ChatMessage) {
        self.listeners.notify(|l| l.chat_message(message));
        self.tracker.record_chat();
    }

    // -----------------------------------------------------------------------
    // Pokemon
    // -----------------------------------------------------------------------

    pub(crate) fn insert_pokemon(&mut self, pokemon: Pokemon) -> PokemonId {
        let id = pokemon.id;
        let pokemon = self.pokemon.entry(id).or_insert(pokemon);
        self.listeners.notify(|l| l.pokemon_spawned(pokemon));
        id
    }

    /// Remove a wild pokemon whose time ran out. Unknown ids are ignored.
    pub(crate) fn expire_pokemon(&mut self, id: PokemonId) -> bool {
        let Some(pokemon) = self.pokemon.remove(&id) else {
            return false;
        };
        tracing::debug!(town = %self.identity.town_id, pokemon = %id, "Pokemon fled");
        self.listeners.notify(|l| l.pokemon_removed(&pokemon));
        true
    }

    /// Move a wild pokemon into a player's list.
    ///
    /// Nothing changes unless both the pokemon and the player exist.
    pub(crate) fn catch_pokemon(&mut self, pokemon_id: PokemonId, player_id: PlayerId) -> bool {
        let Some(player) = self.players.get_mut(&player_id) else {
            return false;
        };
        let Some(mut pokemon) = self.pokemon.remove(&pokemon_id) else {
            return false;
        };
        pokemon.location.is_wild = false;
        self.listeners.notify(|l| l.pokemon_removed(&pokemon));

        tracing::info!(
            town = %self.identity.town_id,
            player = %player_id,
            species = %pokemon.name(),
            "Pokemon caught"
        );
        player.add_pokemon(pokemon);
        self.listeners.notify(|l| l.player_pokemon_updated(player));
        self.tracker.record_pokemon_caught();
        true
    }

    /// Make an owned pokemon the player's selected one.
    pub(crate) fn select_pokemon(&mut self, player_id: PlayerId, pokemon_id: PokemonId) -> bool {
        let Some(player) = self.players.get_mut(&player_id) else {
            return false;
        };
        if !player.select_pokemon(pokemon_id) {
            return false;
        }
        self.listeners.notify(|l| l.player_pokemon_updated(player));
        true
    }

    // -----------------------------------------------------------------------
    // Listeners
    // -----------------------------------------------------------------------

    pub(crate) fn add_listener(&mut self, listener: Box<dyn TownListener>) -> ListenerId {
        let id = self.listeners.add(listener);
        tracing::debug!(
            town = %self.identity.town_id,
            listener = %id,
            total = self.listeners.len(),
            "Listener added"
        );
        id
    }

    pub(crate) fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub(crate) fn set_progress_listener(&mut self, listener: Box<dyn ProgressListener>) {
        self.tracker.set_listener(listener);
    }

    /// Tell every listener the town is going away.
    pub(crate) fn disconnect_all(&mut self) {
        tracing::info!(
            town = %self.identity.town_id,
            players = self.players.len(),
            "Disconnecting all listeners"
        );
        self.listeners.notify(|l| l.town_destroyed());
    }

    // -----------------------------------------------------------------------
    // Settings and views
    // -----------------------------------------------------------------------

    /// Rename or relist the town. An empty name is refused.
    pub(crate) fn update_settings(
        &mut self,
        friendly_name: Option<String>,
        publicly_listed: Option<bool>,
    ) -> bool {
        if friendly_name.as_deref().is_some_and(str::is_empty) {
            return false;
        }
        if let Some(name) = friendly_name {
            self.identity.friendly_name = name;
        }
        if let Some(listed) = publicly_listed {
            self.identity.publicly_listed = listed;
        }
        true
    }

    pub(crate) fn summary(&self) -> TownSummary {
        TownSummary {
            town_id: self.identity.town_id.clone(),
            friendly_name: self.identity.friendly_name.clone(),
            current_occupancy: self.occupancy(),
            maximum_occupancy: self.identity.capacity,
            is_publicly_listed: self.identity.publicly_listed,
        }
    }

    pub(crate) fn snapshot(&self) -> TownSnapshot {
        TownSnapshot {
            summary: self.summary(),
            players: self.players.values().cloned().collect(),
            pokemon: self.pokemon.values().cloned().collect(),
            conversation_areas: self.areas.iter().cloned().collect(),
            achievements: self.tracker.achievements().clone(),
            counts: self.tracker.counts(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use covey_types::{
        BoundingBox, Direction, PokemonLocation, SpeciesDescriptor, SpeciesName, SpeciesType,
        TrainerName,
    };

    use super::*;

    /// Records callback names in order.
    struct Log(Arc<Mutex<Vec<String>>>);

    impl Log {
        fn push(&self, entry: impl Into<String>) {
            self.0.lock().unwrap().push(entry.into());
        }
    }

    impl TownListener for Log {
        fn player_joined(&mut self, player: &Player) {
            self.push(format!("joined:{}", player.user_name));
        }
        fn player_moved(&mut self, player: &Player) {
            self.push(format!("moved:{}", player.user_name));
        }
        fn player_disconnected(&mut self, player: &Player) {
            self.push(format!("left:{}", player.user_name));
        }
        fn town_destroyed(&mut self) {
            self.push("destroyed");
        }
        fn conversation_area_updated(&mut self, area: &ConversationArea) {
            self.push(format!("area:{}:{}", area.label, area.occupants_by_id.len()));
        }
        fn conversation_area_destroyed(&mut self, area: &ConversationArea) {
            self.push(format!("area-gone:{}", area.label));
        }
        fn pokemon_spawned(&mut self, pokemon: &Pokemon) {
            self.push(format!("spawned:{}", pokemon.name()));
        }
        fn pokemon_removed(&mut self, pokemon: &Pokemon) {
            self.push(format!("removed:{}", pokemon.name()));
        }
        fn player_pokemon_updated(&mut self, player: &Player) {
            self.push(format!("inventory:{}:{}", player.user_name, player.pokemon.len()));
        }
    }

    fn town(capacity: u32) -> (TownState, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut state = TownState::new(
            TownIdentity {
                town_id: TownId::from("TEST0001"),
                friendly_name: "test".to_owned(),
                publicly_listed: true,
                capacity,
            },
            ProgressTracker::new(),
        );
        state.add_listener(Box::new(Log(Arc::clone(&log))));
        (state, log)
    }

    fn drain(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
        std::mem::take(&mut *log.lock().unwrap())
    }

    fn join(state: &mut TownState, name: &str) -> (PlayerId, SessionToken) {
        let player = Player::new(name, TrainerName::default());
        let id = player.id;
        let session = state.join(player, "video".to_owned()).unwrap();
        (id, session.session_token)
    }

    fn at(x: f64, y: f64, label: Option<&str>) -> PlayerLocation {
        PlayerLocation {
            x,
            y,
            rotation: Direction::Front,
            moving: false,
            conversation_label: label.map(ToOwned::to_owned),
        }
    }

    fn wild(name: SpeciesName) -> Pokemon {
        Pokemon {
            id: PokemonId::new(),
            species: SpeciesDescriptor {
                name,
                sprite_url: String::new(),
                type1: SpeciesType::Water,
                type2: None,
                moves: Vec::new(),
            },
            location: PokemonLocation {
                x: 1.0,
                y: 1.0,
                is_wild: true,
                direction: Direction::Front,
            },
            moves: Vec::new(),
        }
    }

    #[test]
    fn join_registers_session_and_counts_player() {
        let (mut state, log) = town(50);
        let (id, token) = join(&mut state, "ash");
        assert_eq!(state.session(&token).map(|s| s.player_id), Some(id));
        assert_eq!(state.occupancy(), 1);
        assert_eq!(state.tracker().counts().players, 1);
        assert_eq!(drain(&log), vec!["joined:ash"]);
    }

    #[test]
    fn join_beyond_capacity_is_refused() {
        let (mut state, log) = town(1);
        join(&mut state, "ash");
        let result = state.join(Player::new("gary", TrainerName::Oak), String::new());
        assert!(matches!(result, Err(TownError::AtCapacity { capacity: 1 })));
        assert_eq!(state.occupancy(), 1);
        assert_eq!(drain(&log), vec!["joined:ash"]);
    }

    #[test]
    fn second_join_of_same_player_changes_nothing() {
        let (mut state, log) = town(50);
        let player = Player::new("ash", TrainerName::default());
        let first = state.join(player.clone(), "video".to_owned()).unwrap();
        drain(&log);

        let again = state.join(player.clone(), "video".to_owned());
        assert!(matches!(again, Err(TownError::AlreadyJoined { player: id }) if id == player.id));
        assert_eq!(state.occupancy(), 1);
        assert_eq!(state.sessions.len(), 1);
        assert_eq!(state.tracker().counts().players, 1);
        assert!(drain(&log).is_empty());

        assert!(state.leave(&first.session_token));
        assert!(state.sessions.is_empty());
        assert_eq!(state.occupancy(), 0);
    }

    #[test]
    fn leave_departs_area_before_disconnect_notice() {
        let (mut state, log) = town(50);
        let (id, token) = join(&mut state, "ash");
        assert!(state.create_area(ConversationArea::new(
            "z",
            "talk",
            BoundingBox::new(0.0, 0.0, 10.0, 10.0)
        )));
        state.update_location(id, at(1.0, 1.0, Some("z")));
        drain(&log);

        assert!(state.leave(&token));
        assert_eq!(drain(&log), vec!["area-gone:z", "left:ash"]);
        assert!(state.session(&token).is_none());
        assert!(!state.leave(&token));
    }

    #[test]
    fn create_area_seeds_players_inside() {
        let (mut state, log) = town(50);
        let (inside, _) = join(&mut state, "ash");
        let (outside, _) = join(&mut state, "misty");
        state.update_location(inside, at(2.0, 2.0, None));
        state.update_location(outside, at(200.0, 200.0, None));
        drain(&log);

        let mut area = ConversationArea::new("z", "talk", BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        // Caller-supplied occupants are ignored.
        area.occupants_by_id.insert(outside);
        assert!(state.create_area(area));

        let snapshot = state.snapshot();
        let created = snapshot.conversation_areas.first().unwrap();
        assert_eq!(created.occupants_by_id.iter().copied().collect::<Vec<_>>(), vec![inside]);
        assert_eq!(drain(&log), vec!["area:z:1"]);
        assert_eq!(state.tracker().counts().conversation_areas, 1);
    }

    #[test]
    fn refused_area_changes_nothing() {
        let (mut state, log) = town(50);
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(state.create_area(ConversationArea::new("z", "talk", bbox)));
        drain(&log);

        assert!(!state.create_area(ConversationArea::new("z", "again", BoundingBox::new(50.0, 50.0, 1.0, 1.0))));
        assert!(!state.create_area(ConversationArea::new("y", "", BoundingBox::new(50.0, 50.0, 1.0, 1.0))));
        assert!(!state.create_area(ConversationArea::new("x", "talk", BoundingBox::new(4.0, 4.0, 4.0, 4.0))));
        assert!(drain(&log).is_empty());
        assert_eq!(state.tracker().counts().conversation_areas, 1);
    }

    #[test]
    fn moving_between_labels_departs_then_arrives() {
        let (mut state, log) = town(50);
        let (a, _) = join(&mut state, "ash");
        let (b, _) = join(&mut state, "brock");
        state.create_area(ConversationArea::new("z1", "one", BoundingBox::new(0.0, 0.0, 10.0, 10.0)));
        state.create_area(ConversationArea::new("z2", "two", BoundingBox::new(100.0, 0.0, 10.0, 10.0)));
        state.update_location(a, at(1.0, 1.0, Some("z1")));
        state.update_location(b, at(1.0, 2.0, Some("z1")));
        drain(&log);

        state.update_location(a, at(100.0, 1.0, Some("z2")));
        assert_eq!(drain(&log), vec!["area:z1:1", "area:z2:1", "moved:ash"]);
    }

    #[test]
    fn unknown_label_clears_membership() {
        let (mut state, log) = town(50);
        let (a, _) = join(&mut state, "ash");
        state.create_area(ConversationArea::new("z", "talk", BoundingBox::new(0.0, 0.0, 10.0, 10.0)));
        state.update_location(a, at(1.0, 1.0, Some("z")));
        drain(&log);

        state.update_location(a, at(1.0, 1.0, Some("nowhere")));
        assert_eq!(drain(&log), vec!["area-gone:z", "moved:ash"]);
        assert!(state.snapshot().players.iter().all(|p| p.active_conversation_area.is_none()));
    }

    #[test]
    fn update_for_unknown_player_is_ignored() {
        let (mut state, log) = town(50);
        assert!(!state.update_location(PlayerId::new(), at(0.0, 0.0, None)));
        assert!(drain(&log).is_empty());
        assert_eq!(state.tracker().counts().moves, 0);
    }

    #[test]
    fn catch_moves_pokemon_to_player() {
        let (mut state, log) = town(50);
        let (a, _) = join(&mut state, "ash");
        let id = state.insert_pokemon(wild(SpeciesName::Piplup));
        drain(&log);

        assert!(state.catch_pokemon(id, a));
        assert_eq!(drain(&log), vec!["removed:piplup", "inventory:ash:1"]);
        let snapshot = state.snapshot();
        assert!(snapshot.pokemon.is_empty());
        let owned = snapshot.players.first().and_then(|p| p.pokemon.first()).unwrap();
        assert!(!owned.is_wild());
        assert_eq!(state.tracker().counts().pokemon, 1);

        // Already caught: expiry and a second catch are both no-ops.
        assert!(!state.expire_pokemon(id));
        assert!(!state.catch_pokemon(id, a));
        assert!(drain(&log).is_empty());
    }

    #[test]
    fn catch_by_unknown_player_leaves_pokemon_wild() {
        let (mut state, log) = town(50);
        let id = state.insert_pokemon(wild(SpeciesName::Turtwig));
        drain(&log);

        assert!(!state.catch_pokemon(id, PlayerId::new()));
        assert!(drain(&log).is_empty());
        let snapshot = state.snapshot();
        assert_eq!(snapshot.pokemon.iter().map(|p| p.id).collect::<Vec<_>>(), vec![id]);
        assert!(snapshot.pokemon.iter().all(Pokemon::is_wild));
    }

    #[test]
    fn select_pokemon_notifies_only_on_change() {
        let (mut state, log) = town(50);
        let (a, _) = join(&mut state, "ash");
        let first = state.insert_pokemon(wild(SpeciesName::Piplup));
        let second = state.insert_pokemon(wild(SpeciesName::Chimchar));
        state.catch_pokemon(first, a);
        state.catch_pokemon(second, a);
        drain(&log);

        assert!(!state.select_pokemon(a, second));
        assert!(state.select_pokemon(a, first));
        assert_eq!(drain(&log), vec!["inventory:ash:2"]);
    }

    #[test]
    fn settings_refuse_empty_name() {
        let (mut state, _log) = town(50);
        assert!(!state.update_settings(Some(String::new()), Some(false)));
        assert!(state.summary().is_publicly_listed);

        assert!(state.update_settings(Some("renamed".to_owned()), Some(false)));
        let summary = state.summary();
        assert_eq!(summary.friendly_name, "renamed");
        assert!(!summary.is_publicly_listed);
        assert_eq!(summary.maximum_occupancy, 50);
    }

    #[test]
    fn removed_listener_hears_nothing() {
        let (mut state, log) = town(50);
        let second = Arc::new(Mutex::new(Vec::new()));
        let id = state.add_listener(Box::new(Log(Arc::clone(&second))));
        assert!(state.remove_listener(id));
        assert!(!state.remove_listener(id));

        state.disconnect_all();
        assert_eq!(drain(&log), vec!["destroyed"]);
        assert!(drain(&second).is_empty());
    }

    /// Tags every join with its own name in a shared log.
    struct Tagged(&'static str, Arc<Mutex<Vec<String>>>);

    impl TownListener for Tagged {
        fn player_joined(&mut self, player: &Player) {
            self.1
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.0, player.user_name));
        }
    }

    #[test]
    fn listeners_hear_events_in_registration_order() {
        let (mut state, _log) = town(50);
        let shared = Arc::new(Mutex::new(Vec::new()));
        state.add_listener(Box::new(Tagged("first", Arc::clone(&shared))));
        state.add_listener(Box::new(Tagged("second", Arc::clone(&shared))));

        join(&mut state, "ash");
        join(&mut state, "misty");
        assert_eq!(
            drain(&shared),
            vec!["first:ash", "second:ash", "first:misty", "second:misty"]
        );
    }
}
