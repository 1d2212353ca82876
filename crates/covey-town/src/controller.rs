//! Per-town controller task.
//!
//! Each town runs as one `tokio` task that owns its [`TownState`] and reads
//! commands from a bounded queue. Callers talk to it through a cloneable
//! [`TownHandle`]; every operation is a command plus a oneshot reply, so
//! operations on one town are applied one at a time in arrival order and
//! listener callbacks observe that same order.
//!
//! Work that has to wait never runs inside the task:
//!
//! - video credentials are issued by the handle before the join command is
//!   sent, so a failed issuance registers nothing
//! - species lookups for spawns run in a spawned task that sends the
//!   finished pokemon back as a command
//! - each wild pokemon gets a sleeping task that sends an expiry command,
//!   aborted if the pokemon is caught first
//!
//! Background tasks hold only a weak sender, so the controller stops once
//! every handle is dropped.

use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use covey_achievements::{ProgressListener, ProgressTracker};
use covey_species::SpeciesCatalog;
use covey_types::{
    ChatMessage, ConversationArea, ListenerId, Player, PlayerId, PlayerLocation, PlayerSession,
    Pokemon, PokemonId, SessionToken, TownId, TownSnapshot, TownSummary,
};
use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::TownConfig;
use crate::credentials::CredentialIssuer;
use crate::error::TownError;
use crate::listener::TownListener;
use crate::spawn_regions::random_spawn_location;
use crate::town::{TownIdentity, TownState};

/// Length of a generated town id.
const TOWN_ID_LEN: usize = 8;

/// Length of a generated update password.
const UPDATE_PASSWORD_LEN: usize = 24;

/// Shortest spawn interval the timer accepts.
const MIN_SPAWN_INTERVAL: Duration = Duration::from_millis(1);

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

type Reply<T> = oneshot::Sender<T>;

enum Command {
    Join {
        player: Box<Player>,
        video_token: String,
        reply: Reply<Result<PlayerSession, TownError>>,
    },
    Leave {
        token: SessionToken,
        reply: Reply<bool>,
    },
    UpdateLocation {
        player_id: PlayerId,
        location: PlayerLocation,
        reply: Reply<bool>,
    },
    CreateArea {
        area: ConversationArea,
        reply: Reply<bool>,
    },
    SendChat {
        message: ChatMessage,
        reply: Reply<()>,
    },
    CatchPokemon {
        pokemon_id: PokemonId,
        player_id: PlayerId,
        reply: Reply<bool>,
    },
    SelectPokemon {
        player_id: PlayerId,
        pokemon_id: PokemonId,
        reply: Reply<bool>,
    },
    AddListener {
        listener: Box<dyn TownListener>,
        reply: Reply<ListenerId>,
    },
    RemoveListener {
        id: ListenerId,
        reply: Reply<bool>,
    },
    SetProgressListener {
        listener: Box<dyn ProgressListener>,
        reply: Reply<()>,
    },
    SessionByToken {
        token: SessionToken,
        reply: Reply<Option<PlayerSession>>,
    },
    UpdateSettings {
        friendly_name: Option<String>,
        publicly_listed: Option<bool>,
        reply: Reply<bool>,
    },
    Summary {
        reply: Reply<TownSummary>,
    },
    Snapshot {
        reply: Reply<Box<TownSnapshot>>,
    },
    Spawned(Box<Pokemon>),
    Expire(PokemonId),
    DisconnectAll {
        reply: Reply<()>,
    },
}

// ---------------------------------------------------------------------------
// Controller task
// ---------------------------------------------------------------------------

/// Owns one town's state and applies its commands in order.
pub struct TownController {
    town_id: TownId,
    state: TownState,
    catalog: Arc<SpeciesCatalog>,
    rng: StdRng,
    expiry: BTreeMap<PokemonId, AbortHandle>,
    pokemon_lifespan: Duration,
    commands: mpsc::WeakSender<Command>,
}

impl TownController {
    /// Create a town and start its controller task.
    ///
    /// Must be called from inside a `tokio` runtime.
    pub fn start(
        friendly_name: impl Into<String>,
        publicly_listed: bool,
        config: &TownConfig,
        catalog: Arc<SpeciesCatalog>,
        issuer: Arc<dyn CredentialIssuer>,
    ) -> TownHandle {
        let friendly_name = friendly_name.into();
        let mut rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

        let town_id = generate_town_id(&friendly_name, config.demo_town_id.as_deref(), &mut rng);
        let update_password = generate_update_password(&mut rng);

        let (tx, rx) = mpsc::channel(config.command_queue_depth.max(1));
        let spawn_interval =
            Duration::from_millis(config.spawn_interval_ms).max(MIN_SPAWN_INTERVAL);

        info!(
            town = %town_id,
            friendly_name = %friendly_name,
            capacity = config.capacity,
            spawn_interval_ms = config.spawn_interval_ms,
            pokemon_lifespan_ms = config.pokemon_lifespan_ms,
            "Town starting"
        );

        let controller = Self {
            town_id: town_id.clone(),
            state: TownState::new(
                TownIdentity {
                    town_id: town_id.clone(),
                    friendly_name,
                    publicly_listed,
                    capacity: config.capacity,
                },
                ProgressTracker::new(),
            ),
            catalog,
            rng,
            expiry: BTreeMap::new(),
            pokemon_lifespan: Duration::from_millis(config.pokemon_lifespan_ms),
            commands: tx.downgrade(),
        };
        tokio::spawn(controller.run(rx, spawn_interval));

        TownHandle {
            town_id,
            update_password: Arc::from(update_password),
            commands: tx,
            issuer,
        }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>, spawn_interval: Duration) {
        let now = Instant::now();
        let first_spawn = now.checked_add(spawn_interval).unwrap_or(now);
        let mut spawn_timer = tokio::time::interval_at(first_spawn, spawn_interval);
        spawn_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => {
                        if self.handle(command).is_break() {
                            break;
                        }
                    }
                    None => {
                        self.stop();
                        break;
                    }
                },
                _ = spawn_timer.tick() => self.spawn_tick(),
            }
        }

        info!(town = %self.town_id, "Town stopped");
    }

    /// Apply one command. Breaks once the town has been torn down.
    fn handle(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Join {
                player,
                video_token,
                reply,
            } => {
                let _ = reply.send(self.state.join(*player, video_token));
            }
            Command::Leave { token, reply } => {
                let _ = reply.send(self.state.leave(&token));
            }
            Command::UpdateLocation {
                player_id,
                location,
                reply,
            } => {
                let _ = reply.send(self.state.update_location(player_id, location));
            }
            Command::CreateArea { area, reply } => {
                let _ = reply.send(self.state.create_area(area));
            }
            Command::SendChat { message, reply } => {
                self.state.send_chat(&message);
                let _ = reply.send(());
            }
            Command::CatchPokemon {
                pokemon_id,
                player_id,
                reply,
            } => {
                let caught = self.state.catch_pokemon(pokemon_id, player_id);
                if caught && let Some(timer) = self.expiry.remove(&pokemon_id) {
                    timer.abort();
                }
                let _ = reply.send(caught);
            }
            Command::SelectPokemon {
                player_id,
                pokemon_id,
                reply,
            } => {
                let _ = reply.send(self.state.select_pokemon(player_id, pokemon_id));
            }
            Command::AddListener { listener, reply } => {
                let _ = reply.send(self.state.add_listener(listener));
            }
            Command::RemoveListener { id, reply } => {
                let _ = reply.send(self.state.remove_listener(id));
            }
            Command::SetProgressListener { listener, reply } => {
                self.state.set_progress_listener(listener);
                let _ = reply.send(());
            }
            Command::SessionByToken { token, reply } => {
                let _ = reply.send(self.state.session(&token));
            }
            Command::UpdateSettings {
                friendly_name,
                publicly_listed,
                reply,
            } => {
                let _ = reply.send(self.state.update_settings(friendly_name, publicly_listed));
            }
            Command::Summary { reply } => {
                let _ = reply.send(self.state.summary());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(Box::new(self.state.snapshot()));
            }
            Command::Spawned(pokemon) => {
                let id = self.state.insert_pokemon(*pokemon);
                self.arm_expiry(id);
            }
            Command::Expire(id) => {
                self.expiry.remove(&id);
                self.state.expire_pokemon(id);
            }
            Command::DisconnectAll { reply } => {
                self.stop();
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Pick a species and a location, then resolve the species off-task.
    fn spawn_tick(&mut self) {
        let species = self.state.tracker().choose_species(&mut self.rng);
        let location = random_spawn_location(&mut self.rng);
        let catalog = Arc::clone(&self.catalog);
        let commands = self.commands.clone();
        let town = self.town_id.clone();

        tokio::spawn(async move {
            match catalog.spawn(species, location).await {
                Ok(pokemon) => {
                    if let Some(tx) = commands.upgrade() {
                        let _ = tx.send(Command::Spawned(Box::new(pokemon))).await;
                    }
                }
                Err(error) => {
                    warn!(town = %town, %species, %error, "Spawn skipped");
                }
            }
        });
    }

    fn arm_expiry(&mut self, id: PokemonId) {
        let commands = self.commands.clone();
        let lifespan = self.pokemon_lifespan;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(lifespan).await;
            if let Some(tx) = commands.upgrade() {
                let _ = tx.send(Command::Expire(id)).await;
            }
        });
        self.expiry.insert(id, timer.abort_handle());
    }

    fn stop(&mut self) {
        self.state.disconnect_all();
        let timers = std::mem::take(&mut self.expiry);
        debug!(town = %self.town_id, timers = timers.len(), "Cancelling expiry timers");
        for timer in timers.into_values() {
            timer.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Cloneable handle to a running town.
///
/// Every method returns [`TownError::Closed`] once the town has stopped.
#[derive(Clone)]
pub struct TownHandle {
    town_id: TownId,
    update_password: Arc<str>,
    commands: mpsc::Sender<Command>,
    issuer: Arc<dyn CredentialIssuer>,
}

impl std::fmt::Debug for TownHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TownHandle")
            .field("town_id", &self.town_id)
            .field("closed", &self.commands.is_closed())
            .finish_non_exhaustive()
    }
}

impl TownHandle {
    /// The town's identifier.
    pub const fn town_id(&self) -> &TownId {
        &self.town_id
    }

    /// Admin credential required to change the town's settings.
    pub fn update_password(&self) -> &str {
        &self.update_password
    }

    /// Whether the controller task has stopped.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, TownError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_closed| TownError::Closed)?;
        response.await.map_err(|_dropped| TownError::Closed)
    }

    /// Add a player to the town and open a session for them.
    ///
    /// The video credential is issued first. If that fails, or the town is
    /// full, nothing is registered.
    pub async fn join(&self, player: Player) -> Result<PlayerSession, TownError> {
        let video_token = self.issuer.issue(&self.town_id, player.id).await?;
        self.request(|reply| Command::Join {
            player: Box::new(player),
            video_token,
            reply,
        })
        .await?
    }

    /// Close a session and remove its player. Unknown tokens are ignored.
    pub async fn leave(&self, token: &SessionToken) -> Result<bool, TownError> {
        let token = token.clone();
        self.request(|reply| Command::Leave { token, reply }).await
    }

    /// Apply a player's new location. Returns `false` for unknown players.
    pub async fn update_location(
        &self,
        player_id: PlayerId,
        location: PlayerLocation,
    ) -> Result<bool, TownError> {
        self.request(|reply| Command::UpdateLocation {
            player_id,
            location,
            reply,
        })
        .await
    }

    /// Create a conversation area.
    ///
    /// Returns `false` when the label is taken, the topic is empty, or the
    /// area overlaps an existing one.
    pub async fn create_conversation_area(
        &self,
        area: ConversationArea,
    ) -> Result<bool, TownError> {
        self.request(|reply| Command::CreateArea { area, reply })
            .await
    }

    /// Relay a chat message to every listener.
    pub async fn send_chat(&self, message: ChatMessage) -> Result<(), TownError> {
        self.request(|reply| Command::SendChat { message, reply })
            .await
    }

    /// Move a wild pokemon into a player's list.
    ///
    /// Returns `false` if the pokemon is gone or the player is unknown.
    pub async fn catch_pokemon(
        &self,
        pokemon_id: PokemonId,
        player_id: PlayerId,
    ) -> Result<bool, TownError> {
        self.request(|reply| Command::CatchPokemon {
            pokemon_id,
            player_id,
            reply,
        })
        .await
    }

    /// Make an owned pokemon the player's selected one.
    pub async fn select_pokemon(
        &self,
        player_id: PlayerId,
        pokemon_id: PokemonId,
    ) -> Result<bool, TownError> {
        self.request(|reply| Command::SelectPokemon {
            player_id,
            pokemon_id,
            reply,
        })
        .await
    }

    /// Subscribe a listener to every state change from now on.
    pub async fn add_listener(
        &self,
        listener: impl TownListener + 'static,
    ) -> Result<ListenerId, TownError> {
        let listener: Box<dyn TownListener> = Box::new(listener);
        self.request(|reply| Command::AddListener { listener, reply })
            .await
    }

    /// Unsubscribe a listener. Unknown ids are ignored.
    pub async fn remove_listener(&self, id: ListenerId) -> Result<bool, TownError> {
        self.request(|reply| Command::RemoveListener { id, reply })
            .await
    }

    /// Attach the listener for achievement and counter updates.
    ///
    /// It receives the current state immediately.
    pub async fn set_progress_listener(
        &self,
        listener: impl ProgressListener + 'static,
    ) -> Result<(), TownError> {
        let listener: Box<dyn ProgressListener> = Box::new(listener);
        self.request(|reply| Command::SetProgressListener { listener, reply })
            .await
    }

    /// Look up a session by its token.
    pub async fn session_by_token(
        &self,
        token: &SessionToken,
    ) -> Result<Option<PlayerSession>, TownError> {
        let token = token.clone();
        self.request(|reply| Command::SessionByToken { token, reply })
            .await
    }

    /// Rename or relist the town.
    ///
    /// Returns `false` without changes if `password` is wrong or the new
    /// name is empty.
    pub async fn update_settings(
        &self,
        password: &str,
        friendly_name: Option<String>,
        publicly_listed: Option<bool>,
    ) -> Result<bool, TownError> {
        if password != self.update_password() {
            return Ok(false);
        }
        self.request(|reply| Command::UpdateSettings {
            friendly_name,
            publicly_listed,
            reply,
        })
        .await
    }

    /// The town's listing entry.
    pub async fn summary(&self) -> Result<TownSummary, TownError> {
        self.request(|reply| Command::Summary { reply }).await
    }

    /// Copy of the town's full state.
    pub async fn snapshot(&self) -> Result<TownSnapshot, TownError> {
        self.request(|reply| Command::Snapshot { reply })
            .await
            .map(|snapshot| *snapshot)
    }

    /// Tell every listener the town is destroyed, cancel all timers, and
    /// stop the controller.
    pub async fn disconnect_all(&self) -> Result<(), TownError> {
        self.request(|reply| Command::DisconnectAll { reply })
            .await
    }

    /// Stop the town if it is still running.
    pub async fn shutdown(&self) {
        match self.disconnect_all().await {
            Ok(()) => info!(town = %self.town_id, "Town shut down"),
            Err(TownError::Closed) => debug!(town = %self.town_id, "Town already stopped"),
            Err(error) => warn!(town = %self.town_id, %error, "Town shutdown failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Identity generation
// ---------------------------------------------------------------------------

/// Eight uppercase hex characters, or the friendly name itself for the
/// configured demo town.
fn generate_town_id<R: Rng + ?Sized>(
    friendly_name: &str,
    demo_town_id: Option<&str>,
    rng: &mut R,
) -> TownId {
    if demo_town_id == Some(friendly_name) {
        return TownId::from(friendly_name);
    }
    let id: String = (0..TOWN_ID_LEN)
        .filter_map(|_| char::from_digit(rng.random_range(0..16), 16))
        .map(|c| c.to_ascii_uppercase())
        .collect();
    TownId::from(id)
}

fn generate_update_password<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(UPDATE_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn town_ids_are_uppercase_hex() {
        let mut rng = StdRng::seed_from_u64(5);
        let id = generate_town_id("my town", None, &mut rng);
        assert_eq!(id.as_str().len(), TOWN_ID_LEN);
        assert!(
            id.as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        );
    }

    #[test]
    fn demo_town_keeps_its_name() {
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(
            generate_town_id("demo", Some("demo"), &mut rng).as_str(),
            "demo"
        );
        assert_ne!(
            generate_town_id("other", Some("demo"), &mut rng).as_str(),
            "other"
        );
    }

    #[test]
    fn update_passwords_are_alphanumeric() {
        let mut rng = StdRng::seed_from_u64(5);
        let password = generate_update_password(&mut rng);
        assert_eq!(password.len(), UPDATE_PASSWORD_LEN);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
