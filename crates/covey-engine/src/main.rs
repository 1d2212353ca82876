//! Covey Town server binary.
//!
//! Loads configuration, builds the shared species catalog, and runs a
//! demo town until interrupted. Transport layers subscribe to the town's
//! event channel; here the events are only logged.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `covey-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the species catalog for the configured backend
//! 4. Start the demo town
//! 5. Attach logging and broadcast listeners
//! 6. Run until Ctrl-C, then shut the town down

mod error;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use covey_species::{FixtureSource, PokeApiSource, SpeciesCatalog};
use covey_town::{
    BroadcastListener, LocalCredentialIssuer, LoggingConfig, ServerConfig, SpeciesBackend,
    TownController, TracingListener,
};
use covey_types::TownEvent;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Path of the configuration file, relative to the working directory.
const CONFIG_PATH: &str = "covey-config.yaml";

/// Friendly name of the demo town when no demo id is configured.
const DEFAULT_DEMO_TOWN: &str = "Covey Town Demo";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the demo town
/// fails to start.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!("covey-engine starting");
    if !from_file {
        info!(path = CONFIG_PATH, "Config file not found, using defaults");
    }
    info!(
        capacity = config.town.capacity,
        spawn_interval_ms = config.town.spawn_interval_ms,
        pokemon_lifespan_ms = config.town.pokemon_lifespan_ms,
        species_backend = ?config.species.backend,
        "Configuration loaded"
    );

    // 3. Build the species catalog.
    let catalog = Arc::new(match config.species.backend {
        SpeciesBackend::PokeApi => {
            let source = PokeApiSource::new(
                config.species.base_url.clone(),
                Duration::from_millis(config.species.lookup_timeout_ms),
            )
            .map_err(EngineError::from)?;
            info!(
                base_url = %source.base_url(),
                timeout_ms = config.species.lookup_timeout_ms,
                "Using species API"
            );
            SpeciesCatalog::new(source)
        }
        SpeciesBackend::Offline => {
            info!("Using built-in species records");
            SpeciesCatalog::new(FixtureSource::offline())
        }
    });

    // 4. Start the demo town.
    let friendly_name = config
        .town
        .demo_town_id
        .clone()
        .unwrap_or_else(|| DEFAULT_DEMO_TOWN.to_owned());
    let town = TownController::start(
        friendly_name,
        true,
        &config.town,
        catalog,
        Arc::new(LocalCredentialIssuer),
    );
    info!(town = %town.town_id(), "Demo town started");

    // 5. Attach listeners.
    town.add_listener(TracingListener::new(town.town_id().as_str()))
        .await
        .map_err(EngineError::from)?;
    let broadcast = BroadcastListener::new();
    let events = broadcast.subscribe();
    town.set_progress_listener(broadcast.clone())
        .await
        .map_err(EngineError::from)?;
    town.add_listener(broadcast)
        .await
        .map_err(EngineError::from)?;
    let relay = tokio::spawn(relay_events(events));

    // 6. Run until interrupted.
    let signal = tokio::signal::ctrl_c().await.map_err(|e| EngineError::Signal {
        message: format!("{e}"),
    });
    if let Ok(summary) = town.summary().await {
        info!(
            town = %summary.town_id,
            occupancy = summary.current_occupancy,
            "Shutting down"
        );
    }
    town.shutdown().await;
    if let Err(error) = relay.await {
        warn!(%error, "Event relay ended abnormally");
    }
    signal?;

    info!("covey-engine stopped");
    Ok(())
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Load configuration from `covey-config.yaml`, falling back to defaults.
///
/// Returns whether the file was found alongside the config.
fn load_config() -> Result<(ServerConfig, bool), EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok((ServerConfig::from_file(config_path)?, true))
    } else {
        let mut config = ServerConfig::default();
        config.apply_env_overrides();
        Ok((config, false))
    }
}

/// Log every town event as JSON until the town stops.
async fn relay_events(mut events: broadcast::Receiver<TownEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => debug!(kind = event.kind(), payload = %json, "Town event"),
                Err(error) => warn!(kind = event.kind(), %error, "Town event not serializable"),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Event relay fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
