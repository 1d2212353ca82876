//! Configuration loading for Covey Town servers.
//!
//! The configuration lives in `covey-config.yaml`. Every section and field
//! has a default, so an empty file (or no file at all) yields a working
//! server pointed at the public species API.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Per-town settings.
    #[serde(default)]
    pub town: TownConfig,

    /// Species catalog settings.
    #[serde(default)]
    pub species: SpeciesConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServerConfig {
    /// Load configuration from a YAML file.
    ///
    /// Environment variables override YAML values:
    /// - `POKEAPI_URL` overrides `species.base_url`
    /// - `DEMO_TOWN_ID` overrides `town.demo_town_id`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment overrides.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `POKEAPI_URL` and `DEMO_TOWN_ID` from the environment.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("POKEAPI_URL") {
            self.species.base_url = url;
        }
        if let Ok(id) = std::env::var("DEMO_TOWN_ID") {
            self.town.demo_town_id = Some(id);
        }
    }
}

/// Settings applied to every town.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TownConfig {
    /// Maximum players per town.
    #[serde(default = "default_capacity")]
    pub capacity: u32,

    /// Milliseconds between spawn attempts.
    #[serde(default = "default_spawn_interval_ms")]
    pub spawn_interval_ms: u64,

    /// Milliseconds a wild pokemon stays before it flees.
    #[serde(default = "default_pokemon_lifespan_ms")]
    pub pokemon_lifespan_ms: u64,

    /// Commands that may wait in a town's queue before callers block.
    #[serde(default = "default_command_queue_depth")]
    pub command_queue_depth: usize,

    /// Seed for spawn draws. Random when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// A town created with this friendly name uses it as its id.
    #[serde(default)]
    pub demo_town_id: Option<String>,
}

impl Default for TownConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            spawn_interval_ms: default_spawn_interval_ms(),
            pokemon_lifespan_ms: default_pokemon_lifespan_ms(),
            command_queue_depth: default_command_queue_depth(),
            seed: None,
            demo_town_id: None,
        }
    }
}

/// Where species descriptors come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeciesBackend {
    /// The public species API over HTTP.
    #[default]
    PokeApi,
    /// Built-in records, no network.
    Offline,
}

/// Species catalog settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpeciesConfig {
    /// Which backend to query.
    #[serde(default)]
    pub backend: SpeciesBackend,

    /// API root for the HTTP backend.
    #[serde(default = "default_species_base_url")]
    pub base_url: String,

    /// Upper bound on one HTTP lookup, in milliseconds.
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
}

impl Default for SpeciesConfig {
    fn default() -> Self {
        Self {
            backend: SpeciesBackend::default(),
            base_url: default_species_base_url(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (required by serde)
// ---------------------------------------------------------------------------

const fn default_capacity() -> u32 {
    50
}

const fn default_spawn_interval_ms() -> u64 {
    2500
}

const fn default_pokemon_lifespan_ms() -> u64 {
    20_000
}

const fn default_command_queue_depth() -> usize {
    256
}

fn default_species_base_url() -> String {
    "https://pokeapi.co/api/v2".to_owned()
}

const fn default_lookup_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_owned()
}
