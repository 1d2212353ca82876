//! Species lookup backends.
//!
//! The catalog never talks to the network directly. It asks a
//! [`SpeciesSource`], which is either the public species API over HTTP
//! ([`PokeApiSource`]) or an in-memory table ([`FixtureSource`]) used for
//! offline runs and tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use covey_types::{SpeciesDescriptor, SpeciesName, SpeciesType};

use crate::error::SpeciesError;

/// Something that can look up descriptive data for a species.
#[async_trait]
pub trait SpeciesSource: Send + Sync {
    /// Fetch the descriptor for one species.
    async fn lookup(&self, species: SpeciesName) -> Result<SpeciesDescriptor, SpeciesError>;
}

// ---------------------------------------------------------------------------
// PokeAPI over HTTP
// ---------------------------------------------------------------------------

/// Looks species up at `{base_url}/pokemon/{name}`.
///
/// Every request is bounded by the timeout given at construction.
pub struct PokeApiSource {
    client: reqwest::Client,
    base_url: String,
}

impl PokeApiSource {
    /// Create a source pointed at the given API root, e.g. `https://pokeapi.co/api/v2`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SpeciesError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SpeciesError::Client {
                message: format!("{e}"),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    /// The API root this source queries.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl SpeciesSource for PokeApiSource {
    async fn lookup(&self, species: SpeciesName) -> Result<SpeciesDescriptor, SpeciesError> {
        let url = format!("{}/pokemon/{species}", self.base_url);
        tracing::debug!(%species, url = %url, "Fetching species record");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SpeciesError::Lookup {
                species,
                message: format!("request failed: {e}"),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SpeciesError::NotFound(species));
        }
        if !status.is_success() {
            return Err(SpeciesError::Lookup {
                species,
                message: format!("service returned {status}"),
            });
        }

        let json: serde_json::Value =
            response.json().await.map_err(|e| SpeciesError::Lookup {
                species,
                message: format!("response parse failed: {e}"),
            })?;

        parse_descriptor(species, &json)
    }
}

/// Map a PokeAPI `pokemon` record onto a [`SpeciesDescriptor`].
///
/// Reads `sprites.front_default`, the first two `types[].type.name`
/// entries, and every `moves[].move.name`.
pub fn parse_descriptor(
    species: SpeciesName,
    json: &serde_json::Value,
) -> Result<SpeciesDescriptor, SpeciesError> {
    let malformed = |message: &str| SpeciesError::Malformed {
        species,
        message: message.to_owned(),
    };

    let sprite_url = json
        .pointer("/sprites/front_default")
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| malformed("missing sprites.front_default"))?;

    let mut types = json
        .get("types")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| malformed("missing types"))?
        .iter()
        .filter_map(|t| t.pointer("/type/name").and_then(serde_json::Value::as_str));

    let type1 = types
        .next()
        .ok_or_else(|| malformed("types is empty"))
        .and_then(|name| {
            SpeciesType::from_name(name).ok_or_else(|| malformed("unknown primary type"))
        })?;
    let type2 = types.next().and_then(SpeciesType::from_name);

    let moves = json
        .get("moves")
        .and_then(serde_json::Value::as_array)
        .map(|moves| {
            moves
                .iter()
                .filter_map(|m| m.pointer("/move/name").and_then(serde_json::Value::as_str))
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default();

    Ok(SpeciesDescriptor {
        name: species,
        sprite_url,
        type1,
        type2,
        moves,
    })
}

// ---------------------------------------------------------------------------
// In-memory fixtures
// ---------------------------------------------------------------------------

/// Serves descriptors from an in-memory table. Unknown species fail.
#[derive(Debug, Default)]
pub struct FixtureSource {
    records: BTreeMap<SpeciesName, SpeciesDescriptor>,
    lookups: AtomicUsize,
}

impl FixtureSource {
    /// Create an empty fixture table.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table with a plain record for every known species.
    ///
    /// Used when the engine runs without network access.
    pub fn offline() -> Self {
        SpeciesName::ALL
            .iter()
            .fold(Self::new(), |source, &name| {
                source.with(SpeciesDescriptor {
                    name,
                    sprite_url: format!("sprites/{name}.png"),
                    type1: SpeciesType::Normal,
                    type2: None,
                    moves: ["tackle", "growl", "quick-attack", "rest", "protect"]
                        .iter()
                        .map(|m| (*m).to_owned())
                        .collect(),
                })
            })
    }

    /// Add or replace a record, builder style.
    #[must_use]
    pub fn with(mut self, descriptor: SpeciesDescriptor) -> Self {
        self.records.insert(descriptor.name, descriptor);
        self
    }

    /// Number of lookups served so far, hits and misses alike.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SpeciesSource for FixtureSource {
    async fn lookup(&self, species: SpeciesName) -> Result<SpeciesDescriptor, SpeciesError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.records
            .get(&species)
            .cloned()
            .ok_or(SpeciesError::NotFound(species))
    }
}
