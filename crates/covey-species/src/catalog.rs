//! Species cache and pokemon factory.
//!
//! A [`SpeciesCatalog`] is shared by the towns it is passed to, as an
//! `Arc`. A species is looked up at
//! most once under normal operation; concurrent first lookups of the same
//! species may each reach the source, and the last write wins. Failed
//! lookups are never cached.

use std::collections::BTreeMap;

use covey_types::{Pokemon, PokemonId, PokemonLocation, SpeciesDescriptor, SpeciesName};
use rand::Rng;
use rand::seq::IndexedRandom;
use tokio::sync::RwLock;

use crate::error::SpeciesError;
use crate::source::SpeciesSource;

/// Maximum number of moves a single pokemon knows.
pub const MAX_MOVES: usize = 4;

/// Cache of species descriptors in front of a [`SpeciesSource`].
pub struct SpeciesCatalog {
    source: Box<dyn SpeciesSource>,
    cache: RwLock<BTreeMap<SpeciesName, SpeciesDescriptor>>,
}

impl SpeciesCatalog {
    /// Create an empty catalog backed by `source`.
    pub fn new(source: impl SpeciesSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            cache: RwLock::new(BTreeMap::new()),
        }
    }

    /// Return the descriptor for `species`, looking it up on a cache miss.
    ///
    /// The cache lock is not held while the source is queried.
    pub async fn resolve(&self, species: SpeciesName) -> Result<SpeciesDescriptor, SpeciesError> {
        if let Some(hit) = self.cache.read().await.get(&species).cloned() {
            tracing::trace!(%species, "Species cache hit");
            return Ok(hit);
        }

        let descriptor = self.source.lookup(species).await?;
        tracing::debug!(%species, moves = descriptor.moves.len(), "Species cached");
        self.cache.write().await.insert(species, descriptor.clone());
        Ok(descriptor)
    }

    /// Resolve `species` and create a new pokemon of it at `location`.
    pub async fn spawn(
        &self,
        species: SpeciesName,
        location: PokemonLocation,
    ) -> Result<Pokemon, SpeciesError> {
        let descriptor = self.resolve(species).await?;
        Ok(materialize(descriptor, location, &mut rand::rng()))
    }

    /// Whether a descriptor for `species` is already cached.
    pub async fn is_cached(&self, species: SpeciesName) -> bool {
        self.cache.read().await.contains_key(&species)
    }

    /// Number of cached species.
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Whether nothing has been cached yet.
    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }
}

/// Build a pokemon from a descriptor.
///
/// Picks up to [`MAX_MOVES`] distinct moves uniformly at random from the
/// species move list.
pub fn materialize<R: Rng + ?Sized>(
    species: SpeciesDescriptor,
    location: PokemonLocation,
    rng: &mut R,
) -> Pokemon {
    let moves = species
        .moves
        .choose_multiple(rng, MAX_MOVES)
        .cloned()
        .collect();
    Pokemon {
        id: PokemonId::new(),
        species,
        location,
        moves,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use covey_types::{Direction, SpeciesType};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::source::FixtureSource;

    /// Source that can be told to fail, and counts calls.
    #[derive(Default)]
    struct Flaky {
        failing: Arc<AtomicBool>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SpeciesSource for Flaky {
        async fn lookup(&self, species: SpeciesName) -> Result<SpeciesDescriptor, SpeciesError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(SpeciesError::Lookup {
                    species,
                    message: "unreachable".to_owned(),
                });
            }
            Ok(descriptor(species, &["a", "b"]))
        }
    }

    fn descriptor(name: SpeciesName, moves: &[&str]) -> SpeciesDescriptor {
        SpeciesDescriptor {
            name,
            sprite_url: format!("{name}.png"),
            type1: SpeciesType::Normal,
            type2: None,
            moves: moves.iter().map(|m| (*m).to_owned()).collect(),
        }
    }

    fn wild_at(x: f64, y: f64) -> PokemonLocation {
        PokemonLocation {
            x,
            y,
            is_wild: true,
            direction: Direction::Front,
        }
    }

    #[tokio::test]
    async fn second_resolve_is_served_from_cache() {
        let flaky = Flaky::default();
        let calls = Arc::clone(&flaky.calls);
        let catalog = SpeciesCatalog::new(flaky);

        let first = catalog.resolve(SpeciesName::Pikachu).await.unwrap();
        let second = catalog.resolve(SpeciesName::Pikachu).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(catalog.is_cached(SpeciesName::Pikachu).await);
    }

    #[tokio::test]
    async fn failed_lookup_is_not_cached() {
        let flaky = Flaky::default();
        let failing = Arc::clone(&flaky.failing);
        let calls = Arc::clone(&flaky.calls);
        let catalog = SpeciesCatalog::new(flaky);

        failing.store(true, Ordering::SeqCst);
        assert!(catalog.resolve(SpeciesName::Snorlax).await.is_err());
        assert!(catalog.is_empty().await);

        failing.store(false, Ordering::SeqCst);
        assert!(catalog.resolve(SpeciesName::Snorlax).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(catalog.len().await, 1);
    }

    #[tokio::test]
    async fn spawn_builds_wild_pokemon_at_location() {
        let catalog = SpeciesCatalog::new(FixtureSource::offline());
        let pokemon = catalog
            .spawn(SpeciesName::Eevee, wild_at(12.0, 34.0))
            .await
            .unwrap();
        assert_eq!(pokemon.name(), SpeciesName::Eevee);
        assert!(pokemon.is_wild());
        assert_eq!(pokemon.moves.len(), MAX_MOVES);
    }

    #[test]
    fn materialize_samples_distinct_moves() {
        let mut rng = StdRng::seed_from_u64(7);
        let species = descriptor(SpeciesName::Lucario, &["a", "b", "c", "d", "e", "f"]);
        for _ in 0..20 {
            let pokemon = materialize(species.clone(), wild_at(0.0, 0.0), &mut rng);
            let unique: BTreeSet<_> = pokemon.moves.iter().collect();
            assert_eq!(pokemon.moves.len(), MAX_MOVES);
            assert_eq!(unique.len(), MAX_MOVES);
            assert!(pokemon.moves.iter().all(|m| species.moves.contains(m)));
        }
    }

    #[test]
    fn materialize_keeps_short_move_lists_whole() {
        let mut rng = StdRng::seed_from_u64(1);
        let pokemon = materialize(
            descriptor(SpeciesName::Magikarp, &["splash", "tackle"]),
            wild_at(0.0, 0.0),
            &mut rng,
        );
        let moves: BTreeSet<_> = pokemon.moves.iter().map(String::as_str).collect();
        assert_eq!(moves, BTreeSet::from(["splash", "tackle"]));
    }
}
