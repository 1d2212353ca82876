//! Per-town progress tracking.
//!
//! The [`ProgressTracker`] counts five kinds of town events, flips
//! achievements to completed once their counter reaches the threshold, and
//! draws the species for each spawn from the pool those achievements have
//! unlocked. Completion is monotonic: nothing ever un-completes an
//! achievement, and counters only go up.

use covey_types::{AchievementCategory, AchievementCounts, AchievementKey, AchievementList, SpeciesName};
use rand::Rng;

use crate::catalog::default_achievements;
use crate::rarity::{ALWAYS_AVAILABLE, spawn_weight};

/// Receives progress snapshots from a [`ProgressTracker`].
pub trait ProgressListener: Send {
    /// Called with the full list when at least one achievement newly completed.
    fn achievements_updated(&mut self, achievements: &AchievementList);

    /// Called with the counters after every recorded event.
    fn counts_updated(&mut self, counts: &AchievementCounts);
}

/// Event counters, achievement state, and spawn pool for one town.
pub struct ProgressTracker {
    achievements: AchievementList,
    counts: AchievementCounts,
    listener: Option<Box<dyn ProgressListener>>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("achievements", &self.achievements.len())
            .field("counts", &self.counts)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

impl ProgressTracker {
    /// Create a tracker with the default achievement list.
    pub fn new() -> Self {
        Self::with_achievements(default_achievements())
    }

    /// Create a tracker over a custom achievement list.
    pub const fn with_achievements(achievements: AchievementList) -> Self {
        Self {
            achievements,
            counts: AchievementCounts {
                players: 0,
                moves: 0,
                conversation_areas: 0,
                chats: 0,
                pokemon: 0,
            },
            listener: None,
        }
    }

    /// Current achievement list.
    pub const fn achievements(&self) -> &AchievementList {
        &self.achievements
    }

    /// Current counters.
    pub const fn counts(&self) -> AchievementCounts {
        self.counts
    }

    /// Attach a listener, replacing any previous one.
    ///
    /// The listener immediately receives the current list and counters.
    pub fn set_listener(&mut self, mut listener: Box<dyn ProgressListener>) {
        listener.achievements_updated(&self.achievements);
        listener.counts_updated(&self.counts);
        self.listener = Some(listener);
    }

    /// A player joined the town.
    pub fn record_player_joined(&mut self) -> Vec<AchievementKey> {
        self.record(AchievementCategory::Players)
    }

    /// A player reported a movement.
    pub fn record_move(&mut self) -> Vec<AchievementKey> {
        self.record(AchievementCategory::Moves)
    }

    /// A conversation area was created.
    pub fn record_conversation_area(&mut self) -> Vec<AchievementKey> {
        self.record(AchievementCategory::ConversationAreas)
    }

    /// A chat message was sent.
    pub fn record_chat(&mut self) -> Vec<AchievementKey> {
        self.record(AchievementCategory::Chats)
    }

    /// A wild pokemon was caught.
    pub fn record_pokemon_caught(&mut self) -> Vec<AchievementKey> {
        self.record(AchievementCategory::Pokemon)
    }

    /// Count one event of `category` and re-evaluate every open achievement.
    ///
    /// Returns the keys that completed because of this event.
    pub fn record(&mut self, category: AchievementCategory) -> Vec<AchievementKey> {
        self.counts.increment(category);

        let counts = self.counts;
        let newly_completed: Vec<AchievementKey> = self
            .achievements
            .iter_mut()
            .filter(|(_, a)| !a.completed && counts.get(a.category) >= a.threshold)
            .map(|(key, a)| {
                a.completed = true;
                *key
            })
            .collect();

        for key in &newly_completed {
            tracing::info!(achievement = ?key, "Achievement completed");
        }

        if let Some(listener) = self.listener.as_mut() {
            if !newly_completed.is_empty() {
                listener.achievements_updated(&self.achievements);
            }
            listener.counts_updated(&self.counts);
        }

        newly_completed
    }

    /// Species that can currently spawn, one entry per unlock.
    ///
    /// Starts with [`ALWAYS_AVAILABLE`], then the unlock list of every
    /// completed achievement. A species unlocked twice appears twice.
    pub fn available_species(&self) -> Vec<SpeciesName> {
        ALWAYS_AVAILABLE
            .iter()
            .copied()
            .chain(
                self.achievements
                    .values()
                    .filter(|a| a.completed)
                    .flat_map(|a| a.pokemon_name.iter().copied()),
            )
            .collect()
    }

    /// Draw the species for the next spawn.
    ///
    /// Each pool entry is chosen with probability proportional to its
    /// spawn weight.
    pub fn choose_species<R: Rng + ?Sized>(&self, rng: &mut R) -> SpeciesName {
        let pool = self.available_species();
        let total = pool
            .iter()
            .map(|s| spawn_weight(*s))
            .fold(0_u32, u32::saturating_add);
        let fallback = SpeciesName::Piplup;
        if total == 0 {
            return fallback;
        }

        let mut ticket = rng.random_range(0..total);
        for species in pool {
            let weight = spawn_weight(species);
            if ticket < weight {
                return species;
            }
            ticket = ticket.saturating_sub(weight);
        }
        fallback
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use covey_types::Achievement;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[derive(Default)]
    struct Recorded {
        lists: Vec<AchievementList>,
        counts: Vec<AchievementCounts>,
    }

    struct Recorder(Arc<Mutex<Recorded>>);

    impl ProgressListener for Recorder {
        fn achievements_updated(&mut self, achievements: &AchievementList) {
            self.0.lock().unwrap().lists.push(achievements.clone());
        }

        fn counts_updated(&mut self, counts: &AchievementCounts) {
            self.0.lock().unwrap().counts.push(*counts);
        }
    }

    fn tracked() -> (ProgressTracker, Arc<Mutex<Recorded>>) {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let mut tracker = ProgressTracker::new();
        tracker.set_listener(Box::new(Recorder(Arc::clone(&recorded))));
        (tracker, recorded)
    }

    fn completed(tracker: &ProgressTracker) -> Vec<AchievementKey> {
        tracker
            .achievements()
            .iter()
            .filter(|(_, a)| a.completed)
            .map(|(k, _)| *k)
            .collect()
    }

    #[test]
    fn listener_gets_snapshot_on_registration() {
        let (_tracker, recorded) = tracked();
        let recorded = recorded.lock().unwrap();
        assert_eq!(recorded.lists.len(), 1);
        assert_eq!(recorded.counts, vec![AchievementCounts::default()]);
    }

    #[test]
    fn threshold_completes_achievement() {
        let (mut tracker, recorded) = tracked();

        assert!(tracker.record_player_joined().is_empty());
        assert_eq!(tracker.record_player_joined(), vec![AchievementKey::Players2]);
        assert_eq!(completed(&tracker), vec![AchievementKey::Players2]);

        let recorded = recorded.lock().unwrap();
        // Replay plus one for the completion.
        assert_eq!(recorded.lists.len(), 2);
        // Replay plus one per event.
        assert_eq!(recorded.counts.len(), 3);
        assert_eq!(recorded.counts.last().map(|c| c.players), Some(2));
    }

    #[test]
    fn counts_are_pushed_even_without_completion() {
        let (mut tracker, recorded) = tracked();
        for _ in 0..10 {
            tracker.record_move();
        }
        let recorded = recorded.lock().unwrap();
        assert_eq!(recorded.lists.len(), 1);
        assert_eq!(recorded.counts.len(), 11);
        assert_eq!(tracker.counts().moves, 10);
    }

    #[test]
    fn completion_is_monotonic() {
        let mut tracker = ProgressTracker::new();
        tracker.record_chat();
        assert_eq!(completed(&tracker), vec![AchievementKey::Chats1]);

        for _ in 0..30 {
            tracker.record_player_joined();
            tracker.record_conversation_area();
        }
        let after = completed(&tracker);
        assert!(after.contains(&AchievementKey::Chats1));
        assert!(after.contains(&AchievementKey::Players25));
        assert!(after.contains(&AchievementKey::ConversationAreas5));
        assert!(!after.contains(&AchievementKey::Players50));
    }

    #[test]
    fn every_open_achievement_is_reevaluated() {
        // An achievement whose threshold is already met completes on the
        // next event of any category.
        let mut list = BTreeMap::new();
        list.insert(
            AchievementKey::Chats1,
            Achievement {
                category: AchievementCategory::Chats,
                completed: false,
                pokemon_name: vec![SpeciesName::Pikachu],
                threshold: 0,
            },
        );
        let mut tracker = ProgressTracker::with_achievements(list);
        assert_eq!(tracker.record_move(), vec![AchievementKey::Chats1]);
    }

    #[test]
    fn pool_grows_with_unlocks() {
        let mut tracker = ProgressTracker::new();
        assert_eq!(tracker.available_species(), ALWAYS_AVAILABLE.to_vec());

        tracker.record_chat();
        let pool = tracker.available_species();
        assert_eq!(pool.len(), 4);
        assert!(pool.contains(&SpeciesName::Pikachu));
    }

    #[test]
    fn draws_only_from_the_pool() {
        let mut tracker = ProgressTracker::new();
        tracker.record_conversation_area();
        let pool = tracker.available_species();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            assert!(pool.contains(&tracker.choose_species(&mut rng)));
        }
    }

    #[test]
    fn draws_follow_weights() {
        // Arcanine (5) and goldeen (5) against three weight-1 starters.
        let mut tracker = ProgressTracker::new();
        tracker.record_conversation_area();
        let mut rng = StdRng::seed_from_u64(9);

        let mut arcanine = 0_u32;
        let mut piplup = 0_u32;
        for _ in 0..13_000 {
            match tracker.choose_species(&mut rng) {
                SpeciesName::Arcanine => arcanine += 1,
                SpeciesName::Piplup => piplup += 1,
                _ => {}
            }
        }
        // Expected roughly 5000 and 1000.
        assert!((4_500..5_500).contains(&arcanine), "arcanine drawn {arcanine}");
        assert!((800..1_200).contains(&piplup), "piplup drawn {piplup}");
    }
}
