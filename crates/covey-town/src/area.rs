//! Conversation area registry.
//!
//! Areas are keyed by label. The registry enforces that labels are unique,
//! topics are non-empty, and no two areas overlap. An area that loses its
//! last occupant is removed in the same call.

use std::collections::BTreeMap;

use covey_types::{ConversationArea, PlayerId};

/// Why a new conversation area was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AreaRejection {
    /// An area with this label already exists.
    #[error("label {0:?} is already in use")]
    DuplicateLabel(String),

    /// The topic was empty.
    #[error("topic is empty")]
    EmptyTopic,

    /// The bounding box overlaps an existing area.
    #[error("overlaps area {0:?}")]
    Overlaps(String),
}

/// What happened to an area after a player left it.
#[derive(Debug)]
pub enum Departure<'a> {
    /// The area still has occupants.
    Updated(&'a ConversationArea),
    /// The area was emptied and removed.
    Destroyed(ConversationArea),
}

/// Active conversation areas of one town.
#[derive(Debug, Clone, Default)]
pub struct AreaRegistry {
    areas: BTreeMap<String, ConversationArea>,
}

impl AreaRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            areas: BTreeMap::new(),
        }
    }

    /// Number of active areas.
    pub fn len(&self) -> usize {
        self.areas.len()
    }

    /// Whether there are no active areas.
    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Whether an area with this label exists.
    pub fn contains(&self, label: &str) -> bool {
        self.areas.contains_key(label)
    }

    /// All active areas, ordered by label.
    pub fn iter(&self) -> impl Iterator<Item = &ConversationArea> {
        self.areas.values()
    }

    /// Check whether `candidate` could be added.
    pub fn check(&self, candidate: &ConversationArea) -> Result<(), AreaRejection> {
        if self.areas.contains_key(&candidate.label) {
            return Err(AreaRejection::DuplicateLabel(candidate.label.clone()));
        }
        if candidate.topic.is_empty() {
            return Err(AreaRejection::EmptyTopic);
        }
        if let Some(existing) = self
            .areas
            .values()
            .find(|existing| existing.bounding_box.overlaps(&candidate.bounding_box))
        {
            return Err(AreaRejection::Overlaps(existing.label.clone()));
        }
        Ok(())
    }

    /// Add an area after checking it. The area keeps the occupants it carries.
    pub fn insert(&mut self, area: ConversationArea) -> Result<&ConversationArea, AreaRejection> {
        self.check(&area)?;
        let label = area.label.clone();
        let inserted: &ConversationArea = self.areas.entry(label).or_insert(area);
        Ok(inserted)
    }

    /// Add a player to an area. Returns the updated area, or `None` if the
    /// label is unknown.
    pub fn add_occupant(&mut self, label: &str, player: PlayerId) -> Option<&ConversationArea> {
        let area = self.areas.get_mut(label)?;
        area.occupants_by_id.insert(player);
        Some(&*area)
    }

    /// Remove a player from an area, destroying it if it becomes empty.
    ///
    /// Returns `None` if the label is unknown.
    pub fn remove_occupant(&mut self, label: &str, player: PlayerId) -> Option<Departure<'_>> {
        let area = self.areas.get_mut(label)?;
        area.occupants_by_id.remove(&player);
        if area.occupants_by_id.is_empty() {
            return self.areas.remove(label).map(Departure::Destroyed);
        }
        self.areas.get(label).map(Departure::Updated)
    }
}
