/// Player and world snapshots read by prerequisite and completion checks.
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// The slice of player stats the story engine reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    pub level: u32,
    pub affection_level: u32,
    pub relationship_status: Option<String>,
    pub inventory: FxHashSet<String>,
}

impl PlayerStats {
    pub fn with_level(level: u32) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    pub fn with_affection(affection_level: u32) -> Self {
        Self {
            affection_level,
            ..Default::default()
        }
    }

    pub fn has_item(&self, item: &str) -> bool {
        self.inventory.contains(item)
    }
}

/// The slice of world state the story engine reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    pub current_location: Option<String>,
    pub time_of_day: Option<String>,
    pub quest_accepted: bool,
    pub completed_dialogues: FxHashSet<String>,
    pub defeated_bosses: FxHashSet<String>,
    pub visited_locations: FxHashSet<String>,
    pub completed_activities: FxHashSet<String>,
}

impl GameState {
    pub fn is_at(&self, location: &str) -> bool {
        self.current_location.as_deref() == Some(location)
    }

    /// True if the location was visited before or is the current location.
    pub fn has_visited(&self, location: &str) -> bool {
        self.visited_locations.contains(location) || self.is_at(location)
    }
}
