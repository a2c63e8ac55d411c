use serde::{Deserialize, Serialize};

use super::episode::EpisodeId;

/// AND-predicate gating an episode's promotion to available.
///
/// Every unset field is vacuously true.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodePrerequisite {
    /// Minimum player level.
    pub player_level: Option<u32>,
    /// Minimum affection level.
    pub affection_level: Option<u32>,
    /// Episodes that must all be completed, in any order.
    pub completed_episodes: Vec<EpisodeId>,
    pub relationship_status: Option<String>,
    pub location: Option<String>,
    pub time_of_day: Option<String>,
}

impl EpisodePrerequisite {
    /// True when no field is set.
    pub fn is_unconditional(&self) -> bool {
        self.player_level.is_none()
            && self.affection_level.is_none()
            && self.completed_episodes.is_empty()
            && self.relationship_status.is_none()
            && self.location.is_none()
            && self.time_of_day.is_none()
    }
}

/// The predicate that ends a beat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionCondition {
    PlayerAccept,
    DialogueComplete { target: String },
    BossDefeated { target: String },
    LocationVisited { target: String },
    ItemObtained { target: String },
    ActivityCompleted { target: String },
    /// Terminal beat; completes as soon as it is checked.
    EndEpisode,
    /// Host-defined condition, evaluated by a checker registered by name.
    Custom {
        name: String,
        #[serde(default)]
        target: Option<String>,
    },
}

impl CompletionCondition {
    /// Returns the snake_case tag used in episode data.
    pub fn tag(&self) -> &str {
        match self {
            Self::PlayerAccept => "player_accept",
            Self::DialogueComplete { .. } => "dialogue_complete",
            Self::BossDefeated { .. } => "boss_defeated",
            Self::LocationVisited { .. } => "location_visited",
            Self::ItemObtained { .. } => "item_obtained",
            Self::ActivityCompleted { .. } => "activity_completed",
            Self::EndEpisode => "end_episode",
            Self::Custom { name, .. } => name,
        }
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            Self::DialogueComplete { target }
            | Self::BossDefeated { target }
            | Self::LocationVisited { target }
            | Self::ItemObtained { target }
            | Self::ActivityCompleted { target } => Some(target),
            Self::Custom { target, .. } => target.as_deref(),
            Self::PlayerAccept | Self::EndEpisode => None,
        }
    }

    /// True if a target-bearing condition has an empty target, or a custom
    /// condition has no name.
    pub fn is_malformed(&self) -> bool {
        match self {
            Self::PlayerAccept | Self::EndEpisode => false,
            Self::Custom { name, .. } => name.trim().is_empty(),
            _ => self.target().map_or(true, |t| t.trim().is_empty()),
        }
    }
}
