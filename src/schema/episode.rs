use serde::{Deserialize, Serialize};
use std::fmt;

use super::action::StoryAction;
use super::condition::{CompletionCondition, EpisodePrerequisite};

/// Newtype wrapper for episode IDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpisodeId(pub String);

impl EpisodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for EpisodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle of an episode. Transitions only move forward:
/// `Inactive → Available → Active → Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeStatus {
    #[default]
    Inactive,
    Available,
    Active,
    Completed,
}

impl EpisodeStatus {
    /// Returns the lowercase label for this status (e.g., "available").
    pub fn label(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Available => "available",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for EpisodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// One step of an episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryBeat {
    #[serde(default)]
    pub actions: Vec<StoryAction>,
    pub completion_condition: CompletionCondition,
}

/// A unit of narrative content, gated by a prerequisite and played out
/// as an ordered sequence of beats.
///
/// `status` and `current_beat_index` are owned by the engine; whatever
/// values the source data carries are reset on registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub id: EpisodeId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub prerequisite: EpisodePrerequisite,
    pub beats: Vec<StoryBeat>,
    #[serde(default)]
    pub status: EpisodeStatus,
    #[serde(default)]
    pub current_beat_index: usize,
}

impl Episode {
    /// The beat under the cursor, or `None` once every beat is done.
    pub fn current_beat(&self) -> Option<&StoryBeat> {
        self.beats.get(self.current_beat_index)
    }

    pub fn is_finished(&self) -> bool {
        self.current_beat_index >= self.beats.len()
    }
}
