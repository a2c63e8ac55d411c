use serde::{Deserialize, Serialize};

use super::action::ObjectiveSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    #[default]
    Active,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

impl From<&ObjectiveSpec> for Objective {
    fn from(spec: &ObjectiveSpec) -> Self {
        Self {
            id: spec.id.clone(),
            text: spec.text.clone(),
            completed: false,
        }
    }
}

/// A quest record created by an `activate_quest` action.
///
/// The engine only creates quests and adds objectives; completing them is
/// left to the host's quest log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    pub title: String,
    pub description: String,
    pub objectives: Vec<Objective>,
    #[serde(default)]
    pub status: QuestStatus,
}

impl Quest {
    /// Add an objective, or replace the text of one with the same id.
    pub fn set_objective(&mut self, id: &str, text: &str) {
        match self.objectives.iter_mut().find(|o| o.id == id) {
            Some(existing) => existing.text = text.to_string(),
            None => self.objectives.push(Objective {
                id: id.to_string(),
                text: text.to_string(),
                completed: false,
            }),
        }
    }
}
