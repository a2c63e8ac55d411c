use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::value::Value;

/// An objective as declared inside an `activate_quest` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveSpec {
    pub id: String,
    pub text: String,
}

/// A side-effecting instruction handed to an external subsystem when a
/// beat becomes current.
///
/// The engine does not interpret payloads. It routes each action to the
/// handler registered for its [`ActionKind`]; the only exception is quest
/// bookkeeping for `ActivateQuest` and `SetQuestObjective`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryAction {
    DeliverMessage {
        sender: String,
        text: String,
    },
    ActivateQuest {
        quest_id: String,
        title: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        objectives: Vec<ObjectiveSpec>,
    },
    SetCharacterMood {
        character: String,
        mood: String,
    },
    ForceCharacterLocation {
        character: String,
        location: String,
    },
    StartDialogueScene {
        scene_id: String,
    },
    SetQuestObjective {
        quest_id: String,
        objective_id: String,
        text: String,
    },
    LoadDungeonEnvironment {
        dungeon_id: String,
    },
    StartBossBattle {
        boss_id: String,
    },
    RewardPlayer {
        #[serde(default)]
        experience: u32,
        #[serde(default)]
        gold: u32,
        #[serde(default)]
        affection: i32,
        #[serde(default)]
        items: Vec<String>,
    },
    CreateMemoryStar {
        memory_id: String,
        title: String,
        #[serde(default)]
        description: String,
    },
    UnlockActivity {
        activity_id: String,
    },
    SetCurrentLocation {
        location: String,
    },
    ShowNotification {
        title: String,
        message: String,
    },
    /// Host-defined action, routed by name.
    Custom {
        name: String,
        #[serde(default)]
        payload: HashMap<String, Value>,
    },
}

/// Payload-free discriminator of a [`StoryAction`], used as the handler key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionKind {
    DeliverMessage,
    ActivateQuest,
    SetCharacterMood,
    ForceCharacterLocation,
    StartDialogueScene,
    SetQuestObjective,
    LoadDungeonEnvironment,
    StartBossBattle,
    RewardPlayer,
    CreateMemoryStar,
    UnlockActivity,
    SetCurrentLocation,
    ShowNotification,
    Custom(String),
}

impl ActionKind {
    /// Returns the snake_case tag used in episode data (e.g., "start_boss_battle").
    pub fn tag(&self) -> &str {
        match self {
            Self::DeliverMessage => "deliver_message",
            Self::ActivateQuest => "activate_quest",
            Self::SetCharacterMood => "set_character_mood",
            Self::ForceCharacterLocation => "force_character_location",
            Self::StartDialogueScene => "start_dialogue_scene",
            Self::SetQuestObjective => "set_quest_objective",
            Self::LoadDungeonEnvironment => "load_dungeon_environment",
            Self::StartBossBattle => "start_boss_battle",
            Self::RewardPlayer => "reward_player",
            Self::CreateMemoryStar => "create_memory_star",
            Self::UnlockActivity => "unlock_activity",
            Self::SetCurrentLocation => "set_current_location",
            Self::ShowNotification => "show_notification",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl StoryAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::DeliverMessage { .. } => ActionKind::DeliverMessage,
            Self::ActivateQuest { .. } => ActionKind::ActivateQuest,
            Self::SetCharacterMood { .. } => ActionKind::SetCharacterMood,
            Self::ForceCharacterLocation { .. } => ActionKind::ForceCharacterLocation,
            Self::StartDialogueScene { .. } => ActionKind::StartDialogueScene,
            Self::SetQuestObjective { .. } => ActionKind::SetQuestObjective,
            Self::LoadDungeonEnvironment { .. } => ActionKind::LoadDungeonEnvironment,
            Self::StartBossBattle { .. } => ActionKind::StartBossBattle,
            Self::RewardPlayer { .. } => ActionKind::RewardPlayer,
            Self::CreateMemoryStar { .. } => ActionKind::CreateMemoryStar,
            Self::UnlockActivity { .. } => ActionKind::UnlockActivity,
            Self::SetCurrentLocation { .. } => ActionKind::SetCurrentLocation,
            Self::ShowNotification { .. } => ActionKind::ShowNotification,
            Self::Custom { name, .. } => ActionKind::Custom(name.clone()),
        }
    }

    /// Name of the first identifier field that is empty, if any.
    ///
    /// Free text (message bodies, descriptions) may be empty; identifiers
    /// that another subsystem looks up may not.
    pub fn missing_identifier(&self) -> Option<&'static str> {
        let required: Vec<(&'static str, &str)> = match self {
            Self::DeliverMessage { sender, .. } => vec![("sender", sender.as_str())],
            Self::ActivateQuest { quest_id, .. } => vec![("quest_id", quest_id.as_str())],
            Self::SetCharacterMood { character, mood } => {
                vec![("character", character.as_str()), ("mood", mood.as_str())]
            }
            Self::ForceCharacterLocation {
                character,
                location,
            } => vec![("character", character.as_str()), ("location", location.as_str())],
            Self::StartDialogueScene { scene_id } => vec![("scene_id", scene_id.as_str())],
            Self::SetQuestObjective {
                quest_id,
                objective_id,
                ..
            } => vec![("quest_id", quest_id.as_str()), ("objective_id", objective_id.as_str())],
            Self::LoadDungeonEnvironment { dungeon_id } => vec![("dungeon_id", dungeon_id.as_str())],
            Self::StartBossBattle { boss_id } => vec![("boss_id", boss_id.as_str())],
            Self::RewardPlayer { .. } => Vec::new(),
            Self::CreateMemoryStar { memory_id, .. } => vec![("memory_id", memory_id.as_str())],
            Self::UnlockActivity { activity_id } => vec![("activity_id", activity_id.as_str())],
            Self::SetCurrentLocation { location } => vec![("location", location.as_str())],
            Self::ShowNotification { title, .. } => vec![("title", title.as_str())],
            Self::Custom { name, .. } => vec![("name", name.as_str())],
        };
        required
            .iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| *field)
    }
}
