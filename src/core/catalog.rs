/// Episode definitions: loading, merging, and structural validation.
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::schema::action::StoryAction;
use crate::schema::episode::{Episode, EpisodeId};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported episode file '{0}': expected .ron or .json")]
    UnsupportedFormat(String),
    #[error("episode has an empty id")]
    EmptyId,
    #[error("episode '{0}' has no beats")]
    NoBeats(EpisodeId),
    #[error("episode '{0}' requires itself to be completed")]
    SelfPrerequisite(EpisodeId),
    #[error("episode '{episode}', beat {beat}: {reason}")]
    InvalidBeat {
        episode: EpisodeId,
        beat: usize,
        reason: String,
    },
}

/// Check an episode definition for structural problems that would leave
/// it stuck or feed bad identifiers to handlers.
pub fn validate_episode(episode: &Episode) -> Result<(), CatalogError> {
    if episode.id.as_str().trim().is_empty() {
        return Err(CatalogError::EmptyId);
    }
    if episode.beats.is_empty() {
        return Err(CatalogError::NoBeats(episode.id.clone()));
    }
    if episode.prerequisite.completed_episodes.contains(&episode.id) {
        return Err(CatalogError::SelfPrerequisite(episode.id.clone()));
    }

    let invalid = |beat: usize, reason: String| CatalogError::InvalidBeat {
        episode: episode.id.clone(),
        beat,
        reason,
    };

    for (index, beat) in episode.beats.iter().enumerate() {
        if beat.completion_condition.is_malformed() {
            return Err(invalid(
                index,
                format!(
                    "'{}' condition is missing its target",
                    beat.completion_condition.tag()
                ),
            ));
        }
        for action in &beat.actions {
            if let Some(field) = action.missing_identifier() {
                return Err(invalid(
                    index,
                    format!("'{}' action has an empty '{}'", action.kind(), field),
                ));
            }
            if let StoryAction::ActivateQuest {
                quest_id,
                objectives,
                ..
            } = action
            {
                let mut seen = FxHashSet::default();
                for objective in objectives {
                    if !seen.insert(objective.id.as_str()) {
                        return Err(invalid(
                            index,
                            format!(
                                "quest '{}' declares objective '{}' twice",
                                quest_id, objective.id
                            ),
                        ));
                    }
                }
            }
        }
    }
    Ok(())
}

/// An ordered set of episode definitions. Ids are unique; order is the
/// order episodes were first added.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpisodeCatalog {
    pub episodes: Vec<Episode>,
}

impl EpisodeCatalog {
    /// Load a catalog from a `.ron` or `.json` file.
    pub fn load(path: &Path) -> Result<EpisodeCatalog, CatalogError> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("ron") => Self::load_from_ron(path),
            Some("json") => Self::load_from_json(path),
            _ => Err(CatalogError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Load a catalog from a RON file containing a list of episodes.
    pub fn load_from_ron(path: &Path) -> Result<EpisodeCatalog, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Load a catalog from a JSON file containing an array of episodes.
    pub fn load_from_json(path: &Path) -> Result<EpisodeCatalog, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_json(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<EpisodeCatalog, CatalogError> {
        let episodes: Vec<Episode> = ron::from_str(input)?;
        Ok(Self::from_episodes(episodes))
    }

    pub fn parse_json(input: &str) -> Result<EpisodeCatalog, CatalogError> {
        let episodes: Vec<Episode> = serde_json::from_str(input)?;
        Ok(Self::from_episodes(episodes))
    }

    /// Build a catalog from a list, collapsing duplicate ids (later wins).
    pub fn from_episodes(episodes: Vec<Episode>) -> EpisodeCatalog {
        let mut catalog = EpisodeCatalog::default();
        for episode in episodes {
            catalog.insert(episode);
        }
        catalog
    }

    /// Insert an episode, replacing one with the same id in place.
    pub fn insert(&mut self, episode: Episode) {
        match self.episodes.iter_mut().find(|e| e.id == episode.id) {
            Some(existing) => {
                warn!(episode = %episode.id, "duplicate episode id, later definition wins");
                *existing = episode;
            }
            None => self.episodes.push(episode),
        }
    }

    /// Merge another catalog into this one. Episodes from `other`
    /// override episodes in `self` with the same id.
    pub fn merge(&mut self, other: EpisodeCatalog) {
        for episode in other.episodes {
            self.insert(episode);
        }
    }

    pub fn get(&self, id: &EpisodeId) -> Option<&Episode> {
        self.episodes.iter().find(|e| &e.id == id)
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// Validate every episode, stopping at the first problem.
    pub fn validate(&self) -> Result<(), CatalogError> {
        self.episodes.iter().try_for_each(validate_episode)
    }

    /// `(episode, missing)` pairs where a prerequisite names an episode
    /// that is not in this catalog. Such episodes can never unlock.
    pub fn dangling_prerequisites(&self) -> Vec<(EpisodeId, EpisodeId)> {
        let known: FxHashSet<&EpisodeId> = self.episodes.iter().map(|e| &e.id).collect();
        let mut dangling = Vec::new();
        for episode in &self.episodes {
            for required in &episode.prerequisite.completed_episodes {
                if !known.contains(required) {
                    dangling.push((episode.id.clone(), required.clone()));
                }
            }
        }
        dangling
    }
}

/// Every `.ron` and `.json` file under `dir`, subdirectories included,
/// sorted by path.
pub fn episode_files(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut files = Vec::new();
    collect_episode_files(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_episode_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), std::io::Error> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_episode_files(&path, files)?;
        } else if matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("ron") | Some("json")
        ) {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::action::ObjectiveSpec;
    use crate::schema::condition::{CompletionCondition, EpisodePrerequisite};
    use crate::schema::episode::{EpisodeStatus, StoryBeat};

    fn make_episode(id: &str, title: &str) -> Episode {
        Episode {
            id: EpisodeId::from(id),
            title: title.to_string(),
            prerequisite: EpisodePrerequisite::default(),
            beats: vec![StoryBeat {
                actions: Vec::new(),
                completion_condition: CompletionCondition::EndEpisode,
            }],
            status: EpisodeStatus::Inactive,
            current_beat_index: 0,
        }
    }

    #[test]
    fn parse_ron_list() {
        let input = r#"[
            (
                id: "E1",
                title: "Coffee",
                prerequisite: (affection_level: Some(5)),
                beats: [
                    (
                        actions: [
                            deliver_message(sender: "cha_hae_in", text: "Coffee?"),
                        ],
                        completion_condition: boss_defeated(target: "B1"),
                    ),
                ],
            ),
        ]"#;
        let catalog = EpisodeCatalog::parse_ron(input).unwrap();
        assert_eq!(catalog.len(), 1);
        let episode = catalog.get(&EpisodeId::from("E1")).unwrap();
        assert_eq!(episode.prerequisite.affection_level, Some(5));
        assert_eq!(episode.beats[0].actions.len(), 1);
        assert_eq!(episode.status, EpisodeStatus::Inactive);
    }

    #[test]
    fn parse_json_array() {
        let input = r#"[
            {
                "id": "E2",
                "prerequisite": {"completed_episodes": ["E1"]},
                "beats": [
                    {"completion_condition": "end_episode"}
                ]
            }
        ]"#;
        let catalog = EpisodeCatalog::parse_json(input).unwrap();
        let episode = catalog.get(&EpisodeId::from("E2")).unwrap();
        assert!(episode.title.is_empty());
        assert!(episode.beats[0].actions.is_empty());
        assert_eq!(
            episode.beats[0].completion_condition,
            CompletionCondition::EndEpisode
        );
    }

    #[test]
    fn unsupported_extension() {
        let err = EpisodeCatalog::load(Path::new("episodes.yaml")).unwrap_err();
        assert!(matches!(err, CatalogError::UnsupportedFormat(_)));
    }

    #[test]
    fn merge_precedence_keeps_position() {
        let mut base =
            EpisodeCatalog::from_episodes(vec![make_episode("a", "base a"), make_episode("b", "b")]);
        let other =
            EpisodeCatalog::from_episodes(vec![make_episode("c", "c"), make_episode("a", "new a")]);
        base.merge(other);

        let ids: Vec<&str> = base.episodes.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(base.episodes[0].title, "new a");
    }

    #[test]
    fn validate_rejects_empty_id_and_no_beats() {
        let mut episode = make_episode("  ", "blank");
        assert!(matches!(validate_episode(&episode), Err(CatalogError::EmptyId)));

        episode.id = EpisodeId::from("empty");
        episode.beats.clear();
        assert!(matches!(validate_episode(&episode), Err(CatalogError::NoBeats(_))));
    }

    #[test]
    fn validate_rejects_self_prerequisite() {
        let mut episode = make_episode("loop", "loop");
        episode.prerequisite.completed_episodes.push(EpisodeId::from("loop"));
        assert!(matches!(
            validate_episode(&episode),
            Err(CatalogError::SelfPrerequisite(_))
        ));
    }

    #[test]
    fn validate_rejects_bad_beats() {
        let mut episode = make_episode("raid", "raid");
        episode.beats[0].completion_condition = CompletionCondition::BossDefeated {
            target: String::new(),
        };
        assert!(matches!(
            validate_episode(&episode),
            Err(CatalogError::InvalidBeat { beat: 0, .. })
        ));

        episode.beats[0].completion_condition = CompletionCondition::EndEpisode;
        episode.beats[0].actions.push(StoryAction::StartBossBattle {
            boss_id: String::new(),
        });
        let err = validate_episode(&episode).unwrap_err();
        assert!(err.to_string().contains("boss_id"));
    }

    #[test]
    fn validate_rejects_duplicate_objectives() {
        let mut episode = make_episode("quest", "quest");
        let objective = ObjectiveSpec {
            id: "o1".to_string(),
            text: "Find her".to_string(),
        };
        episode.beats[0].actions.push(StoryAction::ActivateQuest {
            quest_id: "q1".to_string(),
            title: "Q".to_string(),
            description: String::new(),
            objectives: vec![objective.clone(), objective],
        });
        let err = validate_episode(&episode).unwrap_err();
        assert!(err.to_string().contains("twice"));
    }

    #[test]
    fn dangling_prerequisites_are_reported() {
        let mut e2 = make_episode("E2", "E2");
        e2.prerequisite.completed_episodes =
            vec![EpisodeId::from("E1"), EpisodeId::from("ghost")];
        let catalog = EpisodeCatalog::from_episodes(vec![make_episode("E1", "E1"), e2]);

        assert!(catalog.validate().is_ok());
        assert_eq!(
            catalog.dangling_prerequisites(),
            vec![(EpisodeId::from("E2"), EpisodeId::from("ghost"))]
        );
    }
}
