/// The story progression engine: episode lifecycle, beat advancement,
/// and action dispatch.
///
/// Owns the registered episodes and the progression state, and calls
/// into the host's action handlers.
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::catalog::{episode_files, validate_episode, CatalogError, EpisodeCatalog};
use crate::core::dispatch::{ActionHandler, ActionHandlers, ConditionCheckers};
use crate::schema::action::{ActionKind, StoryAction};
use crate::schema::episode::{Episode, EpisodeId, EpisodeStatus};
use crate::schema::quest::{Objective, Quest, QuestStatus};
use crate::schema::snapshot::{GameState, PlayerStats};
use crate::schema::value::Value;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Story progression for one save slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeState {
    pub active_episodes: Vec<EpisodeId>,
    /// Append-only log of finished episodes.
    pub completed_episodes: Vec<EpisodeId>,
    pub available_episodes: Vec<EpisodeId>,
    pub current_quests: Vec<Quest>,
    pub story_flags: FxHashMap<String, Value>,
}

/// Result of [`StoryEngine::accept_episode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    Accepted,
    NotFound,
    /// The episode exists but is not available; nothing changed.
    WrongState(EpisodeStatus),
}

/// What happened during one [`StoryEngine::update`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Episodes promoted from inactive to available.
    pub unlocked: Vec<EpisodeId>,
    /// Episodes that moved on to their next beat.
    pub advanced: Vec<EpisodeId>,
    /// Episodes that finished their last beat.
    pub completed: Vec<EpisodeId>,
    /// Actions that reached a registered handler.
    pub actions_dispatched: usize,
}

impl UpdateReport {
    pub fn is_empty(&self) -> bool {
        self.unlocked.is_empty() && self.advanced.is_empty() && self.completed.is_empty()
    }
}

/// The episodic story engine. Built via `StoryEngine::builder()`.
///
/// One instance per game session; the host owns it and drives it by
/// calling [`update`](Self::update) with fresh snapshots.
pub struct StoryEngine {
    episodes: FxHashMap<EpisodeId, Episode>,
    /// Registration order, used for deterministic sweeps.
    order: Vec<EpisodeId>,
    state: EpisodeState,
    handlers: ActionHandlers,
    checkers: ConditionCheckers,
}

/// Builder for constructing a `StoryEngine`.
pub struct StoryEngineBuilder {
    episode_files: Vec<PathBuf>,
    episodes_dir: Option<PathBuf>,
    /// Directly provided episodes (for testing without files).
    episodes: Vec<Episode>,
    handlers: ActionHandlers,
    checkers: ConditionCheckers,
}

impl StoryEngine {
    pub fn builder() -> StoryEngineBuilder {
        StoryEngineBuilder {
            episode_files: Vec::new(),
            episodes_dir: None,
            episodes: Vec::new(),
            handlers: ActionHandlers::new(),
            checkers: ConditionCheckers::new(),
        }
    }

    /// Insert or overwrite an episode definition.
    ///
    /// The stored copy always starts `Inactive` at beat 0. Re-registering
    /// an id drops it from the available and active lists; the completed
    /// log is left as is.
    pub fn register_episode(&mut self, mut episode: Episode) -> Result<(), CatalogError> {
        if let Err(e) = validate_episode(&episode) {
            warn!(episode = %episode.id, error = %e, "episode rejected");
            return Err(e);
        }

        episode.status = EpisodeStatus::Inactive;
        episode.current_beat_index = 0;

        let id = episode.id.clone();
        if self.episodes.insert(id.clone(), episode).is_some() {
            self.state.available_episodes.retain(|e| e != &id);
            self.state.active_episodes.retain(|e| e != &id);
            debug!(episode = %id, "episode re-registered");
        } else {
            self.order.push(id);
        }
        Ok(())
    }

    /// Register every episode in a catalog, in catalog order.
    ///
    /// The whole catalog is validated first; if any episode is rejected
    /// the engine is left unchanged.
    pub fn register_catalog(&mut self, catalog: EpisodeCatalog) -> Result<(), CatalogError> {
        if let Err(e) = catalog.validate() {
            warn!(error = %e, "catalog rejected");
            return Err(e);
        }
        for episode in catalog.episodes {
            self.register_episode(episode)?;
        }
        Ok(())
    }

    /// Advance the story against the current snapshots.
    ///
    /// First promotes every inactive episode whose prerequisite holds
    /// (firing its beat-0 actions), then checks the current beat of each
    /// active episode and advances at most one beat per episode.
    pub fn update(&mut self, player: &PlayerStats, game: &GameState) -> UpdateReport {
        let mut report = UpdateReport::default();

        let unlocked: Vec<EpisodeId> = self
            .order
            .iter()
            .filter(|id| {
                self.episodes.get(*id).map_or(false, |episode| {
                    episode.status == EpisodeStatus::Inactive
                        && episode.prerequisite.is_satisfied(
                            player,
                            game,
                            &self.state.completed_episodes,
                        )
                })
            })
            .cloned()
            .collect();

        for id in unlocked {
            if let Some(episode) = self.episodes.get_mut(&id) {
                episode.status = EpisodeStatus::Available;
            }
            self.state.available_episodes.push(id.clone());
            info!(episode = %id, "episode available");
            report.actions_dispatched += self.run_current_beat(&id);
            report.unlocked.push(id);
        }

        let active = self.state.active_episodes.clone();
        for id in active {
            let ready = self
                .episodes
                .get(&id)
                .and_then(|episode| episode.current_beat())
                .map_or(false, |beat| {
                    beat.completion_condition
                        .is_satisfied(player, game, &self.checkers)
                });
            if ready {
                self.complete_beat(&id, &mut report);
            }
        }

        report
    }

    /// Move an available episode to active.
    pub fn accept_episode(&mut self, id: &EpisodeId) -> AcceptOutcome {
        let Some(episode) = self.episodes.get_mut(id) else {
            debug!(episode = %id, "accept ignored, unknown episode");
            return AcceptOutcome::NotFound;
        };
        if episode.status != EpisodeStatus::Available {
            debug!(episode = %id, status = %episode.status, "accept ignored");
            return AcceptOutcome::WrongState(episode.status);
        }

        episode.status = EpisodeStatus::Active;
        self.state.available_episodes.retain(|e| e != id);
        self.state.active_episodes.push(id.clone());
        info!(episode = %id, "episode accepted");
        AcceptOutcome::Accepted
    }

    /// Finish the current beat of an active episode. Completes the
    /// episode after its last beat, otherwise fires the next beat.
    fn complete_beat(&mut self, id: &EpisodeId, report: &mut UpdateReport) {
        let Some(episode) = self.episodes.get_mut(id) else {
            return;
        };
        if episode.status != EpisodeStatus::Active {
            return;
        }

        episode.current_beat_index += 1;
        if episode.is_finished() {
            episode.status = EpisodeStatus::Completed;
            self.state.active_episodes.retain(|e| e != id);
            if !self.state.completed_episodes.contains(id) {
                self.state.completed_episodes.push(id.clone());
            }
            info!(episode = %id, "episode completed");
            report.completed.push(id.clone());
        } else {
            debug!(episode = %id, beat = episode.current_beat_index, "beat advanced");
            report.actions_dispatched += self.run_current_beat(id);
            report.advanced.push(id.clone());
        }
    }

    /// Execute the actions of an episode's current beat, in order.
    fn run_current_beat(&mut self, id: &EpisodeId) -> usize {
        let Some(beat) = self
            .episodes
            .get(id)
            .and_then(|episode| episode.current_beat())
        else {
            return 0;
        };

        for action in &beat.actions {
            record_quest(&mut self.state.current_quests, action);
        }
        self.handlers.dispatch(&beat.actions)
    }

    /// Active episodes, in acceptance order.
    pub fn active_episodes(&self) -> Vec<&Episode> {
        self.resolve(&self.state.active_episodes)
    }

    /// Available episodes, in unlock order.
    pub fn available_episodes(&self) -> Vec<&Episode> {
        self.resolve(&self.state.available_episodes)
    }

    fn resolve(&self, ids: &[EpisodeId]) -> Vec<&Episode> {
        ids.iter().filter_map(|id| self.episodes.get(id)).collect()
    }

    pub fn episode(&self, id: &EpisodeId) -> Option<&Episode> {
        self.episodes.get(id)
    }

    /// All registered episodes, in registration order.
    pub fn episodes(&self) -> impl Iterator<Item = &Episode> {
        self.order.iter().filter_map(|id| self.episodes.get(id))
    }

    /// Quests that are still active.
    pub fn current_quests(&self) -> Vec<&Quest> {
        self.state
            .current_quests
            .iter()
            .filter(|q| q.status == QuestStatus::Active)
            .collect()
    }

    /// A copy of the whole progression state.
    pub fn episode_state(&self) -> EpisodeState {
        self.state.clone()
    }

    pub fn story_flag(&self, key: &str) -> Option<&Value> {
        self.state.story_flags.get(key)
    }

    pub fn set_story_flag(&mut self, key: &str, value: impl Into<Value>) {
        self.state.story_flags.insert(key.to_string(), value.into());
    }

    pub fn has_handler(&self, kind: &ActionKind) -> bool {
        self.handlers.contains(kind)
    }
}

/// Quest bookkeeping done by the engine itself before dispatch.
fn record_quest(quests: &mut Vec<Quest>, action: &StoryAction) {
    match action {
        StoryAction::ActivateQuest {
            quest_id,
            title,
            description,
            objectives,
        } => {
            let quest = Quest {
                id: quest_id.clone(),
                title: title.clone(),
                description: description.clone(),
                objectives: objectives.iter().map(Objective::from).collect(),
                status: QuestStatus::Active,
            };
            match quests.iter_mut().find(|q| &q.id == quest_id) {
                Some(existing) => *existing = quest,
                None => quests.push(quest),
            }
        }
        StoryAction::SetQuestObjective {
            quest_id,
            objective_id,
            text,
        } => match quests.iter_mut().find(|q| &q.id == quest_id) {
            Some(quest) => quest.set_objective(objective_id, text),
            None => debug!(quest = %quest_id, "objective for unknown quest ignored"),
        },
        _ => {}
    }
}

impl std::fmt::Debug for StoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryEngine")
            .field("episodes", &self.order)
            .field("state", &self.state)
            .field("handlers", &self.handlers)
            .field("checkers", &self.checkers)
            .finish()
    }
}

impl StoryEngineBuilder {
    /// Load episodes from a single `.ron` or `.json` file.
    pub fn episodes_file(mut self, path: impl AsRef<Path>) -> Self {
        self.episode_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Load every `.ron` and `.json` file under a directory, subdirectories
    /// included, in path order.
    pub fn episodes_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.episodes_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Provide episodes directly (for testing without files).
    pub fn with_episodes(mut self, episodes: Vec<Episode>) -> Self {
        self.episodes.extend(episodes);
        self
    }

    /// Register the handler for one action kind.
    pub fn on<H>(mut self, kind: ActionKind, handler: H) -> Self
    where
        H: ActionHandler + 'static,
    {
        self.handlers.register(kind, handler);
        self
    }

    /// Register a checker for `custom` completion conditions named `name`.
    pub fn checker<F>(mut self, name: &str, checker: F) -> Self
    where
        F: Fn(Option<&str>, &PlayerStats, &GameState) -> bool + 'static,
    {
        self.checkers.register(name, checker);
        self
    }

    pub fn build(self) -> Result<StoryEngine, EngineError> {
        let mut catalog = EpisodeCatalog::default();

        if let Some(ref dir) = self.episodes_dir {
            for path in episode_files(dir)? {
                catalog.merge(EpisodeCatalog::load(&path)?);
            }
        }

        // Explicit files override the directory
        for path in &self.episode_files {
            catalog.merge(EpisodeCatalog::load(path)?);
        }

        // Direct episodes override everything loaded from disk
        catalog.merge(EpisodeCatalog::from_episodes(self.episodes));

        let mut engine = StoryEngine {
            episodes: FxHashMap::default(),
            order: Vec::new(),
            state: EpisodeState::default(),
            handlers: self.handlers,
            checkers: self.checkers,
        };
        engine.register_catalog(catalog)?;

        info!(
            episodes = engine.order.len(),
            handlers = engine.handlers.len(),
            "story engine ready"
        );
        Ok(engine)
    }
}
