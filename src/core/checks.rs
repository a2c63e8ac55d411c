use crate::core::dispatch::ConditionCheckers;
use crate::schema::condition::{CompletionCondition, EpisodePrerequisite};
use crate::schema::episode::EpisodeId;
use crate::schema::snapshot::{GameState, PlayerStats};

impl EpisodePrerequisite {
    /// Evaluate against the supplied snapshots and the completed-episode log.
    ///
    /// `completed_episodes` is checked by set membership; ids missing from
    /// the log (including ids never registered) leave the predicate unmet.
    pub fn is_satisfied(
        &self,
        player: &PlayerStats,
        game: &GameState,
        completed: &[EpisodeId],
    ) -> bool {
        if let Some(level) = self.player_level {
            if player.level < level {
                return false;
            }
        }
        if let Some(affection) = self.affection_level {
            if player.affection_level < affection {
                return false;
            }
        }
        if !self
            .completed_episodes
            .iter()
            .all(|required| completed.contains(required))
        {
            return false;
        }
        if let Some(ref status) = self.relationship_status {
            if player.relationship_status.as_ref() != Some(status) {
                return false;
            }
        }
        if let Some(ref location) = self.location {
            if !game.is_at(location) {
                return false;
            }
        }
        if let Some(ref time) = self.time_of_day {
            if game.time_of_day.as_ref() != Some(time) {
                return false;
            }
        }
        true
    }
}

impl CompletionCondition {
    pub fn is_satisfied(
        &self,
        player: &PlayerStats,
        game: &GameState,
        checkers: &ConditionCheckers,
    ) -> bool {
        match self {
            Self::PlayerAccept => game.quest_accepted,
            Self::DialogueComplete { target } => game.completed_dialogues.contains(target),
            Self::BossDefeated { target } => game.defeated_bosses.contains(target),
            Self::LocationVisited { target } => game.has_visited(target),
            Self::ItemObtained { target } => player.has_item(target),
            Self::ActivityCompleted { target } => game.completed_activities.contains(target),
            Self::EndEpisode => true,
            Self::Custom { name, target } => {
                checkers.check(name, target.as_deref(), player, game)
            }
        }
    }
}
