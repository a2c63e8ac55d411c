/// Outbound integration points: action handlers and custom condition checkers.
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::schema::action::{ActionKind, StoryAction};
use crate::schema::snapshot::{GameState, PlayerStats};

/// Receives story actions and applies them to a subsystem outside the
/// engine (messaging, quest log, combat, rewards, ...).
///
/// Handlers are fire-and-forget: the engine never inspects what they do.
pub trait ActionHandler {
    fn handle(&mut self, action: &StoryAction);
}

impl<F> ActionHandler for F
where
    F: FnMut(&StoryAction),
{
    fn handle(&mut self, action: &StoryAction) {
        self(action)
    }
}

/// Handler registry keyed by action kind.
#[derive(Default)]
pub struct ActionHandlers {
    handlers: FxHashMap<ActionKind, Box<dyn ActionHandler>>,
}

impl ActionHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for the same kind.
    pub fn register<H>(&mut self, kind: ActionKind, handler: H)
    where
        H: ActionHandler + 'static,
    {
        self.handlers.insert(kind, Box::new(handler));
    }

    pub fn contains(&self, kind: &ActionKind) -> bool {
        self.handlers.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Route each action, in order, to its handler. Actions without a
    /// handler are skipped. Returns the number of actions handled.
    pub fn dispatch(&mut self, actions: &[StoryAction]) -> usize {
        let mut handled = 0;
        for action in actions {
            let kind = action.kind();
            match self.handlers.get_mut(&kind) {
                Some(handler) => {
                    handler.handle(action);
                    handled += 1;
                }
                None => debug!(action = %kind, "no handler registered, skipping"),
            }
        }
        handled
    }
}

impl std::fmt::Debug for ActionHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionHandlers")
            .field("kinds", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

type CheckerFn = dyn Fn(Option<&str>, &PlayerStats, &GameState) -> bool;

/// Checkers for host-defined `custom` completion conditions, keyed by name.
#[derive(Default)]
pub struct ConditionCheckers {
    checkers: FxHashMap<String, Box<CheckerFn>>,
}

impl ConditionCheckers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, checker: F)
    where
        F: Fn(Option<&str>, &PlayerStats, &GameState) -> bool + 'static,
    {
        self.checkers.insert(name.to_string(), Box::new(checker));
    }

    /// Evaluate the checker registered under `name`. An unknown name is
    /// never satisfied.
    pub fn check(
        &self,
        name: &str,
        target: Option<&str>,
        player: &PlayerStats,
        game: &GameState,
    ) -> bool {
        match self.checkers.get(name) {
            Some(checker) => checker(target, player, game),
            None => {
                debug!(condition = name, "no checker registered, condition unmet");
                false
            }
        }
    }
}

impl std::fmt::Debug for ConditionCheckers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionCheckers")
            .field("names", &self.checkers.keys().collect::<Vec<_>>())
            .finish()
    }
}
