/// Engine integration tests: episode lifecycle driven through `update`.

use story_engine::core::engine::{AcceptOutcome, StoryEngine};
use story_engine::schema::action::{ActionKind, StoryAction};
use story_engine::schema::condition::{CompletionCondition, EpisodePrerequisite};
use story_engine::schema::episode::{Episode, EpisodeId, EpisodeStatus, StoryBeat};
use story_engine::schema::snapshot::{GameState, PlayerStats};
use std::cell::RefCell;
use std::rc::Rc;

fn episode(id: &str, prerequisite: EpisodePrerequisite, beats: Vec<StoryBeat>) -> Episode {
    Episode {
        id: EpisodeId::from(id),
        title: String::new(),
        prerequisite,
        beats,
        status: EpisodeStatus::Inactive,
        current_beat_index: 0,
    }
}

fn message(text: &str) -> StoryAction {
    StoryAction::DeliverMessage {
        sender: "cha_hae_in".to_string(),
        text: text.to_string(),
    }
}

fn bosses(ids: &[&str]) -> GameState {
    GameState {
        defeated_bosses: ids.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

/// Engine recording every delivered message text.
fn engine_with_log(episodes: Vec<Episode>) -> (StoryEngine, Rc<RefCell<Vec<String>>>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let engine = StoryEngine::builder()
        .with_episodes(episodes)
        .on(ActionKind::DeliverMessage, move |action: &StoryAction| {
            if let StoryAction::DeliverMessage { text, .. } = action {
                sink.borrow_mut().push(text.clone());
            }
        })
        .build()
        .unwrap();
    (engine, log)
}

fn status(engine: &StoryEngine, id: &str) -> EpisodeStatus {
    engine.episode(&EpisodeId::from(id)).unwrap().status
}

#[test]
fn level_gate_unlocks_exactly_once() {
    let gated = episode(
        "level_ten",
        EpisodePrerequisite {
            player_level: Some(10),
            ..Default::default()
        },
        vec![StoryBeat {
            actions: vec![message("offer")],
            completion_condition: CompletionCondition::EndEpisode,
        }],
    );
    let (mut engine, log) = engine_with_log(vec![gated]);
    let game = GameState::default();

    engine.update(&PlayerStats::with_level(9), &game);
    assert_eq!(status(&engine, "level_ten"), EpisodeStatus::Inactive);
    assert!(log.borrow().is_empty());

    let report = engine.update(&PlayerStats::with_level(10), &game);
    assert_eq!(report.unlocked, vec![EpisodeId::from("level_ten")]);
    assert_eq!(status(&engine, "level_ten"), EpisodeStatus::Available);
    assert_eq!(*log.borrow(), vec!["offer"]);

    let report = engine.update(&PlayerStats::with_level(11), &game);
    assert!(report.unlocked.is_empty());
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn boss_episode_scenario_with_follow_up() {
    let e1 = episode(
        "E1",
        EpisodePrerequisite {
            affection_level: Some(5),
            ..Default::default()
        },
        vec![StoryBeat {
            actions: vec![message("coffee?")],
            completion_condition: CompletionCondition::BossDefeated {
                target: "B1".to_string(),
            },
        }],
    );
    let e2 = episode(
        "E2",
        EpisodePrerequisite {
            completed_episodes: vec![EpisodeId::from("E1")],
            ..Default::default()
        },
        vec![StoryBeat {
            actions: vec![message("evening?")],
            completion_condition: CompletionCondition::EndEpisode,
        }],
    );
    let (mut engine, log) = engine_with_log(vec![e1, e2]);
    let e1_id = EpisodeId::from("E1");

    engine.update(&PlayerStats::with_affection(3), &GameState::default());
    assert_eq!(status(&engine, "E1"), EpisodeStatus::Inactive);

    engine.update(&PlayerStats::with_affection(6), &GameState::default());
    assert_eq!(status(&engine, "E1"), EpisodeStatus::Available);
    assert_eq!(*log.borrow(), vec!["coffee?"]);

    assert_eq!(engine.accept_episode(&e1_id), AcceptOutcome::Accepted);
    assert_eq!(status(&engine, "E1"), EpisodeStatus::Active);

    let report = engine.update(&PlayerStats::with_affection(6), &bosses(&["B2"]));
    assert!(report.is_empty());
    assert_eq!(status(&engine, "E1"), EpisodeStatus::Active);
    assert_eq!(status(&engine, "E2"), EpisodeStatus::Inactive);

    let report = engine.update(&PlayerStats::with_affection(6), &bosses(&["B1"]));
    assert_eq!(report.completed, vec![e1_id.clone()]);
    assert_eq!(status(&engine, "E1"), EpisodeStatus::Completed);
    // Completion lands after the prerequisite sweep of the same call
    assert_eq!(status(&engine, "E2"), EpisodeStatus::Inactive);

    let state = engine.episode_state();
    assert_eq!(state.completed_episodes, vec![e1_id.clone()]);
    assert!(!state.active_episodes.contains(&e1_id));

    let report = engine.update(&PlayerStats::with_affection(6), &bosses(&["B1"]));
    assert_eq!(report.unlocked, vec![EpisodeId::from("E2")]);
    assert_eq!(*log.borrow(), vec!["coffee?", "evening?"]);
}

#[test]
fn update_never_skips_states() {
    let single = episode(
        "single",
        EpisodePrerequisite::default(),
        vec![StoryBeat {
            actions: Vec::new(),
            completion_condition: CompletionCondition::EndEpisode,
        }],
    );
    let (mut engine, _) = engine_with_log(vec![single]);
    let player = PlayerStats::default();
    let game = GameState::default();

    engine.update(&player, &game);
    assert_eq!(status(&engine, "single"), EpisodeStatus::Available);

    // Satisfied condition, but never accepted: stays available
    for _ in 0..5 {
        engine.update(&player, &game);
    }
    assert_eq!(status(&engine, "single"), EpisodeStatus::Available);
    assert!(engine.episode_state().completed_episodes.is_empty());
}

#[test]
fn rejected_accepts_leave_lists_untouched() {
    let gated = episode(
        "gated",
        EpisodePrerequisite {
            player_level: Some(50),
            ..Default::default()
        },
        vec![StoryBeat {
            actions: Vec::new(),
            completion_condition: CompletionCondition::EndEpisode,
        }],
    );
    let (mut engine, _) = engine_with_log(vec![gated]);
    let before = engine.episode_state();

    assert_eq!(
        engine.accept_episode(&EpisodeId::from("gated")),
        AcceptOutcome::WrongState(EpisodeStatus::Inactive)
    );
    assert_eq!(
        engine.accept_episode(&EpisodeId::from("missing")),
        AcceptOutcome::NotFound
    );
    assert_eq!(engine.episode_state(), before);
}

#[test]
fn episode_state_is_an_independent_copy() {
    let single = episode(
        "single",
        EpisodePrerequisite::default(),
        vec![StoryBeat {
            actions: Vec::new(),
            completion_condition: CompletionCondition::EndEpisode,
        }],
    );
    let (mut engine, _) = engine_with_log(vec![single]);
    engine.update(&PlayerStats::default(), &GameState::default());

    let mut copy = engine.episode_state();
    copy.available_episodes.clear();
    copy.completed_episodes.push(EpisodeId::from("forged"));

    assert_eq!(engine.available_episodes().len(), 1);
    assert!(engine.episode_state().completed_episodes.is_empty());
    assert_eq!(
        engine.accept_episode(&EpisodeId::from("single")),
        AcceptOutcome::Accepted
    );
}

#[test]
fn simultaneous_episodes_progress_independently() {
    let make = |id: &str, boss: &str| {
        episode(
            id,
            EpisodePrerequisite::default(),
            vec![StoryBeat {
                actions: Vec::new(),
                completion_condition: CompletionCondition::BossDefeated {
                    target: boss.to_string(),
                },
            }],
        )
    };
    let (mut engine, _) = engine_with_log(vec![make("a", "B1"), make("b", "B2")]);
    let player = PlayerStats::default();

    engine.update(&player, &GameState::default());
    engine.accept_episode(&EpisodeId::from("a"));
    engine.accept_episode(&EpisodeId::from("b"));
    assert_eq!(engine.active_episodes().len(), 2);

    let report = engine.update(&player, &bosses(&["B2"]));
    assert_eq!(report.completed, vec![EpisodeId::from("b")]);
    let active: Vec<&str> = engine
        .active_episodes()
        .iter()
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(active, vec!["a"]);
}

#[test]
fn actions_without_handlers_do_not_block_the_beat() {
    let mixed = episode(
        "mixed",
        EpisodePrerequisite::default(),
        vec![StoryBeat {
            actions: vec![
                StoryAction::StartBossBattle {
                    boss_id: "igris".to_string(),
                },
                message("after the unhandled one"),
            ],
            completion_condition: CompletionCondition::EndEpisode,
        }],
    );
    let (mut engine, log) = engine_with_log(vec![mixed]);
    assert!(!engine.has_handler(&ActionKind::StartBossBattle));

    let report = engine.update(&PlayerStats::default(), &GameState::default());
    assert_eq!(report.actions_dispatched, 1);
    assert_eq!(*log.borrow(), vec!["after the unhandled one"]);
}
