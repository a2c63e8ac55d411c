/// Story Preview: interactive shell for playing through episode files.
///
/// Usage: story_preview --episodes <dir_or_file> [--level <n>] [--affection <n>]
///
/// Commands:
///   tick                      - run one engine update
///   level <n> / affection <n> - set player stats
///   status <text>             - set relationship status
///   at <location>             - set current location (also marks it visited)
///   time <time_of_day>        - set time of day
///   accept <episode>          - accept an available episode
///   yes                       - toggle quest_accepted
///   dialogue|boss|item|activity <id> - record a completed fact
///   flag <key> <value>        - set a story flag
///   show                      - print episode and quest state
///   help                      - list commands
///   quit                      - exit

use story_engine::core::engine::{AcceptOutcome, StoryEngine};
use story_engine::schema::action::{ActionKind, StoryAction};
use story_engine::schema::episode::EpisodeId;
use story_engine::schema::snapshot::{GameState, PlayerStats};
use story_engine::schema::value::Value;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::error;
use tracing_subscriber::EnvFilter;

const ACTION_KINDS: [ActionKind; 13] = [
    ActionKind::DeliverMessage,
    ActionKind::ActivateQuest,
    ActionKind::SetCharacterMood,
    ActionKind::ForceCharacterLocation,
    ActionKind::StartDialogueScene,
    ActionKind::SetQuestObjective,
    ActionKind::LoadDungeonEnvironment,
    ActionKind::StartBossBattle,
    ActionKind::RewardPlayer,
    ActionKind::CreateMemoryStar,
    ActionKind::UnlockActivity,
    ActionKind::SetCurrentLocation,
    ActionKind::ShowNotification,
];

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut episodes_path = None;
    let mut player = PlayerStats::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--episodes" if i + 1 < args.len() => {
                i += 1;
                episodes_path = Some(args[i].clone());
            }
            "--level" if i + 1 < args.len() => {
                i += 1;
                player.level = args[i].parse().unwrap_or(1);
            }
            "--affection" if i + 1 < args.len() => {
                i += 1;
                player.affection_level = args[i].parse().unwrap_or(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let Some(episodes_path) = episodes_path else {
        print_usage();
        std::process::exit(1);
    };

    let mut engine = match build_engine(Path::new(&episodes_path)) {
        Ok(engine) => engine,
        Err(e) => {
            error!("failed to load episodes: {}", e);
            std::process::exit(1);
        }
    };

    println!("Loaded {} episodes", engine.episodes().count());
    println!("Type 'help' for commands.\n");

    let mut game = GameState::default();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("story> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();
        let arg = parts.get(1).copied();

        match (cmd.as_str(), arg) {
            ("quit" | "exit" | "q", _) => {
                println!("Goodbye.");
                break;
            }
            ("help" | "h" | "?", _) => print_help(),
            ("tick" | "t", _) => {
                let report = engine.update(&player, &game);
                if report.is_empty() {
                    println!("(nothing happened)");
                }
                for id in &report.unlocked {
                    println!("  unlocked:  {}", id);
                }
                for id in &report.advanced {
                    println!("  advanced:  {}", id);
                }
                for id in &report.completed {
                    println!("  completed: {}", id);
                }
            }
            ("level", Some(n)) => match n.parse() {
                Ok(level) => player.level = level,
                Err(_) => println!("Invalid level: {}", n),
            },
            ("affection", Some(n)) => match n.parse() {
                Ok(affection) => player.affection_level = affection,
                Err(_) => println!("Invalid affection: {}", n),
            },
            ("status", Some(_)) => {
                player.relationship_status = Some(parts[1..].join(" "));
            }
            ("at", Some(location)) => {
                game.visited_locations.insert(location.to_string());
                game.current_location = Some(location.to_string());
            }
            ("time", Some(time)) => game.time_of_day = Some(time.to_string()),
            ("yes", _) => {
                game.quest_accepted = !game.quest_accepted;
                println!("quest_accepted = {}", game.quest_accepted);
            }
            ("accept", Some(id)) => match engine.accept_episode(&EpisodeId::from(id)) {
                AcceptOutcome::Accepted => println!("Accepted '{}'", id),
                AcceptOutcome::NotFound => println!("No episode '{}'", id),
                AcceptOutcome::WrongState(status) => {
                    println!("Episode '{}' is {}, not available", id, status)
                }
            },
            ("dialogue", Some(id)) => {
                game.completed_dialogues.insert(id.to_string());
            }
            ("boss", Some(id)) => {
                game.defeated_bosses.insert(id.to_string());
            }
            ("item", Some(id)) => {
                player.inventory.insert(id.to_string());
            }
            ("activity", Some(id)) => {
                game.completed_activities.insert(id.to_string());
            }
            ("flag", Some(key)) => {
                let value = parts.get(2).map_or(Value::Bool(true), |v| parse_value(v));
                engine.set_story_flag(key, value);
            }
            ("show" | "s", _) => print_state(&engine, &player, &game),
            _ => println!("Unknown command or missing argument: {}", line),
        }
    }
}

fn build_engine(path: &Path) -> Result<StoryEngine, story_engine::core::engine::EngineError> {
    let mut builder = StoryEngine::builder();
    builder = if path.is_dir() {
        builder.episodes_dir(path)
    } else {
        builder.episodes_file(path)
    };
    for kind in ACTION_KINDS {
        builder = builder.on(kind, print_action);
    }
    builder.build()
}

fn print_action(action: &StoryAction) {
    match action {
        StoryAction::DeliverMessage { sender, text } => println!("  [message] {}: {}", sender, text),
        StoryAction::ShowNotification { title, message } => {
            println!("  [notice] {} - {}", title, message)
        }
        StoryAction::ActivateQuest { title, .. } => println!("  [quest] started: {}", title),
        StoryAction::RewardPlayer {
            experience,
            gold,
            affection,
            items,
        } => println!(
            "  [reward] {} xp, {} gold, {:+} affection, items {:?}",
            experience, gold, affection, items
        ),
        other => println!("  [{}] {:?}", other.kind(), other),
    }
}

fn parse_value(raw: &str) -> Value {
    if let Ok(b) = raw.parse::<bool>() {
        Value::Bool(b)
    } else if let Ok(i) = raw.parse::<i64>() {
        Value::Int(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        Value::Float(f)
    } else {
        Value::String(raw.to_string())
    }
}

fn print_state(engine: &StoryEngine, player: &PlayerStats, game: &GameState) {
    println!("\n--- Player ---");
    println!(
        "level {}  affection {}  status {:?}",
        player.level, player.affection_level, player.relationship_status
    );
    println!(
        "location {:?}  time {:?}  quest_accepted {}",
        game.current_location, game.time_of_day, game.quest_accepted
    );

    println!("--- Episodes ---");
    for episode in engine.episodes() {
        println!(
            "  {:<20} {:<10} beat {}/{}",
            episode.id,
            episode.status,
            episode.current_beat_index,
            episode.beats.len()
        );
    }

    println!("--- Quests ---");
    for quest in engine.current_quests() {
        println!("  {} ({})", quest.title, quest.id);
        for objective in &quest.objectives {
            let mark = if objective.completed { "x" } else { " " };
            println!("    [{}] {}", mark, objective.text);
        }
    }

    let state = engine.episode_state();
    if !state.story_flags.is_empty() {
        println!("--- Flags ---");
        let mut flags: Vec<_> = state.story_flags.iter().collect();
        flags.sort_by(|a, b| a.0.cmp(b.0));
        for (key, value) in flags {
            println!("  {} = {:?}", key, value);
        }
    }
    println!();
}

fn print_usage() {
    println!("Usage: story_preview --episodes <dir_or_file> [--level <n>] [--affection <n>]");
}

fn print_help() {
    println!("Commands:");
    println!("  tick                       run one engine update");
    println!("  level <n> | affection <n>  set player stats");
    println!("  status <text>              set relationship status");
    println!("  at <location>              move to a location");
    println!("  time <time_of_day>         set time of day");
    println!("  yes                        toggle quest_accepted");
    println!("  accept <episode>           accept an available episode");
    println!("  dialogue|boss|item|activity <id>  record a completed fact");
    println!("  flag <key> [value]         set a story flag");
    println!("  show                       print current state");
    println!("  quit                       exit");
}
