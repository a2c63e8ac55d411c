/// Episode Linter: validates episode definitions and their dependency graph.
///
/// Usage: episode_linter <episodes_dir_or_file>

use story_engine::core::catalog::{episode_files, validate_episode, EpisodeCatalog};
use story_engine::schema::action::StoryAction;
use story_engine::schema::condition::CompletionCondition;
use story_engine::schema::episode::EpisodeId;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: episode_linter <episodes_dir_or_file>");
        process::exit(0);
    }

    let mut catalog = EpisodeCatalog::default();
    let mut errors = Vec::new();
    let episodes_path = Path::new(&args[1]);

    if episodes_path.is_file() {
        match EpisodeCatalog::load(episodes_path) {
            Ok(loaded) => catalog.merge(loaded),
            Err(e) => {
                eprintln!("ERROR: Failed to load episode file: {}", e);
                process::exit(1);
            }
        }
    } else if episodes_path.is_dir() {
        load_episodes_recursive(episodes_path, &mut catalog, &mut errors);
    } else {
        eprintln!("ERROR: Path '{}' does not exist", args[1]);
        process::exit(1);
    }

    println!("Loaded {} episodes", catalog.len());

    let warnings = lint_episodes(&catalog, &mut errors);

    println!("\n=== Episode Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn load_episodes_recursive(dir: &Path, catalog: &mut EpisodeCatalog, errors: &mut Vec<String>) {
    let paths = match episode_files(dir) {
        Ok(paths) => paths,
        Err(e) => {
            errors.push(format!("{}: {}", dir.display(), e));
            return;
        }
    };

    for path in paths {
        match EpisodeCatalog::load(&path) {
            Ok(loaded) => {
                println!("  Loaded: {}", path.display());
                catalog.merge(loaded);
            }
            Err(e) => errors.push(format!("{}: {}", path.display(), e)),
        }
    }
}

/// Push errors for episodes that can never run; return warnings for
/// content that probably needs attention.
fn lint_episodes(catalog: &EpisodeCatalog, errors: &mut Vec<String>) -> Vec<String> {
    let mut warnings = Vec::new();

    for episode in &catalog.episodes {
        if let Err(e) = validate_episode(episode) {
            errors.push(e.to_string());
        }
        if episode.title.trim().is_empty() {
            warnings.push(format!("Episode '{}' has no title", episode.id));
        }
        if episode.prerequisite.is_unconditional() {
            warnings.push(format!(
                "Episode '{}' has no prerequisite and unlocks on the first update",
                episode.id
            ));
        }
    }

    for (episode, missing) in catalog.dangling_prerequisites() {
        errors.push(format!(
            "Episode '{}' requires unknown episode '{}' and can never unlock",
            episode, missing
        ));
    }

    for id in prerequisite_cycles(catalog) {
        errors.push(format!(
            "Episode '{}' is part of a prerequisite cycle and can never unlock",
            id
        ));
    }

    // Quest ids activated anywhere in the catalog
    let quests: HashSet<&str> = catalog
        .episodes
        .iter()
        .flat_map(|e| e.beats.iter())
        .flat_map(|b| b.actions.iter())
        .filter_map(|a| match a {
            StoryAction::ActivateQuest { quest_id, .. } => Some(quest_id.as_str()),
            _ => None,
        })
        .collect();

    for episode in &catalog.episodes {
        for (index, beat) in episode.beats.iter().enumerate() {
            if let CompletionCondition::Custom { name, .. } = &beat.completion_condition {
                warnings.push(format!(
                    "Episode '{}' beat {} uses custom condition '{}'; the host must register a checker",
                    episode.id, index, name
                ));
            }
            for action in &beat.actions {
                if let StoryAction::SetQuestObjective { quest_id, .. } = action {
                    if !quests.contains(quest_id.as_str()) {
                        warnings.push(format!(
                            "Episode '{}' beat {} sets an objective on quest '{}' which no episode activates",
                            episode.id, index, quest_id
                        ));
                    }
                }
            }
        }
    }

    warnings
}

/// Episodes whose `completed_episodes` chain loops back on itself.
fn prerequisite_cycles(catalog: &EpisodeCatalog) -> Vec<EpisodeId> {
    let edges: HashMap<&EpisodeId, &[EpisodeId]> = catalog
        .episodes
        .iter()
        .map(|e| (&e.id, e.prerequisite.completed_episodes.as_slice()))
        .collect();

    let mut cyclic = Vec::new();
    for start in catalog.episodes.iter().map(|e| &e.id) {
        let mut stack: Vec<&EpisodeId> = edges.get(start).map_or(Vec::new(), |d| d.iter().collect());
        let mut seen: HashSet<&EpisodeId> = HashSet::new();
        while let Some(next) = stack.pop() {
            if next == start {
                cyclic.push(start.clone());
                break;
            }
            if seen.insert(next) {
                if let Some(deps) = edges.get(next) {
                    stack.extend(deps.iter());
                }
            }
        }
    }
    cyclic
}
