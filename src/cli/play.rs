//! Interactive role-play in the terminal.

use anyhow::{Result, anyhow};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::gamification::{ProfileDefaults, ProgressionStore};
use crate::roleplay::scenario::{ConversationNode, ResponseEdge};
use crate::roleplay::{ChoiceOutcome, DialogueEngine, ScenarioLibrary};

/// What a line of input asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Index into the node's responses.
    Pick(usize),
    Quit,
    Invalid,
}

/// Accepts a 1-based number or a response id; `q`, `quit` and `exit` leave.
pub fn parse_choice(input: &str, responses: &[ResponseEdge]) -> Choice {
    let input = input.trim();
    if matches!(input, "q" | "quit" | "exit") {
        return Choice::Quit;
    }
    if let Ok(n) = input.parse::<usize>() {
        return if (1..=responses.len()).contains(&n) {
            Choice::Pick(n - 1)
        } else {
            Choice::Invalid
        };
    }
    responses
        .iter()
        .position(|r| r.id == input)
        .map_or(Choice::Invalid, Choice::Pick)
}

fn print_node(node: &ConversationNode) {
    println!();
    println!("{}: {}", node.speaker, node.text);
    for (i, response) in node.responses.iter().enumerate() {
        match response.xp_bonus {
            Some(bonus) => println!("  {}. {} (+{} XP)", i + 1, response.text, bonus),
            None => println!("  {}. {}", i + 1, response.text),
        }
    }
}

/// Add a line to the editor history. History is a convenience only.
fn remember(editor: &mut DefaultEditor, line: &str) {
    if let Err(e) = editor.add_history_entry(line) {
        debug!(error = %e, "Could not record history entry");
    }
}

/// Walk one scenario with a throwaway profile.
pub fn run(
    library: &ScenarioLibrary,
    scenario_id: &str,
    defaults: ProfileDefaults,
    badge_threshold: usize,
) -> Result<()> {
    let scenario = library.get(scenario_id).ok_or_else(|| {
        anyhow!("unknown scenario {scenario_id:?} (run `linguaplay scenarios` to list them)")
    })?;

    println!("🎭 {} [{}]", scenario.title, scenario.difficulty);
    println!("{}", scenario.description);
    println!("Completing it is worth {} XP. Type a number to answer, q to leave.", scenario.xp_reward);

    let mut store = ProgressionStore::new(defaults);
    let mut engine = DialogueEngine::with_badge_threshold(badge_threshold);
    engine.select_scenario(scenario);
    let mut editor = DefaultEditor::new()?;

    while let Some(node) = engine.current_node() {
        print_node(node);
        let line = match editor.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                engine.abandon();
                println!("Left the scenario.");
                break;
            }
            Err(e) => return Err(e.into()),
        };
        let response_id = match parse_choice(&line, &node.responses) {
            Choice::Pick(index) => node.responses[index].id.clone(),
            Choice::Quit => {
                engine.abandon();
                println!("Left the scenario.");
                break;
            }
            Choice::Invalid => {
                println!("Pick one of 1-{}.", node.responses.len());
                continue;
            }
        };
        remember(&mut editor, &line);

        if let ChoiceOutcome::Completed(done) = engine.choose_response(&response_id, &mut store)? {
            println!();
            println!("🎉 Scenario complete! +{} XP", done.total_xp());
        }
        for event in store.drain_events() {
            println!("  ✨ {}", event.message());
        }
    }

    let profile = store.profile();
    println!();
    println!(
        "Level {} · {} XP ({} to next level)",
        profile.level,
        profile.xp,
        profile.xp_to_next_level()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges() -> Vec<ResponseEdge> {
        ["r1", "r2", "r3"]
            .into_iter()
            .map(|id| ResponseEdge {
                id: id.to_string(),
                text: format!("answer {id}"),
                next: None,
                xp_bonus: None,
            })
            .collect()
    }

    #[test]
    fn numbers_are_one_based() {
        let edges = edges();
        assert_eq!(parse_choice("1", &edges), Choice::Pick(0));
        assert_eq!(parse_choice(" 3 \n", &edges), Choice::Pick(2));
        assert_eq!(parse_choice("0", &edges), Choice::Invalid);
        assert_eq!(parse_choice("4", &edges), Choice::Invalid);
    }

    #[test]
    fn ids_and_quit() {
        let edges = edges();
        assert_eq!(parse_choice("r2", &edges), Choice::Pick(1));
        assert_eq!(parse_choice("q", &edges), Choice::Quit);
        assert_eq!(parse_choice("exit", &edges), Choice::Quit);
        assert_eq!(parse_choice("maybe", &edges), Choice::Invalid);
        assert_eq!(parse_choice("", &edges), Choice::Invalid);
    }

    #[test]
    fn answers_go_into_history() {
        use rustyline::history::History;

        let mut editor = DefaultEditor::new().unwrap();
        remember(&mut editor, "1");
        remember(&mut editor, "r2");
        assert_eq!(editor.history().len(), 2);
    }

    #[test]
    fn unknown_scenario_is_error() {
        let library = ScenarioLibrary::builtin().unwrap();
        let err = run(&library, "nowhere", ProfileDefaults::default(), 3).unwrap_err();
        assert!(err.to_string().contains("nowhere"));
    }
}
