//! Scripted role-play scenarios and the engine that walks them.

pub mod engine;
pub mod library;
pub mod scenario;

pub use engine::{ChoiceOutcome, Completion, DialogueEngine, DialogueError, DialogueView, NodeView};
pub use library::ScenarioLibrary;
pub use scenario::{Difficulty, NodeIndex, Scenario, ScenarioDefinition, ScenarioError, ScenarioSummary};
