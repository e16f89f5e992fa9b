//! Collection of compiled scenarios.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::scenario::{Scenario, ScenarioDefinition, ScenarioError, ScenarioSummary};

const BUILTIN_SCENARIOS: &str = include_str!("../../data/scenarios.json");

/// Ordered set of validated scenarios, addressable by id.
#[derive(Debug, Clone, Default)]
pub struct ScenarioLibrary {
    scenarios: Vec<Arc<Scenario>>,
}

impl ScenarioLibrary {
    /// Scenarios bundled with the binary.
    pub fn builtin() -> Result<Self, ScenarioError> {
        Self::from_json(BUILTIN_SCENARIOS)
    }

    /// Load scenarios from a JSON file containing an array of definitions.
    pub fn from_path(path: &Path) -> Result<Self, ScenarioError> {
        let raw = std::fs::read_to_string(path)?;
        let library = Self::from_json(&raw)?;
        info!(path = %path.display(), count = library.len(), "Loaded scenarios");
        Ok(library)
    }

    pub fn from_json(raw: &str) -> Result<Self, ScenarioError> {
        let definitions: Vec<ScenarioDefinition> = serde_json::from_str(raw)?;
        Self::from_definitions(definitions)
    }

    pub fn from_definitions(definitions: Vec<ScenarioDefinition>) -> Result<Self, ScenarioError> {
        let mut seen = HashSet::new();
        let mut scenarios = Vec::with_capacity(definitions.len());
        for def in definitions {
            if !seen.insert(def.id.clone()) {
                return Err(ScenarioError::DuplicateScenario(def.id));
            }
            scenarios.push(Arc::new(Scenario::compile(def)?));
        }
        Ok(Self { scenarios })
    }

    pub fn get(&self, id: &str) -> Option<Arc<Scenario>> {
        self.scenarios.iter().find(|s| s.id == id).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Scenario>> {
        self.scenarios.iter()
    }

    pub fn summaries(&self) -> Vec<ScenarioSummary> {
        self.scenarios.iter().map(|s| s.summary()).collect()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roleplay::scenario::{Difficulty, NodeIndex};
    use std::io::Write;

    #[test]
    fn builtin_scenarios_load_and_validate() {
        let library = ScenarioLibrary::builtin().unwrap();
        let ids: Vec<_> = library.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["market-shopping", "hotel-reservation", "police-station"]
        );

        let rewards: Vec<_> = library.iter().map(|s| s.xp_reward).collect();
        assert_eq!(rewards, vec![50, 75, 100]);
    }

    #[test]
    fn market_shopping_matches_documented_walk() {
        let library = ScenarioLibrary::builtin().unwrap();
        let market = library.get("market-shopping").unwrap();
        assert_eq!(market.difficulty, Difficulty::Beginner);
        assert_eq!(market.start().id, "market-1");

        let r1 = market.start().response("r1").unwrap();
        assert_eq!(r1.xp_bonus, None);
        let next = market.node(r1.next.unwrap()).unwrap();
        assert_eq!(next.id, "market-2a");

        let r4 = next.response("r4").unwrap();
        assert_eq!(r4.xp_bonus, Some(10));
        assert!(r4.is_terminal());
        assert_eq!(market.find_node("market-2a"), Some(NodeIndex(1)));
    }

    #[test]
    fn unknown_id_returns_none() {
        let library = ScenarioLibrary::builtin().unwrap();
        assert!(library.get("space-station").is_none());
    }

    #[test]
    fn duplicate_scenario_ids_are_rejected() {
        let raw = r#"[
            {"id": "x", "title": "X", "description": "", "difficulty": "beginner", "xpReward": 1,
             "conversations": [{"id": "n", "speaker": "A", "text": "t", "responses": [{"id": "r", "text": "ok"}]}]},
            {"id": "x", "title": "X again", "description": "", "difficulty": "beginner", "xpReward": 1,
             "conversations": [{"id": "n", "speaker": "A", "text": "t", "responses": [{"id": "r", "text": "ok"}]}]}
        ]"#;
        let err = ScenarioLibrary::from_json(raw).unwrap_err();
        assert!(matches!(err, ScenarioError::DuplicateScenario(id) if id == "x"));
    }

    #[test]
    fn broken_file_is_reported_at_load() {
        let raw = r#"[
            {"id": "x", "title": "X", "description": "", "difficulty": "advanced", "xpReward": 1,
             "conversations": [{"id": "n", "speaker": "A", "text": "t",
                                "responses": [{"id": "r", "text": "go", "nextConversationId": "nowhere"}]}]}
        ]"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(raw.as_bytes()).unwrap();

        let err = ScenarioLibrary::from_path(file.path()).unwrap_err();
        assert!(matches!(err, ScenarioError::BrokenGraph { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ScenarioLibrary::from_path(Path::new("/nonexistent/scenarios.json")).unwrap_err();
        assert!(matches!(err, ScenarioError::Io(_)));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = ScenarioLibrary::from_json("{not json").unwrap_err();
        assert!(matches!(err, ScenarioError::Parse(_)));
    }
}
