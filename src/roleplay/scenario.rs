//! Role-play scenario model.
//!
//! Scenarios are authored as [`ScenarioDefinition`]s (JSON, nodes linked by
//! string id) and compiled into [`Scenario`]s, where every edge target is an
//! index into the scenario's own node list. Compilation is the only place a
//! dangling reference can be observed.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario {scenario_id:?} has no conversation nodes")]
    EmptyScenario { scenario_id: String },

    #[error("scenario {scenario_id:?} defines node {node_id:?} more than once")]
    DuplicateNode {
        scenario_id: String,
        node_id: String,
    },

    #[error("node {node_id:?} in scenario {scenario_id:?} defines response {response_id:?} more than once")]
    DuplicateResponse {
        scenario_id: String,
        node_id: String,
        response_id: String,
    },

    #[error("node {node_id:?} in scenario {scenario_id:?} has no responses")]
    DeadEnd {
        scenario_id: String,
        node_id: String,
    },

    #[error(
        "response {response_id:?} of node {node_id:?} in scenario {scenario_id:?} points at missing node {target:?}"
    )]
    BrokenGraph {
        scenario_id: String,
        node_id: String,
        response_id: String,
        target: String,
    },

    #[error("duplicate scenario id {0:?}")]
    DuplicateScenario(String),

    #[error("invalid scenario data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        };
        f.write_str(s)
    }
}

// ── Authored form ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDefinition {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    #[serde(default = "default_language")]
    pub language: String,
    pub xp_reward: u32,
    pub conversations: Vec<ConversationDefinition>,
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDefinition {
    pub id: String,
    pub speaker: String,
    pub text: String,
    pub responses: Vec<ResponseDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDefinition {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp_bonus: Option<u32>,
}

// ── Compiled form ────────────────────────────────────────────────

/// Position of a node inside its scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub usize);

impl NodeIndex {
    pub const START: NodeIndex = NodeIndex(0);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEdge {
    pub id: String,
    pub text: String,
    /// `None` means choosing this response ends the scenario.
    pub next: Option<NodeIndex>,
    pub xp_bonus: Option<u32>,
}

impl ResponseEdge {
    pub fn is_terminal(&self) -> bool {
        self.next.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationNode {
    pub id: String,
    pub speaker: String,
    pub text: String,
    pub responses: Vec<ResponseEdge>,
}

impl ConversationNode {
    pub fn response(&self, response_id: &str) -> Option<&ResponseEdge> {
        self.responses.iter().find(|r| r.id == response_id)
    }
}

/// A validated scenario graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub language: String,
    pub xp_reward: u32,
    nodes: Vec<ConversationNode>,
}

impl Scenario {
    /// Validate a definition and resolve every edge target to a node index.
    pub fn compile(def: ScenarioDefinition) -> Result<Self, ScenarioError> {
        if def.conversations.is_empty() {
            return Err(ScenarioError::EmptyScenario {
                scenario_id: def.id,
            });
        }

        let mut index_of: HashMap<&str, NodeIndex> = HashMap::new();
        for (i, node) in def.conversations.iter().enumerate() {
            if index_of.insert(node.id.as_str(), NodeIndex(i)).is_some() {
                return Err(ScenarioError::DuplicateNode {
                    scenario_id: def.id.clone(),
                    node_id: node.id.clone(),
                });
            }
        }

        let mut nodes = Vec::with_capacity(def.conversations.len());
        for node in &def.conversations {
            if node.responses.is_empty() {
                return Err(ScenarioError::DeadEnd {
                    scenario_id: def.id.clone(),
                    node_id: node.id.clone(),
                });
            }

            let mut seen = HashSet::new();
            let mut responses = Vec::with_capacity(node.responses.len());
            for response in &node.responses {
                if !seen.insert(response.id.as_str()) {
                    return Err(ScenarioError::DuplicateResponse {
                        scenario_id: def.id.clone(),
                        node_id: node.id.clone(),
                        response_id: response.id.clone(),
                    });
                }

                let next = match &response.next_conversation_id {
                    None => None,
                    Some(target) => match index_of.get(target.as_str()) {
                        Some(&idx) => Some(idx),
                        None => {
                            return Err(ScenarioError::BrokenGraph {
                                scenario_id: def.id.clone(),
                                node_id: node.id.clone(),
                                response_id: response.id.clone(),
                                target: target.clone(),
                            });
                        }
                    },
                };

                responses.push(ResponseEdge {
                    id: response.id.clone(),
                    text: response.text.clone(),
                    next,
                    xp_bonus: response.xp_bonus,
                });
            }

            nodes.push(ConversationNode {
                id: node.id.clone(),
                speaker: node.speaker.clone(),
                text: node.text.clone(),
                responses,
            });
        }

        Ok(Self {
            id: def.id,
            title: def.title,
            description: def.description,
            difficulty: def.difficulty,
            language: def.language,
            xp_reward: def.xp_reward,
            nodes,
        })
    }

    pub fn node(&self, index: NodeIndex) -> Option<&ConversationNode> {
        self.nodes.get(index.0)
    }

    pub fn nodes(&self) -> &[ConversationNode] {
        &self.nodes
    }

    pub fn start(&self) -> &ConversationNode {
        // compile() rejects scenarios without nodes
        &self.nodes[NodeIndex::START.0]
    }

    pub fn find_node(&self, node_id: &str) -> Option<NodeIndex> {
        self.nodes.iter().position(|n| n.id == node_id).map(NodeIndex)
    }

    pub fn summary(&self) -> ScenarioSummary {
        ScenarioSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            difficulty: self.difficulty,
            language: self.language.clone(),
            xp_reward: self.xp_reward,
        }
    }
}

/// Listing entry for a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub language: String,
    pub xp_reward: u32,
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn compile_resolves_targets_to_indices() {
        let scenario = Scenario::compile(definition(
            "s",
            10,
            vec![
                node("a", vec![response("to-b", Some("b"), None)]),
                node(
                    "b",
                    vec![
                        response("back", Some("a"), Some(2)),
                        response("end", None, None),
                    ],
                ),
            ],
        ))
        .unwrap();

        assert_eq!(scenario.start().id, "a");
        assert_eq!(scenario.start().responses[0].next, Some(NodeIndex(1)));
        let b = scenario.node(NodeIndex(1)).unwrap();
        assert_eq!(b.response("back").unwrap().next, Some(NodeIndex(0)));
        assert!(b.response("end").unwrap().is_terminal());
        assert_eq!(scenario.find_node("b"), Some(NodeIndex(1)));
    }

    #[test]
    fn dangling_target_is_broken_graph() {
        let err = Scenario::compile(definition(
            "s",
            10,
            vec![node("a", vec![response("r1", Some("missing"), None)])],
        ))
        .unwrap_err();

        match err {
            ScenarioError::BrokenGraph {
                node_id,
                response_id,
                target,
                ..
            } => {
                assert_eq!(node_id, "a");
                assert_eq!(response_id, "r1");
                assert_eq!(target, "missing");
            }
            other => panic!("expected BrokenGraph, got {other:?}"),
        }
    }

    #[test]
    fn empty_scenario_is_rejected() {
        let err = Scenario::compile(definition("s", 10, vec![])).unwrap_err();
        assert!(matches!(err, ScenarioError::EmptyScenario { .. }));
    }

    #[test]
    fn duplicate_node_is_rejected() {
        let err = Scenario::compile(definition(
            "s",
            10,
            vec![
                node("a", vec![response("r", None, None)]),
                node("a", vec![response("r", None, None)]),
            ],
        ))
        .unwrap_err();
        assert!(matches!(err, ScenarioError::DuplicateNode { .. }));
    }

    #[test]
    fn duplicate_response_in_node_is_rejected() {
        let err = Scenario::compile(definition(
            "s",
            10,
            vec![node(
                "a",
                vec![response("r", None, None), response("r", None, Some(5))],
            )],
        ))
        .unwrap_err();
        assert!(matches!(err, ScenarioError::DuplicateResponse { .. }));
    }

    #[test]
    fn same_response_id_in_different_nodes_is_fine() {
        let result = Scenario::compile(definition(
            "s",
            10,
            vec![
                node("a", vec![response("r", Some("b"), None)]),
                node("b", vec![response("r", None, None)]),
            ],
        ));
        assert!(result.is_ok());
    }

    #[test]
    fn node_without_responses_is_dead_end() {
        let err = Scenario::compile(definition("s", 10, vec![node("a", vec![])])).unwrap_err();
        assert!(matches!(err, ScenarioError::DeadEnd { .. }));
    }

    #[test]
    fn definition_parses_camel_case_json() {
        let json = r#"{
            "id": "cafe",
            "title": "Cafe",
            "description": "Order a coffee",
            "difficulty": "intermediate",
            "xpReward": 40,
            "conversations": [
                {"id": "c1", "speaker": "Barista", "text": "Hi!",
                 "responses": [{"id": "r1", "text": "A latte", "xpBonus": 5}]}
            ]
        }"#;
        let def: ScenarioDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.language, "en");
        assert_eq!(def.difficulty, Difficulty::Intermediate);
        let scenario = Scenario::compile(def).unwrap();
        assert_eq!(scenario.xp_reward, 40);
        assert_eq!(scenario.start().responses[0].xp_bonus, Some(5));
        assert!(scenario.start().responses[0].is_terminal());
    }
}
