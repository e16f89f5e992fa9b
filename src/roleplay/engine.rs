//! Dialogue graph traversal.
//!
//! The engine walks one scenario at a time. Rewards are pushed into a
//! [`Rewards`] sink supplied by the caller on every choice, so the engine
//! never owns the profile it pays into.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::scenario::{ConversationNode, NodeIndex, Scenario};
use crate::gamification::Rewards;
use crate::gamification::badges::ROLE_PLAYER;

/// Distinct completed scenarios needed for the role-play badge.
pub const DEFAULT_BADGE_THRESHOLD: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DialogueError {
    #[error("response {response_id:?} is not offered at node {node_id:?}")]
    InvalidEdge { node_id: String, response_id: String },

    #[error("no role-play scenario is active")]
    NoActiveScenario,

    #[error("unknown scenario {0:?}")]
    UnknownScenario(String),

    #[error("scenario {scenario_id:?} has no node at index {index}")]
    BrokenGraph { scenario_id: String, index: usize },
}

impl DialogueError {
    /// Stable identifier for API consumers.
    pub fn kind(&self) -> &'static str {
        match self {
            DialogueError::InvalidEdge { .. } => "invalid_edge",
            DialogueError::NoActiveScenario => "no_active_scenario",
            DialogueError::UnknownScenario(_) => "unknown_scenario",
            DialogueError::BrokenGraph { .. } => "broken_graph",
        }
    }
}

#[derive(Debug, Clone, Default)]
enum DialogueState {
    #[default]
    Idle,
    InScenario {
        scenario: Arc<Scenario>,
        node: NodeIndex,
    },
}

/// What a successful choice did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChoiceOutcome {
    /// Moved to another node of the same scenario.
    Advanced {
        #[serde(rename = "nodeId")]
        node_id: String,
        #[serde(rename = "bonusXp")]
        bonus_xp: u32,
    },
    /// The response ended the scenario; the engine is idle again.
    Completed(Completion),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub scenario_id: String,
    pub bonus_xp: u32,
    pub xp_reward: u32,
    /// False when the scenario had already been completed before.
    pub first_completion: bool,
    pub completed_count: usize,
    pub role_player_unlocked: bool,
}

impl Completion {
    pub fn total_xp(&self) -> u32 {
        self.bonus_xp.saturating_add(self.xp_reward)
    }
}

/// Render model for the current dialogue position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueView {
    pub scenario_id: Option<String>,
    pub current_node: Option<NodeView>,
    pub is_complete: bool,
    pub completed_scenarios: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    pub id: String,
    pub speaker: String,
    pub text: String,
    pub responses: Vec<ResponseView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseView {
    pub id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp_bonus: Option<u32>,
}

impl From<&ConversationNode> for NodeView {
    fn from(node: &ConversationNode) -> Self {
        Self {
            id: node.id.clone(),
            speaker: node.speaker.clone(),
            text: node.text.clone(),
            responses: node
                .responses
                .iter()
                .map(|r| ResponseView {
                    id: r.id.clone(),
                    text: r.text.clone(),
                    xp_bonus: r.xp_bonus,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DialogueEngine {
    state: DialogueState,
    completed: BTreeSet<String>,
    badge_threshold: usize,
    last_completed: Option<String>,
}

impl DialogueEngine {
    pub fn new() -> Self {
        Self::with_badge_threshold(DEFAULT_BADGE_THRESHOLD)
    }

    pub fn with_badge_threshold(badge_threshold: usize) -> Self {
        Self {
            state: DialogueState::Idle,
            completed: BTreeSet::new(),
            badge_threshold,
            last_completed: None,
        }
    }

    /// Start (or restart) a scenario at its first node.
    pub fn select_scenario(&mut self, scenario: Arc<Scenario>) {
        if let DialogueState::InScenario { scenario: prev, .. } = &self.state {
            debug!(previous = %prev.id, "Replacing active scenario");
        }
        info!(scenario_id = %scenario.id, "Scenario selected");
        self.last_completed = None;
        self.state = DialogueState::InScenario {
            scenario,
            node: NodeIndex::START,
        };
    }

    /// Leave the active scenario without completing it.
    pub fn abandon(&mut self) -> bool {
        match std::mem::take(&mut self.state) {
            DialogueState::Idle => false,
            DialogueState::InScenario { scenario, .. } => {
                info!(scenario_id = %scenario.id, "Scenario abandoned");
                true
            }
        }
    }

    pub fn choose_response<R: Rewards + ?Sized>(
        &mut self,
        response_id: &str,
        rewards: &mut R,
    ) -> Result<ChoiceOutcome, DialogueError> {
        let DialogueState::InScenario { scenario, node } = &self.state else {
            return Err(DialogueError::NoActiveScenario);
        };
        let (scenario, node) = (Arc::clone(scenario), *node);
        let current = scenario.node(node).ok_or_else(|| DialogueError::BrokenGraph {
            scenario_id: scenario.id.clone(),
            index: node.0,
        })?;

        let Some(edge) = current.response(response_id) else {
            warn!(
                scenario_id = %scenario.id,
                node_id = %current.id,
                response_id,
                "Response not offered at current node"
            );
            return Err(DialogueError::InvalidEdge {
                node_id: current.id.clone(),
                response_id: response_id.to_string(),
            });
        };

        // Resolve the target before paying out so a bad index leaves no trace.
        let next = match edge.next {
            Some(index) => Some(scenario.node(index).map(|n| (index, n)).ok_or_else(|| {
                DialogueError::BrokenGraph {
                    scenario_id: scenario.id.clone(),
                    index: index.0,
                }
            })?),
            None => None,
        };

        let bonus_xp = edge.xp_bonus.unwrap_or(0);
        if let Some(bonus) = edge.xp_bonus {
            rewards.award_xp(bonus);
        }

        match next {
            Some((index, target)) => {
                debug!(scenario_id = %scenario.id, from = %current.id, to = %target.id, "Advanced");
                let node_id = target.id.clone();
                self.state = DialogueState::InScenario {
                    scenario: Arc::clone(&scenario),
                    node: index,
                };
                Ok(ChoiceOutcome::Advanced { node_id, bonus_xp })
            }
            None => Ok(ChoiceOutcome::Completed(
                self.complete(&scenario, bonus_xp, rewards),
            )),
        }
    }

    fn complete<R: Rewards + ?Sized>(
        &mut self,
        scenario: &Scenario,
        bonus_xp: u32,
        rewards: &mut R,
    ) -> Completion {
        rewards.award_xp(scenario.xp_reward);

        let first_completion = self.completed.insert(scenario.id.clone());
        let completed_count = self.completed.len();
        let role_player_unlocked = first_completion && completed_count == self.badge_threshold;
        if role_player_unlocked {
            rewards.unlock_badge(ROLE_PLAYER);
        }

        info!(
            scenario_id = %scenario.id,
            xp_reward = scenario.xp_reward,
            first_completion,
            completed_count,
            "Scenario completed"
        );

        self.state = DialogueState::Idle;
        self.last_completed = Some(scenario.id.clone());

        Completion {
            scenario_id: scenario.id.clone(),
            bonus_xp,
            xp_reward: scenario.xp_reward,
            first_completion,
            completed_count,
            role_player_unlocked,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, DialogueState::InScenario { .. })
    }

    pub fn active_scenario(&self) -> Option<&Arc<Scenario>> {
        match &self.state {
            DialogueState::Idle => None,
            DialogueState::InScenario { scenario, .. } => Some(scenario),
        }
    }

    pub fn current_node(&self) -> Option<&ConversationNode> {
        match &self.state {
            DialogueState::Idle => None,
            DialogueState::InScenario { scenario, node } => scenario.node(*node),
        }
    }

    pub fn is_completed(&self, scenario_id: &str) -> bool {
        self.completed.contains(scenario_id)
    }

    pub fn completed(&self) -> impl Iterator<Item = &str> {
        self.completed.iter().map(String::as_str)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn view(&self) -> DialogueView {
        let (scenario_id, current_node) = match &self.state {
            DialogueState::Idle => (self.last_completed.clone(), None),
            DialogueState::InScenario { scenario, node } => (
                Some(scenario.id.clone()),
                scenario.node(*node).map(NodeView::from),
            ),
        };
        DialogueView {
            scenario_id,
            current_node,
            is_complete: !self.is_active() && self.last_completed.is_some(),
            completed_scenarios: self.completed.iter().cloned().collect(),
        }
    }
}

impl Default for DialogueEngine {
    fn default() -> Self {
        Self::new()
    }
}
