//! Badge catalog.
//!
//! The catalog is fixed, process-wide reference data. Profiles only ever
//! hold snapshots of catalog entries (see [`UnlockedBadge`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const FIRST_CHAT: &str = "first-chat";
pub const POLYGLOT: &str = "polyglot";
pub const PRONUNCIATION_MASTER: &str = "pronunciation-master";
pub const CONVERSATIONALIST: &str = "conversationalist";
pub const NATIVE_SPEAKER: &str = "native-speaker";
pub const ROLE_PLAYER: &str = "role-player";

/// A badge definition as it appears in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BadgeDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

static BUILTIN_BADGES: [BadgeDefinition; 6] = [
    BadgeDefinition {
        id: FIRST_CHAT,
        name: "First Chat",
        description: "Send your first message",
        icon: "💬",
    },
    BadgeDefinition {
        id: POLYGLOT,
        name: "Polyglot",
        description: "Use 5 different languages",
        icon: "🌍",
    },
    BadgeDefinition {
        id: PRONUNCIATION_MASTER,
        name: "Pronunciation Master",
        description: "Score 90%+ on pronunciation",
        icon: "🎯",
    },
    BadgeDefinition {
        id: CONVERSATIONALIST,
        name: "Conversationalist",
        description: "Complete 10 conversations",
        icon: "🗣️",
    },
    BadgeDefinition {
        id: NATIVE_SPEAKER,
        name: "Native Speaker",
        description: "Complete native level exercises",
        icon: "⭐",
    },
    BadgeDefinition {
        id: ROLE_PLAYER,
        name: "Role Player",
        description: "Complete 3 role-play scenarios",
        icon: "🎭",
    },
];

/// Read-only lookup over a set of badge definitions.
#[derive(Debug, Clone, Copy)]
pub struct BadgeCatalog {
    entries: &'static [BadgeDefinition],
}

impl BadgeCatalog {
    /// The catalog shipped with the application.
    pub fn builtin() -> Self {
        Self {
            entries: &BUILTIN_BADGES,
        }
    }

    pub fn get(&self, id: &str) -> Option<&'static BadgeDefinition> {
        self.entries.iter().find(|b| b.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'static, BadgeDefinition> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for BadgeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// A badge held by a profile, stamped with the moment it was unlocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockedBadge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub unlocked_at: DateTime<Utc>,
}

impl UnlockedBadge {
    pub fn from_definition(def: &BadgeDefinition, unlocked_at: DateTime<Utc>) -> Self {
        Self {
            id: def.id.to_string(),
            name: def.name.to_string(),
            description: def.description.to_string(),
            icon: def.icon.to_string(),
            unlocked_at,
        }
    }
}
