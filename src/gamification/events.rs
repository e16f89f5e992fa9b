//! Progress notifications for UI display

use serde::Serialize;

/// Something observable that happened to a profile
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ProgressEvent {
    /// XP was added to the profile
    XpAwarded { amount: u32, total: u64 },
    /// The profile crossed one or more level boundaries
    LevelUp { level: u64 },
    /// A badge was added to the profile
    BadgeUnlocked {
        badge_id: String,
        name: String,
        icon: String,
    },
}

impl ProgressEvent {
    /// Short human-readable notification text
    pub fn message(&self) -> String {
        match self {
            ProgressEvent::XpAwarded { amount, .. } => format!("+{} XP", amount),
            ProgressEvent::LevelUp { level } => format!("Level up! You are now level {}", level),
            ProgressEvent::BadgeUnlocked { name, icon, .. } => {
                format!("Badge unlocked: {}! {}", name, icon)
            }
        }
    }
}
