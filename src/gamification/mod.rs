//! XP, levels and badges.

pub mod badges;
pub mod events;
pub mod profile;

pub use badges::{BadgeCatalog, BadgeDefinition, UnlockedBadge};
pub use events::ProgressEvent;
pub use profile::{
    BadgeUnlock, ProfileDefaults, ProfileError, ProgressionStore, UserProfile, XpAward,
    level_for_xp,
};

/// Sink for rewards earned outside the progression store itself
/// (role-play edges, scenario completion).
#[cfg_attr(test, mockall::automock)]
pub trait Rewards {
    fn award_xp(&mut self, amount: u32) -> XpAward;

    fn unlock_badge(&mut self, badge_id: &str) -> BadgeUnlock;
}
