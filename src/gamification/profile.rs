//! User profile and the progression store that owns it.
//!
//! `ProgressionStore` is the only way to mutate a [`UserProfile`]. Level is
//! never stored independently of XP; every mutation goes through
//! [`level_for_xp`].

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::Rewards;
use super::badges::{BadgeCatalog, UnlockedBadge};
use super::events::ProgressEvent;

/// XP needed to advance one level.
pub const XP_PER_LEVEL: u64 = 100;

/// Level derived from a total XP amount.
pub fn level_for_xp(xp: u64) -> u64 {
    xp / XP_PER_LEVEL + 1
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("profile name must not be empty")]
    EmptyName,
}

/// Values a freshly created (or reset) profile starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDefaults {
    pub name: String,
    pub current_language: String,
    pub native_language: String,
}

impl Default for ProfileDefaults {
    fn default() -> Self {
        Self {
            name: "Language Learner".to_string(),
            current_language: "en".to_string(),
            native_language: "en".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub level: u64,
    pub xp: u64,
    pub badges: Vec<UnlockedBadge>,
    pub current_language: String,
    pub native_language: String,
}

impl UserProfile {
    fn from_defaults(defaults: &ProfileDefaults) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: defaults.name.clone(),
            level: level_for_xp(0),
            xp: 0,
            badges: Vec::new(),
            current_language: defaults.current_language.clone(),
            native_language: defaults.native_language.clone(),
        }
    }

    /// XP earned inside the current level (0..100).
    pub fn xp_into_level(&self) -> u64 {
        self.xp % XP_PER_LEVEL
    }

    /// XP still needed to reach the next level.
    pub fn xp_to_next_level(&self) -> u64 {
        XP_PER_LEVEL - self.xp_into_level()
    }
}

/// Result of [`ProgressionStore::award_xp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpAward {
    pub amount: u32,
    pub xp: u64,
    pub level: u64,
    pub previous_level: u64,
}

impl XpAward {
    pub fn leveled_up(&self) -> bool {
        self.level > self.previous_level
    }
}

/// Result of [`ProgressionStore::unlock_badge`].
///
/// Only `Unlocked` changes the profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadgeUnlock {
    Unlocked(UnlockedBadge),
    AlreadyUnlocked,
    UnknownBadge,
}

impl BadgeUnlock {
    pub fn is_unlocked(&self) -> bool {
        matches!(self, BadgeUnlock::Unlocked(_))
    }
}

/// Owner of one user's gamification state.
#[derive(Debug, Clone)]
pub struct ProgressionStore {
    profile: UserProfile,
    defaults: ProfileDefaults,
    catalog: BadgeCatalog,
    events: Vec<ProgressEvent>,
}

impl ProgressionStore {
    pub fn new(defaults: ProfileDefaults) -> Self {
        Self::with_catalog(defaults, BadgeCatalog::builtin())
    }

    pub fn with_catalog(defaults: ProfileDefaults, catalog: BadgeCatalog) -> Self {
        Self {
            profile: UserProfile::from_defaults(&defaults),
            defaults,
            catalog,
            events: Vec::new(),
        }
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn catalog(&self) -> BadgeCatalog {
        self.catalog
    }

    pub fn has_badge(&self, badge_id: &str) -> bool {
        self.profile.badges.iter().any(|b| b.id == badge_id)
    }

    pub fn award_xp(&mut self, amount: u32) -> XpAward {
        let previous_level = self.profile.level;
        self.profile.xp = self.profile.xp.saturating_add(u64::from(amount));
        self.profile.level = level_for_xp(self.profile.xp);

        let award = XpAward {
            amount,
            xp: self.profile.xp,
            level: self.profile.level,
            previous_level,
        };

        debug!(amount, xp = award.xp, level = award.level, "XP awarded");
        self.events.push(ProgressEvent::XpAwarded {
            amount,
            total: award.xp,
        });
        if award.leveled_up() {
            info!(level = award.level, "Level up");
            self.events.push(ProgressEvent::LevelUp { level: award.level });
        }

        award
    }

    pub fn unlock_badge(&mut self, badge_id: &str) -> BadgeUnlock {
        let Some(def) = self.catalog.get(badge_id) else {
            debug!(badge_id, "Ignoring unknown badge");
            return BadgeUnlock::UnknownBadge;
        };
        if self.has_badge(badge_id) {
            return BadgeUnlock::AlreadyUnlocked;
        }

        let badge = UnlockedBadge::from_definition(def, Utc::now());
        info!(badge_id, "Badge unlocked");
        self.events.push(ProgressEvent::BadgeUnlocked {
            badge_id: badge.id.clone(),
            name: badge.name.clone(),
            icon: badge.icon.clone(),
        });
        self.profile.badges.push(badge.clone());
        BadgeUnlock::Unlocked(badge)
    }

    pub fn set_current_language(&mut self, code: impl Into<String>) {
        self.profile.current_language = code.into();
    }

    pub fn set_native_language(&mut self, code: impl Into<String>) {
        self.profile.native_language = code.into();
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), ProfileError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ProfileError::EmptyName);
        }
        self.profile.name = name;
        Ok(())
    }

    /// Return the profile to its configured defaults.
    pub fn reset(&mut self) {
        self.profile = UserProfile::from_defaults(&self.defaults);
        self.events.clear();
    }

    /// Take the notifications accumulated since the last call.
    pub fn drain_events(&mut self) -> Vec<ProgressEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Default for ProgressionStore {
    fn default() -> Self {
        Self::new(ProfileDefaults::default())
    }
}

impl Rewards for ProgressionStore {
    fn award_xp(&mut self, amount: u32) -> XpAward {
        ProgressionStore::award_xp(self, amount)
    }

    fn unlock_badge(&mut self, badge_id: &str) -> BadgeUnlock {
        ProgressionStore::unlock_badge(self, badge_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamification::badges::{FIRST_CHAT, ROLE_PLAYER};

    fn assert_level_invariant(store: &ProgressionStore) {
        let p = store.profile();
        assert_eq!(p.level, p.xp / 100 + 1, "level out of sync at xp={}", p.xp);
    }

    #[test]
    fn defaults() {
        let store = ProgressionStore::default();
        let p = store.profile();
        assert_eq!(p.xp, 0);
        assert_eq!(p.level, 1);
        assert_eq!(p.name, "Language Learner");
        assert_eq!(p.current_language, "en");
        assert_eq!(p.native_language, "en");
        assert!(p.badges.is_empty());
        assert!(Uuid::parse_str(&p.id).is_ok());
    }

    #[test]
    fn level_boundaries() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(250), 3);

        let mut store = ProgressionStore::default();
        store.award_xp(99);
        assert_eq!(store.profile().level, 1);
        let award = store.award_xp(1);
        assert_eq!(award.xp, 100);
        assert_eq!(award.level, 2);
        assert!(award.leveled_up());
        assert_level_invariant(&store);
    }

    #[test]
    fn xp_is_additive() {
        let pairs = [(0, 0), (0, 5), (37, 63), (99, 1), (150, 275), (1, 9_999)];
        for (a, b) in pairs {
            let mut split = ProgressionStore::default();
            split.award_xp(a);
            assert_level_invariant(&split);
            split.award_xp(b);
            assert_level_invariant(&split);

            let mut single = ProgressionStore::default();
            single.award_xp(a + b);

            assert_eq!(split.profile().xp, single.profile().xp, "a={a} b={b}");
            assert_eq!(split.profile().level, single.profile().level, "a={a} b={b}");
        }
    }

    #[test]
    fn zero_award_changes_nothing_observable() {
        let mut store = ProgressionStore::default();
        store.award_xp(40);
        let before = store.profile().clone();
        let award = store.award_xp(0);
        assert!(!award.leveled_up());
        assert_eq!(store.profile(), &before);
    }

    #[test]
    fn xp_saturates_instead_of_overflowing() {
        let mut store = ProgressionStore::default();
        store.profile.xp = u64::MAX - 1;
        store.award_xp(10);
        assert_eq!(store.profile().xp, u64::MAX);
        assert_level_invariant(&store);
    }

    #[test]
    fn unlock_is_idempotent() {
        let mut store = ProgressionStore::default();
        assert!(store.unlock_badge(FIRST_CHAT).is_unlocked());
        assert_eq!(store.unlock_badge(FIRST_CHAT), BadgeUnlock::AlreadyUnlocked);
        assert_eq!(store.profile().badges.len(), 1);
        assert!(store.has_badge(FIRST_CHAT));
    }

    #[test]
    fn unknown_badge_leaves_profile_unchanged() {
        let mut store = ProgressionStore::default();
        store.award_xp(12);
        let before = store.profile().clone();
        assert_eq!(store.unlock_badge("no-such-badge"), BadgeUnlock::UnknownBadge);
        assert_eq!(store.profile(), &before);
    }

    #[test]
    fn badges_keep_unlock_order() {
        let mut store = ProgressionStore::default();
        store.unlock_badge(ROLE_PLAYER);
        store.unlock_badge(FIRST_CHAT);
        let ids: Vec<_> = store.profile().badges.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec![ROLE_PLAYER, FIRST_CHAT]);
    }

    #[test]
    fn setters_replace_fields() {
        let mut store = ProgressionStore::default();
        store.set_current_language("es");
        store.set_native_language("hi");
        store.set_name("Priya").unwrap();
        let p = store.profile();
        assert_eq!(p.current_language, "es");
        assert_eq!(p.native_language, "hi");
        assert_eq!(p.name, "Priya");
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut store = ProgressionStore::default();
        assert_eq!(store.set_name("   "), Err(ProfileError::EmptyName));
        assert_eq!(store.profile().name, "Language Learner");
    }

    #[test]
    fn reset_restores_defaults() {
        let defaults = ProfileDefaults {
            name: "Sam".into(),
            current_language: "fr".into(),
            native_language: "de".into(),
        };
        let mut store = ProgressionStore::new(defaults);
        store.award_xp(230);
        store.unlock_badge(FIRST_CHAT);
        store.set_current_language("ja");
        store.reset();

        let p = store.profile();
        assert_eq!((p.xp, p.level), (0, 1));
        assert!(p.badges.is_empty());
        assert_eq!(p.name, "Sam");
        assert_eq!(p.current_language, "fr");
        assert!(store.drain_events().is_empty());
    }

    #[test]
    fn events_record_xp_level_and_badges() {
        let mut store = ProgressionStore::default();
        store.award_xp(120);
        store.unlock_badge(FIRST_CHAT);
        store.unlock_badge(FIRST_CHAT);

        let events = store.drain_events();
        assert_eq!(
            events,
            vec![
                ProgressEvent::XpAwarded {
                    amount: 120,
                    total: 120
                },
                ProgressEvent::LevelUp { level: 2 },
                ProgressEvent::BadgeUnlocked {
                    badge_id: "first-chat".into(),
                    name: "First Chat".into(),
                    icon: "💬".into(),
                },
            ]
        );
        assert!(store.drain_events().is_empty());
    }

    #[test]
    fn profile_progress_helpers() {
        let mut store = ProgressionStore::default();
        store.award_xp(145);
        assert_eq!(store.profile().xp_into_level(), 45);
        assert_eq!(store.profile().xp_to_next_level(), 55);
    }
}
