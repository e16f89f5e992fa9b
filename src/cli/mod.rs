//! Terminal output for the non-server subcommands.

pub mod play;

use crate::gamification::BadgeCatalog;
use crate::roleplay::ScenarioLibrary;

pub fn print_scenarios(library: &ScenarioLibrary) {
    for summary in library.summaries() {
        println!(
            "{:<20} {:<12} {:>4} XP  {}",
            summary.id,
            summary.difficulty.to_string(),
            summary.xp_reward,
            summary.title
        );
    }
}

pub fn print_badges(catalog: BadgeCatalog) {
    for badge in catalog.iter() {
        println!("{} {:<22} {}", badge.icon, badge.name, badge.description);
    }
}
