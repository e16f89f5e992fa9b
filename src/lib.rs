//! linguaplay - a language-learning companion backend
//!
//! This crate provides:
//! - Gamification: XP, levels and the badge catalog
//! - Role-play: scenario graphs and the dialogue engine that walks them
//! - Mock chat, translation, speech and pronunciation services
//! - Learner sessions tying rewards to those services
//! - HTTP API and terminal role-play

pub mod cli;
pub mod config;
pub mod exercises;
pub mod gamification;
pub mod languages;
pub mod roleplay;
pub mod server;
pub mod services;
pub mod session;

pub use config::Config;
