//! Application configuration.
//!
//! Loaded from `config.toml` in the platform config directory unless a path
//! is given explicitly. A missing file yields defaults; every section and
//! field is optional.

pub mod schema;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::gamification::ProfileDefaults;
use crate::roleplay::ScenarioLibrary;
use crate::roleplay::engine::DEFAULT_BADGE_THRESHOLD;
use crate::session::registry::DEFAULT_MAX_SESSIONS;

pub use schema::{parse_duration, validate_language_code};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub services: ServicesConfig,
    pub profile: ProfileConfig,
    pub roleplay: RoleplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin allowed by CORS (the web frontend).
    pub frontend_url: String,
    pub max_upload_bytes: usize,
    /// Idle time after which a learner session is dropped, e.g. "30m".
    pub session_ttl: String,
    /// Live sessions kept before the least recently used one is dropped.
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            frontend_url: "http://localhost:5173".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            session_ttl: "30m".to_string(),
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

impl ServerConfig {
    pub fn session_ttl(&self) -> Result<Duration> {
        parse_duration(&self.session_ttl)
            .map_err(anyhow::Error::msg)
            .context("invalid server.session_ttl")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Only "mock" is available.
    pub provider: String,
    /// Multiplier applied to every simulated delay (0.0 = instant).
    pub latency_multiplier: f64,
    /// Fixed RNG seed for reproducible mock output.
    pub seed: Option<u64>,
    /// Upper bound for a single service call, e.g. "30s".
    pub request_timeout: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            latency_multiplier: 1.0,
            seed: None,
            request_timeout: "30s".to_string(),
        }
    }
}

impl ServicesConfig {
    pub fn request_timeout(&self) -> Result<Duration> {
        parse_duration(&self.request_timeout)
            .map_err(anyhow::Error::msg)
            .context("invalid services.request_timeout")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub name: String,
    pub native_language: String,
    pub current_language: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        let defaults = ProfileDefaults::default();
        Self {
            name: defaults.name,
            native_language: defaults.native_language,
            current_language: defaults.current_language,
        }
    }
}

impl ProfileConfig {
    pub fn defaults(&self) -> ProfileDefaults {
        ProfileDefaults {
            name: self.name.clone(),
            current_language: self.current_language.clone(),
            native_language: self.native_language.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleplayConfig {
    /// JSON file replacing the built-in scenarios.
    pub scenarios_path: Option<PathBuf>,
    pub badge_threshold: usize,
}

impl Default for RoleplayConfig {
    fn default() -> Self {
        Self {
            scenarios_path: None,
            badge_threshold: DEFAULT_BADGE_THRESHOLD,
        }
    }
}

impl RoleplayConfig {
    /// The configured scenario file, or the built-in scenarios.
    pub fn load_scenarios(&self) -> Result<ScenarioLibrary> {
        match &self.scenarios_path {
            Some(path) => ScenarioLibrary::from_path(path)
                .with_context(|| format!("failed to load scenarios from {}", path.display())),
            None => ScenarioLibrary::builtin().context("built-in scenarios are invalid"),
        }
    }
}

impl Config {
    /// `<config dir>/linguaplay/config.toml`, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "linguaplay").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// An explicit path must exist; a missing default file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_overrides(std::env::var("PORT").ok(), std::env::var("FRONTEND_URL").ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply the `PORT` / `FRONTEND_URL` environment overrides.
    pub fn apply_overrides(&mut self, port: Option<String>, frontend_url: Option<String>) -> Result<()> {
        if let Some(port) = port {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("invalid PORT value {:?}", port))?;
        }
        if let Some(url) = frontend_url.filter(|u| !u.trim().is_empty()) {
            self.server.frontend_url = url;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.services.provider != "mock" {
            bail!(
                "unknown services provider: {:?} (expected \"mock\")",
                self.services.provider
            );
        }
        if !self.services.latency_multiplier.is_finite() || self.services.latency_multiplier < 0.0 {
            bail!("services.latency_multiplier must be a non-negative number");
        }
        self.services.request_timeout()?;
        self.server.session_ttl()?;
        if self.server.max_sessions == 0 {
            bail!("server.max_sessions must be at least 1");
        }
        if self.profile.name.trim().is_empty() {
            bail!("profile.name must not be empty");
        }
        validate_language_code(&self.profile.native_language).map_err(anyhow::Error::msg)?;
        validate_language_code(&self.profile.current_language).map_err(anyhow::Error::msg)?;
        if self.roleplay.badge_threshold == 0 {
            bail!("roleplay.badge_threshold must be at least 1");
        }
        Ok(())
    }
}
