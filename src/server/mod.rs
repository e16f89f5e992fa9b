//! HTTP API.
//!
//! Stateless mock endpoints mirror the web client's service calls; the
//! `/api/sessions` tree holds learner state server-side.

pub mod api;
pub mod error;
pub mod sessions;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, Uri, header};
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::exercises::ExerciseCatalog;
use crate::gamification::BadgeCatalog;
use crate::roleplay::ScenarioLibrary;
use crate::services::Services;
use crate::session::SessionRegistry;

pub use error::ApiError;

/// Shared by every handler.
pub struct AppState {
    pub services: Services,
    pub sessions: SessionRegistry,
    pub scenarios: ScenarioLibrary,
    pub exercises: ExerciseCatalog,
    pub badges: BadgeCatalog,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let services = Services::from_config(&config.services)?;
        let scenarios = config.roleplay.load_scenarios()?;
        let exercises = ExerciseCatalog::builtin().context("built-in exercises are invalid")?;

        Ok(Self {
            services,
            sessions: SessionRegistry::new(
                config.profile.defaults(),
                config.roleplay.badge_threshold,
            )
            .with_limits(config.server.session_ttl()?, config.server.max_sessions),
            scenarios,
            exercises,
            badges: BadgeCatalog::builtin(),
        })
    }
}

/// All routes, without middleware.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(api::health))
        .route("/api/chat", post(api::chat))
        .route("/api/translate", post(api::translate))
        .route("/api/speech/speech-to-text", post(api::speech_to_text))
        .route("/api/speech/text-to-speech", post(api::text_to_speech))
        .route("/api/pronunciation", post(api::score_pronunciation))
        .route("/api/pronunciation-score", post(api::score_pronunciation))
        .route("/api/languages", get(api::list_languages))
        .route("/api/badges", get(api::list_badges))
        .route("/api/scenarios", get(api::list_scenarios))
        .route("/api/exercises", get(api::list_exercises))
        .route("/api/sessions", post(sessions::create))
        .route(
            "/api/sessions/{id}",
            get(sessions::snapshot).delete(sessions::remove),
        )
        .route(
            "/api/sessions/{id}/profile",
            get(sessions::profile).put(sessions::update_profile),
        )
        .route("/api/sessions/{id}/chat", post(sessions::chat))
        .route("/api/sessions/{id}/translate", post(sessions::translate))
        .route(
            "/api/sessions/{id}/pronunciation",
            post(sessions::score_pronunciation),
        )
        .route("/api/sessions/{id}/roleplay", get(sessions::roleplay))
        .route(
            "/api/sessions/{id}/roleplay/select",
            post(sessions::select_scenario),
        )
        .route("/api/sessions/{id}/roleplay/respond", post(sessions::respond))
        .route("/api/sessions/{id}/roleplay/exit", post(sessions::exit_scenario))
        .fallback(route_not_found)
}

/// Routes plus tracing, CORS and the upload limit.
pub fn router(state: Arc<AppState>, config: &Config) -> Result<Router> {
    let origin = HeaderValue::from_str(&config.server.frontend_url)
        .with_context(|| format!("invalid frontend_url {:?}", config.server.frontend_url))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Ok(routes()
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.server.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &Config) -> Result<()> {
    let state = Arc::new(AppState::from_config(config)?);
    info!(
        scenarios = state.scenarios.len(),
        exercises = state.exercises.all().len(),
        provider = %config.services.provider,
        "Application state ready"
    );
    let app = router(state, config)?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, frontend = %config.server.frontend_url, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}

async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::RouteNotFound(uri.path().to_string())
}
