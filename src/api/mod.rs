//! HTTP API
//!
//! Two routes:
//!
//! - `GET /` returns a static welcome message (used as a health check)
//! - `POST /chat` takes `{question, session_id}` and returns `{response}`
//!
//! `/chat` always answers `200`: failures inside the pipeline are reported
//! as text in `response`.

use axum::extract::State;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use crate::agent::ConversationPipeline;
use crate::config::ServerConfig;
use crate::error::{CabError, Result};

pub const WELCOME_MESSAGE: &str = "Welcome to the Chatbot API";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<ConversationPipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<ConversationPipeline>) -> Self {
        Self { pipeline }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
}

async fn root_handler() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: WELCOME_MESSAGE.to_string(),
    })
}

#[instrument(skip(state, request), fields(session_id = %request.session_id))]
async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let response = state
        .pipeline
        .respond(&request.question, &request.session_id)
        .await;
    Json(ChatResponse { response })
}

/// CORS policy for the configured origins.
///
/// Origins are compared without a trailing `/`, since browsers never send
/// one. A `*` entry allows any origin, without credentials.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    if origins.iter().any(|o| o.trim() == "*") {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let values = origins
        .iter()
        .map(|origin| {
            let origin = origin.trim().trim_end_matches('/');
            HeaderValue::from_str(origin)
                .map_err(|_| CabError::Config(format!("invalid CORS origin '{}'", origin)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(values))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

/// Build the application router.
pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/chat", post(chat_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serve the API until Ctrl-C.
pub async fn serve(config: &ServerConfig, pipeline: Arc<ConversationPipeline>) -> Result<()> {
    let app = router(AppState::new(pipeline), cors_layer(&config.cors_origins)?);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "chat API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("chat API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
