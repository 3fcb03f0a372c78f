//! Webhook transport: axum application receiving Telegram updates over HTTP.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use sqlx::PgPool;
use telegram::{TelegramService, Update};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::domains::bot::{CommandRouter, InboundEvent};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub router: Arc<CommandRouter>,
    pub telegram: Arc<TelegramService>,
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/telegram/webhook", post(webhook_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint: verifies database connectivity.
async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let db_ok = sqlx::query("SELECT 1").execute(&state.db_pool).await.is_ok();
    if db_ok {
        (StatusCode::OK, Json(serde_json::json!({ "status": "healthy" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "unhealthy" })),
        )
    }
}

/// Receive one update. Always answers 200 quickly so Telegram does not
/// re-deliver; processing runs in a spawned task and its failures are
/// logged, never surfaced to the transport.
async fn webhook_handler(State(state): State<AppState>, Json(update): Json<Update>) -> StatusCode {
    if let Some(callback) = &update.callback_query {
        if let Err(e) = state.telegram.answer_callback_query(&callback.id).await {
            warn!(error = %e, "failed to answer callback query");
        }
    }

    if let Some(event) = InboundEvent::from_update(&update) {
        let router = state.router.clone();
        tokio::spawn(async move {
            router.handle(event).await;
        });
    }

    StatusCode::OK
}
