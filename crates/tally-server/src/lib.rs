//! Tally Webhook Server
//!
//! Axum server receiving Telegram webhook updates and driving the expense
//! and goal flows in tally-core.
//!
//! Transport contract:
//! - POST /webhook answers 200 for every body that is valid JSON, whether
//!   or not it decodes to something this bot acts on. Telegram retries
//!   non-200 responses, and a replayed update would repeat side effects.
//! - 400 is reserved for bodies that are not JSON at all.
//! - GET /webhook is a liveness probe.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use tally_core::{
    CachedRows, CachedTable, ModelBackend, ModelClient, StoreClient, EXPENSES_TABLE,
    EXPENSES_TTL, GOALS_TABLE, GOALS_TTL,
};

pub mod config;
mod handlers;
pub mod telegram;

pub use config::{BotConfig, RejectPolicy};

use telegram::{InboundEvent, TelegramApi, Update};

/// Shared application state
pub struct AppState {
    pub config: BotConfig,
    pub telegram: TelegramApi,
    pub model: ModelClient,
    pub expenses: CachedTable,
    pub goals: CachedRows,
}

impl AppState {
    /// Wire up production clients from configuration
    pub fn from_config(config: BotConfig) -> Self {
        let store = StoreClient::sheets(&config.sheet_id, &config.sheet_token);
        let telegram = TelegramApi::new(&config.bot_token);
        let model = ModelClient::openai_compatible(
            &config.model_host,
            &config.model_name,
            config.model_api_key.as_deref(),
        );
        Self::with_clients(config, telegram, model, store)
    }

    /// Assemble state from explicit parts (tests inject memory store and
    /// mock model here)
    pub fn with_clients(
        config: BotConfig,
        telegram: TelegramApi,
        model: ModelClient,
        store: StoreClient,
    ) -> Self {
        Self {
            telegram,
            model,
            expenses: CachedTable::new(store.clone(), EXPENSES_TABLE, EXPENSES_TTL),
            goals: CachedRows::new(store, GOALS_TABLE, GOALS_TTL),
            config,
        }
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", post(receive_update).get(liveness))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn liveness() -> &'static str {
    "tally webhook up"
}

async fn receive_update(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    let update: Update = match serde_json::from_value(body) {
        Ok(u) => u,
        Err(e) => {
            // Valid JSON that isn't an Update shape; acknowledge so
            // Telegram doesn't replay it forever
            debug!(error = %e, "Unrecognized webhook body");
            return StatusCode::OK;
        }
    };
    debug!(update_id = update.update_id, "Webhook update received");

    let event = InboundEvent::decode(&update);
    handlers::handle_event(&state, event).await;
    StatusCode::OK
}

/// Start the server
pub async fn serve(config: BotConfig, host: &str, port: u16) -> anyhow::Result<()> {
    let state = Arc::new(AppState::from_config(config));
    info!(
        model = state.model.model(),
        allowed_users = state.config.allowed_users.len(),
        "Starting webhook server"
    );
    if state.config.allowed_users.is_empty() {
        tracing::warn!("ALLOWED_USERS is empty; every update will be rejected");
    }

    let app = create_router(state);
    let addr = format!("{}:{}", host, port);
    info!("Listening on http://{}/webhook", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
