use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::routing::{delete, get, post, put};
use axum::Router;
use mnemora_core::config::MnemoraConfig;
use mnemora_emotion::EmotionEngine;
use mnemora_llm::{Gateway, OpenAiCompatProvider, ProviderRouter, ProviderSlot};
use mnemora_memory::MemoryStore;
use mnemora_users::UserStore;
use tower_http::cors::CorsLayer;

use crate::http;

/// Central shared state, passed as `Arc<AppState>` to every axum handler and
/// cloned into the scheduler's background GC consumer and the per-turn
/// detached cleaning task. Each store owns its own `Mutex<Connection>` (§5);
/// sharing this `Arc` costs a refcount bump, nothing more.
pub struct AppState {
    pub config: MnemoraConfig,
    pub gateway: Gateway,
    pub users: UserStore,
    pub memory: MemoryStore,
    pub emotion: EmotionEngine,
}

impl AppState {
    pub fn new(
        config: MnemoraConfig,
        users: UserStore,
        memory: MemoryStore,
        emotion: EmotionEngine,
    ) -> Self {
        let provider = OpenAiCompatProvider::new(
            config.llm.base_url.clone(),
            config.llm.api_key.clone(),
            config.llm.embedding_model.clone(),
            Duration::from_secs(config.llm.timeout_secs),
        );
        let router = ProviderRouter::new(vec![ProviderSlot::new(Box::new(provider), 2)]);
        let gateway = Gateway::new(router, config.llm.model.clone());

        Self {
            config,
            gateway,
            users,
            memory,
            emotion,
        }
    }
}

/// Assemble the full axum router: a public `/health` probe, everything else
/// under `/api/v1` (§6).
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.http.cors_origins);

    let api = Router::new()
        .route("/auth/register", post(http::auth::register))
        .route("/auth/login", post(http::auth::login))
        .route("/auth/me", get(http::auth::me))
        .route("/chat", post(http::chat::chat))
        .route(
            "/system-instructions",
            get(http::system_instructions::list).post(http::system_instructions::create),
        )
        .route(
            "/system-instructions/{id}",
            put(http::system_instructions::update).delete(http::system_instructions::delete),
        )
        .route("/prompts", get(http::prompts::list).post(http::prompts::upsert))
        .route("/prompts/{system_instruction_id}", delete(http::prompts::delete))
        .route("/memory/list", get(http::memory::list))
        .route("/memory/emotion", get(http::memory::emotion))
        .route("/memory/clear-old", post(http::memory::clear_old))
        .route("/memory/{id}", delete(http::memory::delete));

    Router::new()
        .route("/health", get(http::health::health))
        .nest("/api/v1", api)
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
