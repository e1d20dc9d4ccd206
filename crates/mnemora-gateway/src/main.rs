use std::net::SocketAddr;
use std::sync::Arc;

use rusqlite::Connection;
use tracing::{info, warn};

mod app;
mod error;
mod gc;
mod http;
mod orchestrator;
mod token;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mnemora_gateway=info,tower_http=debug".into()),
        )
        .init();

    // explicit path > MNEMORA_CONFIG env > ~/.mnemora/mnemora.toml
    let config_path = std::env::var("MNEMORA_CONFIG").ok();
    let config = mnemora_core::config::MnemoraConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("config load failed ({e}), using defaults");
        mnemora_core::config::MnemoraConfig::default()
    });

    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        std::fs::create_dir_all(parent).ok();
    }

    let users = mnemora_users::UserStore::new(open_conn(&config.database.path)?)?;
    let memory = mnemora_memory::MemoryStore::new(open_conn(&config.database.path)?)?;
    let emotion = mnemora_emotion::EmotionEngine::new(open_conn(&config.database.path)?)?;

    let state = Arc::new(app::AppState::new(config.clone(), users, memory, emotion));

    // Held for the process lifetime: dropping it would close the scheduler's
    // shutdown watch channel and spin its select loop (see gc::spawn).
    let _scheduler_shutdown = gc::spawn(state.clone(), &config)?;

    let router = app::build_router(state.clone());

    let addr: SocketAddr = format!("{}:{}", config.http.bind, config.http.port).parse()?;
    info!("mnemora gateway listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn open_conn(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(conn)
}
