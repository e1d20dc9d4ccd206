use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8780;
pub const DEFAULT_BIND: &str = "127.0.0.1";
/// Number of dialogue messages that triggers a cleaning round. Source
/// material ships this as 6 but notes the intended production value is
/// closer to 50 — kept configurable rather than hard-coded either way.
pub const DEFAULT_BATCH_SIZE: usize = 6;
pub const DEFAULT_JWT_TTL_DAYS: i64 = 7;

/// Top-level config (mnemora.toml + MNEMORA_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MnemoraConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl Default for MnemoraConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            database: DatabaseConfig::default(),
            llm: LlmConfig {
                base_url: default_llm_base_url(),
                api_key: "change-me".to_string(),
                model: default_model(),
                embedding_model: default_embedding_model(),
                temperature: default_temperature(),
                max_tokens: default_max_tokens(),
                timeout_secs: default_timeout_secs(),
            },
            auth: AuthConfig::default(),
            memory: MemoryConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Comma-separated list is split by the caller before this struct sees it.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Single LLM provider: an OpenAI-compatible chat-completions + embeddings endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_jwt_ttl_days")]
    pub jwt_ttl_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_ttl_days: default_jwt_ttl_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Default horizon, in months, for the rolling soft-delete the chat
    /// orchestrator runs after every cleaning round.
    #[serde(default = "default_rolling_cleanup_months")]
    pub rolling_cleanup_months: i64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            rolling_cleanup_months: default_rolling_cleanup_months(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Local hour (0-23) the daily GC job fires at.
    #[serde(default = "default_gc_hour")]
    pub gc_hour: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            gc_hour: default_gc_hour(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_llm_base_url() -> String {
    "https://api.openai.com".to_string()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_jwt_secret() -> String {
    "change-me".to_string()
}
fn default_jwt_ttl_days() -> i64 {
    DEFAULT_JWT_TTL_DAYS
}
fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}
fn default_rolling_cleanup_months() -> i64 {
    3
}
fn default_gc_hour() -> u32 {
    3
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.mnemora/mnemora.db", home)
}

impl MnemoraConfig {
    /// Load config from a TOML file with MNEMORA_* env var overrides.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: MnemoraConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("MNEMORA_").split("_"))
            .extract()
            .map_err(|e| crate::error::AppError::Validation(format!("config error: {e}")))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.mnemora/mnemora.toml", home)
}
