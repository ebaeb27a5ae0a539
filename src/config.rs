//! Configuration types — env-driven, with defaults.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default timeout applied to every outbound HTTP call.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default number of memory records retrieved per reply.
const DEFAULT_MEMORY_TOP_K: usize = 3;

/// Default embedding model and its vector dimensionality.
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;

/// Read a required environment variable.
fn require_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

/// Build a `reqwest::Client` with the engine-wide request timeout.
///
/// Every external collaborator (LLM, vector store, Telegram, send webhook)
/// goes through a client built here so no call can suspend indefinitely.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

/// Engine-level configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Conversation identifier of the single human operator.
    pub operator_chat_id: String,
    /// Port for the webhook HTTP server.
    pub http_port: u16,
    /// Timeout for every outbound HTTP call.
    pub request_timeout: Duration,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let operator_chat_id = require_env("TRIAGE_OPERATOR_CHAT_ID")?;

        let http_port = std::env::var("TRIAGE_HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "TRIAGE_HTTP_PORT".to_string(),
                message: "expected a port number".to_string(),
            })?;

        let timeout_secs = std::env::var("TRIAGE_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        Ok(Self {
            operator_chat_id,
            http_port,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Memory gateway configuration — embeddings plus the vector index.
///
/// `embedding_dimension` is the single dimensionality constant shared by
/// writer and reader; the embedding client validates every response against
/// it.
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Base URL of the vector index (query/upsert endpoints).
    pub index_url: String,
    /// API key for the vector index.
    pub index_api_key: SecretString,
    /// API key for the embeddings endpoint.
    pub embed_api_key: SecretString,
    /// Embedding model name.
    pub embedding_model: String,
    /// Expected embedding vector length.
    pub embedding_dimension: usize,
    /// Number of nearest records returned per retrieval.
    pub top_k: usize,
}

impl MemoryConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let index_url = require_env("TRIAGE_INDEX_URL")?;
        let index_api_key = SecretString::from(require_env("TRIAGE_INDEX_API_KEY")?);

        // Embeddings default to the OpenAI key used for completions.
        let embed_api_key = SecretString::from(
            std::env::var("TRIAGE_EMBED_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .map_err(|_| ConfigError::MissingEnvVar("TRIAGE_EMBED_API_KEY".to_string()))?,
        );

        let embedding_model = std::env::var("TRIAGE_EMBED_MODEL")
            .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string());

        let embedding_dimension = std::env::var("TRIAGE_EMBED_DIMENSION")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_EMBEDDING_DIMENSION);

        let top_k = std::env::var("TRIAGE_MEMORY_TOP_K")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MEMORY_TOP_K);

        Ok(Self {
            index_url,
            index_api_key,
            embed_api_key,
            embedding_model,
            embedding_dimension,
            top_k,
        })
    }
}

/// Configuration for the downstream collaborators that deliver results.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Telegram bot token for operator notifications.
    pub telegram_bot_token: String,
    /// Webhook that performs the actual email send.
    pub send_webhook_url: String,
}

impl DeliveryConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            telegram_bot_token: require_env("TELEGRAM_BOT_TOKEN")?,
            send_webhook_url: require_env("TRIAGE_SEND_WEBHOOK_URL")?,
        })
    }
}
