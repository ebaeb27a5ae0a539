//! Error types for the triage engine.

/// Top-level error type for the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Memory gateway errors — embedding, vector query, and upsert failures.
///
/// Retrieval failures are recovered inside the gateway (degrade to empty
/// context); commit failures are absorbed by the summary writer. These
/// variants exist so the degrade points stay visible at the call site.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("Embedding generation failed: {reason}")]
    EmbeddingFailed { reason: String },

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Vector query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Vector upsert failed: {reason}")]
    UpsertFailed { reason: String },

    #[error("Malformed store response: {reason}")]
    MalformedResponse { reason: String },
}

/// Channel-related errors (operator notifications, outbound dispatch).
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to send on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(String),
}

/// Reply pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Composition failed: {0}")]
    Compose(#[from] LlmError),

    #[error("Summary write-back failed: {0}")]
    WriteBack(#[from] MemoryError),
}

/// Result type alias for the engine.
pub type Result<T> = std::result::Result<T, Error>;
