use std::sync::Arc;

use triage_assist::channels::{TelegramNotifier, WebhookSender};
use triage_assist::config::{self, DeliveryConfig, EngineConfig, MemoryConfig};
use triage_assist::llm::{LlmBackend, LlmConfig, create_provider};
use triage_assist::memory::{EmbeddingClient, HttpVectorIndex, MemoryGateway};
use triage_assist::pipeline::{ComposerConfig, ReplyComposer, SummaryWriter};
use triage_assist::routes::app_routes;
use triage_assist::session::{DialogueEngine, EngineDeps, KeywordClassifier, SessionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // ── LLM backend ──────────────────────────────────────────────────
    let backend_name =
        std::env::var("TRIAGE_LLM_BACKEND").unwrap_or_else(|_| "openai".to_string());
    let backend = LlmBackend::parse(&backend_name).unwrap_or_else(|| {
        eprintln!("Error: unknown TRIAGE_LLM_BACKEND '{backend_name}' (openai|anthropic)");
        std::process::exit(1);
    });

    let api_key = std::env::var("TRIAGE_LLM_API_KEY")
        .or_else(|_| match backend {
            LlmBackend::OpenAi => std::env::var("OPENAI_API_KEY"),
            LlmBackend::Anthropic => std::env::var("ANTHROPIC_API_KEY"),
        })
        .unwrap_or_else(|_| {
            eprintln!("Error: TRIAGE_LLM_API_KEY not set");
            eprintln!("  export TRIAGE_LLM_API_KEY=sk-...");
            std::process::exit(1);
        });

    let model = std::env::var("TRIAGE_LLM_MODEL").unwrap_or_else(|_| match backend {
        LlmBackend::OpenAi => "gpt-4o-mini".to_string(),
        LlmBackend::Anthropic => "claude-sonnet-4-20250514".to_string(),
    });

    let engine_config = EngineConfig::from_env()?;
    let memory_config = MemoryConfig::from_env()?;
    let delivery_config = DeliveryConfig::from_env()?;

    eprintln!("📬 Triage Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {} ({})", model, backend_name);
    eprintln!(
        "   Memory: {} (dim {}, top {})",
        memory_config.index_url, memory_config.embedding_dimension, memory_config.top_k
    );
    eprintln!("   Operator chat: {}", engine_config.operator_chat_id);
    eprintln!(
        "   Webhooks: http://0.0.0.0:{}/webhook/email, /webhook/telegram",
        engine_config.http_port
    );
    eprintln!(
        "   Draft API: http://0.0.0.0:{}/api/triage\n",
        engine_config.http_port
    );

    // One HTTP client with the engine-wide timeout, shared by every
    // collaborator.
    let http = config::http_client(engine_config.request_timeout)?;

    // ── LLM provider ─────────────────────────────────────────────────
    let llm_config = LlmConfig {
        backend,
        api_key: secrecy::SecretString::from(api_key),
        model,
    };
    let llm = create_provider(&llm_config, http.clone());

    // ── Memory gateway ──────────────────────────────────────────────
    let embeddings = EmbeddingClient::new(
        http.clone(),
        memory_config.embed_api_key.clone(),
        memory_config.embedding_model.clone(),
        memory_config.embedding_dimension,
    );
    let index = HttpVectorIndex::new(
        embeddings,
        http.clone(),
        memory_config.index_url.clone(),
        memory_config.index_api_key.clone(),
    );
    let gateway = Arc::new(MemoryGateway::new(Arc::new(index), memory_config.top_k));

    // ── Pipeline ────────────────────────────────────────────────────
    let composer = Arc::new(ReplyComposer::new(llm.clone(), ComposerConfig::default()));
    let summaries = Arc::new(SummaryWriter::new(llm.clone(), Arc::clone(&gateway)));

    // ── Dialogue engine ─────────────────────────────────────────────
    let deps = EngineDeps {
        sessions: Arc::new(SessionStore::new()),
        memory: gateway,
        composer,
        summaries,
        notifier: Arc::new(TelegramNotifier::new(
            delivery_config.telegram_bot_token,
            http.clone(),
        )),
        outbound: Arc::new(WebhookSender::new(delivery_config.send_webhook_url, http)),
        classifier: Arc::new(KeywordClassifier::new()),
    };
    let engine = Arc::new(DialogueEngine::new(deps));

    // ── HTTP server ─────────────────────────────────────────────────
    let app = app_routes(engine, engine_config.operator_chat_id);
    let listener =
        tokio::net::TcpListener::bind(format!("0.0.0.0:{}", engine_config.http_port)).await?;
    tracing::info!(port = engine_config.http_port, "Webhook server started");
    axum::serve(listener, app).await?;

    Ok(())
}
