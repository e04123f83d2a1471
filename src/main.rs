use std::sync::Arc;

use enroll_assist::assistant::AssistantBridge;
use enroll_assist::config::AppConfig;
use enroll_assist::llm::{LlmConfig, create_provider};
use enroll_assist::registration::{Registrar, SessionStore};
use enroll_assist::store::{LibSqlBackend, StudentStore};
use enroll_assist::voice::{HttpTranscriber, VoiceBridge};
use enroll_assist::ws::{AppState, registration_routes};

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

    let config = AppConfig::from_env()?;

    eprintln!("🚗 Enroll Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.model);
    eprintln!("   Chat WS: ws://0.0.0.0:{}/ws", config.port);
    eprintln!("   Student API: http://0.0.0.0:{}/api/students", config.port);
    eprintln!("   Database: {}", config.db_path);
    eprintln!("   STT: {}\n", config.stt_endpoint);

    // ── LLM provider ─────────────────────────────────────────────────────
    let llm = create_provider(&LlmConfig {
        backend: config.llm_backend,
        api_key: config.api_key.clone(),
        model: config.model.clone(),
    })?;

    // ── Student database ─────────────────────────────────────────────────
    let students: Arc<dyn StudentStore> = Arc::new(
        LibSqlBackend::new_local(std::path::Path::new(&config.db_path)).await?,
    );

    // ── Conversation engine + bridges ────────────────────────────────────
    let sessions = SessionStore::new();
    let registrar = Arc::new(Registrar::new(Arc::clone(&sessions), Arc::clone(&students)));
    let transcriber = Arc::new(HttpTranscriber::new(
        config.stt_endpoint.clone(),
        config.stt_model.clone(),
        config.stt_api_key.clone(),
    ));
    let voice = Arc::new(VoiceBridge::new(transcriber, Arc::clone(&registrar)));
    let assistant = Arc::new(AssistantBridge::new(llm, Arc::clone(&sessions)));

    // ── Server ───────────────────────────────────────────────────────────
    let app = registration_routes(AppState {
        registrar,
        voice,
        assistant,
        students,
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "Registration server started");
    axum::serve(listener, app).await?;

    Ok(())
}
