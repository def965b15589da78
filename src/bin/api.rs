use cymbal_assistant::{
    api::{start_server, ApiState},
    audit::RunLog,
    chat::ChatOrchestrator,
    connector::RemoteBankConnector,
    llm::GeminiClient,
    pipeline::build_pipelines,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let gemini_api_key = std::env::var("GEMINI_API_KEY").unwrap_or_else(|_| {
        eprintln!("⚠️  GEMINI_API_KEY not set in .env");
        eprintln!("📌 See .env.example for setup instructions");
        "mock_key".to_string()
    });

    let api_port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("API_PORT"))
        .unwrap_or_else(|_| "8080".to_string())
        .parse()?;

    info!("🚀 Cymbal Banking Assistant - API Server");
    info!("📍 Port: {}", api_port);

    // Create components
    let connector = Arc::new(RemoteBankConnector::from_env());
    let llm = Arc::new(GeminiClient::new(gemini_api_key));

    let state = ApiState {
        pipelines: Arc::new(build_pipelines(connector.clone(), llm.clone())),
        chat: Arc::new(ChatOrchestrator::new(connector, llm)),
        run_log: Arc::new(RunLog::new()),
    };

    info!("✅ Pipelines and chat orchestrator initialized");
    info!("📡 Starting API server...");

    // Start API server
    start_server(state, api_port).await?;

    Ok(())
}
