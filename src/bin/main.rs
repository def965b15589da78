use cymbal_assistant::{
    audit::RunLog,
    connector::{BankConnector, MockBankConnector, RemoteBankConnector},
    llm::{GeminiClient, Llm, MockLlm},
    pipeline::SnapshotPipeline,
    state::SessionState,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    dotenv::dotenv().ok();

    info!("Cymbal banking assistant starting");

    // Use the live stack when a Gemini key is configured, otherwise run the
    // demo against the scripted mocks.
    let gemini_api_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();

    let (connector, llm): (Arc<dyn BankConnector>, Arc<dyn Llm>) = if gemini_api_key.is_empty() {
        info!("GEMINI_API_KEY not set - running with mock connector and model");
        let connector = MockBankConnector::new()
            .with_response("meetings", "Meeting with Dana Reeve, Tuesday 10:00, portfolio review")
            .with_response("advisors", "Dana Reeve - Wealth - Tue/Thu\nLee Okafor - Retirement - Mon/Wed")
            .with_response("profile", "Name: Ada Chen. Goal: save $12,000 for a house deposit.");
        (Arc::new(connector), Arc::new(MockLlm::new()))
    } else {
        (
            Arc::new(RemoteBankConnector::from_env()),
            Arc::new(GeminiClient::new(gemini_api_key)),
        )
    };

    let pipeline = SnapshotPipeline::advisors(connector, llm);
    let run_log = RunLog::new();
    let mut session = SessionState::new();

    info!(pipeline = pipeline.name(), "Running snapshot pipeline");

    match pipeline.run(&mut session).await {
        Ok(outcome) => {
            if let Some(input) = session.retrieval(outcome.domain) {
                run_log.record_snapshot(&outcome, input).await?;
            }

            println!("\n=== SNAPSHOT RESULT ===");
            println!("Run ID: {}", outcome.run_id);
            println!("Pipeline: {}", outcome.pipeline);
            println!("Elapsed: {} ms", outcome.elapsed_ms);
            println!("\nSteps:");
            for (i, step) in outcome.steps.iter().enumerate() {
                println!(
                    "  {}: {:?} - {} ({} ms)",
                    i + 1,
                    step.status,
                    step.query,
                    step.elapsed_ms
                );
            }
            println!("\nSummary:");
            println!("{}", serde_json::to_string_pretty(&outcome.summary)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("Snapshot failed: {}", e);
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}
