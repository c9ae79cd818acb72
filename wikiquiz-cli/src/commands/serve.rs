//! `wikiquiz serve` command - Run the HTTP API

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use wikiquiz_core::{server, Config, GeminiCliBackend, QuizPipeline};

pub async fn run(config: Config) -> Result<()> {
    info!("Starting WikiQuiz server...");

    let pipeline = QuizPipeline::from_config(&config).await?;

    let gemini = GeminiCliBackend::from_config(&config.model);
    if !gemini.check_available().await {
        eprintln!(
            "⚠️  Warning: Gemini CLI not found at '{}'",
            config.model.gemini_binary
        );
        if config.model.api_key.is_none() {
            eprintln!("   GEMINI_API_KEY is not set either, so generation will fail.");
        }
        eprintln!("   Install: npm install -g @google/gemini-cli");
    }

    let state = Arc::new(server::AppState::new(pipeline, config.clone()));

    println!("🚀 WikiQuiz server starting on {}", config.server_url());
    println!("   Generate:  POST {}/generate_quiz", config.server_url());
    println!("   History:   GET  {}/history", config.server_url());
    println!("   OpenAPI:   GET  {}/openapi.json", config.server_url());
    println!("   Press Ctrl+C to stop");

    server::start_server(state).await?;

    Ok(())
}
