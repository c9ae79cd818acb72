//! `wikiquiz status` command - Check whether the server is running

use anyhow::Result;
use wikiquiz_core::{Config, HealthResponse};

pub async fn run(config: Config) -> Result<()> {
    let url = format!("{}/health", config.server_url());

    println!("Checking WikiQuiz server status...");
    println!("URL: {}", url);

    match reqwest::get(&url).await {
        Ok(response) if response.status().is_success() => {
            let health: HealthResponse = response.json().await?;

            println!("\n✅ WikiQuiz server is running");
            println!("   Status:          {}", health.status);
            println!("   Version:         {}", health.version);
            println!(
                "   Gemini CLI:      {}",
                if health.gemini_cli_available {
                    "available ✓"
                } else {
                    "not available ⚠"
                }
            );
            println!(
                "   Database:        {}",
                if health.database_ok { "ok ✓" } else { "unreachable ⚠" }
            );
        }
        Ok(response) => {
            println!(
                "\n⚠️  WikiQuiz server responded with status: {}",
                response.status()
            );
        }
        Err(_) => {
            println!("\n❌ WikiQuiz server is not running");
            println!("   Start it with: wikiquiz serve");
        }
    }

    Ok(())
}
