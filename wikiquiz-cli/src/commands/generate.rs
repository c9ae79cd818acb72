//! `wikiquiz generate` command - Run the full pipeline once

use anyhow::Result;
use tracing::info;
use wikiquiz_core::{Config, QuizPipeline};

use super::print_quiz;

pub async fn run(config: Config, url: &str, json_output: bool) -> Result<()> {
    let pipeline = QuizPipeline::from_config(&config).await?;

    if !json_output {
        println!("⏳ Generating quiz for {}...", url);
    }

    let quiz = pipeline.generate_for_url(url).await?;
    info!("Generated quiz {}", quiz.id);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&quiz)?);
    } else {
        println!();
        print_quiz(&quiz);
    }

    Ok(())
}
