//! `wikiquiz show` command - Print a stored quiz

use anyhow::Result;
use wikiquiz_core::pipeline::stored_response;
use wikiquiz_core::{Config, QuizStore};

use super::print_quiz;

pub async fn run(config: Config, id: i64, json_output: bool) -> Result<()> {
    let db_path = config
        .db_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine database path"))?;

    let store = QuizStore::open(&db_path).await?;
    let stored = store
        .get(id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Quiz {} not found", id))?;

    let quiz = stored_response(&stored);
    if json_output {
        println!("{}", serde_json::to_string_pretty(&quiz)?);
    } else {
        print_quiz(&quiz);
    }

    Ok(())
}
