//! `wikiquiz history` command - List stored quizzes

use anyhow::Result;
use wikiquiz_core::{Config, QuizStore};

use super::truncate;

pub async fn run(config: Config, json_output: bool) -> Result<()> {
    let db_path = config
        .db_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine database path"))?;

    let store = QuizStore::open(&db_path).await?;
    let items = store.list().await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No quizzes generated yet.");
        println!("   Create one with: wikiquiz generate <url>");
        return Ok(());
    }

    println!("╭───────┬──────────────────┬──────────────────────────┬──────────────────────────────────────────╮");
    println!("│ ID    │ Generated        │ Title                    │ URL                                      │");
    println!("├───────┼──────────────────┼──────────────────────────┼──────────────────────────────────────────┤");

    for item in &items {
        println!(
            "│ {:<5} │ {:<16} │ {:<24} │ {:<40} │",
            item.id,
            item.date_generated.format("%Y-%m-%d %H:%M"),
            truncate(item.title.as_deref().unwrap_or("-"), 24),
            truncate(&item.url, 40)
        );
    }

    println!("╰───────┴──────────────────┴──────────────────────────┴──────────────────────────────────────────╯");
    println!("{} quiz(zes). Show one with: wikiquiz show <id>", items.len());

    Ok(())
}
