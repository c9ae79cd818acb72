//! `wikiquiz scrape` command - Extract an article without generating a quiz

use anyhow::Result;
use wikiquiz_core::{ArticleExtractor, Config};

/// Characters of body text shown as a sample
const SAMPLE_CHARS: usize = 1000;

pub async fn run(config: Config, url: &str, max_paragraphs: Option<usize>) -> Result<()> {
    let extractor = ArticleExtractor::new(&config.scraper)?
        .with_max_paragraphs(max_paragraphs.or(config.scraper.max_paragraphs));

    let article = extractor.extract(url).await?;

    println!(
        "Title: {}",
        if article.title.is_empty() {
            "(none)"
        } else {
            &article.title
        }
    );
    println!(
        "Length: {} chars, {} paragraphs",
        article.body.chars().count(),
        article.body.split("\n\n").filter(|p| !p.is_empty()).count()
    );
    println!("\nContent sample:\n");

    let sample: String = article.body.chars().take(SAMPLE_CHARS).collect();
    println!("{}", sample);

    Ok(())
}
