//! `wikiquiz config` commands - View and manage configuration

use anyhow::Result;
use std::path::PathBuf;
use wikiquiz_core::Config;

use super::truncate;

/// Show current configuration
pub fn show(config: Config) -> Result<()> {
    let backends = config
        .model
        .backends
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" → ");
    let prompt = match &config.model.prompt_template {
        Some(path) => path.display().to_string(),
        None => config.model.prompt_version.clone(),
    };
    let char_cap = match config.model.article_char_cap {
        0 => "none".to_string(),
        cap => cap.to_string(),
    };

    println!("╭─────────────────────────────────────────╮");
    println!("│         WikiQuiz Configuration          │");
    println!("├─────────────────────────────────────────┤");
    println!("│ Model                                   │");
    println!("│   Model:        {:<23} │", truncate(&config.model.model_id, 23));
    println!("│   Backends:     {:<23} │", backends);
    println!("│   Binary:       {:<23} │", truncate(&config.model.gemini_binary, 23));
    println!(
        "│   API key:      {:<23} │",
        if config.model.api_key.is_some() { "set" } else { "not set" }
    );
    println!("│   Prompt:       {:<23} │", truncate(&prompt, 23));
    println!("│   Article cap:  {:<23} │", char_cap);
    println!("├─────────────────────────────────────────┤");
    println!("│ Scraper                                 │");
    println!("│   Timeout:      {:<23} │", format!("{}s", config.scraper.timeout_secs));
    println!(
        "│   Paragraphs:   {:<23} │",
        config
            .scraper
            .max_paragraphs
            .map_or("all".to_string(), |n| n.to_string())
    );
    println!("├─────────────────────────────────────────┤");
    println!("│ Server                                  │");
    println!("│   Host:         {:<23} │", config.server.host);
    println!("│   Port:         {:<23} │", config.server.port);
    println!("│   URL:          {:<23} │", truncate(&config.server_url(), 23));
    println!("├─────────────────────────────────────────┤");
    println!("│ Logging                                 │");
    println!("│   Level:        {:<23} │", config.logging.level);
    println!("╰─────────────────────────────────────────╯");

    println!("\n📁 Paths:");
    if let Some(path) = Config::default_config_path() {
        let exists = path.exists();
        println!(
            "   Config:   {} {}",
            path.display(),
            if exists { "✓" } else { "(not created)" }
        );
    }
    if let Some(path) = config.db_path() {
        let exists = path.exists();
        println!(
            "   Database: {} {}",
            path.display(),
            if exists { "✓" } else { "(not created)" }
        );
    }

    Ok(())
}

/// Initialize default configuration
pub fn init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path
        .or_else(Config::default_config_path)
        .ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;

    if path.exists() && !force {
        println!(
            "⚠️  Configuration file already exists at: {}",
            path.display()
        );
        println!("   Use --force to overwrite.");
        return Ok(());
    }

    let config = Config::default();
    config.save_to_file(&path)?;

    println!("✅ Created configuration file at: {}", path.display());
    println!("\n📝 Default configuration:");
    println!("{}", toml::to_string_pretty(&config)?);

    Ok(())
}
