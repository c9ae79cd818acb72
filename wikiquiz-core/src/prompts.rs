//! Versioned quiz prompt templates.
//!
//! Two templates are built in (`v1`, `v2`). A custom template can be
//! supplied as a `.prompt.md` file: YAML frontmatter describing the version
//! and requested counts, followed by a Tera body that receives `article`,
//! `min_questions`, `max_questions`, `min_options` and `max_options`.

use crate::config::ModelConfig;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;
use tera::{Context, Tera};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while loading or rendering a prompt template
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Unknown prompt version: {0}")]
    UnknownVersion(String),

    #[error("Failed to read template file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse template frontmatter: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Template rendering error: {0}")]
    RenderError(#[from] tera::Error),

    #[error("Invalid template format: {0}")]
    InvalidFormat(String),
}

const V1_BODY: &str = r#"You are an AI that transforms Wikipedia articles into structured quiz data.

ARTICLE TEXT:
{{ article }}

Generate a structured JSON object with the following fields:

- "title": title of the article
- "summary": 3-5 sentence summary
- "questions": a list of {{ min_questions }}-{{ max_questions }} quiz questions, each question must be an object with:
    - "question"
    - "options" (list of {{ min_options }}-{{ max_options }} choices)
    - "answer" (must be exactly one of the options)

Return ONLY valid JSON."#;

const V2_BODY: &str = r#"Create a multiple-choice quiz from the following Wikipedia article.

Respond with valid JSON only, in this exact format:
{
  "summary": "A short summary of the article",
  "questions": [
    {
      "question": "Question text",
      "options": ["Option A", "Option B", "Option C", "Option D"],
      "answer": "Option A"
    }
  ]
}

Write exactly {{ max_questions }} questions with {{ max_options }} options each.
The answer must be copied verbatim from the options.

Article:
{{ article }}"#;

/// A quiz prompt template and the shape it asks the model for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_min_questions")]
    pub min_questions: u32,
    #[serde(default = "default_max_questions")]
    pub max_questions: u32,
    #[serde(default = "default_min_options")]
    pub min_options: u32,
    #[serde(default = "default_max_options")]
    pub max_options: u32,
    /// The template body (Tera syntax)
    #[serde(skip)]
    pub body: String,
}

fn default_min_questions() -> u32 {
    5
}

fn default_max_questions() -> u32 {
    10
}

fn default_min_options() -> u32 {
    3
}

fn default_max_options() -> u32 {
    5
}

impl PromptTemplate {
    /// Look up a built-in template
    pub fn builtin(version: &str, question_count: u32) -> Result<Self, TemplateError> {
        match version {
            "v1" => Ok(Self {
                version: "v1".to_string(),
                description: "Title, summary and 5-10 questions".to_string(),
                min_questions: default_min_questions(),
                max_questions: default_max_questions(),
                min_options: default_min_options(),
                max_options: default_max_options(),
                body: V1_BODY.to_string(),
            }),
            "v2" => Ok(Self {
                version: "v2".to_string(),
                description: "Summary and a fixed number of four-option questions".to_string(),
                min_questions: question_count,
                max_questions: question_count,
                min_options: 4,
                max_options: 4,
                body: V2_BODY.to_string(),
            }),
            other => Err(TemplateError::UnknownVersion(other.to_string())),
        }
    }

    /// Resolve the template a generator should use
    pub fn from_config(config: &ModelConfig) -> Result<Self, TemplateError> {
        match &config.prompt_template {
            Some(path) => Self::from_file(path),
            None => Self::builtin(&config.prompt_version, config.question_count),
        }
    }

    /// Parse a template from a .prompt.md file
    pub fn from_file(path: &Path) -> Result<Self, TemplateError> {
        let content = std::fs::read_to_string(path)?;
        let template = Self::parse(&content)?;
        debug!("Loaded prompt template {} from {}", template.version, path.display());
        Ok(template)
    }

    /// Parse a template from string content
    pub fn parse(content: &str) -> Result<Self, TemplateError> {
        let (frontmatter, body) = split_frontmatter(content)?;

        let mut template: PromptTemplate = serde_yaml::from_str(&frontmatter)?;
        template.body = body;

        if template.version.trim().is_empty() {
            return Err(TemplateError::InvalidFormat(
                "Template must have a 'version' field".to_string(),
            ));
        }
        if template.min_questions > template.max_questions
            || template.min_options > template.max_options
        {
            return Err(TemplateError::InvalidFormat(
                "min counts must not exceed max counts".to_string(),
            ));
        }
        if !template.body.contains("article") {
            return Err(TemplateError::InvalidFormat(
                "Template body must reference {{ article }}".to_string(),
            ));
        }

        Ok(template)
    }

    /// Requested number of questions
    pub fn question_range(&self) -> RangeInclusive<usize> {
        self.min_questions as usize..=self.max_questions as usize
    }

    /// Requested number of options per question
    pub fn option_range(&self) -> RangeInclusive<usize> {
        self.min_options as usize..=self.max_options as usize
    }

    /// Render the prompt for an article
    pub fn render(&self, article: &str) -> Result<String, TemplateError> {
        let mut tera = Tera::default();
        tera.add_raw_template("prompt", &self.body)?;

        let mut context = Context::new();
        context.insert("article", article);
        context.insert("min_questions", &self.min_questions);
        context.insert("max_questions", &self.max_questions);
        context.insert("min_options", &self.min_options);
        context.insert("max_options", &self.max_options);

        Ok(tera.render("prompt", &context)?)
    }
}

/// Split content into frontmatter and body
fn split_frontmatter(content: &str) -> Result<(String, String), TemplateError> {
    let content = content.trim();

    let rest = content.strip_prefix("---").ok_or_else(|| {
        TemplateError::InvalidFormat("Template must start with YAML frontmatter (---)".to_string())
    })?;

    let end_pos = rest.find("\n---").ok_or_else(|| {
        TemplateError::InvalidFormat("Could not find end of frontmatter (---)".to_string())
    })?;

    let frontmatter = rest[..end_pos].trim().to_string();
    let body = rest[end_pos + 4..].trim().to_string();

    Ok((frontmatter, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v1_renders_article_and_counts() {
        let template = PromptTemplate::builtin("v1", 5).unwrap();
        let prompt = template.render("Dogs are mammals.").unwrap();
        assert!(prompt.contains("ARTICLE TEXT:\nDogs are mammals."));
        assert!(prompt.contains("a list of 5-10 quiz questions"));
        assert!(prompt.contains("list of 3-5 choices"));
        assert!(prompt.contains("\"title\""));
    }

    #[test]
    fn test_v2_uses_fixed_question_count() {
        let template = PromptTemplate::builtin("v2", 7).unwrap();
        assert_eq!(template.question_range(), 7..=7);
        assert_eq!(template.option_range(), 4..=4);
        let prompt = template.render("Text").unwrap();
        assert!(prompt.contains("exactly 7 questions with 4 options"));
        assert!(!prompt.contains("\"title\""));
    }

    #[test]
    fn test_article_is_not_html_escaped() {
        let template = PromptTemplate::builtin("v1", 5).unwrap();
        let prompt = template.render("A & B <c> \"d\"").unwrap();
        assert!(prompt.contains("A & B <c> \"d\""));
    }

    #[test]
    fn test_unknown_version() {
        assert!(matches!(
            PromptTemplate::builtin("v3", 5),
            Err(TemplateError::UnknownVersion(_))
        ));
    }

    #[test]
    fn test_parse_custom_template() {
        let content = r#"---
version: "short"
description: "Three quick questions"
min_questions: 3
max_questions: 3
---
Write {{ max_questions }} questions about:
{{ article }}"#;

        let template = PromptTemplate::parse(content).unwrap();
        assert_eq!(template.version, "short");
        assert_eq!(template.min_options, 3);
        assert_eq!(template.max_options, 5);
        assert_eq!(
            template.render("Cats").unwrap(),
            "Write 3 questions about:\nCats"
        );
    }

    #[test]
    fn test_parse_rejects_bad_templates() {
        assert!(PromptTemplate::parse("no frontmatter").is_err());
        assert!(PromptTemplate::parse("---\nversion: x\n---\nNo variable here").is_err());
        assert!(PromptTemplate::parse(
            "---\nversion: x\nmin_questions: 9\nmax_questions: 2\n---\n{{ article }}"
        )
        .is_err());
    }

    #[test]
    fn test_from_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.prompt.md");
        std::fs::write(&path, "---\nversion: file\n---\nQuiz: {{ article }}").unwrap();

        let config = ModelConfig {
            prompt_template: Some(path),
            ..Default::default()
        };
        let template = PromptTemplate::from_config(&config).unwrap();
        assert_eq!(template.version, "file");
    }
}
