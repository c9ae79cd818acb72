//! Quiz generation.
//!
//! Renders the prompt for an article, obtains model text through a two-tier
//! backend fallback, recovers the JSON object from the text and validates it
//! into a [`Quiz`].

use crate::backend::{build_backend, BackendError, ModelBackend};
use crate::config::{ConfigError, ModelConfig};
use crate::model::{Question, Quiz};
use crate::prompts::{PromptTemplate, TemplateError};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Longest slice of raw model text quoted in errors
const EXCERPT_CHARS: usize = 200;

/// A single field-level schema violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    /// Location such as `questions[2].options[1]`
    pub path: String,
    pub message: String,
}

impl SchemaIssue {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn join_issues(issues: &[SchemaIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur during quiz generation
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("All model backends failed. Last error from {backend}: {source}")]
    GenerationUnavailable {
        backend: String,
        #[source]
        source: BackendError,
    },

    #[error("Model output is not valid JSON: {excerpt}")]
    MalformedOutput { excerpt: String },

    #[error("Model output failed validation: {}", join_issues(.0))]
    SchemaValidation(Vec<SchemaIssue>),

    #[error("Invalid generator configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Prompt template error: {0}")]
    Template(#[from] TemplateError),
}

/// Turns article text into a validated quiz
pub struct QuizGenerator {
    primary: Box<dyn ModelBackend>,
    secondary: Box<dyn ModelBackend>,
    template: PromptTemplate,
    /// 0 means the article is passed through untruncated
    article_char_cap: usize,
    default_title: String,
}

impl QuizGenerator {
    /// Create a generator with explicit backends, tried in argument order
    pub fn new(
        primary: impl ModelBackend + 'static,
        secondary: impl ModelBackend + 'static,
        template: PromptTemplate,
    ) -> Self {
        let defaults = ModelConfig::default();
        Self {
            primary: Box::new(primary),
            secondary: Box::new(secondary),
            template,
            article_char_cap: defaults.article_char_cap,
            default_title: defaults.default_title,
        }
    }

    /// Build a generator from configuration, failing fast on bad settings
    pub fn from_config(config: &ModelConfig) -> Result<Self, QuizError> {
        config.validate()?;

        let template = PromptTemplate::from_config(config)?;
        let mut backends = config
            .backends
            .iter()
            .map(|&kind| build_backend(kind, config))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConfigError::ValidationError(format!("Failed to set up backend: {}", e)))?;

        // validate() guarantees exactly two entries
        let secondary = backends.pop();
        let primary = backends.pop();
        let (Some(primary), Some(secondary)) = (primary, secondary) else {
            return Err(ConfigError::ValidationError(
                "model.backends must list exactly two backends".to_string(),
            )
            .into());
        };

        info!(
            "Quiz generator ready: {} -> {}, prompt {}",
            primary.name(),
            secondary.name(),
            template.version
        );

        Ok(Self {
            primary,
            secondary,
            template,
            article_char_cap: config.article_char_cap,
            default_title: config.default_title.clone(),
        })
    }

    pub fn with_article_char_cap(mut self, cap: usize) -> Self {
        self.article_char_cap = cap;
        self
    }

    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Render the prompt for `article_body`, applying the character cap
    pub fn build_prompt(&self, article_body: &str) -> Result<String, QuizError> {
        let article = if self.article_char_cap > 0 {
            crate::article::truncate_chars(article_body, self.article_char_cap)
        } else {
            article_body.to_string()
        };

        Ok(self.template.render(&article)?)
    }

    /// Generate a quiz from article text
    #[instrument(skip(self, article_body), fields(article_len = article_body.len(), prompt = %self.template.version))]
    pub async fn generate(&self, article_body: &str) -> Result<Quiz, QuizError> {
        let prompt = self.build_prompt(article_body)?;
        let raw = self.call_model(&prompt).await?;

        let value = parse_model_output(&raw)?;
        let mut quiz = validate_quiz(&value)?;

        if quiz.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
            quiz.title = Some(self.default_title.clone());
        }

        self.warn_on_soft_limits(&quiz);
        info!("Generated quiz with {} questions", quiz.questions.len());

        Ok(quiz)
    }

    /// Try the primary backend, then the secondary once
    async fn call_model(&self, prompt: &str) -> Result<String, QuizError> {
        match self.primary.generate(prompt).await {
            Ok(text) => {
                debug!("{} returned {} chars", self.primary.name(), text.len());
                return Ok(text);
            }
            Err(e) => warn!(
                "{} failed, falling back to {}: {}",
                self.primary.name(),
                self.secondary.name(),
                e
            ),
        }

        match self.secondary.generate(prompt).await {
            Ok(text) => {
                debug!("{} returned {} chars", self.secondary.name(), text.len());
                Ok(text)
            }
            Err(e) => Err(QuizError::GenerationUnavailable {
                backend: self.secondary.name().to_string(),
                source: e,
            }),
        }
    }

    /// Counts and answers the prompt asks for but validation does not enforce
    fn warn_on_soft_limits(&self, quiz: &Quiz) {
        let wanted = self.template.question_range();
        if !wanted.contains(&quiz.questions.len()) {
            warn!(
                "Model returned {} questions, prompt asked for {}-{}",
                quiz.questions.len(),
                wanted.start(),
                wanted.end()
            );
        }

        let options = self.template.option_range();
        for (i, q) in quiz.questions.iter().enumerate() {
            if !options.contains(&q.options.len()) {
                warn!("questions[{}] has {} options", i, q.options.len());
            }
            if !q.answer_in_options() {
                warn!("questions[{}] answer is not one of its options", i);
            }
        }
    }
}

/// Recover a JSON value from model text.
///
/// The whole text is tried first, then the span from the first `{` to the
/// last `}`.
pub fn parse_model_output(raw: &str) -> Result<Value, QuizError> {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return Ok(value);
    }

    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&raw[start..=end]) {
                debug!("Recovered JSON object embedded in model output");
                return Ok(value);
            }
        }
    }

    Err(QuizError::MalformedOutput {
        excerpt: crate::article::truncate_chars(raw.trim(), EXCERPT_CHARS),
    })
}

/// Check a parsed value against the quiz schema.
///
/// Every violation is reported, not just the first.
pub fn validate_quiz(value: &Value) -> Result<Quiz, QuizError> {
    let Some(obj) = value.as_object() else {
        return Err(QuizError::SchemaValidation(vec![SchemaIssue::new(
            "$",
            format!("expected an object, got {}", kind_of(value)),
        )]));
    };

    let mut issues = Vec::new();

    let title = match obj.get("title") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            issues.push(SchemaIssue::new(
                "title",
                format!("expected a string, got {}", kind_of(other)),
            ));
            None
        }
    };

    let summary = required_string(obj, "summary", "summary", &mut issues);

    let questions = match obj.get("questions") {
        None => {
            issues.push(SchemaIssue::new("questions", "field required"));
            Vec::new()
        }
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| validate_question(&format!("questions[{}]", i), item, &mut issues))
            .collect(),
        Some(other) => {
            issues.push(SchemaIssue::new(
                "questions",
                format!("expected an array, got {}", kind_of(other)),
            ));
            Vec::new()
        }
    };

    match summary {
        Some(summary) if issues.is_empty() => Ok(Quiz {
            title,
            summary,
            questions,
        }),
        _ => Err(QuizError::SchemaValidation(issues)),
    }
}

fn validate_question(path: &str, value: &Value, issues: &mut Vec<SchemaIssue>) -> Option<Question> {
    let Some(obj) = value.as_object() else {
        issues.push(SchemaIssue::new(
            path,
            format!("expected an object, got {}", kind_of(value)),
        ));
        return None;
    };

    let question = required_string(obj, "question", &format!("{}.question", path), issues);
    let answer = required_string(obj, "answer", &format!("{}.answer", path), issues);

    let options_path = format!("{}.options", path);
    let options = match obj.get("options") {
        None => {
            issues.push(SchemaIssue::new(options_path, "field required"));
            None
        }
        Some(Value::Array(items)) => {
            let before = issues.len();
            let options: Vec<String> = items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| match item {
                    Value::String(s) => Some(s.clone()),
                    other => {
                        issues.push(SchemaIssue::new(
                            format!("{}[{}]", options_path, i),
                            format!("expected a string, got {}", kind_of(other)),
                        ));
                        None
                    }
                })
                .collect();
            (issues.len() == before).then_some(options)
        }
        Some(other) => {
            issues.push(SchemaIssue::new(
                options_path,
                format!("expected an array, got {}", kind_of(other)),
            ));
            None
        }
    };

    Some(Question {
        question: question?,
        options: options?,
        answer: answer?,
    })
}

fn required_string(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    issues: &mut Vec<SchemaIssue>,
) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        None => {
            issues.push(SchemaIssue::new(path, "field required"));
            None
        }
        Some(other) => {
            issues.push(SchemaIssue::new(
                path,
                format!("expected a string, got {}", kind_of(other)),
            ));
            None
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CannedBackend;

    fn v1() -> PromptTemplate {
        PromptTemplate::builtin("v1", 5).unwrap()
    }

    const VALID: &str = r#"{
        "title": "Dog",
        "summary": "Dogs are domesticated wolves.",
        "questions": [
            {"question": "Dogs descend from?", "options": ["Wolves", "Cats", "Bears", "Seals"], "answer": "Wolves"},
            {"question": "Dogs are?", "options": ["Plants", "Mammals", "Fungi"], "answer": "Mammals"}
        ]
    }"#;

    #[tokio::test]
    async fn test_valid_output_round_trips() {
        let generator = QuizGenerator::new(
            CannedBackend::replying("a", VALID),
            CannedBackend::down("b"),
            v1(),
        );
        let quiz = generator.generate("article").await.unwrap();

        let expected: Quiz = serde_json::from_str(VALID).unwrap();
        assert_eq!(quiz, expected);
        assert_eq!(quiz.questions[1].options.len(), 3);
    }

    #[tokio::test]
    async fn test_prose_wrapped_json_gets_default_title() {
        let raw = "Here you go: {\"summary\":\"s\",\"questions\":[]}  Thanks!";
        let generator =
            QuizGenerator::new(CannedBackend::replying("a", raw), CannedBackend::down("b"), v1())
                .with_default_title("Placeholder");

        let quiz = generator.generate("article").await.unwrap();
        assert_eq!(
            quiz,
            Quiz {
                title: Some("Placeholder".to_string()),
                summary: "s".to_string(),
                questions: vec![],
            }
        );
    }

    #[tokio::test]
    async fn test_primary_failure_falls_back_to_secondary() {
        let primary = CannedBackend::down("primary");
        let secondary = CannedBackend::replying("secondary", VALID);
        let generator = QuizGenerator::new(primary.clone(), secondary.clone(), v1());

        let quiz = generator.generate("article").await.unwrap();
        assert_eq!(quiz.title.as_deref(), Some("Dog"));
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
        assert_eq!(primary.prompts(), secondary.prompts());
    }

    #[tokio::test]
    async fn test_primary_success_skips_secondary() {
        let secondary = CannedBackend::replying("secondary", VALID);
        let generator =
            QuizGenerator::new(CannedBackend::replying("primary", VALID), secondary.clone(), v1());
        generator.generate("article").await.unwrap();
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn test_both_backends_down() {
        let generator = QuizGenerator::new(
            CannedBackend::down("primary"),
            CannedBackend::down("secondary"),
            v1(),
        );

        match generator.generate("article").await {
            Err(QuizError::GenerationUnavailable { backend, source }) => {
                assert_eq!(backend, "secondary");
                assert!(source.to_string().contains("secondary is down"));
            }
            other => panic!("expected GenerationUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unrecoverable_output_is_malformed() {
        let primary = CannedBackend::replying("primary", "Sorry, I cannot help with that.");
        let secondary = CannedBackend::replying("secondary", VALID);
        let generator = QuizGenerator::new(primary, secondary.clone(), v1());

        assert!(matches!(
            generator.generate("article").await,
            Err(QuizError::MalformedOutput { .. })
        ));
        // Parse failures are not an availability problem
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn test_prompt_respects_char_cap() {
        let primary = CannedBackend::replying("primary", VALID);
        let generator = QuizGenerator::new(primary.clone(), CannedBackend::down("b"), v1())
            .with_article_char_cap(10);

        generator.generate(&"x".repeat(50)).await.unwrap();
        let prompt = primary.prompts()[0].clone();
        assert!(prompt.contains(&"x".repeat(10)));
        assert!(!prompt.contains(&"x".repeat(11)));

        let uncapped =
            QuizGenerator::new(CannedBackend::replying("a", VALID), CannedBackend::down("b"), v1())
                .with_article_char_cap(0);
        assert!(uncapped
            .build_prompt(&"y".repeat(9000))
            .unwrap()
            .contains(&"y".repeat(9000)));
    }

    #[test]
    fn test_parse_model_output_steps() {
        assert!(parse_model_output(r#"{"a": 1}"#).is_ok());
        assert_eq!(
            parse_model_output("```json\n{\"a\": {\"b\": 2}}\n```").unwrap()["a"]["b"],
            2
        );
        assert!(matches!(
            parse_model_output("} backwards {"),
            Err(QuizError::MalformedOutput { .. })
        ));
        assert!(matches!(
            parse_model_output("{ not json }"),
            Err(QuizError::MalformedOutput { .. })
        ));
        assert!(matches!(
            parse_model_output(""),
            Err(QuizError::MalformedOutput { .. })
        ));
    }

    #[test]
    fn test_validation_reports_every_field() {
        let value: Value = serde_json::from_str(
            r#"{
                "title": 3,
                "questions": [
                    {"question": "Q", "options": ["a", 2], "answer": "a"},
                    "not an object",
                    {"options": "abc", "answer": null}
                ]
            }"#,
        )
        .unwrap();

        let Err(QuizError::SchemaValidation(issues)) = validate_quiz(&value) else {
            panic!("expected schema validation error");
        };
        let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "title",
                "summary",
                "questions[0].options[1]",
                "questions[1]",
                "questions[2].question",
                "questions[2].answer",
                "questions[2].options",
            ]
        );
    }

    #[test]
    fn test_validation_shapes() {
        assert!(matches!(
            validate_quiz(&serde_json::json!([1, 2])),
            Err(QuizError::SchemaValidation(_))
        ));
        assert!(matches!(
            validate_quiz(&serde_json::json!({"summary": "s", "questions": {}})),
            Err(QuizError::SchemaValidation(_))
        ));

        // Empty questions and a null title are accepted
        let quiz =
            validate_quiz(&serde_json::json!({"title": null, "summary": "s", "questions": []}))
                .unwrap();
        assert_eq!(quiz.title, None);
        assert!(quiz.questions.is_empty());
    }

    #[test]
    fn test_answer_outside_options_is_not_rejected() {
        let quiz = validate_quiz(&serde_json::json!({
            "summary": "s",
            "questions": [{"question": "q", "options": ["a", "b", "c"], "answer": "z"}]
        }))
        .unwrap();
        assert!(!quiz.questions[0].answer_in_options());
    }

    #[test]
    fn test_from_config_fails_fast() {
        let bad = ModelConfig {
            prompt_version: "v7".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            QuizGenerator::from_config(&bad),
            Err(QuizError::Config(_))
        ));

        let generator = QuizGenerator::from_config(&ModelConfig::default()).unwrap();
        assert_eq!(generator.template().version, "v1");
        assert_eq!(generator.primary.name(), "gemini-cli");
        assert_eq!(generator.secondary.name(), "gemini-rest");
    }
}
