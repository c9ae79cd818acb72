//! End-to-end quiz generation: extract, generate, persist, respond.

use crate::article::{ArticleExtractor, ExtractError};
use crate::config::Config;
use crate::model::{HistoryItem, NewQuiz, QuizResponse, StoredQuiz};
use crate::quiz::{QuizError, QuizGenerator};
use crate::store::{QuizStore, StoreError};
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Whether a failure is the caller's fault or ours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    ClientInput,
    Service,
}

/// Errors from a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Scraping failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("LLM generation failed: {0}")]
    Generate(#[from] QuizError),

    #[error("Storage failed: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to serialize quiz: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn class(&self) -> ErrorClass {
        match self {
            // Building the HTTP client is our own setup, not the caller's URL
            PipelineError::Extract(ExtractError::Client(_)) => ErrorClass::Service,
            PipelineError::Extract(_) => ErrorClass::ClientInput,
            PipelineError::Generate(_) | PipelineError::Store(_) | PipelineError::Serialize(_) => {
                ErrorClass::Service
            }
        }
    }
}

/// Sequences extraction, generation and storage
pub struct QuizPipeline {
    extractor: ArticleExtractor,
    generator: QuizGenerator,
    store: QuizStore,
}

impl QuizPipeline {
    pub fn new(extractor: ArticleExtractor, generator: QuizGenerator, store: QuizStore) -> Self {
        Self {
            extractor,
            generator,
            store,
        }
    }

    /// Build every component from configuration
    pub async fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let db_path = config.db_path().ok_or_else(|| {
            StoreError::Initialization("Could not determine database path".to_string())
        })?;

        let extractor = ArticleExtractor::new(&config.scraper)?;
        let generator = QuizGenerator::from_config(&config.model)?;
        let store = QuizStore::open(&db_path).await?;

        Ok(Self::new(extractor, generator, store))
    }

    pub fn store(&self) -> &QuizStore {
        &self.store
    }

    /// Scrape `url`, generate a quiz, store it and return the stored form
    #[instrument(skip(self))]
    pub async fn generate_for_url(&self, url: &str) -> Result<QuizResponse, PipelineError> {
        let article = self.extractor.extract(url).await?;
        let quiz = self.generator.generate(&article.body).await?;
        let quiz_json = serde_json::to_string(&quiz)?;

        let title = if article.title.trim().is_empty() {
            quiz.title.clone()
        } else {
            Some(article.title)
        };

        let stored = self
            .store
            .insert(NewQuiz {
                url: url.to_string(),
                title,
                scraped_content: Some(article.body),
                quiz_json,
            })
            .await?;

        info!("Stored quiz {} for {}", stored.id, stored.url);
        Ok(QuizResponse::from_stored(&stored, Some(quiz)))
    }

    /// Stored quizzes, newest first
    pub async fn history(&self) -> Result<Vec<HistoryItem>, PipelineError> {
        Ok(self.store.list().await?)
    }

    /// A stored quiz by id
    pub async fn quiz(&self, id: i64) -> Result<Option<QuizResponse>, PipelineError> {
        Ok(self.store.get(id).await?.as_ref().map(stored_response))
    }
}

/// Shape a stored row for output, tolerating an undecodable quiz body
pub fn stored_response(stored: &StoredQuiz) -> QuizResponse {
    let quiz = match stored.quiz() {
        Ok(quiz) => Some(quiz),
        Err(e) => {
            warn!("Stored quiz {} has unreadable data: {}", stored.id, e);
            None
        }
    };

    QuizResponse::from_stored(stored, quiz)
}
