//! # WikiQuiz Core
//!
//! Core library for WikiQuiz - turns Wikipedia articles into multiple-choice
//! quizzes.
//!
//! This crate provides:
//! - Configuration management
//! - Article fetching and text extraction
//! - Quiz generation over two Gemini backends (CLI and REST)
//! - Versioned prompt templates
//! - SQLite quiz storage
//! - HTTP API server
//! - Shared data models

pub mod article;
pub mod backend;
pub mod config;
pub mod gemini;
pub mod gemini_rest;
pub mod model;
pub mod pipeline;
pub mod prompts;
pub mod quiz;
pub mod server;
pub mod store;

#[cfg(test)]
mod testing;

pub use article::{ArticleExtractor, ExtractError};
pub use backend::{BackendError, ModelBackend};
pub use config::{BackendKind, Config, ModelConfig};
pub use gemini::GeminiCliBackend;
pub use gemini_rest::GeminiRestBackend;
pub use model::*;
pub use pipeline::{ErrorClass, PipelineError, QuizPipeline};
pub use prompts::{PromptTemplate, TemplateError};
pub use quiz::{QuizError, QuizGenerator, SchemaIssue};
pub use store::{QuizStore, StoreError};
