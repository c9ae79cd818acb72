//! Shared data models for WikiQuiz.
//!
//! This module contains the article and quiz records passed between the
//! extractor, the generator and the store, plus the HTTP request/response
//! shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Article text extracted from a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Page heading; empty when the page has none
    pub title: String,
    /// Cleaned, paragraph-joined prose
    pub body: String,
}

/// A single multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

impl Question {
    /// Whether the answer is one of the options
    pub fn answer_in_options(&self) -> bool {
        self.options.iter().any(|o| o == &self.answer)
    }
}

/// A generated quiz
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Quiz {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub summary: String,
    pub questions: Vec<Question>,
}

/// A quiz about to be persisted
#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub url: String,
    pub title: Option<String>,
    pub scraped_content: Option<String>,
    pub quiz_json: String,
}

/// A persisted quiz row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredQuiz {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub scraped_content: Option<String>,
    pub quiz_json: String,
}

impl StoredQuiz {
    /// Decode the stored quiz JSON
    pub fn quiz(&self) -> Result<Quiz, serde_json::Error> {
        serde_json::from_str(&self.quiz_json)
    }
}

/// Request body for `POST /generate_quiz`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerateRequest {
    pub url: String,
}

/// A quiz as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuizResponse {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub date_generated: DateTime<Utc>,
    pub summary: Option<String>,
    pub questions: Vec<Question>,
}

impl QuizResponse {
    /// Shape a stored row and its decoded quiz into a response
    pub fn from_stored(stored: &StoredQuiz, quiz: Option<Quiz>) -> Self {
        let (summary, questions) = match quiz {
            Some(q) => (Some(q.summary), q.questions),
            None => (None, Vec::new()),
        };

        Self {
            id: stored.id,
            url: stored.url.clone(),
            title: stored.title.clone(),
            date_generated: stored.created_at,
            summary,
            questions,
        }
    }
}

/// One entry of `GET /history`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HistoryItem {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub date_generated: DateTime<Utc>,
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorDetail {
    pub message: String,
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ApiError {
    pub fn new(message: impl Into<String>, error_type: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                message: message.into(),
                r#type: error_type.into(),
                code: None,
            },
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.error.code = Some(code.into());
        self
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(message, "invalid_request_error")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, "not_found")
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(message, "internal_error")
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub gemini_cli_available: bool,
    pub database_ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(answer: &str) -> Question {
        Question {
            question: "What barks?".to_string(),
            options: vec!["Dog".to_string(), "Cat".to_string(), "Fish".to_string()],
            answer: answer.to_string(),
        }
    }

    #[test]
    fn test_answer_in_options() {
        assert!(question("Dog").answer_in_options());
        assert!(!question("Cow").answer_in_options());
    }

    #[test]
    fn test_quiz_without_title_deserializes() {
        let quiz: Quiz = serde_json::from_str(r#"{"summary":"s","questions":[]}"#).unwrap();
        assert_eq!(quiz.title, None);
        assert!(quiz.questions.is_empty());
    }

    #[test]
    fn test_response_degrades_without_quiz() {
        let stored = StoredQuiz {
            id: 7,
            url: "https://en.wikipedia.org/wiki/Dog".to_string(),
            title: Some("Dog".to_string()),
            created_at: Utc::now(),
            scraped_content: None,
            quiz_json: "not json".to_string(),
        };
        assert!(stored.quiz().is_err());

        let response = QuizResponse::from_stored(&stored, None);
        assert_eq!(response.id, 7);
        assert_eq!(response.summary, None);
        assert!(response.questions.is_empty());
    }

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::invalid_request("Scraping failed: bad url").with_code("invalid_input");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("invalid_request_error"));
        assert!(json.contains("invalid_input"));
    }
}
