//! In-process fakes shared by the pipeline and server tests.

use crate::article::{ExtractError, FetchedPage, PageFetcher};
use crate::backend::{BackendError, ModelBackend};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use url::Url;

pub const DOG_URL: &str = "https://en.wikipedia.org/wiki/Dog";

pub const DOG_PAGE: &str = r#"<html><body>
    <h1 id="firstHeading">Dog</h1>
    <div id="mw-content-text">
      <p>The dog is a domesticated descendant of the wolf.</p>
      <p>Dogs were the first species to be domesticated.</p>
    </div>
</body></html>"#;

pub const DOG_QUIZ: &str = r#"{
    "title": "Dogs",
    "summary": "Dogs descend from wolves.",
    "questions": [
        {"question": "Dogs descend from?", "options": ["Wolves", "Cats", "Bears", "Seals"], "answer": "Wolves"}
    ]
}"#;

/// Serves fixed pages; unknown URLs fail like a refused connection
#[derive(Default)]
pub struct StaticFetcher {
    pages: HashMap<String, FetchedPage>,
}

impl StaticFetcher {
    pub fn with_page(mut self, url: &str, status: u16, body: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            FetchedPage {
                status,
                body: body.to_string(),
            },
        );
        self
    }
}

impl PageFetcher for StaticFetcher {
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<FetchedPage, ExtractError>> {
        Box::pin(async move {
            self.pages
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| ExtractError::Fetch {
                    url: url.to_string(),
                    status: None,
                    reason: "connection refused".to_string(),
                })
        })
    }
}

/// Backend with a canned reply, or none when it is "down"
#[derive(Clone)]
pub struct CannedBackend {
    name: &'static str,
    reply: Option<String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl CannedBackend {
    pub fn replying(name: &'static str, reply: &str) -> Self {
        Self {
            name,
            reply: Some(reply.to_string()),
            prompts: Arc::default(),
        }
    }

    pub fn down(name: &'static str) -> Self {
        Self {
            name,
            reply: None,
            prompts: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Every prompt received, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl ModelBackend for CannedBackend {
    fn name(&self) -> &str {
        self.name
    }

    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, BackendError>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let result = self
            .reply
            .clone()
            .ok_or_else(|| BackendError::NotConfigured(format!("{} is down", self.name)));
        Box::pin(async move { result })
    }
}
