//! Article extraction.
//!
//! Fetches a Wikipedia page and reduces it to a title plus cleaned prose:
//! non-prose chrome (tables, citations, reference lists, infoboxes, ...) is
//! dropped structurally, paragraphs are whitespace-normalised and joined
//! with blank lines.

use crate::config::ScraperConfig;
use crate::model::Article;
use futures::future::BoxFuture;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Body length cap when paragraphs were found
pub const MAX_BODY_CHARS: usize = 20_000;

/// Body length cap on the generic-container fallback path
pub const MAX_FALLBACK_CHARS: usize = 10_000;

/// Tags whose content never counts as prose
const NOISE_TAGS: &[&str] = &["table", "style", "script", "noscript", "sup"];

/// Classes marking citation, navigation and media blocks
const NOISE_CLASSES: &[&str] = &[
    "reference",
    "references",
    "reflist",
    "mw-references-wrap",
    "toc",
    "thumb",
    "infobox",
];

static FIRST_HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1#firstHeading").expect("valid selector"));
static ANY_H1: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("valid selector"));
static CONTENT_TEXT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#mw-content-text").expect("valid selector"));
static ARTICLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article").expect("valid selector"));
static PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("valid selector"));
static GENERIC_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div, span").expect("valid selector"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Errors that can occur while extracting an article
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Please supply a full URL (including http/https): {0}")]
    InvalidInput(String),

    #[error("Failed to fetch {url}: {reason}")]
    Fetch {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("Couldn't find main content on the page")]
    ContentNotFound,

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Raw result of a page fetch
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

/// Capability to GET a page. Non-2xx statuses are returned, not raised.
pub trait PageFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<FetchedPage, ExtractError>>;
}

/// `reqwest`-backed fetcher with a fixed user agent and timeout
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self, ExtractError> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ExtractError::Client)?;

        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<FetchedPage, ExtractError>> {
        Box::pin(async move {
            let fetch_error = |e: reqwest::Error| ExtractError::Fetch {
                url: url.to_string(),
                status: e.status().map(|s| s.as_u16()),
                reason: e.to_string(),
            };

            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(fetch_error)?;
            let status = response.status().as_u16();
            let body = response.text().await.map_err(fetch_error)?;

            Ok(FetchedPage { status, body })
        })
    }
}

/// Fetches pages and turns them into [`Article`]s
pub struct ArticleExtractor {
    fetcher: Box<dyn PageFetcher>,
    max_paragraphs: Option<usize>,
}

impl ArticleExtractor {
    /// Create an extractor that fetches over HTTP
    pub fn new(config: &ScraperConfig) -> Result<Self, ExtractError> {
        Ok(Self::with_fetcher(HttpFetcher::new(config)?)
            .with_max_paragraphs(config.max_paragraphs))
    }

    /// Create an extractor around any fetcher
    pub fn with_fetcher(fetcher: impl PageFetcher + 'static) -> Self {
        Self {
            fetcher: Box::new(fetcher),
            max_paragraphs: None,
        }
    }

    /// Stop collecting after this many non-empty paragraphs
    pub fn with_max_paragraphs(mut self, max_paragraphs: Option<usize>) -> Self {
        self.max_paragraphs = max_paragraphs.filter(|&n| n > 0);
        self
    }

    /// Fetch `url` and extract its title and body
    #[instrument(skip(self))]
    pub async fn extract(&self, url: &str) -> Result<Article, ExtractError> {
        let url = validate_url(url)?;

        debug!("Fetching article");
        let page = self.fetcher.fetch(&url).await?;

        if !(200..300).contains(&page.status) {
            warn!("Article fetch returned HTTP {}", page.status);
            return Err(ExtractError::Fetch {
                url: url.to_string(),
                status: Some(page.status),
                reason: format!("HTTP status {}", page.status),
            });
        }

        let article = extract_article(&page.body, self.max_paragraphs)?;
        info!(
            "Extracted article '{}' ({} chars)",
            article.title,
            article.body.chars().count()
        );

        Ok(article)
    }
}

/// Accept only absolute http(s) URLs with a host
pub fn validate_url(raw: &str) -> Result<Url, ExtractError> {
    let url = Url::parse(raw.trim()).map_err(|_| ExtractError::InvalidInput(raw.to_string()))?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(ExtractError::InvalidInput(raw.to_string())),
    }
}

/// Extract an article from raw HTML.
///
/// Paragraphs are joined with a blank line and capped at [`MAX_BODY_CHARS`];
/// pages without usable `<p>` text fall back to div/span text capped at
/// [`MAX_FALLBACK_CHARS`].
pub fn extract_article(html: &str, max_paragraphs: Option<usize>) -> Result<Article, ExtractError> {
    let document = Html::parse_document(html);

    let title = document
        .select(&FIRST_HEADING)
        .next()
        .or_else(|| document.select(&ANY_H1).next())
        .map(|h| collapse_whitespace(&h.text().collect::<String>()))
        .unwrap_or_default();

    let region = document
        .select(&CONTENT_TEXT)
        .next()
        .or_else(|| document.select(&ARTICLE).next())
        .ok_or(ExtractError::ContentNotFound)?;

    let mut paragraphs = Vec::new();
    for p in region.select(&PARAGRAPH) {
        if is_suppressed(p, region) {
            continue;
        }
        let text = visible_text(p, region);
        if text.is_empty() {
            continue;
        }
        paragraphs.push(text);
        if max_paragraphs.is_some_and(|max| paragraphs.len() >= max) {
            break;
        }
    }

    if paragraphs.is_empty() {
        debug!("No paragraphs found, falling back to generic containers");
        let texts: Vec<String> = region
            .select(&GENERIC_BLOCK)
            .filter(|el| el.id() != region.id() && !is_suppressed(*el, region))
            .map(|el| visible_text(el, region))
            .filter(|t| !t.is_empty())
            .collect();

        return Ok(Article {
            title,
            body: cap_body(&texts.join(" "), MAX_FALLBACK_CHARS),
        });
    }

    Ok(Article {
        title,
        body: cap_body(&paragraphs.join("\n\n"), MAX_BODY_CHARS),
    })
}

/// Text of `element` with stripped segments joined by single spaces,
/// skipping anything under a noise node
fn visible_text(element: ElementRef<'_>, region: ElementRef<'_>) -> String {
    let segments: Vec<&str> = element
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) => {
                let hidden = node
                    .parent()
                    .and_then(ElementRef::wrap)
                    .is_some_and(|parent| is_suppressed(parent, region));
                (!hidden).then(|| text.trim())
            }
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect();

    collapse_whitespace(&segments.join(" "))
}

/// Whether `element` or any ancestor below `region` is a noise element
fn is_suppressed(element: ElementRef<'_>, region: ElementRef<'_>) -> bool {
    std::iter::once(*element)
        .chain(element.ancestors())
        .take_while(|n| n.id() != region.id())
        .filter_map(|n| n.value().as_element())
        .any(|el| {
            NOISE_TAGS.contains(&el.name()) || el.classes().any(|c| NOISE_CLASSES.contains(&c))
        })
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Cap a joined body, dropping any separator left dangling by the cut
fn cap_body(text: &str, max: usize) -> String {
    let mut capped = truncate_chars(text, max);
    capped.truncate(capped.trim_end().len());
    capped
}

/// Truncate to at most `max` characters without splitting a char
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
