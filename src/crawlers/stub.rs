//! In-memory fetcher and extractor over a synthetic link graph.

use crate::crawlers::crawler::{ExtractedPage, Extractor, LoadOptions, LoadedPage, PageFetcher};
use crate::error::{ExtractError, FetchError};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct StubFetcher {
    pages: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, links: &[&str]) -> Self {
        self.pages
            .insert(url.to_string(), links.iter().map(|l| l.to_string()).collect());
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    /// Every load sleeps this long on the tokio clock
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_calls_per_url(&self) -> usize {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for url in self.calls() {
            *counts.entry(url).or_default() += 1;
        }
        counts.values().copied().max().unwrap_or(0)
    }
}

impl PageFetcher for StubFetcher {
    async fn load(&mut self, url: &str, _options: &LoadOptions) -> Result<LoadedPage, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.contains(url) {
            return Err(FetchError::Navigation {
                url: url.to_string(),
                message: "stubbed failure".to_string(),
            });
        }

        match self.pages.get(url) {
            Some(links) => Ok(LoadedPage {
                url: url.to_string(),
                final_url: url.to_string(),
                html: links.join("\n"),
            }),
            None => Err(FetchError::Navigation {
                url: url.to_string(),
                message: "no such page".to_string(),
            }),
        }
    }
}

/// Treats every line of the page source as one link
#[derive(Debug, Clone, Copy, Default)]
pub struct StubExtractor;

impl Extractor for StubExtractor {
    fn extract(&self, page: &LoadedPage) -> Result<ExtractedPage, ExtractError> {
        Ok(ExtractedPage {
            links: page
                .html
                .lines()
                .filter(|l| !l.is_empty())
                .map(|l| l.to_string())
                .collect(),
            images: Vec::new(),
            text_content: format!("page {}", page.url),
            html_content: page.html.clone(),
        })
    }
}
