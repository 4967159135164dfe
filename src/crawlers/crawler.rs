use crate::error::{ExtractError, FetchError};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Page load condition the fetcher waits for before handing the page over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaitUntil {
    /// The `load` event has fired
    #[default]
    Load,
    /// The DOM has been parsed; subresources may still be loading
    DomContentLoaded,
}

/// How a single page should be loaded
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub wait_until: WaitUntil,
    /// CSS selector that must be present before the page counts as loaded
    pub wait_for_selector: Option<String>,
    /// Per-page ceiling, independent of the crawl budget
    pub timeout: Duration,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            wait_until: WaitUntil::Load,
            wait_for_selector: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// A page as handed over by the browser
#[derive(Debug, Clone)]
pub struct LoadedPage {
    /// URL that was requested
    pub url: String,
    /// URL the browser ended up on (differs after redirects)
    pub final_url: String,
    pub html: String,
}

/// Data pulled out of a loaded page
#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    pub links: Vec<String>,
    pub images: Vec<String>,
    pub text_content: String,
    pub html_content: String,
}

/// Drives a browser tab to a URL
pub trait PageFetcher {
    fn load(
        &mut self,
        url: &str,
        options: &LoadOptions,
    ) -> impl Future<Output = Result<LoadedPage, FetchError>> + Send;
}

/// Pulls links, images and text from a loaded page
pub trait Extractor {
    fn extract(&self, page: &LoadedPage) -> Result<ExtractedPage, ExtractError>;
}
