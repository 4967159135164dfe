use crate::crawlers::crawler::{LoadOptions, WaitUntil};
use crate::error::CrawlError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Configuration for one site crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// URL to start crawling from; also the scope prefix for followed links
    pub seed_url: String,

    /// Wall-clock budget for the whole crawl
    #[serde(default = "default_time_limit_secs")]
    pub time_limit_secs: u64,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Ceiling for loading a single page
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,

    /// Load condition awaited before a page is extracted
    #[serde(default)]
    pub wait_until: WaitUntil,

    /// Optional CSS selector that must appear before a page is extracted
    #[serde(default)]
    pub wait_for_selector: Option<String>,

    /// Number of browser sessions crawling in parallel (1 = sequential)
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Run the browser without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Directory crawl results are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_time_limit_secs() -> u64 {
    60
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_page_timeout_secs() -> u64 {
    30
}

fn default_max_concurrency() -> usize {
    1
}

fn default_headless() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl CrawlConfig {
    /// Create a new configuration with default values
    pub fn new(seed_url: &str) -> Self {
        Self {
            seed_url: seed_url.to_string(),
            time_limit_secs: default_time_limit_secs(),
            webdriver_url: default_webdriver_url(),
            page_timeout_secs: default_page_timeout_secs(),
            wait_until: WaitUntil::default(),
            wait_for_selector: None,
            max_concurrency: default_max_concurrency(),
            headless: default_headless(),
            output_dir: default_output_dir(),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CrawlError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, CrawlError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Replace the WebDriver URL with `WEBDRIVER_URL` when it is set and non-empty
    pub fn apply_env(&mut self) {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
    }

    /// Rejects input that must never reach the browser
    pub fn validate(&self) -> Result<(), CrawlError> {
        validate_seed_url(&self.seed_url)?;
        if self.time_limit_secs == 0 {
            return Err(CrawlError::invalid("time limit must be a positive number of seconds"));
        }
        if self.page_timeout_secs == 0 {
            return Err(CrawlError::invalid("page timeout must be a positive number of seconds"));
        }
        if self.max_concurrency == 0 {
            return Err(CrawlError::invalid("concurrency must be at least 1"));
        }
        Ok(())
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_secs)
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            wait_until: self.wait_until,
            wait_for_selector: self.wait_for_selector.clone(),
            timeout: Duration::from_secs(self.page_timeout_secs),
        }
    }
}

/// Seed URLs must be absolute http(s) URLs
pub fn validate_seed_url(seed_url: &str) -> Result<Url, CrawlError> {
    if seed_url.trim().is_empty() {
        return Err(CrawlError::invalid("a seed URL is required"));
    }
    let url = Url::parse(seed_url)
        .map_err(|e| CrawlError::invalid(format!("invalid URL {:?}: {}", seed_url, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(CrawlError::invalid(format!(
            "unsupported URL scheme {:?} in {}",
            other, seed_url
        ))),
    }
}
