use thiserror::Error;

/// Failure to load a single page in the browser
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timed out after {secs}s loading {url}")]
    Timeout { url: String, secs: u64 },

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("browser session lost while loading {url}")]
    SessionLost { url: String },
}

/// Failure to pull data out of a loaded page
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("page {url} has no document body")]
    EmptyDocument { url: String },

    #[error("invalid page URL {url}: {source}")]
    BaseUrl {
        url: String,
        source: url::ParseError,
    },
}

/// Errors that abort a whole crawl run
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("could not start browser session at {webdriver_url}: {message}")]
    Browser {
        webdriver_url: String,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CrawlError {
    pub fn invalid(message: impl Into<String>) -> Self {
        CrawlError::InvalidInput(message.into())
    }
}
