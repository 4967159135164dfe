pub mod aggregate;
pub mod config;
pub mod crawlers;
pub mod error;
pub mod output;
pub mod parsers;
pub mod results;
pub mod server;
pub mod utils;

// Re-export commonly used types for convenience
pub use crawlers::engine::{CrawlContext, CrawlEngine, Deadline, VisitTracker};
pub use error::{CrawlError, ExtractError, FetchError};
pub use parsers::typed::WebsiteType;
pub use results::{CrawlResult, PageRecord};

use config::CrawlConfig;
use crawlers::pool::WorkerPool;
use crawlers::web::BrowserFetcher;
use parsers::HtmlExtractor;
use std::path::Path;

/// Builder for one browser-driven crawl of a site
pub struct SiteCrawl {
    config: CrawlConfig,
}

impl SiteCrawl {
    /// Create a crawl of `seed_url` with default settings
    pub fn new(seed_url: &str) -> Self {
        Self {
            config: CrawlConfig::new(seed_url),
        }
    }

    /// Set the wall-clock budget of the whole crawl
    pub fn with_time_limit(mut self, seconds: u64) -> Self {
        self.config.time_limit_secs = seconds;
        self
    }

    /// Set the number of browser sessions crawling in parallel
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config.max_concurrency = max_concurrency;
        self
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: CrawlConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a JSON file
    pub fn with_config_file(self, path: impl AsRef<Path>) -> Result<Self, CrawlError> {
        let config = CrawlConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Load configuration from a JSON string
    pub fn with_config_str(self, config_str: &str) -> Result<Self, CrawlError> {
        let config = CrawlConfig::from_json(config_str)?;
        Ok(self.with_config(config))
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Validates the input, opens browser sessions and crawls.
    ///
    /// Only invalid input and a browser that cannot be started are errors;
    /// pages that fail to load are skipped.
    pub async fn run(self) -> Result<CrawlResult, CrawlError> {
        let mut config = self.config;
        config.apply_env();
        config.validate()?;

        let options = config.load_options();

        // The budget starts once the browser is up
        let ctx = if config.max_concurrency <= 1 {
            let fetcher = BrowserFetcher::connect(&config).await?;
            let mut ctx = CrawlContext::new(&config.seed_url, config.time_limit());
            let mut engine = CrawlEngine::new(fetcher, HtmlExtractor, options);
            engine.crawl(&mut ctx).await;
            engine.into_fetcher().close().await;
            ctx
        } else {
            let fetchers = BrowserFetcher::connect_many(&config, config.max_concurrency).await?;
            let mut ctx = CrawlContext::new(&config.seed_url, config.time_limit());
            let mut pool = WorkerPool::new(fetchers, HtmlExtractor, options);
            pool.crawl(&mut ctx).await;
            for fetcher in pool.into_fetchers() {
                fetcher.close().await;
            }
            ctx
        };

        Ok(ctx.into_result())
    }
}
