use crate::config::CrawlConfig;
use crate::crawlers::crawler::{LoadOptions, LoadedPage, PageFetcher, WaitUntil};
use crate::error::{CrawlError, FetchError};
use fantoccini::wd::{Capabilities, TimeoutConfiguration};
use fantoccini::{Client, ClientBuilder, Locator};
use std::time::Duration;
use tokio::time::timeout;

const READY_STATE_POLL: Duration = Duration::from_millis(100);

/// Alternative WebDriver endpoints tried when the configured one refuses
const FALLBACK_WEBDRIVER_URLS: [&str; 3] = [
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4444", // Selenium / geckodriver default
    "http://127.0.0.1:4444",
];

/// A single WebDriver session, reused for every page it loads
pub struct BrowserFetcher {
    client: Client,
    webdriver_url: String,
    capabilities: Capabilities,
}

impl BrowserFetcher {
    /// Opens a browser session, trying well-known endpoints if the configured
    /// one cannot be reached. Failure here is fatal to the crawl.
    pub async fn connect(config: &CrawlConfig) -> Result<Self, CrawlError> {
        let capabilities = session_capabilities(config);

        let mut last_error = match open_session(&config.webdriver_url, &capabilities).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", config.webdriver_url);
                return Ok(Self {
                    client,
                    webdriver_url: config.webdriver_url.clone(),
                    capabilities,
                });
            }
            Err(e) => {
                ::log::warn!(
                    "Failed to connect to WebDriver at {}: {}",
                    config.webdriver_url,
                    e
                );
                e
            }
        };

        for url in FALLBACK_WEBDRIVER_URLS {
            if url == config.webdriver_url {
                continue;
            }
            ::log::info!("Trying fallback WebDriver URL: {}", url);
            match open_session(url, &capabilities).await {
                Ok(client) => {
                    ::log::debug!("Connected to fallback WebDriver at {}", url);
                    return Ok(Self {
                        client,
                        webdriver_url: url.to_string(),
                        capabilities,
                    });
                }
                Err(e) => last_error = e,
            }
        }

        Err(CrawlError::Browser {
            webdriver_url: config.webdriver_url.clone(),
            message: last_error,
        })
    }

    /// Opens `count` independent sessions for a worker pool
    pub async fn connect_many(config: &CrawlConfig, count: usize) -> Result<Vec<Self>, CrawlError> {
        let mut fetchers = Vec::with_capacity(count);
        for _ in 0..count {
            fetchers.push(Self::connect(config).await?);
        }
        Ok(fetchers)
    }

    pub fn webdriver_url(&self) -> &str {
        &self.webdriver_url
    }

    /// Ends the browser session
    pub async fn close(self) {
        if let Err(e) = self.client.close().await {
            ::log::warn!("Failed to close browser session: {}", e);
        }
    }

    async fn reconnect(&mut self) -> bool {
        ::log::warn!("Attempting to reconnect WebDriver session");
        match open_session(&self.webdriver_url, &self.capabilities).await {
            Ok(client) => {
                self.client = client;
                ::log::info!("Reconnected to WebDriver at {}", self.webdriver_url);
                true
            }
            Err(e) => {
                ::log::error!("Failed to reconnect to WebDriver: {}", e);
                false
            }
        }
    }

    async fn navigate(&self, url: &str, options: &LoadOptions) -> Result<LoadedPage, FetchError> {
        // The browser gives up on the page load at the same ceiling as we do
        let timeouts = TimeoutConfiguration::new(None, Some(options.timeout), None);
        self.client
            .update_timeouts(timeouts)
            .await
            .map_err(|e| navigation_error(url, "configuring timeouts for", e))?;

        self.client
            .goto(url)
            .await
            .map_err(|e| navigation_error(url, "navigating to", e))?;

        if options.wait_until == WaitUntil::Load {
            self.wait_for_load_event(url).await?;
        }

        if let Some(selector) = &options.wait_for_selector {
            self.client
                .wait()
                .at_most(options.timeout)
                .for_element(Locator::Css(selector))
                .await
                .map_err(|e| navigation_error(url, "waiting for selector on", e))?;
        }

        let html = self
            .client
            .source()
            .await
            .map_err(|e| navigation_error(url, "getting source for", e))?;
        let final_url = self
            .client
            .current_url()
            .await
            .map(|u| u.to_string())
            .unwrap_or_else(|_| url.to_string());

        Ok(LoadedPage {
            url: url.to_string(),
            final_url,
            html,
        })
    }

    /// Sessions navigate eagerly, so the `load` event is awaited by polling
    async fn wait_for_load_event(&self, url: &str) -> Result<(), FetchError> {
        loop {
            let state = self
                .client
                .execute("return document.readyState", Vec::new())
                .await
                .map_err(|e| navigation_error(url, "reading ready state of", e))?;
            if state.as_str() == Some("complete") {
                return Ok(());
            }
            tokio::time::sleep(READY_STATE_POLL).await;
        }
    }
}

impl PageFetcher for BrowserFetcher {
    async fn load(&mut self, url: &str, options: &LoadOptions) -> Result<LoadedPage, FetchError> {
        let started = std::time::Instant::now();

        for attempt in 0..2 {
            if attempt > 0 && !self.reconnect().await {
                break;
            }

            let result = match timeout(options.timeout, self.navigate(url, options)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout {
                    url: url.to_string(),
                    secs: options.timeout.as_secs(),
                }),
            };

            match result {
                Err(FetchError::SessionLost { .. }) => continue,
                Ok(page) => {
                    ::log::debug!(
                        "Loaded {} in {:.2} seconds",
                        url,
                        started.elapsed().as_secs_f64()
                    );
                    return Ok(page);
                }
                Err(e) => return Err(e),
            }
        }

        Err(FetchError::SessionLost {
            url: url.to_string(),
        })
    }
}

async fn open_session(webdriver_url: &str, capabilities: &Capabilities) -> Result<Client, String> {
    ClientBuilder::native()
        .capabilities(capabilities.clone())
        .connect(webdriver_url)
        .await
        .map_err(|e| e.to_string())
}

/// Navigation returns at DOMContentLoaded; `WaitUntil::Load` waits further per page
fn session_capabilities(config: &CrawlConfig) -> Capabilities {
    let mut capabilities = Capabilities::new();
    capabilities.insert("pageLoadStrategy".to_string(), "eager".into());
    if config.headless {
        capabilities.insert(
            "goog:chromeOptions".to_string(),
            serde_json::json!({ "args": ["--headless=new", "--disable-gpu"] }),
        );
        capabilities.insert(
            "moz:firefoxOptions".to_string(),
            serde_json::json!({ "args": ["-headless"] }),
        );
    }
    capabilities
}

fn navigation_error(url: &str, context: &str, error: fantoccini::error::CmdError) -> FetchError {
    let message = error.to_string();
    if message.contains("Unable to find session") || message.contains("invalid session id") {
        ::log::warn!("Lost session while {} {}", context, url);
        FetchError::SessionLost {
            url: url.to_string(),
        }
    } else {
        ::log::debug!("Failed {} {}: {}", context, url, message);
        FetchError::Navigation {
            url: url.to_string(),
            message,
        }
    }
}
