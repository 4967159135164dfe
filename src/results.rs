use serde::{Deserialize, Serialize};

/// Data captured from one successfully fetched page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    /// URL the page was requested under
    pub url: String,

    /// Links in discovery order, resolved against the page URL (may repeat)
    pub links: Vec<String>,

    /// Image sources in discovery order, resolved against the page URL
    pub images: Vec<String>,

    /// Raw text content of the page body
    pub text_content: String,

    /// Full page source
    pub html_content: String,
}

impl PageRecord {
    /// Create a new page record
    pub fn new(
        url: String,
        links: Vec<String>,
        images: Vec<String>,
        text_content: String,
        html_content: String,
    ) -> Self {
        Self {
            url,
            links,
            images,
            text_content,
            html_content,
        }
    }
}

/// Pages of one crawl in depth-first pre-order
pub type CrawlResult = Vec<PageRecord>;
