pub mod html;
pub mod typed;

#[cfg(test)]
mod tests;

use crate::crawlers::crawler::{ExtractedPage, Extractor, LoadedPage};
use crate::error::ExtractError;
use scraper::Html;
use url::Url;

/// Extracts links, images and body text from the page source
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl Extractor for HtmlExtractor {
    fn extract(&self, page: &LoadedPage) -> Result<ExtractedPage, ExtractError> {
        if page.html.trim().is_empty() {
            return Err(ExtractError::EmptyDocument {
                url: page.url.clone(),
            });
        }

        // Relative references resolve against where the browser actually landed
        let base = Url::parse(&page.final_url).map_err(|source| ExtractError::BaseUrl {
            url: page.final_url.clone(),
            source,
        })?;
        let doc = Html::parse_document(&page.html);

        Ok(ExtractedPage {
            links: html::extract_links(&doc, &base),
            images: html::extract_images(&doc, &base),
            text_content: html::extract_text(&doc),
            html_content: page.html.clone(),
        })
    }
}
