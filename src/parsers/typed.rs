//! Typed records for news, e-commerce and weather pages.
//!
//! Each website type has a list of container selectors and, per field, a list
//! of selectors tried in order until one yields non-empty text.

use crate::error::CrawlError;
use crate::parsers::html::resolve;
use crate::results::PageRecord;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use url::Url;

/// Kind of site a typed crawl extracts records for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebsiteType {
    News,
    Ecommerce,
    Weather,
}

impl WebsiteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebsiteType::News => "news",
            WebsiteType::Ecommerce => "ecommerce",
            WebsiteType::Weather => "weather",
        }
    }
}

impl fmt::Display for WebsiteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebsiteType {
    type Err = CrawlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "news" => Ok(WebsiteType::News),
            "ecommerce" | "e-commerce" => Ok(WebsiteType::Ecommerce),
            "weather" => Ok(WebsiteType::Weather),
            other => Err(CrawlError::invalid(format!(
                "unknown website type {:?} (expected news, ecommerce or weather)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub title: String,
    pub url: Option<String>,
    pub summary: Option<String>,
    pub published: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub name: String,
    pub price: Option<String>,
    pub price_value: Option<f64>,
    pub url: Option<String>,
    pub image: Option<String>,
    pub rating: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub location: Option<String>,
    pub temperature: Option<String>,
    pub temperature_value: Option<f64>,
    pub condition: Option<String>,
    pub time: Option<String>,
}

/// One typed record; serialized without a variant tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SiteRecord {
    News(NewsArticle),
    Product(Product),
    Weather(WeatherReport),
}

struct Selectors(Vec<Selector>);

impl Selectors {
    fn new(list: &[&str]) -> Self {
        Self(list.iter().map(|s| Selector::parse(s).unwrap()).collect())
    }

    fn text(&self, scope: ElementRef<'_>) -> Option<String> {
        self.0
            .iter()
            .flat_map(|s| scope.select(s))
            .map(element_text)
            .find(|t| !t.is_empty())
    }

    fn attr(&self, scope: ElementRef<'_>, attrs: &[&str]) -> Option<String> {
        self.0
            .iter()
            .flat_map(|s| scope.select(s))
            .find_map(|e| attrs.iter().find_map(|a| e.value().attr(a)))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

struct NewsSelectors {
    items: Selectors,
    title: Selectors,
    link: Selectors,
    summary: Selectors,
    published: Selectors,
    image: Selectors,
}

struct ProductSelectors {
    items: Selectors,
    name: Selectors,
    price: Selectors,
    link: Selectors,
    image: Selectors,
    rating: Selectors,
}

struct WeatherSelectors {
    items: Selectors,
    location: Selectors,
    temperature: Selectors,
    condition: Selectors,
    time: Selectors,
}

static NEWS: LazyLock<NewsSelectors> = LazyLock::new(|| NewsSelectors {
    items: Selectors::new(&[
        "article",
        "[itemtype*='NewsArticle']",
        ".news-item",
        ".story",
        ".post",
    ]),
    title: Selectors::new(&["h1", "h2", "h3", ".headline", ".title", "[itemprop='headline']"]),
    link: Selectors::new(&["h1 a[href]", "h2 a[href]", "h3 a[href]", "a[href]"]),
    summary: Selectors::new(&[".summary", ".excerpt", "[itemprop='description']", "p"]),
    published: Selectors::new(&["time", ".date", ".published", "[itemprop='datePublished']"]),
    image: Selectors::new(&["img[src]"]),
});

static PRODUCTS: LazyLock<ProductSelectors> = LazyLock::new(|| ProductSelectors {
    items: Selectors::new(&[
        "[itemtype*='Product']",
        ".product",
        ".product-item",
        ".product-card",
        "li.item",
    ]),
    name: Selectors::new(&[
        "[itemprop='name']",
        ".product-title",
        ".product-name",
        "h2",
        "h3",
        ".title",
    ]),
    price: Selectors::new(&["[itemprop='price']", ".price", ".product-price", ".amount"]),
    link: Selectors::new(&["a[href]"]),
    image: Selectors::new(&["img[src]"]),
    rating: Selectors::new(&["[itemprop='ratingValue']", ".rating", ".stars"]),
});

static WEATHER: LazyLock<WeatherSelectors> = LazyLock::new(|| WeatherSelectors {
    items: Selectors::new(&[
        ".forecast-day",
        ".forecast-item",
        ".weather-card",
        ".current-weather",
        ".weather",
        ".forecast",
    ]),
    location: Selectors::new(&[".location", ".city", "[itemprop='name']", "h2", "h1"]),
    temperature: Selectors::new(&[".temperature", ".temp", ".degrees", "[data-temperature]"]),
    condition: Selectors::new(&[".condition", ".description", ".summary", ".phrase"]),
    time: Selectors::new(&["time", ".date", ".day", ".time"]),
});

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d{1,3}(?:,\d{3})+(?:\.\d+)?|-?\d+(?:\.\d+)?").unwrap());

/// Extracts typed records of `kind` from one page, in document order
pub fn extract_records(kind: WebsiteType, html: &str, base: &Url) -> Vec<SiteRecord> {
    let doc = Html::parse_document(html);
    let records: Vec<SiteRecord> = match kind {
        WebsiteType::News => containers(&doc, &NEWS.items)
            .into_iter()
            .filter_map(|item| news_article(item, base))
            .map(SiteRecord::News)
            .collect(),
        WebsiteType::Ecommerce => containers(&doc, &PRODUCTS.items)
            .into_iter()
            .filter_map(|item| product(item, base))
            .map(SiteRecord::Product)
            .collect(),
        WebsiteType::Weather => containers(&doc, &WEATHER.items)
            .into_iter()
            .filter_map(weather_report)
            .map(SiteRecord::Weather)
            .collect(),
    };

    let mut unique: Vec<SiteRecord> = Vec::with_capacity(records.len());
    for record in records {
        if !unique.contains(&record) {
            unique.push(record);
        }
    }
    ::log::debug!("Extracted {} {} records", unique.len(), kind);
    unique
}

/// Typed records of every crawled page, in crawl order
pub fn extract_from_pages(kind: WebsiteType, pages: &[PageRecord]) -> Vec<SiteRecord> {
    let mut records = Vec::new();
    for page in pages {
        let base = match Url::parse(&page.url) {
            Ok(base) => base,
            Err(e) => {
                ::log::warn!("Skipping typed extraction of {}: {}", page.url, e);
                continue;
            }
        };
        records.extend(extract_records(kind, &page.html_content, &base));
    }
    records
}

/// Containers matched by the highest-priority selector that matches anything
fn containers<'a>(doc: &'a Html, items: &Selectors) -> Vec<ElementRef<'a>> {
    items
        .0
        .iter()
        .map(|s| doc.select(s).collect::<Vec<_>>())
        .find(|found| !found.is_empty())
        .unwrap_or_default()
}

fn news_article(item: ElementRef<'_>, base: &Url) -> Option<NewsArticle> {
    let title = NEWS.title.text(item)?;
    Some(NewsArticle {
        title,
        url: NEWS
            .link
            .attr(item, &["href"])
            .and_then(|href| resolve(base, &href)),
        summary: NEWS.summary.text(item),
        published: NEWS
            .published
            .attr(item, &["datetime", "content"])
            .or_else(|| NEWS.published.text(item)),
        image: NEWS
            .image
            .attr(item, &["src"])
            .and_then(|src| resolve(base, &src)),
    })
}

fn product(item: ElementRef<'_>, base: &Url) -> Option<Product> {
    let name = PRODUCTS.name.text(item)?;
    let price = PRODUCTS
        .price
        .attr(item, &["content"])
        .or_else(|| PRODUCTS.price.text(item));
    Some(Product {
        name,
        price_value: price.as_deref().and_then(parse_number),
        price,
        url: PRODUCTS
            .link
            .attr(item, &["href"])
            .and_then(|href| resolve(base, &href)),
        image: PRODUCTS
            .image
            .attr(item, &["src"])
            .and_then(|src| resolve(base, &src)),
        rating: PRODUCTS
            .rating
            .attr(item, &["content"])
            .or_else(|| PRODUCTS.rating.text(item)),
    })
}

fn weather_report(item: ElementRef<'_>) -> Option<WeatherReport> {
    let temperature = WEATHER
        .temperature
        .attr(item, &["data-temperature"])
        .or_else(|| WEATHER.temperature.text(item));
    let location = WEATHER.location.text(item);
    if temperature.is_none() && location.is_none() {
        return None;
    }
    Some(WeatherReport {
        location,
        temperature_value: temperature.as_deref().and_then(parse_number),
        temperature,
        condition: WEATHER.condition.text(item),
        time: WEATHER
            .time
            .attr(item, &["datetime"])
            .or_else(|| WEATHER.time.text(item)),
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// First number in `text`, ignoring thousands separators ("$1,299.00" -> 1299.0)
pub fn parse_number(text: &str) -> Option<f64> {
    let found = NUMBER.find(text)?;
    found.as_str().replace(',', "").parse().ok()
}
