use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());
static LINKS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static IMAGES: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img[src]").unwrap());

/// Links of all anchors in document order, resolved against `base`.
///
/// Duplicates are kept; hrefs that do not resolve to a URL are dropped.
pub fn extract_links(doc: &Html, base: &Url) -> Vec<String> {
    let links = resolve_attr(doc, &LINKS, "href", base);
    ::log::debug!("HTML parser found {} links", links.len());
    if !links.is_empty() {
        ::log::trace!(
            "First few links: {:?}",
            links.iter().take(5).collect::<Vec<_>>()
        );
    }
    links
}

/// Image sources in document order, resolved against `base`
pub fn extract_images(doc: &Html, base: &Url) -> Vec<String> {
    resolve_attr(doc, &IMAGES, "src", base)
}

/// Concatenated text nodes of the body, whitespace untouched
pub fn extract_text(doc: &Html) -> String {
    doc.select(&BODY).flat_map(|n| n.text()).collect()
}

fn resolve_attr(doc: &Html, selector: &Selector, attr: &str, base: &Url) -> Vec<String> {
    doc.select(selector)
        .filter_map(|e| e.value().attr(attr))
        .filter_map(|value| resolve(base, value))
        .collect()
}

/// Resolves a possibly relative reference the way a browser's `href` property does
pub fn resolve(base: &Url, reference: &str) -> Option<String> {
    base.join(reference.trim()).ok().map(|u| u.to_string())
}
