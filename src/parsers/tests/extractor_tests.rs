use crate::crawlers::crawler::{Extractor, LoadedPage};
use crate::error::ExtractError;
use crate::parsers::HtmlExtractor;

fn page(url: &str, final_url: &str, html: &str) -> LoadedPage {
    LoadedPage {
        url: url.to_string(),
        final_url: final_url.to_string(),
        html: html.to_string(),
    }
}

#[test]
fn test_extract_full_page() {
    let html = r#"<html><head><title>T</title></head><body>
        <h1>Welcome</h1>
        <a href="/a">A</a> <a href="https://example.com/b">B</a>
        <img src="/img/logo.png">
    </body></html>"#;

    let extracted = HtmlExtractor
        .extract(&page("https://example.com/", "https://example.com/", html))
        .unwrap();

    assert_eq!(
        extracted.links,
        vec!["https://example.com/a", "https://example.com/b"]
    );
    assert_eq!(extracted.images, vec!["https://example.com/img/logo.png"]);
    assert!(extracted.text_content.contains("Welcome"));
    assert!(!extracted.text_content.contains("<h1>"));
    assert_eq!(extracted.html_content, html);
}

#[test]
fn test_links_resolve_against_final_url() {
    let html = r#"<body><a href="next">Next</a></body>"#;

    let extracted = HtmlExtractor
        .extract(&page(
            "https://example.com/old",
            "https://example.com/new/start",
            html,
        ))
        .unwrap();

    assert_eq!(extracted.links, vec!["https://example.com/new/next"]);
}

#[test]
fn test_empty_source_is_an_error() {
    let result = HtmlExtractor.extract(&page("https://example.com/", "https://example.com/", "  \n"));
    assert!(matches!(result, Err(ExtractError::EmptyDocument { .. })));
}

#[test]
fn test_unparseable_final_url_is_an_error() {
    let result = HtmlExtractor.extract(&page("about:blank", "not a url", "<p>x</p>"));
    assert!(matches!(result, Err(ExtractError::BaseUrl { .. })));
}
