use crate::results::PageRecord;
use std::collections::HashSet;

/// Cleans one record: links and images deduplicated in first-seen order,
/// text whitespace collapsed to single spaces and trimmed
pub fn clean_record(record: &PageRecord) -> PageRecord {
    PageRecord {
        url: record.url.clone(),
        links: dedup_preserving_order(&record.links),
        images: dedup_preserving_order(&record.images),
        text_content: collapse_whitespace(&record.text_content),
        html_content: record.html_content.clone(),
    }
}

/// Cleans every record of a crawl, keeping crawl order
pub fn filter_results(records: &[PageRecord]) -> Vec<PageRecord> {
    records.iter().map(clean_record).collect()
}

/// Cleans only the seed page, if it was recorded
pub fn filter_first(records: &[PageRecord]) -> Option<PageRecord> {
    records.first().map(clean_record)
}

pub fn dedup_preserving_order(items: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(items.len());
    let mut unique = Vec::with_capacity(items.len());
    for item in items {
        if seen.insert(item.as_str()) {
            unique.push(item.clone());
        }
    }
    unique
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
