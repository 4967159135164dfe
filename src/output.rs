use crate::error::CrawlError;
use crate::parsers::typed::{SiteRecord, WebsiteType};
use crate::utils::sanitize_filename;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Window of typed records written to the output file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: usize,
    pub offset: usize,
    /// Records in this window
    pub count: usize,
    /// Records extracted before windowing
    pub total: usize,
}

/// Output document of a typed crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedOutput {
    pub website_type: WebsiteType,
    pub pagination: Pagination,
    pub data: Vec<SiteRecord>,
}

impl TypedOutput {
    /// Keeps `limit` records starting at `offset`
    pub fn paginate(
        website_type: WebsiteType,
        records: Vec<SiteRecord>,
        limit: usize,
        offset: usize,
    ) -> Self {
        let total = records.len();
        let data: Vec<SiteRecord> = records.into_iter().skip(offset).take(limit).collect();
        Self {
            website_type,
            pagination: Pagination {
                limit,
                offset,
                count: data.len(),
                total,
            },
            data,
        }
    }
}

pub fn crawl_file_name(seed_url: &str, time_limit_secs: u64) -> String {
    format!("crawl_{}_{}s.json", sanitize_filename(seed_url), time_limit_secs)
}

pub fn first_page_file_name(seed_url: &str) -> String {
    format!("page_{}.json", sanitize_filename(seed_url))
}

pub fn typed_file_name(
    website_type: WebsiteType,
    seed_url: &str,
    limit: usize,
    offset: usize,
) -> String {
    format!(
        "{}_{}_l{}_o{}.json",
        website_type,
        sanitize_filename(seed_url),
        limit,
        offset
    )
}

/// Writes `value` as pretty JSON to `dir/file_name`, creating `dir` if needed
pub fn write_json<T: Serialize + ?Sized>(
    dir: &Path,
    file_name: &str,
    value: &T,
) -> Result<PathBuf, CrawlError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(&path, json)?;
    ::log::info!("Wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::typed::NewsArticle;
    use crate::results::PageRecord;

    fn article(title: &str) -> SiteRecord {
        SiteRecord::News(NewsArticle {
            title: title.to_string(),
            url: None,
            summary: None,
            published: None,
            image: None,
        })
    }

    #[test]
    fn test_paginate_window() {
        let records = (0..5).map(|i| article(&format!("t{}", i))).collect();

        let output = TypedOutput::paginate(WebsiteType::News, records, 2, 1);

        assert_eq!(
            output.pagination,
            Pagination {
                limit: 2,
                offset: 1,
                count: 2,
                total: 5
            }
        );
        assert_eq!(output.data, vec![article("t1"), article("t2")]);
    }

    #[test]
    fn test_paginate_past_the_end() {
        let records = vec![article("only")];
        let output = TypedOutput::paginate(WebsiteType::News, records, 10, 3);
        assert_eq!(output.pagination.count, 0);
        assert_eq!(output.pagination.total, 1);
        assert!(output.data.is_empty());
    }

    #[test]
    fn test_typed_output_json_shape() {
        let output = TypedOutput::paginate(WebsiteType::Ecommerce, vec![], 10, 0);
        let json = serde_json::to_value(&output).unwrap();

        assert_eq!(json["websiteType"], "ecommerce");
        assert_eq!(json["pagination"]["limit"], 10);
        assert_eq!(json["pagination"]["offset"], 0);
        assert_eq!(json["pagination"]["count"], 0);
        assert_eq!(json["pagination"]["total"], 0);
        assert!(json["data"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_file_names_are_deterministic() {
        assert_eq!(
            crawl_file_name("https://example.com/docs", 30),
            "crawl_example.com_docs_30s.json"
        );
        assert_eq!(
            first_page_file_name("https://example.com/"),
            "page_example.com_.json"
        );
        assert_eq!(
            typed_file_name(WebsiteType::Weather, "https://wx.example.com", 5, 10),
            "weather_wx.example.com_l5_o10.json"
        );
    }

    #[test]
    fn test_write_json_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("nested").join("out");
        let records = vec![PageRecord::new(
            "https://example.com/".to_string(),
            vec![],
            vec![],
            "text".to_string(),
            "<p>text</p>".to_string(),
        )];

        let path = write_json(&out_dir, "crawl.json", &records).unwrap();

        let written: Vec<PageRecord> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, records);
    }
}
