use clap::{Parser, ValueEnum};
use site_crawl::WebsiteType;
use site_crawl::config::CrawlConfig;
use site_crawl::error::CrawlError;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "site-crawl")]
#[command(about = "Crawls a site through a browser within a time budget and saves what it finds")]
#[command(version)]
pub struct Args {
    /// Seed URL; only links starting with this exact string are followed
    pub url: Option<String>,

    /// Time budget for the whole crawl, in seconds
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub time_limit: Option<u64>,

    /// Extract typed records for this kind of site instead of raw pages
    #[arg(short, long, value_enum)]
    pub website_type: Option<WebsiteTypeArg>,

    /// Maximum number of typed records to write
    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    /// Number of typed records to skip
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Only keep the cleaned seed page
    #[arg(long)]
    pub first_page_only: bool,

    /// Number of browser sessions crawling in parallel
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// JSON configuration file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory the result file is written to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// WebDriver endpoint (also read from WEBDRIVER_URL)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Serve typed crawls over HTTP on this address instead of crawling once
    #[arg(long, value_name = "ADDR", conflicts_with_all = ["url", "time_limit", "website_type"])]
    pub serve: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum WebsiteTypeArg {
    News,
    Ecommerce,
    Weather,
}

impl From<WebsiteTypeArg> for WebsiteType {
    fn from(arg: WebsiteTypeArg) -> Self {
        match arg {
            WebsiteTypeArg::News => WebsiteType::News,
            WebsiteTypeArg::Ecommerce => WebsiteType::Ecommerce,
            WebsiteTypeArg::Weather => WebsiteType::Weather,
        }
    }
}

impl Args {
    /// Builds the crawl configuration, asking on stdin for a missing URL or
    /// time limit
    pub fn to_config(&self) -> Result<CrawlConfig, CrawlError> {
        let stdin = io::stdin();
        self.to_config_with(&mut stdin.lock())
    }

    pub fn to_config_with(&self, input: &mut impl BufRead) -> Result<CrawlConfig, CrawlError> {
        if self.website_type.is_some() && self.limit == 0 {
            return Err(CrawlError::invalid("limit must be at least 1"));
        }

        let mut config = match &self.config {
            Some(path) => CrawlConfig::from_file(path)?,
            None => CrawlConfig::new(""),
        };

        if let Some(url) = &self.url {
            config.seed_url = url.clone();
        } else if config.seed_url.trim().is_empty() {
            config.seed_url = prompt(input, "Enter the URL to crawl: ")?;
        }

        if let Some(secs) = self.time_limit {
            config.time_limit_secs = secs;
        } else if self.config.is_none() {
            let answer = prompt(input, "Enter the time limit in seconds: ")?;
            config.time_limit_secs = parse_time_limit(&answer)?;
        }

        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Settings every served request starts from; requests supply the seed
    /// and the budget
    pub fn server_defaults(&self) -> Result<CrawlConfig, CrawlError> {
        let mut config = match &self.config {
            Some(path) => CrawlConfig::from_file(path)?,
            None => CrawlConfig::new(""),
        };
        self.apply_overrides(&mut config);
        if config.max_concurrency == 0 {
            return Err(CrawlError::invalid("concurrency must be at least 1"));
        }
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut CrawlConfig) {
        if let Some(concurrency) = self.concurrency {
            config.max_concurrency = concurrency;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(webdriver_url) = &self.webdriver_url {
            config.webdriver_url = webdriver_url.clone();
        }
    }
}

/// Time limits are positive whole seconds
pub fn parse_time_limit(value: &str) -> Result<u64, CrawlError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(CrawlError::invalid(format!(
            "time limit must be a positive integer, got {:?}",
            value.trim()
        ))),
    }
}

fn prompt(input: &mut impl BufRead, label: &str) -> Result<String, CrawlError> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("site-crawl").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_flags_build_config_without_prompting() {
        let args = parse(&["https://example.com/docs", "-t", "45", "-c", "3"]);
        let config = args.to_config_with(&mut io::empty()).unwrap();

        assert_eq!(config.seed_url, "https://example.com/docs");
        assert_eq!(config.time_limit_secs, 45);
        assert_eq!(config.max_concurrency, 3);
    }

    #[test]
    fn test_missing_values_are_prompted() {
        let args = parse(&[]);
        let mut input = io::Cursor::new("https://example.com/\n12\n");

        let config = args.to_config_with(&mut input).unwrap();

        assert_eq!(config.seed_url, "https://example.com/");
        assert_eq!(config.time_limit_secs, 12);
    }

    #[test]
    fn test_zero_time_limit_is_rejected() {
        assert!(Args::try_parse_from(["site-crawl", "https://example.com", "-t", "0"]).is_err());

        let args = parse(&["https://example.com"]);
        let result = args.to_config_with(&mut io::Cursor::new("0\n"));
        assert!(matches!(result, Err(CrawlError::InvalidInput(_))));
    }

    #[test]
    fn test_website_type_and_pagination() {
        let args = parse(&[
            "https://shop.example.com",
            "-t",
            "30",
            "-w",
            "ecommerce",
            "--limit",
            "5",
            "--offset",
            "10",
        ]);

        assert_eq!(args.website_type.map(WebsiteType::from), Some(WebsiteType::Ecommerce));
        assert_eq!(args.limit, 5);
        assert_eq!(args.offset, 10);
        assert!(Args::try_parse_from(["site-crawl", "-w", "sports"]).is_err());
    }

    #[test]
    fn test_zero_limit_is_rejected_for_typed_crawls() {
        let args = parse(&["https://example.com", "-t", "5", "-w", "news", "--limit", "0"]);
        assert!(matches!(
            args.to_config_with(&mut io::empty()),
            Err(CrawlError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let args = parse(&["example dot com", "-t", "5"]);
        assert!(matches!(
            args.to_config_with(&mut io::empty()),
            Err(CrawlError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_serve_mode_skips_prompts() {
        let args = parse(&["--serve", "127.0.0.1:8080", "-c", "2"]);
        assert_eq!(args.serve.as_deref(), Some("127.0.0.1:8080"));

        let config = args.server_defaults().unwrap();
        assert_eq!(config.max_concurrency, 2);
        assert!(config.seed_url.is_empty());

        assert!(
            Args::try_parse_from(["site-crawl", "--serve", "0.0.0.0:80", "https://example.com"])
                .is_err()
        );
    }

    #[test]
    fn test_parse_time_limit() {
        assert_eq!(parse_time_limit(" 30 ").unwrap(), 30);
        assert!(parse_time_limit("-5").is_err());
        assert!(parse_time_limit("soon").is_err());
    }
}
