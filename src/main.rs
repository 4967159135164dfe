use clap::Parser;
use site_crawl::error::CrawlError;
use site_crawl::parsers::typed::extract_from_pages;
use site_crawl::{SiteCrawl, WebsiteType, aggregate, output, server};

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    if let Err(e) = run(args).await {
        ::log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), CrawlError> {
    if let Some(addr) = &args.serve {
        let defaults = args.server_defaults()?;
        return server::serve(addr, defaults).await;
    }

    let config = args.to_config()?;
    let seed_url = config.seed_url.clone();
    let time_limit_secs = config.time_limit_secs;
    let output_dir = config.output_dir.clone();

    println!("Note: crawling requires a WebDriver server (e.g. ChromeDriver).");
    println!("Set WEBDRIVER_URL if not using {}", config.webdriver_url);

    ::log::info!(
        "Starting crawl of {} with a {} second budget",
        seed_url,
        time_limit_secs
    );
    let start_time = std::time::Instant::now();

    let result = SiteCrawl::new(&seed_url).with_config(config).run().await?;

    ::log::info!(
        "Crawling complete - recorded {} pages in {:.2} seconds",
        result.len(),
        start_time.elapsed().as_secs_f64()
    );

    let path = match args.website_type {
        Some(kind) => {
            let kind = WebsiteType::from(kind);
            let records = extract_from_pages(kind, &result);
            let typed = output::TypedOutput::paginate(kind, records, args.limit, args.offset);
            ::log::info!(
                "Keeping {} of {} {} records",
                typed.pagination.count,
                typed.pagination.total,
                kind
            );
            let file_name = output::typed_file_name(kind, &seed_url, args.limit, args.offset);
            output::write_json(&output_dir, &file_name, &typed)?
        }
        None if args.first_page_only => {
            let first: Vec<_> = aggregate::filter_first(&result).into_iter().collect();
            let file_name = output::first_page_file_name(&seed_url);
            output::write_json(&output_dir, &file_name, &first)?
        }
        None => {
            let filtered = aggregate::filter_results(&result);
            let file_name = output::crawl_file_name(&seed_url, time_limit_secs);
            output::write_json(&output_dir, &file_name, &filtered)?
        }
    };

    println!("Saved results to {}", path.display());
    Ok(())
}
