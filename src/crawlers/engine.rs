use crate::crawlers::crawler::{Extractor, LoadOptions, PageFetcher};
use crate::results::{CrawlResult, PageRecord};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::time::Instant;

/// URLs already visited or claimed for a visit during one crawl
#[derive(Debug, Default)]
pub struct VisitTracker {
    visited: HashSet<String>,
}

impl VisitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Marks a URL as visited, returning `true` if it was not marked before
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }
}

/// Wall-clock budget for a whole crawl
///
/// Expiry is only observed at checkpoints between fetches; a fetch that is
/// already running when the deadline passes is allowed to finish.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    at: Instant,
    budget: Duration,
}

impl Deadline {
    /// Starts the clock now with the given budget
    pub fn new(budget: Duration) -> Self {
        let started = Instant::now();
        Self {
            started,
            at: started + budget,
            budget,
        }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// True once more whole milliseconds have elapsed than the budget.
    /// A zero budget is not yet expired within its first millisecond.
    pub fn expired(&self) -> bool {
        self.started.elapsed().as_millis() > self.budget.as_millis()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// All mutable state of one crawl invocation
#[derive(Debug)]
pub struct CrawlContext {
    pub(crate) seed: String,
    pub(crate) visited: VisitTracker,
    pub(crate) deadline: Deadline,
    pub(crate) result: CrawlResult,
}

impl CrawlContext {
    /// Creates a context whose deadline starts counting now
    pub fn new(seed: impl Into<String>, budget: Duration) -> Self {
        Self::with_deadline(seed, Deadline::new(budget))
    }

    pub fn with_deadline(seed: impl Into<String>, deadline: Deadline) -> Self {
        Self {
            seed: seed.into(),
            visited: VisitTracker::new(),
            deadline,
            result: Vec::new(),
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn deadline(&self) -> &Deadline {
        &self.deadline
    }

    pub fn visited(&self) -> &VisitTracker {
        &self.visited
    }

    pub fn result(&self) -> &[PageRecord] {
        &self.result
    }

    pub fn into_result(self) -> CrawlResult {
        self.result
    }

    /// A link is followed only when the seed string is a literal prefix of it
    pub fn in_scope(&self, link: &str) -> bool {
        link.starts_with(&self.seed)
    }
}

/// Sequential depth-first crawler over a single page fetcher
pub struct CrawlEngine<F, E> {
    fetcher: F,
    extractor: E,
    options: LoadOptions,
}

impl<F: PageFetcher, E: Extractor> CrawlEngine<F, E> {
    pub fn new(fetcher: F, extractor: E, options: LoadOptions) -> Self {
        Self {
            fetcher,
            extractor,
            options,
        }
    }

    /// Crawls from `seed` until the link graph is exhausted or `budget` runs out
    pub async fn run(&mut self, seed: &str, budget: Duration) -> CrawlResult {
        let mut ctx = CrawlContext::new(seed, budget);
        self.crawl(&mut ctx).await;
        ctx.into_result()
    }

    /// Depth-first pre-order traversal driven by an explicit work stack.
    ///
    /// Children are pushed in reverse discovery order and the visited check
    /// happens when a URL is popped, so pages are recorded in the same order
    /// a recursive descent would record them.
    pub async fn crawl(&mut self, ctx: &mut CrawlContext) {
        ::log::info!(
            "Crawling {} with {:.0?} budget",
            ctx.seed,
            ctx.deadline.remaining()
        );

        let mut stack = vec![ctx.seed.clone()];

        while let Some(url) = stack.pop() {
            if ctx.visited.has_visited(&url) {
                ::log::trace!("Skipping already visited: {}", url);
                continue;
            }
            if ctx.deadline.expired() {
                ::log::info!(
                    "Time budget exhausted after {:.2?}, stopping before {}",
                    ctx.deadline.elapsed(),
                    url
                );
                break;
            }

            // Marked before the fetch so a page linking to itself is not re-entered
            ctx.visited.mark_visited(&url);

            let Some(record) =
                fetch_record(&mut self.fetcher, &self.extractor, &url, &self.options).await
            else {
                continue;
            };

            stack.extend(
                record
                    .links
                    .iter()
                    .rev()
                    .filter(|link| ctx.in_scope(link) && !ctx.visited.has_visited(link))
                    .cloned(),
            );
            ctx.result.push(record);
        }

        ::log::info!(
            "Crawl of {} finished: {} pages recorded, {} URLs visited in {:.2?}",
            ctx.seed,
            ctx.result.len(),
            ctx.visited.len(),
            ctx.deadline.elapsed()
        );
    }

    pub fn into_fetcher(self) -> F {
        self.fetcher
    }
}

/// Loads and extracts one page; failures are logged and yield no record
pub(crate) async fn fetch_record<F: PageFetcher, E: Extractor>(
    fetcher: &mut F,
    extractor: &E,
    url: &str,
    options: &LoadOptions,
) -> Option<PageRecord> {
    ::log::debug!("Visiting {}", url);

    let page = match fetcher.load(url, options).await {
        Ok(page) => page,
        Err(e) => {
            ::log::warn!("Failed to fetch {}: {}", url, e);
            return None;
        }
    };

    match extractor.extract(&page) {
        Ok(extracted) => {
            ::log::debug!(
                "Found {} links and {} images in {}",
                extracted.links.len(),
                extracted.images.len(),
                url
            );
            Some(PageRecord::new(
                url.to_string(),
                extracted.links,
                extracted.images,
                extracted.text_content,
                extracted.html_content,
            ))
        }
        Err(e) => {
            ::log::warn!("Failed to extract {}: {}", url, e);
            None
        }
    }
}

/// Reorders records into the depth-first pre-order a sequential crawl from
/// `seed` would have produced over the same link graph.
///
/// Records that the replay cannot reach are appended in their original order.
pub fn restore_preorder(seed: &str, records: Vec<PageRecord>) -> CrawlResult {
    let arrival: Vec<String> = records.iter().map(|r| r.url.clone()).collect();
    let mut by_url: HashMap<String, PageRecord> =
        records.into_iter().map(|r| (r.url.clone(), r)).collect();

    let mut seen = HashSet::new();
    let mut ordered = Vec::with_capacity(by_url.len());
    let mut stack = vec![seed.to_string()];

    while let Some(url) = stack.pop() {
        if !seen.insert(url.clone()) {
            continue;
        }
        let Some(record) = by_url.remove(&url) else {
            continue;
        };
        stack.extend(
            record
                .links
                .iter()
                .rev()
                .filter(|link| link.starts_with(seed) && !seen.contains(*link))
                .cloned(),
        );
        ordered.push(record);
    }

    ordered.extend(arrival.iter().filter_map(|url| by_url.remove(url)));
    ordered
}
