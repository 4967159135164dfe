use crate::crawlers::crawler::{Extractor, LoadOptions, PageFetcher};
use crate::crawlers::engine::{CrawlContext, Deadline, fetch_record, restore_preorder};
use crate::results::PageRecord;
use futures::future::join_all;
use tokio::sync::{Mutex, Notify};

/// Bounded pool of workers, each driving its own fetcher, over one frontier.
///
/// Visit bookkeeping and the frontier sit behind a single mutex so that two
/// workers can never both claim the same URL. Records are put back into
/// depth-first pre-order once every worker has stopped.
pub struct WorkerPool<F, E> {
    fetchers: Vec<F>,
    extractor: E,
    options: LoadOptions,
}

struct Shared<'a> {
    ctx: &'a mut CrawlContext,
    frontier: Vec<String>,
    in_flight: usize,
}

enum Next {
    Url(String),
    Wait,
    Done,
}

impl Shared<'_> {
    fn next_url(&mut self, deadline: &Deadline) -> Next {
        if deadline.expired() {
            return Next::Done;
        }
        while let Some(url) = self.frontier.pop() {
            if self.ctx.visited.mark_visited(&url) {
                self.in_flight += 1;
                return Next::Url(url);
            }
        }
        if self.in_flight == 0 {
            Next::Done
        } else {
            Next::Wait
        }
    }

    fn finish(&mut self, record: Option<PageRecord>) {
        self.in_flight -= 1;
        let Some(record) = record else {
            return;
        };
        let ctx = &*self.ctx;
        self.frontier.extend(
            record
                .links
                .iter()
                .rev()
                .filter(|link| ctx.in_scope(link) && !ctx.visited.has_visited(link))
                .cloned(),
        );
        self.ctx.result.push(record);
    }
}

impl<F: PageFetcher, E: Extractor> WorkerPool<F, E> {
    pub fn new(fetchers: Vec<F>, extractor: E, options: LoadOptions) -> Self {
        Self {
            fetchers,
            extractor,
            options,
        }
    }

    pub fn size(&self) -> usize {
        self.fetchers.len()
    }

    pub async fn crawl(&mut self, ctx: &mut CrawlContext) {
        let deadline = *ctx.deadline();
        let seed = ctx.seed().to_string();
        let num_workers = self.fetchers.len();
        ::log::info!(
            "Crawling {} with {} workers and {:.0?} budget",
            seed,
            num_workers,
            deadline.remaining()
        );

        let shared = Mutex::new(Shared {
            ctx,
            frontier: vec![seed.clone()],
            in_flight: 0,
        });
        let wake = Notify::new();
        let (shared_ref, wake_ref) = (&shared, &wake);
        let extractor = &self.extractor;
        let options = &self.options;

        let workers = self
            .fetchers
            .iter_mut()
            .enumerate()
            .map(|(worker_id, fetcher)| {
                worker_loop(
                    worker_id, fetcher, extractor, options, shared_ref, wake_ref, deadline,
                )
            });
        join_all(workers).await;

        let ctx = shared.into_inner().ctx;
        let completed = std::mem::take(&mut ctx.result);
        ctx.result = restore_preorder(&seed, completed);

        ::log::info!(
            "Crawl of {} finished: {} pages recorded, {} URLs visited in {:.2?}",
            seed,
            ctx.result.len(),
            ctx.visited.len(),
            deadline.elapsed()
        );
    }

    pub fn into_fetchers(self) -> Vec<F> {
        self.fetchers
    }
}

async fn worker_loop<F: PageFetcher, E: Extractor>(
    worker_id: usize,
    fetcher: &mut F,
    extractor: &E,
    options: &LoadOptions,
    shared: &Mutex<Shared<'_>>,
    wake: &Notify,
    deadline: Deadline,
) {
    ::log::trace!("Worker {} started", worker_id);
    let mut pages = 0usize;

    loop {
        // Registered before the frontier is inspected so a wakeup sent between
        // releasing the lock and awaiting is not lost.
        let notified = wake.notified();

        let next = shared.lock().await.next_url(&deadline);
        let url = match next {
            Next::Url(url) => url,
            Next::Wait => {
                notified.await;
                continue;
            }
            Next::Done => break,
        };

        ::log::trace!("Worker {} processing: {}", worker_id, url);
        let record = fetch_record(fetcher, extractor, &url, options).await;
        if record.is_some() {
            pages += 1;
        }

        shared.lock().await.finish(record);
        wake.notify_waiters();
    }

    // Let idle workers re-check the exit condition
    wake.notify_waiters();
    ::log::debug!("Worker {} done after {} pages", worker_id, pages);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawlers::stub::{StubExtractor, StubFetcher};
    use std::time::Duration;

    fn pool(fetcher: StubFetcher, workers: usize) -> WorkerPool<StubFetcher, StubExtractor> {
        WorkerPool::new(
            vec![fetcher; workers],
            StubExtractor,
            LoadOptions::default(),
        )
    }

    fn graph() -> StubFetcher {
        StubFetcher::new()
            .page(
                "https://s.io/",
                &["https://s.io/b", "https://s.io/c", "https://s.io/e"],
            )
            .page("https://s.io/b", &["https://s.io/d", "https://s.io/c"])
            .page("https://s.io/c", &["https://s.io/", "https://s.io/f"])
            .page("https://s.io/d", &["https://s.io/b"])
            .page("https://s.io/e", &["https://other.io/"])
            .page("https://s.io/f", &[])
            .with_delay(Duration::from_millis(50))
    }

    #[tokio::test(start_paused = true)]
    async fn test_pool_fetches_each_url_once() {
        let fetcher = graph();
        let mut pool = pool(fetcher.clone(), 3);
        let mut ctx = CrawlContext::new("https://s.io/", Duration::from_secs(60));

        pool.crawl(&mut ctx).await;

        let mut calls = fetcher.calls();
        calls.sort();
        assert_eq!(
            calls,
            vec![
                "https://s.io/",
                "https://s.io/b",
                "https://s.io/c",
                "https://s.io/d",
                "https://s.io/e",
                "https://s.io/f"
            ]
        );
        assert_eq!(fetcher.max_calls_per_url(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pool_output_matches_sequential_preorder() {
        let mut pool = pool(graph(), 4);
        let mut ctx = CrawlContext::new("https://s.io/", Duration::from_secs(60));

        pool.crawl(&mut ctx).await;

        let urls: Vec<&str> = ctx.result().iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://s.io/",
                "https://s.io/b",
                "https://s.io/d",
                "https://s.io/c",
                "https://s.io/f",
                "https://s.io/e"
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pool_survives_failures() {
        let fetcher = StubFetcher::new()
            .page("https://s.io/", &["https://s.io/bad", "https://s.io/ok"])
            .page("https://s.io/ok", &[])
            .failing("https://s.io/bad");
        let mut pool = pool(fetcher, 2);
        let mut ctx = CrawlContext::new("https://s.io/", Duration::from_secs(60));

        pool.crawl(&mut ctx).await;

        let urls: Vec<&str> = ctx.result().iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://s.io/", "https://s.io/ok"]);
        assert!(ctx.visited().has_visited("https://s.io/bad"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pool_with_expired_deadline_fetches_nothing() {
        let fetcher = graph();
        let mut pool = pool(fetcher.clone(), 2);
        let mut ctx = CrawlContext::new("https://s.io/", Duration::from_secs(1));

        tokio::time::advance(Duration::from_secs(2)).await;
        pool.crawl(&mut ctx).await;

        assert!(ctx.result().is_empty());
        assert!(fetcher.calls().is_empty());
    }
}
