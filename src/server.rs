//! HTTP endpoint running a typed crawl per request.
//!
//! `POST /crawl` takes `{url, websiteType, timeLimit, limit, offset}` and
//! answers with the same document a typed CLI crawl writes to disk. Failures
//! come back as `{error, details}` with a 400 for bad input and a 500
//! otherwise.

use crate::SiteCrawl;
use crate::config::CrawlConfig;
use crate::error::CrawlError;
use crate::output::TypedOutput;
use crate::parsers::typed::{WebsiteType, extract_from_pages};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlRequest {
    pub url: Option<String>,
    pub website_type: Option<String>,
    pub time_limit: Option<u64>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
}

/// A crawl error rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub CrawlError);

impl From<CrawlError> for ApiError {
    fn from(e: CrawlError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self.0 {
            CrawlError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "Invalid input"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Crawl failed"),
        };
        let body = ErrorBody {
            error: error.to_string(),
            details: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Settings shared by every request; request fields override seed and budget
pub struct ServerState {
    defaults: CrawlConfig,
}

impl ServerState {
    pub fn new(defaults: CrawlConfig) -> Self {
        Self { defaults }
    }
}

/// A validated request, ready to crawl
#[derive(Debug)]
struct TypedCrawl {
    config: CrawlConfig,
    website_type: WebsiteType,
    limit: usize,
    offset: usize,
}

impl CrawlRequest {
    fn into_crawl(self, defaults: &CrawlConfig) -> Result<TypedCrawl, CrawlError> {
        let url = self
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| CrawlError::invalid("url is required"))?;
        let website_type: WebsiteType = self
            .website_type
            .ok_or_else(|| CrawlError::invalid("websiteType is required"))?
            .parse()?;
        let time_limit = match self.time_limit {
            Some(secs) if secs > 0 => secs,
            _ => return Err(CrawlError::invalid("timeLimit must be a positive integer")),
        };
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 {
            return Err(CrawlError::invalid("limit must be at least 1"));
        }

        let mut config = defaults.clone();
        config.seed_url = url;
        config.time_limit_secs = time_limit;
        config.validate()?;

        Ok(TypedCrawl {
            config,
            website_type,
            limit,
            offset: self.offset.unwrap_or(0),
        })
    }
}

pub fn router(defaults: CrawlConfig) -> Router {
    Router::new()
        .route("/crawl", post(crawl))
        .with_state(Arc::new(ServerState::new(defaults)))
}

/// Serves the crawl endpoint on `addr` until the process is stopped
pub async fn serve(addr: &str, defaults: CrawlConfig) -> Result<(), CrawlError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    ::log::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(defaults)).await?;
    Ok(())
}

async fn crawl(
    State(state): State<Arc<ServerState>>,
    request: Result<Json<CrawlRequest>, JsonRejection>,
) -> Result<Json<TypedOutput>, ApiError> {
    let Json(request) = request.map_err(|e| CrawlError::invalid(e.body_text()))?;
    let job = request.into_crawl(&state.defaults)?;

    ::log::info!(
        "Typed {} crawl of {} requested with a {} second budget",
        job.website_type,
        job.config.seed_url,
        job.config.time_limit_secs
    );

    let seed_url = job.config.seed_url.clone();
    let result = SiteCrawl::new(&seed_url).with_config(job.config).run().await?;
    let records = extract_from_pages(job.website_type, &result);

    Ok(Json(TypedOutput::paginate(
        job.website_type,
        records,
        job.limit,
        job.offset,
    )))
}
