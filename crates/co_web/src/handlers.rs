use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use co_core::{ArticleFilter, ArticlePatch, NewArticle, SourceArticle};
use co_pipeline::{AbortReason, PipelineOutcome};
use co_scrapers::IngestReport;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::response::{created, ok, ApiError, ApiResult, Envelope, Pagination};
use crate::AppState;

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;
const MAX_PAGE: usize = 1_000_000;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub is_optimized: Option<bool>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub urls: Vec<String>,
}

fn not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("Article {} not found", id))
}

pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "Content Optimizer API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "articles": "/api/articles",
            "scrape": "/api/articles/scrape",
            "optimize": "/api/articles/:id/optimize"
        }
    }))
}

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<SourceArticle>> {
    let filter = ArticleFilter {
        is_optimized: params.is_optimized,
        ..Default::default()
    };
    let page = params.page.unwrap_or(1).clamp(1, MAX_PAGE);
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let listing = state.store.list(&filter, page, limit).await?;
    let pagination = Pagination::from(&listing);
    ok(Envelope::data(listing.items).with_pagination(pagination))
}

pub async fn create_article(
    State(state): State<Arc<AppState>>,
    Json(article): Json<NewArticle>,
) -> ApiResult<SourceArticle> {
    let stored = state.store.create(article).await?;
    created(Envelope::data(stored))
}

pub async fn get_article(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<SourceArticle> {
    let article = state.store.get(&id).await?.ok_or_else(|| not_found(&id))?;
    ok(Envelope::data(article))
}

pub async fn update_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<ArticlePatch>,
) -> ApiResult<SourceArticle> {
    let article = state.store.update(&id, patch).await?.ok_or_else(|| not_found(&id))?;
    ok(Envelope::data(article).with_message("Article updated successfully"))
}

pub async fn delete_article(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<()> {
    if !state.store.delete(&id).await? {
        return Err(not_found(&id));
    }
    ok(Envelope::<()>::message("Article deleted successfully"))
}

pub async fn optimize_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<SourceArticle> {
    let article = state.store.get(&id).await?.ok_or_else(|| not_found(&id))?;
    if article.is_optimized {
        return Err(ApiError::BadRequest("Article is already optimized".to_string()));
    }

    match state.manager.run_article(&article).await {
        PipelineOutcome::Published(published) => {
            created(Envelope::data(published).with_message("Article optimized successfully"))
        }
        PipelineOutcome::AlreadyOptimized(existing) => Err(ApiError::Conflict {
            message: "Article has already been optimized".to_string(),
            existing: Box::new(existing),
        }),
        PipelineOutcome::Aborted {
            reason: AbortReason::SourceIsOptimized,
            ..
        } => Err(ApiError::BadRequest("Article is already optimized".to_string())),
        PipelineOutcome::Aborted { stage, reason } => Err(ApiError::Internal(format!(
            "Optimization failed while {}: {}",
            stage, reason
        ))),
    }
}

/// Empty body ingests the configured seed URLs.
pub async fn scrape_articles(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult<IngestReport> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ScrapeRequest::default()
    } else {
        serde_json::from_slice::<ScrapeRequest>(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid scrape request: {}", e)))?
    };
    let urls = if request.urls.is_empty() {
        state.ingester.seed_urls().to_vec()
    } else {
        request.urls
    };

    let report = state.ingester.ingest(&urls).await;
    let message = format!("Scraped and stored {} articles", report.created.len());
    created(Envelope::data(report).with_message(message))
}
