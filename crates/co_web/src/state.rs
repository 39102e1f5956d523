use co_core::ArticleStore;
use co_pipeline::OptimizationManager;
use co_scrapers::ArticleIngester;
use std::sync::Arc;

pub struct AppState {
    pub store: Arc<dyn ArticleStore>,
    pub manager: Arc<OptimizationManager>,
    pub ingester: Arc<ArticleIngester>,
}
