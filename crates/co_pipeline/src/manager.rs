use co_core::config::{OrchestrationConfig, PipelineConfig};
use co_core::{ArticleFilter, ArticleStore, Error, ExtractedContent, Reference, Result, SourceArticle, TextGenerator};
use co_inference::Optimizer;
use co_scrapers::{ContentExtractor, ContentSource, DuckDuckGoSearch, ReferenceSelector, SearchProvider};
use serde::Serialize;
use std::sync::Arc;
use tokio::time::sleep;

use crate::logging::Logger;
use crate::publisher::Publisher;
use crate::stage::{AbortReason, PipelineOutcome, Stage};

const MIN_REFERENCES: usize = 2;
const BATCH_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRun {
    pub article_id: String,
    pub title: String,
    pub outcome: PipelineOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub runs: Vec<ArticleRun>,
}

impl BatchReport {
    pub fn published(&self) -> usize {
        self.runs.iter().filter(|r| r.outcome.is_published()).count()
    }

    pub fn aborted(&self) -> usize {
        self.runs
            .iter()
            .filter(|r| matches!(r.outcome, PipelineOutcome::Aborted { .. }))
            .count()
    }
}

/// Drives one source article at a time through search, selection,
/// extraction, rewriting and publishing.
pub struct OptimizationManager {
    store: Arc<dyn ArticleStore>,
    search: Arc<dyn SearchProvider>,
    selector: ReferenceSelector,
    extractor: Arc<dyn ContentSource>,
    optimizer: Optimizer,
    publisher: Publisher,
    config: OrchestrationConfig,
}

impl OptimizationManager {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        search: Arc<dyn SearchProvider>,
        selector: ReferenceSelector,
        extractor: Arc<dyn ContentSource>,
        optimizer: Optimizer,
        publisher: Publisher,
        config: OrchestrationConfig,
    ) -> Self {
        Self {
            store,
            search,
            selector,
            extractor,
            optimizer,
            publisher,
            config,
        }
    }

    /// Wires the production search provider and extractor.
    pub fn from_config(
        store: Arc<dyn ArticleStore>,
        model: Arc<dyn TextGenerator>,
        config: &PipelineConfig,
    ) -> Result<Self> {
        let optimizer = Optimizer::new(model, config.optimization.clone());
        let publisher = Publisher::new(store.clone(), optimizer.model_name(), config.ingestion.excerpt_chars);
        Ok(Self::new(
            store,
            Arc::new(DuckDuckGoSearch::new(config.search.clone())?),
            ReferenceSelector::new(config.selection.clone()),
            Arc::new(ContentExtractor::new(config.extraction.clone())?),
            optimizer,
            publisher,
            config.orchestration.clone(),
        ))
    }

    pub fn batch_limit(&self) -> usize {
        self.config.batch_limit
    }

    /// `Error::NotFound` for an unknown id; every pipeline failure after
    /// that is reported through the outcome.
    pub async fn optimize_by_id(&self, id: &str) -> Result<PipelineOutcome> {
        let article = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Article {} not found", id)))?;
        Ok(self.run_article(&article).await)
    }

    pub async fn run_article(&self, article: &SourceArticle) -> PipelineOutcome {
        self.run_logged(article, Logger::new()).await
    }

    async fn run_logged(&self, article: &SourceArticle, parent: Logger) -> PipelineOutcome {
        let log = parent.with_prefix(format!("[{}]", article.id));
        log.info(&format!("📰 Processing article: {}", article.title));

        let outcome = self.advance(article, &log).await;
        match &outcome {
            PipelineOutcome::Published(_) => log.info(&format!("✅ {}", outcome)),
            PipelineOutcome::AlreadyOptimized(_) => log.info(&format!("⏭️ {}", outcome)),
            PipelineOutcome::Aborted {
                reason: AbortReason::StoreFailed { .. },
                ..
            } => log.error(&format!("❌ {}", outcome)),
            PipelineOutcome::Aborted { .. } => log.warn(&format!("❌ {}", outcome)),
        }
        outcome
    }

    async fn advance(&self, article: &SourceArticle, log: &Logger) -> PipelineOutcome {
        let stage = Stage::Fetched;
        if article.is_optimized {
            return PipelineOutcome::aborted(stage, AbortReason::SourceIsOptimized);
        }
        match self.store.find_optimized_for(&article.id).await {
            Ok(Some(existing)) => return PipelineOutcome::AlreadyOptimized(existing),
            Ok(None) => {}
            Err(e) => return PipelineOutcome::aborted(stage, store_failed(e)),
        }

        let stage = Stage::Searching;
        log.info(&format!("🔍 {}: \"{}\"", stage, article.title));
        let candidates = self.search.search(&article.title).await;

        let stage = Stage::Selecting;
        let selected = self.selector.select_top(&candidates);
        log.info(&format!("🎯 {}: {} of {} candidates", stage, selected.len(), candidates.len()));
        if selected.len() < MIN_REFERENCES {
            return PipelineOutcome::aborted(stage, AbortReason::NotEnoughReferences { found: selected.len() });
        }

        let stage = Stage::Extracting;
        let extracted = self.extract_all(&selected, log).await;
        if extracted.is_empty() {
            return PipelineOutcome::aborted(stage, AbortReason::NoExtractions { attempted: selected.len() });
        }

        let stage = Stage::Optimizing;
        log.info(&format!("🤖 {} with {} references", stage, extracted.len()));
        let rewritten = match self.optimizer.optimize(article, &extracted).await {
            Ok(rewritten) => rewritten,
            Err(e) => {
                return PipelineOutcome::aborted(stage, AbortReason::ModelFailed { message: e.to_string() });
            }
        };
        if rewritten.trim().is_empty() {
            log.warn("Model returned an empty body");
        }

        let stage = Stage::Publishing;
        let references: Vec<Reference> = extracted.iter().map(Reference::from).collect();
        match self.publisher.publish(article, &rewritten, &references).await {
            Ok(published) => {
                log.debug(&format!("🏁 {}", Stage::Done));
                PipelineOutcome::Published(published)
            }
            Err(e) => PipelineOutcome::aborted(stage, store_failed(e)),
        }
    }

    /// Sequential, with the politeness delay between fetches. Individual
    /// failures are dropped.
    async fn extract_all(&self, urls: &[String], log: &Logger) -> Vec<ExtractedContent> {
        let mut extracted = Vec::new();
        for (i, url) in urls.iter().enumerate() {
            if i > 0 {
                self.pause().await;
            }
            match self.extractor.extract(url).await {
                Some(content) => extracted.push(content),
                None => log.warn(&format!("Skipping reference {}", url)),
            }
        }
        extracted
    }

    async fn pause(&self) {
        let delay = self.config.politeness_delay();
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }

    /// Optimizes up to `limit` pending articles (the configured batch limit
    /// when `None`), newest first. Articles that already have a derivative
    /// are passed over without counting toward the limit. A failed lookup
    /// aborts that article only; a failed listing ends the batch with the
    /// runs completed so far.
    pub async fn run_batch(&self, limit: Option<usize>) -> Result<BatchReport> {
        let limit = limit.unwrap_or(self.config.batch_limit);
        let log = Logger::new().with_prefix("[batch]".to_string());
        let mut report = BatchReport::default();
        let mut page = 1;

        'pages: while report.runs.len() < limit {
            let pending = match self.store.list(&ArticleFilter::pending(), page, BATCH_PAGE_SIZE).await {
                Ok(pending) => pending,
                Err(e) if report.runs.is_empty() => return Err(e),
                Err(e) => {
                    log.error(&format!("Listing pending articles failed, stopping early: {}", e));
                    break;
                }
            };

            for article in &pending.items {
                if report.runs.len() >= limit {
                    break 'pages;
                }
                let outcome = match self.store.find_optimized_for(&article.id).await {
                    Ok(Some(_)) => {
                        log.debug(&format!("{} already optimized", article.id));
                        continue;
                    }
                    Ok(None) => {
                        if !report.runs.is_empty() {
                            self.pause().await;
                        }
                        self.run_logged(article, log.clone()).await
                    }
                    Err(e) => {
                        let outcome = PipelineOutcome::aborted(Stage::Fetched, store_failed(e));
                        log.error(&format!("[{}] ❌ {}", article.id, outcome));
                        outcome
                    }
                };
                report.runs.push(ArticleRun {
                    article_id: article.id.clone(),
                    title: article.title.clone(),
                    outcome,
                });
            }
            if page >= pending.pages {
                break;
            }
            page += 1;
        }

        log.info(&format!(
            "📊 Batch finished: {} published, {} aborted, {} processed",
            report.published(),
            report.aborted(),
            report.runs.len()
        ));
        Ok(report)
    }
}

fn store_failed(error: Error) -> AbortReason {
    AbortReason::StoreFailed {
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use co_core::config::{SearchConfig, SelectionConfig};
    use co_core::{ArticlePatch, GenerationRequest, NewArticle, Page};
    use co_storage::MemoryStorage;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct MockSearch {
        results: Vec<String>,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SearchProvider for MockSearch {
        async fn search(&self, query: &str) -> Vec<String> {
            self.queries.lock().unwrap().push(query.to_string());
            self.results.clone()
        }
    }

    #[derive(Default)]
    struct MockExtractor {
        pages: HashMap<String, ExtractedContent>,
        calls: Mutex<Vec<String>>,
    }

    impl MockExtractor {
        fn serving(urls: &[&str]) -> Self {
            let pages = urls
                .iter()
                .enumerate()
                .map(|(i, url)| {
                    let content = ExtractedContent {
                        title: format!("Reference {}", i + 1),
                        url: url.to_string(),
                        content: format!("Reference body {}", i + 1),
                    };
                    (url.to_string(), content)
                })
                .collect();
            Self {
                pages,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ContentSource for MockExtractor {
        async fn extract(&self, url: &str) -> Option<ExtractedContent> {
            self.calls.lock().unwrap().push(url.to_string());
            self.pages.get(url).cloned()
        }
    }

    struct MockModel {
        fail: bool,
        calls: Mutex<Vec<GenerationRequest>>,
    }

    impl MockModel {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for MockModel {
        fn name(&self) -> &str {
            "mock-model"
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            self.calls.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(Error::Inference("429 rate limited".to_string()));
            }
            Ok("## Chatbot Pricing\n\n- Plans compared".to_string())
        }
    }

    /// Wraps the memory store and injects failures: every `create`, or the
    /// derivative lookup for one article.
    #[derive(Default)]
    struct FaultyStore {
        inner: MemoryStorage,
        fail_create: bool,
        fail_lookup_for: Option<String>,
    }

    #[async_trait]
    impl ArticleStore for FaultyStore {
        async fn create(&self, article: NewArticle) -> Result<SourceArticle> {
            if self.fail_create {
                return Err(Error::Storage("disk full".to_string()));
            }
            self.inner.create(article).await
        }
        async fn get(&self, id: &str) -> Result<Option<SourceArticle>> {
            self.inner.get(id).await
        }
        async fn find_by_url(&self, url: &str) -> Result<Option<SourceArticle>> {
            self.inner.find_by_url(url).await
        }
        async fn find_optimized_for(&self, original_id: &str) -> Result<Option<SourceArticle>> {
            if self.fail_lookup_for.as_deref() == Some(original_id) {
                return Err(Error::Storage("lookup timed out".to_string()));
            }
            self.inner.find_optimized_for(original_id).await
        }
        async fn list(&self, filter: &ArticleFilter, page: usize, limit: usize) -> Result<Page<SourceArticle>> {
            self.inner.list(filter, page, limit).await
        }
        async fn update(&self, id: &str, patch: ArticlePatch) -> Result<Option<SourceArticle>> {
            self.inner.update(id, patch).await
        }
        async fn delete(&self, id: &str) -> Result<bool> {
            self.inner.delete(id).await
        }
    }

    const SEARCH_RESULTS: [&str; 5] = [
        "https://shop.example.net/cart",
        "https://vendor.example.net/chatbot-pricing-guide",
        "https://example.net/pricing",
        "https://help.example.net/faq",
        "https://reviews.example.net/ultimate-guide",
    ];
    const GUIDE_URLS: [&str; 2] = [SEARCH_RESULTS[1], SEARCH_RESULTS[4]];

    fn orchestration() -> OrchestrationConfig {
        OrchestrationConfig {
            politeness_delay_ms: 0,
            batch_limit: 1,
        }
    }

    fn manager(
        store: Arc<dyn ArticleStore>,
        search: Arc<dyn SearchProvider>,
        extractor: Arc<dyn ContentSource>,
        model: Arc<dyn TextGenerator>,
    ) -> OptimizationManager {
        manager_with(store, search, extractor, model, orchestration())
    }

    fn manager_with(
        store: Arc<dyn ArticleStore>,
        search: Arc<dyn SearchProvider>,
        extractor: Arc<dyn ContentSource>,
        model: Arc<dyn TextGenerator>,
        config: OrchestrationConfig,
    ) -> OptimizationManager {
        let optimizer = Optimizer::new(model, Default::default());
        let publisher = Publisher::new(store.clone(), optimizer.model_name(), 200);
        OptimizationManager::new(
            store,
            search,
            ReferenceSelector::new(SelectionConfig::default()),
            extractor,
            optimizer,
            publisher,
            config,
        )
    }

    fn search_returning(urls: &[&str]) -> Arc<MockSearch> {
        Arc::new(MockSearch {
            results: urls.iter().map(|u| u.to_string()).collect(),
            queries: Mutex::new(Vec::new()),
        })
    }

    async fn seed(store: &Arc<dyn ArticleStore>, title: &str, url: &str) -> SourceArticle {
        store
            .create(NewArticle {
                title: title.to_string(),
                url: url.to_string(),
                content: format!("{} original body", title),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_chatbot_pricing_guide_scenario() {
        let store: Arc<dyn ArticleStore> = Arc::new(MemoryStorage::default());
        let original = seed(&store, "Chatbot Pricing Guide", "https://blog.test/pricing").await;
        let search = search_returning(&SEARCH_RESULTS);
        let extractor = Arc::new(MockExtractor::serving(&GUIDE_URLS));
        let model = MockModel::new(false);
        let manager = manager(store.clone(), search.clone(), extractor.clone(), model.clone());

        let outcome = manager.optimize_by_id(&original.id).await.unwrap();
        let PipelineOutcome::Published(published) = outcome else {
            panic!("expected a published article, got {:?}", outcome);
        };

        assert_eq!(search.queries.lock().unwrap().as_slice(), ["Chatbot Pricing Guide"]);
        assert_eq!(extractor.calls.lock().unwrap().as_slice(), GUIDE_URLS);
        assert!(published.is_optimized);
        assert_eq!(published.references.len(), 2);
        assert!(published.content.starts_with("## Chatbot Pricing\n\n- Plans compared"));
        assert!(published.content.contains("## References"));
        assert!(published.content.contains(&format!("1. [Reference 1]({})", GUIDE_URLS[0])));
        assert!(published.content.contains(&format!("2. [Reference 2]({})", GUIDE_URLS[1])));
        assert!(published
            .content
            .ends_with("*Original article: [Chatbot Pricing Guide](https://blog.test/pricing)*"));
        assert_eq!(published.metadata["llmModel"], serde_json::json!("mock-model"));

        let prompt = &model.calls.lock().unwrap()[0].prompt;
        assert!(prompt.contains("Reference body 1"));
        assert!(prompt.contains("Reference body 2"));
    }

    #[tokio::test]
    async fn test_second_run_is_a_no_op() {
        let store: Arc<dyn ArticleStore> = Arc::new(MemoryStorage::default());
        let original = seed(&store, "Chatbot Pricing Guide", "https://blog.test/pricing").await;
        let model = MockModel::new(false);
        let manager = manager(
            store.clone(),
            search_returning(&SEARCH_RESULTS),
            Arc::new(MockExtractor::serving(&GUIDE_URLS)),
            model.clone(),
        );

        let first = manager.optimize_by_id(&original.id).await.unwrap();
        let second = manager.optimize_by_id(&original.id).await.unwrap();

        assert!(first.is_published());
        assert!(matches!(second, PipelineOutcome::AlreadyOptimized(_)));
        assert_eq!(first.article().map(|a| &a.id), second.article().map(|a| &a.id));
        assert_eq!(model.calls.lock().unwrap().len(), 1);

        let derived = ArticleFilter {
            original_article_id: Some(original.id.clone()),
            ..Default::default()
        };
        assert_eq!(store.list(&derived, 1, 10).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_search_fallback_feeds_selector() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>nothing</body></html>"))
            .mount(&server)
            .await;
        let search_config = SearchConfig {
            endpoint: format!("{}/html/?q=", server.uri()),
            ..Default::default()
        };
        let fallback = search_config.fallback_urls.clone();
        let fallback_refs: Vec<&str> = fallback.iter().map(String::as_str).collect();

        let store: Arc<dyn ArticleStore> = Arc::new(MemoryStorage::default());
        let original = seed(&store, "What is a chatbot", "https://blog.test/what").await;
        let extractor = Arc::new(MockExtractor::serving(&fallback_refs));
        let manager = manager(
            store,
            Arc::new(DuckDuckGoSearch::new(search_config).unwrap()),
            extractor.clone(),
            MockModel::new(false),
        );

        let outcome = manager.run_article(&original).await;
        assert!(outcome.is_published());
        assert_eq!(extractor.calls.lock().unwrap().as_slice(), fallback.as_slice());
    }

    #[tokio::test]
    async fn test_one_failed_extraction_still_publishes() {
        let store: Arc<dyn ArticleStore> = Arc::new(MemoryStorage::default());
        let original = seed(&store, "Chatbot Pricing Guide", "https://blog.test/pricing").await;
        let model = MockModel::new(false);
        let manager = manager(
            store,
            search_returning(&SEARCH_RESULTS),
            Arc::new(MockExtractor::serving(&GUIDE_URLS[1..])),
            model.clone(),
        );

        let outcome = manager.run_article(&original).await;
        let published = outcome.article().unwrap();
        assert_eq!(published.references.len(), 1);
        assert_eq!(published.references[0].url, GUIDE_URLS[1]);
        assert!(published.content.contains("1. [Reference 1]"));
        assert!(!published.content.contains("2. ["));
        assert!(model.calls.lock().unwrap()[0].prompt.contains("Title: N/A"));
    }

    #[tokio::test]
    async fn test_too_few_search_results_aborts_before_extraction() {
        let store: Arc<dyn ArticleStore> = Arc::new(MemoryStorage::default());
        let original = seed(&store, "Niche topic", "https://blog.test/niche").await;
        let extractor = Arc::new(MockExtractor::default());
        let manager = manager(
            store,
            search_returning(&["https://only.example.net/guide"]),
            extractor.clone(),
            MockModel::new(false),
        );

        let outcome = manager.run_article(&original).await;
        assert_eq!(
            outcome,
            PipelineOutcome::aborted(Stage::Selecting, AbortReason::NotEnoughReferences { found: 1 })
        );
        assert!(extractor.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_extractions_aborts_before_model() {
        let store: Arc<dyn ArticleStore> = Arc::new(MemoryStorage::default());
        let original = seed(&store, "Chatbot Pricing Guide", "https://blog.test/pricing").await;
        let model = MockModel::new(false);
        let manager = manager(
            store,
            search_returning(&SEARCH_RESULTS),
            Arc::new(MockExtractor::default()),
            model.clone(),
        );

        let outcome = manager.run_article(&original).await;
        assert_eq!(
            outcome,
            PipelineOutcome::aborted(Stage::Extracting, AbortReason::NoExtractions { attempted: 2 })
        );
        assert!(model.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_aborts_without_publishing() {
        let store: Arc<dyn ArticleStore> = Arc::new(MemoryStorage::default());
        let original = seed(&store, "Chatbot Pricing Guide", "https://blog.test/pricing").await;
        let manager = manager(
            store.clone(),
            search_returning(&SEARCH_RESULTS),
            Arc::new(MockExtractor::serving(&GUIDE_URLS)),
            MockModel::new(true),
        );

        match manager.run_article(&original).await {
            PipelineOutcome::Aborted {
                stage: Stage::Optimizing,
                reason: AbortReason::ModelFailed { message },
            } => assert!(message.contains("429")),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(store.find_optimized_for(&original.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_failure_aborts_at_publishing() {
        let memory = MemoryStorage::default();
        let original = memory
            .create(NewArticle {
                title: "Chatbot Pricing Guide".to_string(),
                url: "https://blog.test/pricing".to_string(),
                content: "body".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let store: Arc<dyn ArticleStore> = Arc::new(FaultyStore {
            inner: memory,
            fail_create: true,
            ..Default::default()
        });
        let manager = manager(
            store,
            search_returning(&SEARCH_RESULTS),
            Arc::new(MockExtractor::serving(&GUIDE_URLS)),
            MockModel::new(false),
        );

        let outcome = manager.run_article(&original).await;
        assert!(matches!(
            outcome,
            PipelineOutcome::Aborted {
                stage: Stage::Publishing,
                reason: AbortReason::StoreFailed { .. }
            }
        ));
    }

    #[tokio::test]
    async fn test_optimized_source_is_rejected() {
        let store: Arc<dyn ArticleStore> = Arc::new(MemoryStorage::default());
        let original = seed(&store, "Chatbot Pricing Guide", "https://blog.test/pricing").await;
        let manager = manager(
            store,
            search_returning(&SEARCH_RESULTS),
            Arc::new(MockExtractor::serving(&GUIDE_URLS)),
            MockModel::new(false),
        );
        let derived = manager.run_article(&original).await.article().cloned().unwrap();

        assert_eq!(
            manager.run_article(&derived).await,
            PipelineOutcome::aborted(Stage::Fetched, AbortReason::SourceIsOptimized)
        );
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let store: Arc<dyn ArticleStore> = Arc::new(MemoryStorage::default());
        let manager = manager(
            store,
            search_returning(&SEARCH_RESULTS),
            Arc::new(MockExtractor::default()),
            MockModel::new(false),
        );
        assert!(matches!(manager.optimize_by_id("missing").await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_batch_respects_limit_and_skips_optimized() {
        let store: Arc<dyn ArticleStore> = Arc::new(MemoryStorage::default());
        let first = seed(&store, "First guide", "https://blog.test/1").await;
        seed(&store, "Second guide", "https://blog.test/2").await;
        seed(&store, "Third guide", "https://blog.test/3").await;
        let manager = manager(
            store.clone(),
            search_returning(&SEARCH_RESULTS),
            Arc::new(MockExtractor::serving(&GUIDE_URLS)),
            MockModel::new(false),
        );

        let report = manager.run_batch(Some(2)).await.unwrap();
        assert_eq!(report.runs.len(), 2);
        assert_eq!(report.published(), 2);

        let report = manager.run_batch(None).await.unwrap();
        assert_eq!(report.runs.len(), 1);
        assert_eq!(report.runs[0].article_id, first.id);

        let report = manager.run_batch(Some(5)).await.unwrap();
        assert!(report.runs.is_empty());
    }

    #[tokio::test]
    async fn test_batch_continues_after_failures() {
        let store: Arc<dyn ArticleStore> = Arc::new(MemoryStorage::default());
        seed(&store, "First guide", "https://blog.test/1").await;
        seed(&store, "Second guide", "https://blog.test/2").await;
        let manager = manager(
            store,
            search_returning(&SEARCH_RESULTS),
            Arc::new(MockExtractor::serving(&GUIDE_URLS)),
            MockModel::new(true),
        );

        let report = manager.run_batch(Some(10)).await.unwrap();
        assert_eq!(report.runs.len(), 2);
        assert_eq!(report.aborted(), 2);
    }

    #[tokio::test]
    async fn test_batch_records_lookup_failure_and_keeps_completed_runs() {
        let memory = MemoryStorage::default();
        let older = memory
            .create(NewArticle {
                title: "Older guide".to_string(),
                url: "https://blog.test/older".to_string(),
                content: "body".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let newer = memory
            .create(NewArticle {
                title: "Newer guide".to_string(),
                url: "https://blog.test/newer".to_string(),
                content: "body".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let store: Arc<dyn ArticleStore> = Arc::new(FaultyStore {
            inner: memory,
            fail_lookup_for: Some(older.id.clone()),
            ..Default::default()
        });
        let manager = manager(
            store.clone(),
            search_returning(&SEARCH_RESULTS),
            Arc::new(MockExtractor::serving(&GUIDE_URLS)),
            MockModel::new(false),
        );

        let report = manager.run_batch(Some(10)).await.unwrap();
        assert_eq!(report.runs.len(), 2);
        assert_eq!(report.runs[0].article_id, newer.id);
        assert!(report.runs[0].outcome.is_published());
        assert_eq!(report.runs[1].article_id, older.id);
        assert!(matches!(
            &report.runs[1].outcome,
            PipelineOutcome::Aborted {
                stage: Stage::Fetched,
                reason: AbortReason::StoreFailed { message },
            } if message.contains("lookup timed out")
        ));
        assert!(store.find_optimized_for(&newer.id).await.unwrap().is_some());
    }

    fn delayed() -> OrchestrationConfig {
        OrchestrationConfig {
            politeness_delay_ms: 1000,
            batch_limit: 1,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_reference_fetches() {
        let store: Arc<dyn ArticleStore> = Arc::new(MemoryStorage::default());
        let original = seed(&store, "Chatbot Pricing Guide", "https://blog.test/pricing").await;
        let manager = manager_with(
            store,
            search_returning(&SEARCH_RESULTS),
            Arc::new(MockExtractor::serving(&GUIDE_URLS)),
            MockModel::new(false),
            delayed(),
        );

        let started = tokio::time::Instant::now();
        assert!(manager.run_article(&original).await.is_published());
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(1), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(2), "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_batch_articles() {
        let store: Arc<dyn ArticleStore> = Arc::new(MemoryStorage::default());
        for i in 0..3 {
            seed(&store, &format!("Guide {}", i), &format!("https://blog.test/{}", i)).await;
        }
        let manager = manager_with(
            store,
            search_returning(&SEARCH_RESULTS),
            Arc::new(MockExtractor::serving(&GUIDE_URLS)),
            MockModel::new(false),
            delayed(),
        );

        let started = tokio::time::Instant::now();
        let report = manager.run_batch(Some(3)).await.unwrap();
        assert_eq!(report.published(), 3);
        // One pause inside each article's extraction, one between articles.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(5), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(6), "elapsed {:?}", elapsed);
    }
}
