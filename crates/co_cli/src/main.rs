mod duration;

use anyhow::Context;
use clap::Parser;
use co_core::config::PipelineConfig;
use co_core::text::char_len;
use co_core::{ArticleFilter, ArticleStore, Error, NewArticle, TextGenerator};
use co_pipeline::{init_logging, OptimizationManager, PipelineOutcome};
use co_scrapers::extract::HttpFetcher;
use co_scrapers::{ArticleIngester, ContentExtractor, ContentSource, DuckDuckGoSearch, SearchProvider};
use co_web::AppState;
use duration::HumanDuration;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Rewrites stored articles using top-ranking web content as reference", long_about = None)]
pub struct Cli {
    /// Storage backend: memory or sqlite
    #[arg(long, env = "CO_STORAGE", default_value = "memory")]
    storage: String,
    /// SQLite URL or file path
    #[arg(long, env = "CO_DATABASE_URL")]
    database_url: Option<String>,
    #[arg(
        long,
        env = "CO_MODEL",
        default_value = "groq",
        help = "Text generation provider. Available: groq (default), openai, dummy"
    )]
    model: String,
    /// Override the provider's default model id
    #[arg(long, env = "CO_MODEL_NAME")]
    model_name: Option<String>,
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Override the provider's API base URL
    #[arg(long, env = "CO_MODEL_BASE_URL")]
    base_url: Option<String>,
    /// Pipeline config file (JSON); omitted sections keep their defaults
    #[arg(long, env = "CO_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the REST API
    Serve {
        #[arg(long, env = "CO_ADDR", default_value = "127.0.0.1:5000")]
        addr: SocketAddr,
    },
    /// Optimize one article, or a batch of pending ones
    Optimize {
        /// Article id; without it the newest pending articles are processed
        #[arg(long)]
        id: Option<String>,
        /// Batch size (defaults to the configured batch limit)
        #[arg(long, conflicts_with = "id")]
        limit: Option<usize>,
        /// Run batches periodically with the given interval (e.g. 1h, 30m, 1h15m30s)
        #[arg(long, conflicts_with = "id")]
        interval: Option<HumanDuration>,
    },
    /// Scrape source articles into the store (configured seed URLs when none given)
    Ingest { urls: Vec<String> },
    /// Show the reference candidates a search would produce
    Search { query: String },
    /// Extract readable content from a single page
    Extract { url: String },
    /// List stored articles
    List {
        /// Only optimized derivatives
        #[arg(long)]
        optimized: bool,
        #[arg(long, default_value = "1")]
        page: usize,
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

/// Write, read back and delete a probe record.
async fn check_storage(store: &Arc<dyn ArticleStore>, storage_type: &str) -> co_core::Result<()> {
    let probe = NewArticle {
        title: "Storage health check".to_string(),
        url: format!("https://health-check.invalid/{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()),
        content: "probe".to_string(),
        ..Default::default()
    };

    let stored = store.create(probe).await?;
    if store.get(&stored.id).await?.is_none() {
        return Err(Error::Storage("Failed to read back the probe article".to_string()));
    }
    if let Err(e) = store.delete(&stored.id).await {
        info!("⚠️ Failed to clean up probe article: {}", e);
    }

    info!("🏦 Storage backend initialized successfully (using {})", storage_type);
    Ok(())
}

async fn open_storage(cli: &Cli) -> anyhow::Result<Arc<dyn ArticleStore>> {
    let store = co_storage::create_storage(cli.storage.as_str(), cli.database_url.as_deref())
        .await
        .with_context(|| format!("Failed to open {} storage", cli.storage))?;
    info!("💾 Checking storage connection...");
    check_storage(&store, cli.storage.as_str())
        .await
        .context("Storage health check failed")?;
    Ok(store)
}

async fn open_model(cli: &Cli) -> anyhow::Result<Arc<dyn TextGenerator>> {
    let api_key = match cli.model.as_str() {
        "openai" => cli.api_key.clone().or_else(|| std::env::var("OPENAI_API_KEY").ok()),
        _ => cli.api_key.clone(),
    };
    let config = co_inference::Config {
        provider: cli.model.clone(),
        api_key,
        model_name: cli.model_name.clone(),
        base_url: cli.base_url.clone(),
    };
    let model = co_inference::create_model(Some(config))
        .await
        .context("Failed to initialize the text generation model")?;
    info!("🧠 Inference model initialized successfully (using {})", model.name());
    Ok(model)
}

fn load_config(cli: &Cli) -> anyhow::Result<PipelineConfig> {
    match &cli.config {
        Some(path) => Ok(PipelineConfig::from_file(path)?),
        None => Ok(PipelineConfig::default()),
    }
}

fn ingester(store: Arc<dyn ArticleStore>, config: &PipelineConfig) -> co_core::Result<ArticleIngester> {
    ArticleIngester::new(
        store,
        Arc::new(HttpFetcher::new(&config.extraction)?),
        &config.extraction,
        config.ingestion.clone(),
        config.orchestration.politeness_delay(),
    )
}

fn print_outcome(outcome: &PipelineOutcome) {
    match outcome {
        PipelineOutcome::Published(article) => {
            println!("✅ Published \"{}\"", article.title);
            println!("   id:  {}", article.id);
            println!("   url: {}", article.url);
            for reference in &article.references {
                println!("   ref: {} ({})", reference.title, reference.url);
            }
        }
        other => println!("{}", other),
    }
}

async fn run_batches(manager: &OptimizationManager, limit: Option<usize>, interval: Option<Duration>) -> anyhow::Result<()> {
    loop {
        info!("Starting optimization batch");
        match manager.run_batch(limit).await {
            Ok(report) => {
                for run in &report.runs {
                    print!("{}: ", run.title);
                    print_outcome(&run.outcome);
                }
                println!(
                    "{} processed, {} published, {} aborted",
                    report.runs.len(),
                    report.published(),
                    report.aborted()
                );
            }
            Err(e) if interval.is_some() => error!("Batch failed: {}", e),
            Err(e) => return Err(e.into()),
        }

        let Some(interval) = interval else {
            return Ok(());
        };
        info!("Waiting {}s before next batch", interval.as_secs());
        tokio::time::sleep(interval).await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging("info");
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Serve { addr } => {
            let store = open_storage(&cli).await?;
            let model = open_model(&cli).await?;
            let manager = OptimizationManager::from_config(store.clone(), model, &config)?;
            let state = AppState {
                store: store.clone(),
                manager: Arc::new(manager),
                ingester: Arc::new(ingester(store, &config)?),
            };
            co_web::serve(*addr, state).await?;
        }
        Commands::Optimize { id, limit, interval } => {
            let store = open_storage(&cli).await?;
            let model = open_model(&cli).await?;
            let manager = OptimizationManager::from_config(store, model, &config)?;
            match id {
                Some(id) => {
                    let outcome = manager.optimize_by_id(id).await?;
                    print_outcome(&outcome);
                    if matches!(outcome, PipelineOutcome::Aborted { .. }) {
                        std::process::exit(1);
                    }
                }
                None => run_batches(&manager, *limit, interval.map(|i| i.0)).await?,
            }
        }
        Commands::Ingest { urls } => {
            let store = open_storage(&cli).await?;
            let ingester = ingester(store, &config)?;
            let urls = if urls.is_empty() {
                ingester.seed_urls().to_vec()
            } else {
                urls.clone()
            };
            let report = ingester.ingest(&urls).await;
            for article in &report.created {
                println!("➕ {} ({})", article.title, article.id);
            }
            for url in &report.skipped {
                println!("⏭️ {} (already stored)", url);
            }
            for failure in &report.failed {
                println!("❌ {}: {}", failure.url, failure.error);
            }
        }
        Commands::Search { query } => {
            let search = DuckDuckGoSearch::new(config.search.clone())?;
            for (i, url) in search.search(query).await.iter().enumerate() {
                println!("{}. {}", i + 1, url);
            }
        }
        Commands::Extract { url } => {
            let extractor = ContentExtractor::new(config.extraction.clone())?;
            let Some(content) = extractor.extract(url).await else {
                anyhow::bail!("Failed to extract content from {}", url);
            };
            println!("# {}\n", content.title);
            println!("{}", content.content);
            println!("\n({} characters from {})", char_len(&content.content), content.url);
        }
        Commands::List { optimized, page, limit } => {
            let store = open_storage(&cli).await?;
            let filter = ArticleFilter {
                is_optimized: optimized.then_some(true),
                ..Default::default()
            };
            let listing = store.list(&filter, *page, *limit).await?;
            for article in &listing.items {
                let marker = if article.is_optimized { "✨" } else { "📰" };
                println!("{} {}  {}  {}", marker, article.id, article.title, article.url);
            }
            println!("page {}/{} ({} total)", listing.page, listing.pages.max(1), listing.total);
        }
    }

    Ok(())
}
