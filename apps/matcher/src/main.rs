use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use matcher::analyzers::AnalyzerSet;
use matcher::config::{AnalyzerBackend, Config};
use matcher::db::create_pool;
use matcher::events::{DomainEventPublisher, EventKind, TracingEventHandler};
use matcher::executor::ParallelExecutor;
use matcher::llm_client::{self, LlmClient};
use matcher::matching::MatchingOrchestrator;
use matcher::models::{Document, DocumentCategory, MatchSummary};
use matcher::repository::{CandidateRepository, InMemoryRepository, PgCandidateRepository};
use matcher::scoring::ScoreAggregator;

const DB_MAX_CONNECTIONS: u32 = 10;

#[derive(Parser)]
#[command(name = "matcher")]
#[command(about = "Rank job postings for a CV, or CVs for a job posting")]
struct Cli {
    /// Processed text of the source document
    source: PathBuf,

    /// What the source document is: cv or job
    #[arg(long, default_value = "cv")]
    category: DocumentCategory,

    /// Corpus directory with cv/ and job/ sub-directories (ignored when DATABASE_URL is set)
    #[arg(long)]
    corpus: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting matcher v{}", env!("CARGO_PKG_VERSION"));

    let analyzers = match config.analyzer_backend {
        AnalyzerBackend::Keyword => AnalyzerSet::keyword(),
        AnalyzerBackend::Llm => {
            let api_key = config
                .anthropic_api_key
                .clone()
                .context("ANTHROPIC_API_KEY is required for the llm backend")?;
            let llm = LlmClient::new(api_key)?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            AnalyzerSet::llm(llm)
        }
    };
    let aggregator = Arc::new(ScoreAggregator::new(analyzers, config.weights));
    info!(weights = ?aggregator.weights(), "score aggregator ready");

    let repository = build_repository(&config, cli.corpus.as_deref()).await?;

    let publisher = Arc::new(DomainEventPublisher::new());
    let handler = Arc::new(TracingEventHandler);
    publisher.subscribe(EventKind::MatchingCompleted, handler.clone());
    publisher.subscribe(EventKind::MatchingFailed, handler);

    let executor = ParallelExecutor::new(config.max_workers).with_task_timeout(config.task_timeout);
    let orchestrator = MatchingOrchestrator::new(repository, aggregator, executor, publisher, config.limits());
    let limits = orchestrator.limits();
    info!(
        top_candidates_count = limits.top_candidates_count,
        min_match_score = limits.min_match_score,
        "orchestrator ready"
    );

    let source = read_source(&cli.source, cli.category).await?;
    let progress = |completed: usize, total: usize| info!(completed, total, "analysis progress");

    let results = orchestrator
        .match_documents_with_progress(&source, Some(&progress))
        .await?;

    let summaries: Vec<MatchSummary> = results.iter().map(|r| r.summary()).collect();
    println!("{}", serde_json::to_string_pretty(&summaries)?);
    Ok(())
}

async fn build_repository(config: &Config, corpus: Option<&Path>) -> Result<Arc<dyn CandidateRepository>> {
    if let Some(url) = &config.database_url {
        let pool = create_pool(url, DB_MAX_CONNECTIONS).await?;
        return Ok(Arc::new(PgCandidateRepository::new(pool)));
    }

    let Some(dir) = corpus else {
        bail!("either DATABASE_URL or --corpus <dir> is required");
    };
    let repository = InMemoryRepository::load_dir(dir)
        .await
        .with_context(|| format!("Failed to load corpus from {}", dir.display()))?;
    info!(documents = repository.len(), "corpus ready");
    Ok(Arc::new(repository))
}

/// The file stem becomes the document id.
async fn read_source(path: &Path, category: DocumentCategory) -> Result<Document> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .context("source path has no file name")?;
    let filename = path.file_name().and_then(|s| s.to_str()).unwrap_or(id).to_string();
    Ok(Document::new(id, category, content).with_metadata("filename", filename))
}
