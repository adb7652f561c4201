use anyhow::Context;
use splits_indexer::{
    config::Config, db::init_db, EventSource, Indexer, JsonlEventSource, Repository,
    UnavailableChainReader,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        eprintln!("Indexer error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let pool = init_db(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    let repo = Repository::new(pool);

    let (store, watermark) = repo
        .load_snapshot()
        .await
        .context("Failed to load snapshot")?;

    let from_block = watermark
        .map(|w| w.block_number)
        .unwrap_or(0)
        .max(config.start_block);
    let source = JsonlEventSource::new(config.events_path.clone());
    let events = source
        .fetch_events(from_block)
        .await
        .with_context(|| format!("Failed to read events from {}", config.events_path))?;
    tracing::info!("Fetched {} events from block {}", events.len(), from_block);

    let mut indexer = Indexer::new(store, UnavailableChainReader, config).with_watermark(watermark);
    let report = indexer.replay(events);
    tracing::info!(
        "Indexed {} events ({} skipped, {} failed); {} swap legs, {} dropped",
        report.processed,
        report.skipped,
        report.failed.len(),
        report.swap_legs,
        report.dropped_legs
    );

    let watermark = indexer.watermark();
    let store = indexer.into_store();
    repo.persist_snapshot(&store, watermark.as_ref())
        .await
        .context("Failed to persist snapshot")?;
    Ok(())
}
