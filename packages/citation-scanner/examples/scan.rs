//! Scan the citation graph under one URL and print the report as JSON.
//!
//! ```text
//! OPENAI_API_KEY=sk-... cargo run -p citation-scanner --features openai,sqlite \
//!     --example scan -- https://en.wikipedia.org/wiki/Tide 1
//! ```
//!
//! All other settings come from the environment (see `ScannerConfig`).

use citation_scanner::{
    CitationScanner, DocumentParser, FetcherExt, HttpFetcher, OpenAIExtractor, ScannerConfig,
    SqliteCache,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,citation_scanner=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let root = args.next().ok_or("usage: scan <root-url> [max-depth]")?;
    let max_depth: i64 = match args.next() {
        Some(depth) => depth.parse()?,
        None => 1,
    };

    let config = ScannerConfig::from_env()?;

    let mut fetcher = HttpFetcher::with_timeout(config.fetch_timeout)?;
    if let Some(user_agent) = &config.fetch_user_agent {
        fetcher = fetcher.with_user_agent(user_agent);
    }
    // Effectively unthrottled when no rate is configured
    let fetcher = fetcher.rate_limited(config.fetch_requests_per_second.unwrap_or(u32::MAX));

    let extractor = OpenAIExtractor::from_config(&config)?;
    let cache = SqliteCache::new(&config.cache_database_url)
        .await?
        .with_ttl(chrono::Duration::from_std(config.cache_ttl)?);

    let scanner = CitationScanner::new(DocumentParser::new(fetcher, extractor), cache)
        .with_config(config.traversal.clone());

    let report = scanner.traverse(&root, max_depth).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
