//! One-shot scrape diagnostics for the configured listing sources
//! Run: cargo run --bin source-probe
//!
//! Fetches each source once and reports how many team pairs the extractor
//! found, how many the name validator threw away, and the first canonical
//! fixtures. Use it when a source suddenly yields "no fixtures parsed".

use anyhow::Result;
use chrono::Utc;
use dotenv::dotenv;
use fixture_scraper::{canonicalize, parse_source_page, FixtureExtractor, PageSource, SourceFetcher};
use match_api::AppConfig;
use tokio::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const SHOW_FIRST: usize = 5;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let config = AppConfig::from_env();
    let fetcher = SourceFetcher::new(config.fetch_timeout);
    let today = Utc::now().date_naive();

    for source in config.sources() {
        let extractor = FixtureExtractor::new(&source)?;
        info!("Probing {} ({})...", source.id, source.url);

        let started = Instant::now();
        let html = match fetcher.fetch_page(&source).await {
            Ok(html) => html,
            Err(e) => {
                warn!("{} fetch failed after {:?}: {}", source.id, started.elapsed(), e);
                continue;
            }
        };

        let parsed = parse_source_page(&extractor, &html);
        info!(
            "{} -> html_len={}, raw_pairs={}, rejected={}, kept={}, took={:?}",
            source.id,
            html.len(),
            parsed.raw_count,
            parsed.rejected,
            parsed.candidates.len(),
            started.elapsed()
        );

        let fixtures = canonicalize(parsed.candidates, today);
        if fixtures.is_empty() {
            warn!("{}: no fixtures parsed; markup may have changed", source.id);
            continue;
        }
        for f in fixtures.iter().take(SHOW_FIRST) {
            info!("  #{} [{}] {} {} vs {}", f.id, f.league, f.kickoff, f.home, f.away);
        }
        if fixtures.len() > SHOW_FIRST {
            info!("  ... {} more", fixtures.len() - SHOW_FIRST);
        }
    }

    Ok(())
}
