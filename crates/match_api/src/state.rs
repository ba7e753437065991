use anyhow::{Context, Result};
use fixture_scraper::{FixtureCache, PageSource, SourceFetcher};
use logger::EventLogger;
use prediction_engine::PredictionEngine;
use std::sync::Arc;

use crate::config::AppConfig;

/// Everything a handler needs; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<FixtureCache>,
    pub engine: Arc<PredictionEngine>,
    pub default_trials: usize,
}

impl AppState {
    pub fn new(cache: Arc<FixtureCache>, engine: Arc<PredictionEngine>, default_trials: usize) -> Self {
        Self {
            cache,
            engine,
            default_trials,
        }
    }

    /// Wire the cache and engine from config, fetching over HTTP.
    pub fn from_config(config: &AppConfig, events: Arc<EventLogger>) -> Result<Self> {
        let fetcher: Arc<dyn PageSource> = Arc::new(SourceFetcher::new(config.fetch_timeout));
        Self::with_page_source(config, fetcher, Some(events))
    }

    pub fn with_page_source(
        config: &AppConfig,
        page_source: Arc<dyn PageSource>,
        events: Option<Arc<EventLogger>>,
    ) -> Result<Self> {
        let mut cache = FixtureCache::new(config.sources(), page_source, config.cache_ttl)
            .context("invalid source delimiter pattern")?;
        let mut engine = PredictionEngine::new();
        if let Some(events) = events {
            cache = cache.with_event_log(Arc::clone(&events));
            engine = engine.with_event_log(events);
        }

        Ok(Self::new(Arc::new(cache), Arc::new(engine), config.sim_trials))
    }
}
