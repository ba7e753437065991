//! TTL-gated fixture cache.
//!
//! The snapshot is swapped as one `Arc` under a write lock, so readers always
//! see a complete {fixtures, fetched_at, origin, message} set. Refreshes are
//! serialized by `refresh_lock`; a caller that queued behind a refresh which
//! completed in the meantime gets that result instead of fetching again.

use chrono::Utc;
use futures_util::future::join_all;
use logger::{now_iso, EventLogger, FixtureRefreshEvent, SourceStatusEvent};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::dedup::{canonicalize, fallback_fixtures, CanonicalFixture};
use crate::extract::{parse_source_page, FixtureExtractor};
use crate::source::{PageSource, SourceConfig};

pub const DEFAULT_TTL: Duration = Duration::from_secs(180);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheOrigin {
    Live,
    Fallback,
}

impl CacheOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOrigin::Live => "live",
            CacheOrigin::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
    pub fixtures: Vec<CanonicalFixture>,
    /// Epoch milliseconds of the refresh that produced this snapshot; 0 before the first one.
    pub fetched_at: i64,
    pub origin: CacheOrigin,
    pub message: String,
}

impl CacheSnapshot {
    fn initial() -> Self {
        Self {
            fixtures: fallback_fixtures(),
            fetched_at: 0,
            origin: CacheOrigin::Fallback,
            message: "using fallback data".to_string(),
        }
    }

    pub fn find(&self, id: u64) -> Option<&CanonicalFixture> {
        self.fixtures.iter().find(|f| f.id == id)
    }
}

pub struct FixtureCache {
    sources: Vec<(SourceConfig, FixtureExtractor)>,
    page_source: Arc<dyn PageSource>,
    ttl: Duration,
    snapshot: RwLock<Arc<CacheSnapshot>>,
    refresh_lock: Mutex<()>,
    generation: AtomicU64,
    events: Option<Arc<EventLogger>>,
}

impl FixtureCache {
    pub fn new(
        sources: Vec<SourceConfig>,
        page_source: Arc<dyn PageSource>,
        ttl: Duration,
    ) -> Result<Self, regex::Error> {
        let sources = sources
            .into_iter()
            .map(|s| FixtureExtractor::new(&s).map(|ex| (s, ex)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            sources,
            page_source,
            ttl,
            snapshot: RwLock::new(Arc::new(CacheSnapshot::initial())),
            refresh_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
            events: None,
        })
    }

    pub fn with_event_log(mut self, events: Arc<EventLogger>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current snapshot without any I/O.
    pub async fn snapshot(&self) -> Arc<CacheSnapshot> {
        Arc::clone(&*self.snapshot.read().await)
    }

    async fn fresh_snapshot(&self) -> Option<Arc<CacheSnapshot>> {
        let snap = self.snapshot().await;
        let age_ms = Utc::now().timestamp_millis() - snap.fetched_at;
        let fresh = !snap.fixtures.is_empty() && age_ms < self.ttl.as_millis() as i64;
        fresh.then_some(snap)
    }

    /// Returns the cached snapshot while it is younger than the TTL (unless `force`),
    /// otherwise fetches every source and swaps in a new snapshot.
    pub async fn refresh(&self, force: bool) -> Arc<CacheSnapshot> {
        let seen_generation = self.generation.load(Ordering::Acquire);
        if !force {
            if let Some(snap) = self.fresh_snapshot().await {
                return snap;
            }
        }

        let _guard = self.refresh_lock.lock().await;
        if self.generation.load(Ordering::Acquire) != seen_generation {
            // Someone else refreshed while we were queued.
            return self.snapshot().await;
        }

        let next = Arc::new(self.fetch_snapshot(force).await);
        *self.snapshot.write().await = Arc::clone(&next);
        self.generation.fetch_add(1, Ordering::AcqRel);
        next
    }

    async fn fetch_snapshot(&self, forced: bool) -> CacheSnapshot {
        let fetched = join_all(
            self.sources
                .iter()
                .map(|(source, _)| self.page_source.fetch_page(source)),
        )
        .await;

        let mut collected = Vec::new();
        let mut errors = Vec::new();
        for ((source, extractor), result) in self.sources.iter().zip(fetched) {
            match result {
                Ok(html) => {
                    let parsed = parse_source_page(extractor, &html);
                    if parsed.candidates.is_empty() {
                        let msg = format!("{}: no fixtures parsed", source.id);
                        warn!("{msg} (raw={}, rejected={})", parsed.raw_count, parsed.rejected);
                        self.log_source(source, false, 0, &msg);
                        errors.push(msg);
                    } else {
                        info!(
                            source = %source.id,
                            raw = parsed.raw_count,
                            rejected = parsed.rejected,
                            "parsed {} candidates",
                            parsed.candidates.len()
                        );
                        self.log_source(source, true, parsed.candidates.len(), "ok");
                        collected.extend(parsed.candidates);
                    }
                }
                Err(e) => {
                    let msg = format!("{}: {}", source.id, e);
                    warn!("source fetch failed: {msg}");
                    self.log_source(source, false, 0, &msg);
                    errors.push(msg);
                }
            }
        }

        let now = Utc::now();
        let fixtures = canonicalize(collected, now.date_naive());
        let snapshot = if fixtures.is_empty() {
            let reason = if errors.is_empty() {
                "no data".to_string()
            } else {
                errors.join("; ")
            };
            CacheSnapshot {
                fixtures: fallback_fixtures(),
                fetched_at: now.timestamp_millis(),
                origin: CacheOrigin::Fallback,
                message: format!("live scrape failed, serving fallback: {reason}"),
            }
        } else {
            let message = if errors.is_empty() {
                "ok".to_string()
            } else {
                format!("partial source failure: {}", errors.join("; "))
            };
            CacheSnapshot {
                fixtures,
                fetched_at: now.timestamp_millis(),
                origin: CacheOrigin::Live,
                message,
            }
        };

        info!(
            origin = snapshot.origin.as_str(),
            count = snapshot.fixtures.len(),
            forced,
            "fixture cache refreshed: {}",
            snapshot.message
        );
        if let Some(events) = &self.events {
            events.log_or_warn(&FixtureRefreshEvent {
                ts: now_iso(),
                event: "FIXTURE_REFRESH",
                origin: snapshot.origin.as_str().to_string(),
                count: snapshot.fixtures.len(),
                forced,
                message: snapshot.message.clone(),
            });
        }

        snapshot
    }

    fn log_source(&self, source: &SourceConfig, ok: bool, items: usize, message: &str) {
        if let Some(events) = &self.events {
            events.log_or_warn(&SourceStatusEvent {
                ts: now_iso(),
                event: "SOURCE_STATUS",
                source: source.id.clone(),
                ok,
                items,
                message: message.to_string(),
            });
        }
    }
}
