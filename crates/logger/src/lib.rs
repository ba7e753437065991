//! MatchCast Live: event logger
//! JSONL audit stream, one file per UTC day

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct EventLogger {
    log_dir: PathBuf,
}

impl EventLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let dir = log_dir.into();
        fs::create_dir_all(&dir).ok();
        Self { log_dir: dir }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn log<T: Serialize>(&self, event: &T) -> Result<()> {
        let date  = Utc::now().format("%Y-%m-%d").to_string();
        let path  = self.log_dir.join(format!("{date}.jsonl"));
        let line  = serde_json::to_string(event).context("serialize event")?;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open {}", path.display()))?;
        writeln!(f, "{line}")?;
        Ok(())
    }

    /// Audit writes never fail the caller; problems only surface as warnings.
    pub fn log_or_warn<T: Serialize>(&self, event: &T) {
        if let Err(e) = self.log(event) {
            tracing::warn!("event log write failed: {e:#}");
        }
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

// ── Event types ───────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
pub struct SourceStatusEvent {
    pub ts:      String,
    pub event:   &'static str,   // "SOURCE_STATUS"
    pub source:  String,
    pub ok:      bool,
    pub items:   usize,
    pub message: String,
}

#[derive(Serialize, Debug)]
pub struct FixtureRefreshEvent {
    pub ts:      String,
    pub event:   &'static str,   // "FIXTURE_REFRESH"
    pub origin:  String,         // "live" | "fallback"
    pub count:   usize,
    pub forced:  bool,
    pub message: String,
}

#[derive(Serialize, Debug)]
pub struct PredictionEvent {
    pub ts:         String,
    pub event:      &'static str,   // "PREDICTION"
    pub fixture_id: u64,
    pub league:     String,
    pub home:       String,
    pub away:       String,
    pub win:        f64,
    pub draw:       f64,
    pub lose:       f64,
    pub weight_elo: f64,
    pub weight_bt:  f64,
    pub weight_mc:  f64,
}

#[derive(Serialize, Debug)]
pub struct WeightsUpdatedEvent {
    pub ts:     String,
    pub event:  &'static str,   // "WEIGHTS_UPDATED"
    pub reason: String,         // "manual" | "retune"
    pub elo:    f64,
    pub bt:     f64,
    pub mc:     f64,
}
