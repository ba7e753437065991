use serde::Serialize;
use std::collections::VecDeque;

use crate::fusion::EnsembleWeights;
use crate::models::OutcomeProbs;
use crate::simulator::ScoreProb;

pub const HISTORY_CAPACITY: usize = 100;
/// Retuning waits until this many predictions are logged.
pub const MIN_RECORDS_FOR_RETUNE: usize = 8;
pub const RETUNE_WINDOW: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: u64,
    pub match_id: u64,
    pub league: String,
    pub home: String,
    pub away: String,
    pub source: String,
    pub prediction: OutcomeProbs,
    pub top_scores: Vec<ScoreProb>,
    pub reason: String,
    /// RFC 3339, UTC
    pub created_at: String,
}

/// Newest-first rolling log of predictions.
#[derive(Debug, Default)]
pub struct HistoryStore {
    records: VecDeque<HistoryRecord>,
    next_id: u64,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next record id; ids only grow.
    pub fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn append(&mut self, record: HistoryRecord) {
        self.records.push_front(record);
        self.records.truncate(HISTORY_CAPACITY);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn page(&self, offset: usize, limit: Option<usize>) -> Vec<HistoryRecord> {
        self.records
            .iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    pub fn recent(&self, n: usize) -> impl Iterator<Item = &HistoryRecord> {
        self.records.iter().take(n)
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Shift weight toward the simulation model when recent predictions are decisive.
///
/// Returns `None` while the log is too short to act on.
pub fn retune(history: &HistoryStore) -> Option<EnsembleWeights> {
    if history.len() < MIN_RECORDS_FOR_RETUNE {
        return None;
    }

    let recent: Vec<f64> = history
        .recent(RETUNE_WINDOW)
        .map(|r| (r.prediction.win - 0.5).abs())
        .collect();
    let variance = recent.iter().sum::<f64>() / recent.len() as f64;

    let mc = round2((0.3 + variance * 0.4).min(0.5));
    let rest = 1.0 - mc;
    Some(EnsembleWeights {
        elo: round2(rest * 0.55),
        bt: round2(rest * 0.45),
        mc,
    })
}
