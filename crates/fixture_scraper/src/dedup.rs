use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::extract::CandidateFixture;
use crate::hash::stable_hash;
use crate::{UNKNOWN_LEAGUE, UNKNOWN_TIME};

/// Ids are the key hash reduced into this range, then offset by batch position.
const ID_RANGE: u64 = 100_000_000;

/// A deduplicated fixture with a stable id, as served to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalFixture {
    pub id: u64,
    pub source: String,
    pub league: String,
    /// `YYYY-MM-DD HH:MM`
    #[serde(rename = "time")]
    pub kickoff: String,
    pub home: String,
    pub away: String,
}

impl CanonicalFixture {
    fn fixed(id: u64, source: &str, league: &str, kickoff: &str, home: &str, away: &str) -> Self {
        Self {
            id,
            source: source.to_string(),
            league: league.to_string(),
            kickoff: kickoff.to_string(),
            home: home.to_string(),
            away: away.to_string(),
        }
    }
}

fn dedup_key(c: &CandidateFixture) -> String {
    format!(
        "{}-{}-{}-{}-{}",
        c.source,
        c.league.as_deref().unwrap_or(UNKNOWN_LEAGUE),
        c.home,
        c.away,
        c.kickoff_time.as_deref().unwrap_or(UNKNOWN_TIME),
    )
}

/// Collapse candidates sharing (source, league, home, away, time); the first one wins
/// and first-appearance order is kept. Kickoff is `today` plus the parsed time.
pub fn canonicalize(
    candidates: impl IntoIterator<Item = CandidateFixture>,
    today: NaiveDate,
) -> Vec<CanonicalFixture> {
    let mut seen = HashSet::new();
    let date = today.format("%Y-%m-%d");

    candidates
        .into_iter()
        .filter_map(|c| {
            let key = dedup_key(&c);
            seen.insert(key.clone()).then_some((key, c))
        })
        .enumerate()
        .map(|(idx, (key, c))| {
            let kickoff = match c.kickoff_time.as_deref() {
                Some(t) if t.contains(':') => format!("{date} {t}"),
                _ => format!("{date} 00:00"),
            };
            CanonicalFixture {
                id: u64::from(stable_hash(&key)) % ID_RANGE + idx as u64,
                source: c.source,
                league: c.league.unwrap_or_else(|| UNKNOWN_LEAGUE.to_string()),
                kickoff,
                home: c.home,
                away: c.away,
            }
        })
        .collect()
}

/// Served whenever live ingestion produces nothing.
pub fn fallback_fixtures() -> Vec<CanonicalFixture> {
    vec![
        CanonicalFixture::fixed(10001, "500", "英超", "2026-03-01 20:00", "阿森纳", "切尔西"),
        CanonicalFixture::fixed(10002, "500", "西甲", "2026-03-01 22:00", "皇马", "马竞"),
        CanonicalFixture::fixed(10003, "球探", "德甲", "2026-03-01 21:30", "拜仁", "多特"),
    ]
}
