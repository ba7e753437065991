use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use fixture_scraper::{CacheSnapshot, CanonicalFixture};
use prediction_engine::{EnsembleWeights, HistoryRecord, Prediction};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

pub const MIN_TRIALS: usize = 100;
pub const MAX_TRIALS: usize = 50_000;
const HEALTH_SAMPLE: usize = 5;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/fixtures/today", get(fixtures_today))
        .route("/fixtures/refresh", post(refresh_fixtures))
        .route("/scrape/health", get(scrape_health))
        .route("/prediction/detail", get(prediction_detail))
        .route("/history/list", get(history_list))
        .route("/weights", get(get_weights).post(set_weights))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Query values arrive as raw strings so a bad one degrades instead of rejecting the request.
fn param<T: FromStr>(raw: &Option<String>) -> Option<T> {
    raw.as_deref().map(str::trim).filter(|v| !v.is_empty())?.parse().ok()
}

fn non_empty(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// ── /fixtures ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct TodayQuery {
    source: Option<String>,
    league: Option<String>,
    refresh: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayResponse {
    list: Vec<CanonicalFixture>,
    leagues: Vec<String>,
    fetched_at: i64,
    mode: &'static str,
    message: String,
    needs_upload: bool,
}

fn distinct_leagues(snapshot: &CacheSnapshot) -> Vec<String> {
    let mut leagues: Vec<String> = Vec::new();
    for fixture in &snapshot.fixtures {
        if !leagues.contains(&fixture.league) {
            leagues.push(fixture.league.clone());
        }
    }
    leagues
}

async fn fixtures_today(
    State(state): State<AppState>,
    Query(q): Query<TodayQuery>,
) -> Json<TodayResponse> {
    let force = matches!(non_empty(&q.refresh), Some("1" | "true"));
    let snapshot = state.cache.refresh(force).await;

    let source = non_empty(&q.source);
    let league = non_empty(&q.league);
    let list = snapshot
        .fixtures
        .iter()
        .filter(|f| source.map_or(true, |s| f.source == s))
        .filter(|f| league.map_or(true, |l| f.league == l))
        .cloned()
        .collect();

    Json(TodayResponse {
        list,
        leagues: distinct_leagues(&snapshot),
        fetched_at: snapshot.fetched_at,
        mode: snapshot.origin.as_str(),
        message: snapshot.message.clone(),
        needs_upload: snapshot.origin == fixture_scraper::CacheOrigin::Fallback,
    })
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    success: bool,
    count: usize,
    mode: &'static str,
    message: String,
}

async fn refresh_fixtures(State(state): State<AppState>) -> Json<RefreshResponse> {
    let snapshot = state.cache.refresh(true).await;
    info!("manual refresh: {} fixtures ({})", snapshot.fixtures.len(), snapshot.origin.as_str());
    Json(RefreshResponse {
        success: true,
        count: snapshot.fixtures.len(),
        mode: snapshot.origin.as_str(),
        message: snapshot.message.clone(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    mode: &'static str,
    fetched_at: i64,
    count: usize,
    message: String,
    sample: Vec<CanonicalFixture>,
}

async fn scrape_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.cache.refresh(false).await;
    Json(HealthResponse {
        mode: snapshot.origin.as_str(),
        fetched_at: snapshot.fetched_at,
        count: snapshot.fixtures.len(),
        message: snapshot.message.clone(),
        sample: snapshot.fixtures.iter().take(HEALTH_SAMPLE).cloned().collect(),
    })
}

// ── /prediction ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailQuery {
    match_id: Option<String>,
    trials: Option<String>,
}

async fn prediction_detail(
    State(state): State<AppState>,
    Query(q): Query<DetailQuery>,
) -> Result<Json<Prediction>, ApiError> {
    let match_id: u64 = param(&q.match_id)
        .ok_or_else(|| ApiError::Validation("matchId must be a non-negative integer".to_string()))?;
    let trials = param::<usize>(&q.trials)
        .unwrap_or(state.default_trials)
        .clamp(MIN_TRIALS, MAX_TRIALS);

    let snapshot = state.cache.refresh(false).await;
    let fixture = snapshot
        .find(match_id)
        .ok_or_else(|| ApiError::NotFound(format!("fixture {match_id} not found")))?;

    // CPU-bound; runs on the blocking pool.
    let fixture = fixture.clone();
    let engine = Arc::clone(&state.engine);
    let prediction = tokio::task::spawn_blocking(move || engine.predict(&fixture, trials))
        .await
        .map_err(|e| ApiError::Internal(format!("prediction task failed: {e}")))?;
    Ok(Json(prediction))
}

// ── /history ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    offset: Option<String>,
    limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    list: Vec<HistoryRecord>,
    total: usize,
}

async fn history_list(
    State(state): State<AppState>,
    Query(q): Query<HistoryQuery>,
) -> Json<HistoryResponse> {
    let (list, total) = state
        .engine
        .history(param(&q.offset).unwrap_or(0), param(&q.limit));
    Json(HistoryResponse { list, total })
}

// ── /weights ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct WeightsBody {
    elo: f64,
    bt: f64,
    mc: f64,
}

#[derive(Debug, Serialize)]
pub struct WeightsResponse {
    success: bool,
    weights: EnsembleWeights,
}

async fn get_weights(State(state): State<AppState>) -> Json<EnsembleWeights> {
    Json(state.engine.weights())
}

async fn set_weights(
    State(state): State<AppState>,
    body: Result<Json<WeightsBody>, JsonRejection>,
) -> Result<Json<WeightsResponse>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::Validation(format!("weights must be numbers: {}", e.body_text())))?;
    let weights = state.engine.set_weights(body.elo, body.bt, body.mc)?;
    Ok(Json(WeightsResponse {
        success: true,
        weights,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_parse_or_degrade() {
        assert_eq!(param::<u64>(&Some(" 10001 ".to_string())), Some(10001));
        assert_eq!(param::<u64>(&Some("abc".to_string())), None);
        assert_eq!(param::<u64>(&Some(String::new())), None);
        assert_eq!(param::<u64>(&None), None);
        assert_eq!(non_empty(&Some("  ".to_string())), None);
        assert_eq!(non_empty(&Some("英超".to_string())), Some("英超"));
    }
}
