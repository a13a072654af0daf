//! HTTP surface. Thin: every handler parses the request, calls the engine
//! or a store read, and maps the structured outcome onto a JSON body.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;

use crate::engine::{self, ClaimError};
use crate::memory::lamports_to_sol;
use crate::quests::QuestPool;
use crate::state::AppState;
use crate::store::{EventStore, Store, StoreError};

#[derive(Serialize)]
struct OkBody<T: Serialize> {
    ok: bool,
    #[serde(flatten)]
    body: T,
}

fn ok<T: Serialize>(body: T) -> Json<Value> {
    Json(serde_json::to_value(OkBody { ok: true, body }).unwrap_or_else(|_| json!({ "ok": true })))
}

fn fail(status: StatusCode, code: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "ok": false, "error": code })))
}

fn storage_failure(e: &StoreError) -> (StatusCode, Json<Value>) {
    error!(error = %e, "storage failure");
    fail(StatusCode::INTERNAL_SERVER_ERROR, "storage_unavailable")
}

pub async fn metrics(State(state): State<AppState>) -> String {
    state.metrics.render()
}

pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let stats = state.store.stats().await.map_err(|e| storage_failure(&e))?;
    Ok(Json(json!({
        "ok": true,
        "stats": stats,
        "creator": state.config.creator_wallet,
    })))
}

/// Active quest with claim count, the 3-quest preview and the full pool.
pub async fn quest_overview(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let overview = engine::quest_overview(state.store.as_ref(), &state.quests, Utc::now())
        .await
        .map_err(|e| storage_failure(&e))?;
    Ok(ok(overview))
}

#[derive(Deserialize)]
pub struct PreviewParams {
    n: Option<usize>,
}

pub async fn quest_preview(
    State(state): State<AppState>,
    Query(params): Query<PreviewParams>,
) -> Json<Value> {
    let n = params.n.unwrap_or(3).clamp(1, 24);
    let hour_index = QuestPool::hour_index(Utc::now());
    ok(json!({
        "hour_index": hour_index,
        "next": state.quests.preview(hour_index, n),
    }))
}

pub async fn quest_pool(State(state): State<AppState>) -> Json<Value> {
    ok(json!({ "pool": state.quests.quests() }))
}

/// Claims for the current hour, in rank order.
pub async fn quest_claims(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let active = state.quests.current_quest(Utc::now());
    let claims = state
        .store
        .claims_for_quest(&active.quest_key, 50)
        .await
        .map_err(|e| storage_failure(&e))?;
    Ok(ok(json!({ "quest_key": active.quest_key, "claims": claims })))
}

#[derive(Deserialize)]
pub struct ClaimRequest {
    #[serde(default)]
    wallet: String,
    #[serde(default)]
    signature: String,
}

pub async fn submit_claim(
    State(state): State<AppState>,
    Json(req): Json<ClaimRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let wallet = req.wallet.trim();
    let signature = req.signature.trim();

    let result = engine::submit_claim(
        state.store.as_ref(),
        &state.quests,
        &state.config.creator_wallet,
        wallet,
        signature,
        Utc::now(),
    )
    .await;

    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.code(),
    };
    counter!("claims_submitted_total", "outcome" => outcome).increment(1);

    match result {
        Ok(success) => {
            counter!("badges_awarded_total").increment(success.awarded_badges.len() as u64);
            Ok(ok(success))
        }
        Err(e @ ClaimError::AlreadyClaimed) => Err(fail(StatusCode::CONFLICT, e.code())),
        Err(ClaimError::Storage(e)) => Err(storage_failure(&e)),
        Err(e) => Err(fail(StatusCode::BAD_REQUEST, e.code())),
    }
}

/// Wallet memory, badges and the recent interaction timeline.
pub async fn wallet_detail(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let wallet = wallet.trim().to_string();
    let memory = state
        .store
        .wallet_memory(&wallet)
        .await
        .map_err(|e| storage_failure(&e))?;
    let badges = state
        .store
        .wallet_badges(&wallet)
        .await
        .map_err(|e| storage_failure(&e))?;
    let events = state
        .store
        .wallet_events(&wallet, 40)
        .await
        .map_err(|e| storage_failure(&e))?;

    let memory = match memory {
        Some(m) => json!({
            "wallet": m.wallet,
            "first_seen": m.first_seen,
            "last_seen": m.last_seen,
            "interactions": m.interactions,
            "lamports_in": m.lamports_in,
            "lamports_out": m.lamports_out,
            "sol_in": lamports_to_sol(m.lamports_in),
            "sol_out": lamports_to_sol(m.lamports_out),
            "vibe": m.vibe,
        }),
        None => json!({ "wallet": wallet, "vibe": "neutral", "interactions": 0 }),
    };
    Ok(Json(json!({
        "ok": true,
        "wallet": memory,
        "badges": badges,
        "events": events,
    })))
}

pub async fn wallet_progress(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let progress = engine::wallet_progress(
        state.store.as_ref(),
        &state.quests,
        wallet.trim(),
        Utc::now(),
    )
    .await
    .map_err(|e| storage_failure(&e))?;
    Ok(ok(progress))
}

#[derive(Deserialize)]
pub struct ActorsParams {
    limit: Option<i64>,
}

/// Leaderboard: wallets by interaction count.
pub async fn actors(
    State(state): State<AppState>,
    Query(params): Query<ActorsParams>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let limit = params.limit.unwrap_or(50).clamp(1, 200);
    let actors = state
        .store
        .top_actors(limit)
        .await
        .map_err(|e| storage_failure(&e))?;
    Ok(ok(json!({ "actors": actors })))
}

/// Operator aid: ingestion counters and the latest raw signatures.
pub async fn debug_raw(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let stats = state.store.stats().await.map_err(|e| storage_failure(&e))?;
    let latest = state
        .store
        .recent_records(10)
        .await
        .map_err(|e| storage_failure(&e))?;
    Ok(ok(json!({ "stats": stats, "latest": latest })))
}
