//! Storage ports: the Event Store (ingested raw transactions, read-mostly)
//! and the game store (claims, memory, events, badges).
//!
//! Both traits are implemented by the Postgres adapter in `pg`; an
//! in-memory adapter in `mem` backs the engine tests. All SQL is
//! runtime-checked so no live database is needed to build.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub mod pg;

#[cfg(test)]
pub mod mem;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage failure: {0}")]
    Db(#[from] sqlx::Error),
}

/// A raw ingested transaction record. Immutable once stored.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RawEvent {
    pub signature: String,
    pub block_time: Option<i64>,
    pub payload: Value,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RawEventSummary {
    pub signature: String,
    pub block_time: Option<i64>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WalletMemoryRow {
    pub wallet: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub interactions: i32,
    pub lamports_in: i64,
    pub lamports_out: i64,
    pub vibe: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WalletEventRow {
    pub wallet: String,
    pub signature: String,
    pub kind: String,
    pub amount_lamports: i64,
    pub counterparty: String,
    pub block_time: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WalletBadgeRow {
    pub badge_id: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct QuestClaimRow {
    pub id: i64,
    pub quest_key: String,
    pub hour_index: i64,
    pub wallet: String,
    pub signature: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ActorRow {
    pub wallet: String,
    pub vibe: String,
    pub interactions: i32,
    pub badge_count: i64,
}

#[derive(Debug, Clone, Copy, Serialize, sqlx::FromRow)]
pub struct StoreStats {
    pub raw_count: i64,
    pub claim_count: i64,
}

/// A verified claim about to be recorded.
#[derive(Debug, Clone)]
pub struct NewClaim {
    pub quest_key: String,
    pub hour_index: i64,
    pub wallet: String,
    pub signature: String,
    /// Quest identity, carried so the claim transaction can decide badges.
    pub quest_id: &'static str,
    pub quest_badge_id: &'static str,
}

/// One qualifying transfer to fold into a wallet's reputation.
#[derive(Debug, Clone)]
pub struct NewInteraction {
    pub wallet: String,
    pub signature: String,
    pub kind: crate::memory::InteractionKind,
    pub amount_lamports: i64,
    pub counterparty: String,
    pub block_time: i64,
}

/// What a recorded claim earned, computed inside the claim transaction.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimReceipt {
    /// Storage-assigned monotonic sequence number; the rank tie-break.
    pub seq: i64,
    pub rank: i64,
    pub streak: i64,
    pub awarded_badges: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    Recorded(ClaimReceipt),
    /// Lost the uniqueness race or re-submitted: not an error.
    AlreadyClaimed,
}

#[derive(Debug, Clone, Serialize)]
pub struct InteractionOutcome {
    pub memory: WalletMemoryRow,
    pub awarded_badges: Vec<String>,
}

/// Read-only view of the ingested transaction stream, plus the single
/// idempotent append the webhook uses.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Point lookup by signature. Complete-or-absent, never partial.
    async fn lookup_by_signature(&self, signature: &str) -> Result<Option<RawEvent>, StoreError>;

    /// Most recent records first. Reporting only, never decision logic.
    async fn recent_records(&self, limit: i64) -> Result<Vec<RawEventSummary>, StoreError>;

    /// Returns false when the signature was already ingested.
    async fn insert_raw_event(
        &self,
        signature: &str,
        block_time: Option<i64>,
        payload: &Value,
    ) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Record a verified claim and everything it earns in ONE transaction:
    /// insert the claim (uniqueness conflict resolves to `AlreadyClaimed`),
    /// derive rank from the returned sequence number, recompute the streak
    /// from the wallet's claimed hours, and award the earned badges. A
    /// failure partway rolls the whole claim back.
    async fn finalize_claim(&self, claim: &NewClaim) -> Result<ClaimOutcome, StoreError>;

    /// Fold one qualifying transfer into the wallet's memory in ONE
    /// transaction: upsert the running sums, recompute the vibe, append the
    /// audit event, and award any memory milestones crossed.
    async fn record_interaction(
        &self,
        interaction: &NewInteraction,
    ) -> Result<InteractionOutcome, StoreError>;

    /// Idempotent award; returns false when the wallet already holds it.
    async fn award_badge(
        &self,
        wallet: &str,
        badge_id: &str,
        reason: &str,
    ) -> Result<bool, StoreError>;

    async fn claim_count(&self, quest_key: &str) -> Result<i64, StoreError>;

    /// Claims for one quest period, ascending by sequence number.
    async fn claims_for_quest(
        &self,
        quest_key: &str,
        limit: i64,
    ) -> Result<Vec<QuestClaimRow>, StoreError>;

    /// Distinct hours the wallet has claimed in.
    async fn claimed_hours(&self, wallet: &str) -> Result<Vec<i64>, StoreError>;

    async fn wallet_memory(&self, wallet: &str) -> Result<Option<WalletMemoryRow>, StoreError>;

    async fn wallet_badges(&self, wallet: &str) -> Result<Vec<WalletBadgeRow>, StoreError>;

    async fn wallet_events(
        &self,
        wallet: &str,
        limit: i64,
    ) -> Result<Vec<WalletEventRow>, StoreError>;

    /// Wallets by interaction count, with badge counts. Leaderboard feed.
    async fn top_actors(&self, limit: i64) -> Result<Vec<ActorRow>, StoreError>;

    async fn stats(&self) -> Result<StoreStats, StoreError>;
}
