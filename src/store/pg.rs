//! Postgres adapter for the storage ports.
//!
//! The multi-step claim and interaction flows each run inside a single
//! transaction, so the uniqueness constraints on `quest_claims` and
//! `wallet_badges` are the only coordination the system needs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Row};

use crate::badges;
use crate::memory::Vibe;
use crate::streak::streak_from_hours;

use super::{
    ActorRow, ClaimOutcome, ClaimReceipt, EventStore, InteractionOutcome, NewClaim,
    NewInteraction, QuestClaimRow, RawEvent, RawEventSummary, Store, StoreError, StoreStats,
    WalletBadgeRow, WalletEventRow, WalletMemoryRow,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Idempotent badge insert. Returns true when the row is new.
async fn award_on<'e, E>(
    executor: E,
    wallet: &str,
    badge_id: &str,
    reason: &str,
) -> Result<bool, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let inserted = sqlx::query(
        r#"
        INSERT INTO wallet_badges(wallet, badge_id, reason)
        VALUES ($1, $2, $3)
        ON CONFLICT (wallet, badge_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(wallet)
    .bind(badge_id)
    .bind(reason)
    .fetch_optional(executor)
    .await?;
    Ok(inserted.is_some())
}

#[async_trait]
impl EventStore for PgStore {
    async fn lookup_by_signature(&self, signature: &str) -> Result<Option<RawEvent>, StoreError> {
        let record = sqlx::query_as::<_, RawEvent>(
            "SELECT signature, block_time, payload FROM raw_events WHERE signature = $1",
        )
        .bind(signature)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn recent_records(&self, limit: i64) -> Result<Vec<RawEventSummary>, StoreError> {
        let rows = sqlx::query_as::<_, RawEventSummary>(
            r#"
            SELECT signature, block_time
            FROM raw_events
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_raw_event(
        &self,
        signature: &str,
        block_time: Option<i64>,
        payload: &Value,
    ) -> Result<bool, StoreError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO raw_events(signature, block_time, payload)
            VALUES ($1, $2, $3)
            ON CONFLICT (signature) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(signature)
        .bind(block_time)
        .bind(payload)
        .fetch_optional(&self.pool)
        .await?;
        Ok(inserted.is_some())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn finalize_claim(&self, claim: &NewClaim) -> Result<ClaimOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        // ON CONFLICT without a target covers both uniqueness constraints:
        // (wallet, hour_index) and the claim signature.
        let inserted = sqlx::query(
            r#"
            INSERT INTO quest_claims(quest_key, hour_index, wallet, signature)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&claim.quest_key)
        .bind(claim.hour_index)
        .bind(&claim.wallet)
        .bind(&claim.signature)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = inserted else {
            tx.rollback().await?;
            return Ok(ClaimOutcome::AlreadyClaimed);
        };
        let seq: i64 = row.try_get("id")?;

        // Rank from the storage-assigned sequence: ties are impossible.
        let earlier: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM quest_claims WHERE quest_key = $1 AND id < $2",
        )
        .bind(&claim.quest_key)
        .bind(seq)
        .fetch_one(&mut *tx)
        .await?;
        let rank = earlier + 1;

        let hours: Vec<i64> =
            sqlx::query_scalar("SELECT DISTINCT hour_index FROM quest_claims WHERE wallet = $1")
                .bind(&claim.wallet)
                .fetch_all(&mut *tx)
                .await?;
        let streak = streak_from_hours(&hours, claim.hour_index);

        let mut awarded_badges = Vec::new();
        for grant in badges::badges_for_claim(claim.quest_id, claim.quest_badge_id, rank, streak) {
            if award_on(&mut *tx, &claim.wallet, &grant.badge_id, &grant.reason).await? {
                awarded_badges.push(grant.badge_id);
            }
        }

        tx.commit().await?;
        Ok(ClaimOutcome::Recorded(ClaimReceipt {
            seq,
            rank,
            streak,
            awarded_badges,
        }))
    }

    async fn record_interaction(
        &self,
        interaction: &NewInteraction,
    ) -> Result<InteractionOutcome, StoreError> {
        let (lamports_in, lamports_out) = interaction.kind.deltas(interaction.amount_lamports);
        let seen_at = DateTime::<Utc>::from_timestamp(interaction.block_time, 0)
            .unwrap_or_else(Utc::now);

        let mut tx = self.pool.begin().await?;

        let mut memory = sqlx::query_as::<_, WalletMemoryRow>(
            r#"
            INSERT INTO wallet_memory
                (wallet, first_seen, last_seen, interactions, lamports_in, lamports_out, vibe)
            VALUES ($1, $2, $2, 1, $3, $4, 'neutral')
            ON CONFLICT (wallet) DO UPDATE SET
                interactions = wallet_memory.interactions + 1,
                lamports_in  = wallet_memory.lamports_in + EXCLUDED.lamports_in,
                lamports_out = wallet_memory.lamports_out + EXCLUDED.lamports_out,
                last_seen    = GREATEST(wallet_memory.last_seen, EXCLUDED.last_seen)
            RETURNING wallet, first_seen, last_seen, interactions, lamports_in, lamports_out, vibe
            "#,
        )
        .bind(&interaction.wallet)
        .bind(seen_at)
        .bind(lamports_in)
        .bind(lamports_out)
        .fetch_one(&mut *tx)
        .await?;

        let vibe = Vibe::classify(memory.lamports_in, memory.lamports_out);
        sqlx::query("UPDATE wallet_memory SET vibe = $2 WHERE wallet = $1")
            .bind(&interaction.wallet)
            .bind(vibe.as_str())
            .execute(&mut *tx)
            .await?;
        memory.vibe = vibe.as_str().to_string();

        sqlx::query(
            r#"
            INSERT INTO wallet_events
                (wallet, signature, kind, amount_lamports, counterparty, block_time)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&interaction.wallet)
        .bind(&interaction.signature)
        .bind(interaction.kind.as_str())
        .bind(interaction.amount_lamports)
        .bind(&interaction.counterparty)
        .bind(interaction.block_time)
        .execute(&mut *tx)
        .await?;

        let previous = memory.interactions - 1;
        let mut awarded_badges = Vec::new();
        for grant in badges::milestones_crossed(previous, memory.interactions) {
            if award_on(&mut *tx, &interaction.wallet, &grant.badge_id, &grant.reason).await? {
                awarded_badges.push(grant.badge_id);
            }
        }

        tx.commit().await?;
        Ok(InteractionOutcome {
            memory,
            awarded_badges,
        })
    }

    async fn award_badge(
        &self,
        wallet: &str,
        badge_id: &str,
        reason: &str,
    ) -> Result<bool, StoreError> {
        Ok(award_on(&self.pool, wallet, badge_id, reason).await?)
    }

    async fn claim_count(&self, quest_key: &str) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM quest_claims WHERE quest_key = $1")
            .bind(quest_key)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn claims_for_quest(
        &self,
        quest_key: &str,
        limit: i64,
    ) -> Result<Vec<QuestClaimRow>, StoreError> {
        let rows = sqlx::query_as::<_, QuestClaimRow>(
            r#"
            SELECT id, quest_key, hour_index, wallet, signature, created_at
            FROM quest_claims
            WHERE quest_key = $1
            ORDER BY id ASC
            LIMIT $2
            "#,
        )
        .bind(quest_key)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn claimed_hours(&self, wallet: &str) -> Result<Vec<i64>, StoreError> {
        let hours: Vec<i64> =
            sqlx::query_scalar("SELECT DISTINCT hour_index FROM quest_claims WHERE wallet = $1")
                .bind(wallet)
                .fetch_all(&self.pool)
                .await?;
        Ok(hours)
    }

    async fn wallet_memory(&self, wallet: &str) -> Result<Option<WalletMemoryRow>, StoreError> {
        let row = sqlx::query_as::<_, WalletMemoryRow>(
            r#"
            SELECT wallet, first_seen, last_seen, interactions, lamports_in, lamports_out, vibe
            FROM wallet_memory
            WHERE wallet = $1
            "#,
        )
        .bind(wallet)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn wallet_badges(&self, wallet: &str) -> Result<Vec<WalletBadgeRow>, StoreError> {
        let rows = sqlx::query_as::<_, WalletBadgeRow>(
            r#"
            SELECT badge_id, reason, created_at
            FROM wallet_badges
            WHERE wallet = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(wallet)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn wallet_events(
        &self,
        wallet: &str,
        limit: i64,
    ) -> Result<Vec<WalletEventRow>, StoreError> {
        let rows = sqlx::query_as::<_, WalletEventRow>(
            r#"
            SELECT wallet, signature, kind, amount_lamports, counterparty, block_time, created_at
            FROM wallet_events
            WHERE wallet = $1
            ORDER BY id DESC
            LIMIT $2
            "#,
        )
        .bind(wallet)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn top_actors(&self, limit: i64) -> Result<Vec<ActorRow>, StoreError> {
        let rows = sqlx::query_as::<_, ActorRow>(
            r#"
            SELECT m.wallet, m.vibe, m.interactions,
                   (SELECT count(*) FROM wallet_badges b WHERE b.wallet = m.wallet) AS badge_count
            FROM wallet_memory m
            ORDER BY m.interactions DESC, m.last_seen DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let stats = sqlx::query_as::<_, StoreStats>(
            r#"
            SELECT (SELECT count(*) FROM raw_events)  AS raw_count,
                   (SELECT count(*) FROM quest_claims) AS claim_count
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}
