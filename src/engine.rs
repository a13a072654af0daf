//! The claim/reputation orchestration: ties the scheduler, verifier,
//! streak/rank computation and badge awards together over the storage
//! ports. Every operation here is a request-scoped unit of work; the only
//! mutual exclusion is the storage layer's uniqueness constraints.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;
use tracing::info;

use crate::badges::{self, BadgeCategory, BadgeDefinition};
use crate::quests::{QuestDefinition, QuestPool, QuestPreview};
use crate::store::{
    ClaimOutcome, EventStore, InteractionOutcome, NewClaim, NewInteraction, Store, StoreError,
};
use crate::streak::streak_from_hours;
use crate::verify::{self, VerifyFailure};

const MIN_SIGNATURE_LEN: usize = 16;
const MAX_SIGNATURE_LEN: usize = 128;

#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("wallet or signature is missing or malformed")]
    MalformedInput,
    #[error("signature has not been ingested yet")]
    SignatureNotIngested,
    #[error("transaction carries no native transfers")]
    NoNativeTransfers,
    #[error("no transfer satisfies the quest rule")]
    RuleNotMet,
    #[error("already claimed this hour")]
    AlreadyClaimed,
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl ClaimError {
    /// Stable machine-readable reason for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            ClaimError::MalformedInput => "invalid_wallet_or_signature",
            ClaimError::SignatureNotIngested => "signature_not_ingested",
            ClaimError::NoNativeTransfers => "no_native_transfers_in_payload",
            ClaimError::RuleNotMet => "rule_not_met",
            ClaimError::AlreadyClaimed => "already_claimed",
            ClaimError::Storage(_) => "storage_unavailable",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClaimSuccess {
    pub quest_id: &'static str,
    pub quest_key: String,
    pub hour_index: i64,
    pub rank: i64,
    pub streak: i64,
    pub awarded_badges: Vec<String>,
}

fn validate_inputs(wallet: &str, signature: &str) -> Result<(), ClaimError> {
    if Pubkey::from_str(wallet).is_err() {
        return Err(ClaimError::MalformedInput);
    }
    if signature.len() < MIN_SIGNATURE_LEN || signature.len() > MAX_SIGNATURE_LEN {
        return Err(ClaimError::MalformedInput);
    }
    Ok(())
}

/// The only state-mutating entry point for claims.
///
/// Malformed input is rejected before any lookup. Verification reads the
/// already-ingested transaction record; everything the claim earns is then
/// recorded in one storage transaction.
pub async fn submit_claim<S>(
    store: &S,
    pool: &QuestPool,
    creator: &str,
    wallet: &str,
    signature: &str,
    now: DateTime<Utc>,
) -> Result<ClaimSuccess, ClaimError>
where
    S: Store + EventStore,
{
    validate_inputs(wallet, signature)?;

    let active = pool.current_quest(now);

    let record = store
        .lookup_by_signature(signature)
        .await?
        .ok_or(ClaimError::SignatureNotIngested)?;

    verify::verify(&active.quest, wallet, creator, &record.payload).map_err(|f| match f {
        VerifyFailure::NoNativeTransfers => ClaimError::NoNativeTransfers,
        VerifyFailure::RuleNotMet => ClaimError::RuleNotMet,
    })?;

    let outcome = store
        .finalize_claim(&NewClaim {
            quest_key: active.quest_key.clone(),
            hour_index: active.hour_index,
            wallet: wallet.to_string(),
            signature: signature.to_string(),
            quest_id: active.quest.id,
            quest_badge_id: active.quest.badge_id,
        })
        .await?;

    match outcome {
        ClaimOutcome::AlreadyClaimed => Err(ClaimError::AlreadyClaimed),
        ClaimOutcome::Recorded(receipt) => {
            info!(
                wallet,
                quest = active.quest.id,
                seq = receipt.seq,
                rank = receipt.rank,
                streak = receipt.streak,
                awarded = receipt.awarded_badges.len(),
                "claim recorded"
            );
            Ok(ClaimSuccess {
                quest_id: active.quest.id,
                quest_key: active.quest_key,
                hour_index: active.hour_index,
                rank: receipt.rank,
                streak: receipt.streak,
                awarded_badges: receipt.awarded_badges,
            })
        }
    }
}

/// Fold one qualifying transfer into the wallet's reputation. Invoked by
/// the ingestion path, never directly by API callers.
pub async fn record_interaction<S: Store>(
    store: &S,
    interaction: NewInteraction,
) -> Result<InteractionOutcome, StoreError> {
    let outcome = store.record_interaction(&interaction).await?;
    info!(
        wallet = %interaction.wallet,
        kind = interaction.kind.as_str(),
        lamports = interaction.amount_lamports,
        interactions = outcome.memory.interactions,
        vibe = %outcome.memory.vibe,
        "interaction recorded"
    );
    Ok(outcome)
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressEntry {
    pub badge_id: &'static str,
    pub label: &'static str,
    pub category: BadgeCategory,
    pub have: i64,
    pub need: i64,
    pub unlocked: bool,
    pub remaining: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletProgress {
    pub wallet: String,
    pub interactions: i32,
    pub streak: i64,
    pub vibe: String,
    pub progress: Vec<ProgressEntry>,
}

/// Numeric progress toward every progress-trackable badge. `have` is
/// clamped to `need` for display; `unlocked` reflects the award table
/// independently (the two can diverge only transiently).
pub async fn wallet_progress<S: Store>(
    store: &S,
    pool: &QuestPool,
    wallet: &str,
    now: DateTime<Utc>,
) -> Result<WalletProgress, StoreError> {
    let memory = store.wallet_memory(wallet).await?;
    let interactions = memory.as_ref().map(|m| m.interactions).unwrap_or(0);
    let vibe = memory
        .map(|m| m.vibe)
        .unwrap_or_else(|| "neutral".to_string());

    let hours = store.claimed_hours(wallet).await?;
    let streak = streak_from_hours(&hours, QuestPool::hour_index(now));

    let held: Vec<String> = store
        .wallet_badges(wallet)
        .await?
        .into_iter()
        .map(|b| b.badge_id)
        .collect();

    let mut progress = Vec::new();
    for def in badges::CATALOG {
        let (have, need) = match def.category {
            BadgeCategory::Quest => {
                let done = hours
                    .iter()
                    .any(|h| pool.quest_for_hour(*h).badge_id == def.id);
                (i64::from(done), 1)
            }
            BadgeCategory::Streak => {
                let Some(need) = streak_need(def) else { continue };
                (streak, need)
            }
            BadgeCategory::Memory => {
                let Some(need) = memory_need(def) else { continue };
                (i64::from(interactions), need)
            }
            // Rank badges are earned in the moment, not progressed toward.
            BadgeCategory::Rarity => continue,
        };
        let have = have.min(need);
        progress.push(ProgressEntry {
            badge_id: def.id,
            label: def.label,
            category: def.category,
            have,
            need,
            unlocked: held.iter().any(|b| b == def.id),
            remaining: need - have,
        });
    }

    Ok(WalletProgress {
        wallet: wallet.to_string(),
        interactions,
        streak,
        vibe,
        progress,
    })
}

fn streak_need(def: &BadgeDefinition) -> Option<i64> {
    badges::STREAK_TIERS
        .iter()
        .find(|(_, id)| *id == def.id)
        .map(|(need, _)| *need)
}

fn memory_need(def: &BadgeDefinition) -> Option<i64> {
    badges::MEMORY_MILESTONES
        .iter()
        .find(|(_, id)| *id == def.id)
        .map(|(need, _)| i64::from(*need))
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestOverview {
    #[serde(flatten)]
    pub active: crate::quests::ActiveQuest,
    pub claim_count: i64,
    pub badge: Option<BadgeDefinition>,
    pub next: Vec<QuestPreview>,
    pub pool: Vec<QuestDefinition>,
}

pub async fn quest_overview<S: Store>(
    store: &S,
    pool: &QuestPool,
    now: DateTime<Utc>,
) -> Result<QuestOverview, StoreError> {
    let active = pool.current_quest(now);
    let claim_count = store.claim_count(&active.quest_key).await?;
    let badge = badges::badge(active.quest.badge_id).copied();
    Ok(QuestOverview {
        claim_count,
        badge,
        next: pool.preview(active.hour_index, 3),
        pool: pool.quests().to_vec(),
        active,
    })
}
