//! In-memory adapter mirroring the Postgres semantics, for engine tests:
//! same sequence-number assignment, conflict rules, and transactional
//! all-or-nothing effects (trivially, under one mutex).

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::badges;
use crate::memory::Vibe;
use crate::streak::streak_from_hours;

use super::{
    ActorRow, ClaimOutcome, ClaimReceipt, EventStore, InteractionOutcome, NewClaim,
    NewInteraction, QuestClaimRow, RawEvent, RawEventSummary, Store, StoreError, StoreStats,
    WalletBadgeRow, WalletEventRow, WalletMemoryRow,
};

#[derive(Default)]
struct Inner {
    raw_order: Vec<String>,
    raw: HashMap<String, RawEvent>,
    claims: Vec<QuestClaimRow>,
    next_claim_id: i64,
    memory: HashMap<String, WalletMemoryRow>,
    events: Vec<WalletEventRow>,
    badges: Vec<(String, WalletBadgeRow)>,
}

#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn award_in(inner: &mut Inner, wallet: &str, badge_id: &str, reason: &str) -> bool {
    let held = inner
        .badges
        .iter()
        .any(|(w, b)| w == wallet && b.badge_id == badge_id);
    if held {
        return false;
    }
    inner.badges.push((
        wallet.to_string(),
        WalletBadgeRow {
            badge_id: badge_id.to_string(),
            reason: reason.to_string(),
            created_at: Utc::now(),
        },
    ));
    true
}

#[async_trait]
impl EventStore for MemStore {
    async fn lookup_by_signature(&self, signature: &str) -> Result<Option<RawEvent>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.raw.get(signature).cloned())
    }

    async fn recent_records(&self, limit: i64) -> Result<Vec<RawEventSummary>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .raw_order
            .iter()
            .rev()
            .take(limit as usize)
            .filter_map(|sig| inner.raw.get(sig))
            .map(|r| RawEventSummary {
                signature: r.signature.clone(),
                block_time: r.block_time,
            })
            .collect())
    }

    async fn insert_raw_event(
        &self,
        signature: &str,
        block_time: Option<i64>,
        payload: &Value,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.raw.contains_key(signature) {
            return Ok(false);
        }
        inner.raw_order.push(signature.to_string());
        inner.raw.insert(
            signature.to_string(),
            RawEvent {
                signature: signature.to_string(),
                block_time,
                payload: payload.clone(),
            },
        );
        Ok(true)
    }
}

#[async_trait]
impl Store for MemStore {
    async fn finalize_claim(&self, claim: &NewClaim) -> Result<ClaimOutcome, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        let conflict = inner.claims.iter().any(|c| {
            (c.wallet == claim.wallet && c.hour_index == claim.hour_index)
                || c.signature == claim.signature
        });
        if conflict {
            return Ok(ClaimOutcome::AlreadyClaimed);
        }

        inner.next_claim_id += 1;
        let seq = inner.next_claim_id;
        inner.claims.push(QuestClaimRow {
            id: seq,
            quest_key: claim.quest_key.clone(),
            hour_index: claim.hour_index,
            wallet: claim.wallet.clone(),
            signature: claim.signature.clone(),
            created_at: Utc::now(),
        });

        let earlier = inner
            .claims
            .iter()
            .filter(|c| c.quest_key == claim.quest_key && c.id < seq)
            .count() as i64;
        let rank = earlier + 1;

        let hours: Vec<i64> = inner
            .claims
            .iter()
            .filter(|c| c.wallet == claim.wallet)
            .map(|c| c.hour_index)
            .collect();
        let streak = streak_from_hours(&hours, claim.hour_index);

        let mut awarded_badges = Vec::new();
        for grant in badges::badges_for_claim(claim.quest_id, claim.quest_badge_id, rank, streak) {
            if award_in(&mut inner, &claim.wallet, &grant.badge_id, &grant.reason) {
                awarded_badges.push(grant.badge_id);
            }
        }

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
        let mut inner = self.inner.lock().unwrap();
        let (lamports_in, lamports_out) = interaction.kind.deltas(interaction.amount_lamports);
        let seen_at = chrono::DateTime::from_timestamp(interaction.block_time, 0)
            .unwrap_or_else(Utc::now);

        let entry = inner
            .memory
            .entry(interaction.wallet.clone())
            .and_modify(|m| {
                m.interactions += 1;
                m.lamports_in += lamports_in;
                m.lamports_out += lamports_out;
                m.last_seen = m.last_seen.max(seen_at);
            })
            .or_insert(WalletMemoryRow {
                wallet: interaction.wallet.clone(),
                first_seen: seen_at,
                last_seen: seen_at,
                interactions: 1,
                lamports_in,
                lamports_out,
                vibe: Vibe::Neutral.as_str().to_string(),
            });
        entry.vibe = Vibe::classify(entry.lamports_in, entry.lamports_out)
            .as_str()
            .to_string();
        let memory = entry.clone();

        inner.events.push(WalletEventRow {
            wallet: interaction.wallet.clone(),
            signature: interaction.signature.clone(),
            kind: interaction.kind.as_str().to_string(),
            amount_lamports: interaction.amount_lamports,
            counterparty: interaction.counterparty.clone(),
            block_time: interaction.block_time,
            created_at: Utc::now(),
        });

        let previous = memory.interactions - 1;
        let mut awarded_badges = Vec::new();
        for grant in badges::milestones_crossed(previous, memory.interactions) {
            if award_in(&mut inner, &interaction.wallet, &grant.badge_id, &grant.reason) {
                awarded_badges.push(grant.badge_id);
            }
        }

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
        let mut inner = self.inner.lock().unwrap();
        Ok(award_in(&mut inner, wallet, badge_id, reason))
    }

    async fn claim_count(&self, quest_key: &str) -> Result<i64, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .claims
            .iter()
            .filter(|c| c.quest_key == quest_key)
            .count() as i64)
    }

    async fn claims_for_quest(
        &self,
        quest_key: &str,
        limit: i64,
    ) -> Result<Vec<QuestClaimRow>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<QuestClaimRow> = inner
            .claims
            .iter()
            .filter(|c| c.quest_key == quest_key)
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.id);
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn claimed_hours(&self, wallet: &str) -> Result<Vec<i64>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut hours: Vec<i64> = inner
            .claims
            .iter()
            .filter(|c| c.wallet == wallet)
            .map(|c| c.hour_index)
            .collect();
        hours.sort_unstable();
        hours.dedup();
        Ok(hours)
    }

    async fn wallet_memory(&self, wallet: &str) -> Result<Option<WalletMemoryRow>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.memory.get(wallet).cloned())
    }

    async fn wallet_badges(&self, wallet: &str) -> Result<Vec<WalletBadgeRow>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .badges
            .iter()
            .filter(|(w, _)| w == wallet)
            .map(|(_, b)| b.clone())
            .collect())
    }

    async fn wallet_events(
        &self,
        wallet: &str,
        limit: i64,
    ) -> Result<Vec<WalletEventRow>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .events
            .iter()
            .rev()
            .filter(|e| e.wallet == wallet)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn top_actors(&self, limit: i64) -> Result<Vec<ActorRow>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut actors: Vec<ActorRow> = inner
            .memory
            .values()
            .map(|m| ActorRow {
                wallet: m.wallet.clone(),
                vibe: m.vibe.clone(),
                interactions: m.interactions,
                badge_count: inner.badges.iter().filter(|(w, _)| *w == m.wallet).count() as i64,
            })
            .collect();
        actors.sort_by(|a, b| b.interactions.cmp(&a.interactions));
        actors.truncate(limit as usize);
        Ok(actors)
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(StoreStats {
            raw_count: inner.raw.len() as i64,
            claim_count: inner.claims.len() as i64,
        })
    }
}
