//! Webhook ingestion: raw enhanced-transaction documents land in the event
//! store, and every native transfer touching the creator wallet is folded
//! into the reputation ledger.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use metrics::counter;
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::engine;
use crate::memory::InteractionKind;
use crate::state::AppState;
use crate::store::{EventStore, NewInteraction};

/// One transfer between the creator and some wallet, from the wallet's
/// point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatorTransfer {
    pub wallet: String,
    pub kind: InteractionKind,
    pub lamports: i64,
    pub counterparty: String,
}

/// Native transfers in the payload that involve the creator wallet.
/// Self-transfers and non-positive amounts are skipped.
pub fn creator_transfers(payload: &Value, creator: &str) -> Vec<CreatorTransfer> {
    crate::verify::native_transfers(payload)
        .into_iter()
        .filter_map(|t| {
            if t.from == creator && t.to != creator {
                Some(CreatorTransfer {
                    wallet: t.to,
                    kind: InteractionKind::SolFromCreator,
                    lamports: t.lamports,
                    counterparty: creator.to_string(),
                })
            } else if t.to == creator && t.from != creator {
                Some(CreatorTransfer {
                    wallet: t.from,
                    kind: InteractionKind::SolToCreator,
                    lamports: t.lamports,
                    counterparty: creator.to_string(),
                })
            } else {
                None
            }
        })
        .collect()
}

fn signature_of(tx: &Value) -> Option<String> {
    tx.get("signature")
        .or_else(|| tx.get("transactionSignature"))
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn block_time_of(tx: &Value) -> Option<i64> {
    ["timestamp", "blockTime", "block_time"]
        .iter()
        .find_map(|k| tx.get(*k).and_then(Value::as_i64))
}

fn authorized(headers: &HeaderMap, secret: &str) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim() == format!("Bearer {secret}"))
        .unwrap_or(false)
}

/// `POST /webhook/helius` — the only writer into the event store.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let Some(secret) = state.config.webhook_secret.as_deref() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "ok": false, "error": "webhook_secret_not_configured" })),
        );
    };
    if !authorized(&headers, secret) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "ok": false, "error": "unauthorized" })),
        );
    }

    let Some(txs) = body.as_array() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": "expected array payload" })),
        );
    };

    let mut inserted = 0usize;
    for tx in txs {
        let Some(signature) = signature_of(tx) else {
            warn!("skipping webhook document without signature");
            continue;
        };
        let block_time = block_time_of(tx);

        let fresh = match state
            .store
            .insert_raw_event(&signature, block_time, tx)
            .await
        {
            Ok(fresh) => fresh,
            Err(e) => {
                error!(error = %e, "raw event insert failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "ok": false, "error": "storage_unavailable" })),
                );
            }
        };
        if !fresh {
            // Webhook redelivery; the ledger already saw this transaction.
            continue;
        }
        inserted += 1;
        counter!("ingest_events_total").increment(1);

        let at = block_time.unwrap_or_else(|| chrono::Utc::now().timestamp());
        for transfer in creator_transfers(tx, &state.config.creator_wallet) {
            let result = engine::record_interaction(
                state.store.as_ref(),
                NewInteraction {
                    wallet: transfer.wallet,
                    signature: signature.clone(),
                    kind: transfer.kind,
                    amount_lamports: transfer.lamports,
                    counterparty: transfer.counterparty,
                    block_time: at,
                },
            )
            .await;
            match result {
                Ok(outcome) => {
                    counter!("interactions_recorded_total").increment(1);
                    counter!("badges_awarded_total")
                        .increment(outcome.awarded_badges.len() as u64);
                }
                Err(e) => {
                    error!(error = %e, "interaction record failed");
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "ok": false, "error": "storage_unavailable" })),
                    );
                }
            }
        }
    }

    (StatusCode::OK, Json(json!({ "ok": true, "inserted": inserted })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CREATOR: &str = "CrEAtorBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB";

    #[test]
    fn transfers_touching_the_creator_are_classified_by_direction() {
        let payload = json!({
            "nativeTransfers": [
                { "fromUserAccount": "alice", "toUserAccount": CREATOR, "amount": 500_000 },
                { "fromUserAccount": CREATOR, "toUserAccount": "bob", "amount": 250_000 },
                { "fromUserAccount": "alice", "toUserAccount": "bob", "amount": 999 },
                { "fromUserAccount": CREATOR, "toUserAccount": CREATOR, "amount": 10 }
            ]
        });
        let transfers = creator_transfers(&payload, CREATOR);
        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[0].wallet, "alice");
        assert_eq!(transfers[0].kind, InteractionKind::SolToCreator);
        assert_eq!(transfers[0].lamports, 500_000);
        assert_eq!(transfers[1].wallet, "bob");
        assert_eq!(transfers[1].kind, InteractionKind::SolFromCreator);
        assert_eq!(transfers[1].lamports, 250_000);
    }

    #[test]
    fn signature_fallback_and_trimming() {
        assert_eq!(
            signature_of(&json!({ "signature": " sig-a " })),
            Some("sig-a".to_string())
        );
        assert_eq!(
            signature_of(&json!({ "transactionSignature": "sig-b" })),
            Some("sig-b".to_string())
        );
        assert_eq!(signature_of(&json!({ "signature": "" })), None);
        assert_eq!(signature_of(&json!({})), None);
    }

    #[test]
    fn block_time_reads_any_of_the_known_keys() {
        assert_eq!(block_time_of(&json!({ "timestamp": 5 })), Some(5));
        assert_eq!(block_time_of(&json!({ "blockTime": 6 })), Some(6));
        assert_eq!(block_time_of(&json!({ "block_time": 7 })), Some(7));
        assert_eq!(block_time_of(&json!({})), None);
    }
}
