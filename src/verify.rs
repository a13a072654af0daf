//! Claim verification: does an ingested transaction document prove the
//! wallet completed the quest?
//!
//! The payload is the enhanced-transaction JSON exactly as the webhook
//! delivered it; only its `nativeTransfers` entries matter here. The
//! predicate is an existential match over single transfers, with no
//! aggregation across entries.

use serde_json::Value;
use thiserror::Error;

use crate::quests::QuestDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyFailure {
    #[error("transaction carries no native transfers")]
    NoNativeTransfers,
    #[error("no transfer satisfies the quest rule")]
    RuleNotMet,
}

/// One native (SOL) transfer entry lifted out of the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeTransfer {
    pub from: String,
    pub to: String,
    pub lamports: i64,
}

/// Extract well-formed `nativeTransfers` entries. Entries with missing
/// accounts or non-positive amounts are skipped rather than rejected.
pub fn native_transfers(payload: &Value) -> Vec<NativeTransfer> {
    let Some(entries) = payload.get("nativeTransfers").and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|t| {
            let from = t.get("fromUserAccount")?.as_str()?;
            let to = t.get("toUserAccount")?.as_str()?;
            let lamports = t.get("amount")?.as_i64()?;
            if from.is_empty() || to.is_empty() || lamports <= 0 {
                return None;
            }
            Some(NativeTransfer {
                from: from.to_string(),
                to: to.to_string(),
                lamports,
            })
        })
        .collect()
}

/// A single transfer of at least the quest minimum, from the claiming
/// wallet to the creator, satisfies the quest.
pub fn verify(
    quest: &QuestDefinition,
    wallet: &str,
    creator: &str,
    payload: &Value,
) -> Result<(), VerifyFailure> {
    let transfers = native_transfers(payload);
    if transfers.is_empty() {
        return Err(VerifyFailure::NoNativeTransfers);
    }
    let satisfied = transfers
        .iter()
        .any(|t| t.from == wallet && t.to == creator && t.lamports >= quest.min_lamports);
    if satisfied {
        Ok(())
    } else {
        Err(VerifyFailure::RuleNotMet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const WALLET: &str = "WaLLetAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
    const CREATOR: &str = "CrEAtorBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB";

    fn quest(min_lamports: i64) -> QuestDefinition {
        QuestDefinition {
            id: "SIGNAL_CHECK",
            title: "SIGNAL CHECK",
            rule: "",
            min_lamports,
            badge_id: "SIGNAL_SENDER",
        }
    }

    fn payload(transfers: Vec<Value>) -> Value {
        json!({ "signature": "sig", "nativeTransfers": transfers })
    }

    fn transfer(from: &str, to: &str, amount: i64) -> Value {
        json!({ "fromUserAccount": from, "toUserAccount": to, "amount": amount })
    }

    #[test]
    fn missing_or_empty_transfers_fail_distinctly() {
        let quest = quest(100_000);
        assert_eq!(
            verify(&quest, WALLET, CREATOR, &json!({"signature": "sig"})),
            Err(VerifyFailure::NoNativeTransfers)
        );
        assert_eq!(
            verify(&quest, WALLET, CREATOR, &payload(vec![])),
            Err(VerifyFailure::NoNativeTransfers)
        );
    }

    #[test]
    fn qualifying_transfer_passes() {
        let p = payload(vec![transfer(WALLET, CREATOR, 200_000)]);
        assert_eq!(verify(&quest(100_000), WALLET, CREATOR, &p), Ok(()));
        // Threshold is inclusive.
        assert_eq!(verify(&quest(200_000), WALLET, CREATOR, &p), Ok(()));
    }

    #[test]
    fn below_minimum_or_wrong_parties_fail() {
        let p = payload(vec![transfer(WALLET, CREATOR, 200_000)]);
        assert_eq!(
            verify(&quest(200_001), WALLET, CREATOR, &p),
            Err(VerifyFailure::RuleNotMet)
        );

        let wrong_receiver = payload(vec![transfer(WALLET, "somebody-else", 200_000)]);
        assert_eq!(
            verify(&quest(100_000), WALLET, CREATOR, &wrong_receiver),
            Err(VerifyFailure::RuleNotMet)
        );

        let wrong_sender = payload(vec![transfer(CREATOR, WALLET, 200_000)]);
        assert_eq!(
            verify(&quest(100_000), WALLET, CREATOR, &wrong_sender),
            Err(VerifyFailure::RuleNotMet)
        );
    }

    #[test]
    fn one_qualifying_entry_among_many_is_enough() {
        let p = payload(vec![
            transfer("other", CREATOR, 1),
            transfer(WALLET, "other", 5_000_000),
            transfer(WALLET, CREATOR, 150_000),
        ]);
        assert_eq!(verify(&quest(100_000), WALLET, CREATOR, &p), Ok(()));
    }

    #[test]
    fn no_cross_transfer_aggregation() {
        // Two transfers summing past the minimum do not satisfy it.
        let p = payload(vec![
            transfer(WALLET, CREATOR, 60_000),
            transfer(WALLET, CREATOR, 60_000),
        ]);
        assert_eq!(
            verify(&quest(100_000), WALLET, CREATOR, &p),
            Err(VerifyFailure::RuleNotMet)
        );
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let p = payload(vec![
            json!({ "fromUserAccount": WALLET, "amount": 200_000 }),
            json!({ "fromUserAccount": WALLET, "toUserAccount": CREATOR, "amount": -5 }),
            json!("not an object"),
        ]);
        assert!(native_transfers(&p).is_empty());
        assert_eq!(
            verify(&quest(100_000), WALLET, CREATOR, &p),
            Err(VerifyFailure::NoNativeTransfers)
        );
    }
}
