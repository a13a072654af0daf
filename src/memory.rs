//! Reputation ledger primitives: interaction kinds and the vibe
//! classification over cumulative value flow.

use serde::Serialize;

/// Minimum one-directional flow (0.01 SOL) before a wallet leaves neutral.
pub const VIBE_FLOOR_LAMPORTS: i64 = 10_000_000;

/// Coarse net-flow classification relative to the creator wallet.
///
/// Recomputed from absolute cumulative totals on every update, with no
/// hysteresis, so it can flip repeatedly as the sums evolve. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Vibe {
    Neutral,
    Supporter,
    Beneficiary,
}

impl Vibe {
    /// The 1.5x dominance rule in exact integer arithmetic:
    /// `out > in * 1.5` becomes `out * 2 > in * 3`.
    pub fn classify(lamports_in: i64, lamports_out: i64) -> Self {
        if lamports_out * 2 > lamports_in * 3 && lamports_out > VIBE_FLOOR_LAMPORTS {
            Vibe::Supporter
        } else if lamports_in * 2 > lamports_out * 3 && lamports_in > VIBE_FLOOR_LAMPORTS {
            Vibe::Beneficiary
        } else {
            Vibe::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Vibe::Neutral => "neutral",
            Vibe::Supporter => "supporter",
            Vibe::Beneficiary => "beneficiary",
        }
    }
}

/// Direction of one qualifying transfer, from the wallet's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    /// The wallet sent SOL to the creator.
    SolToCreator,
    /// The creator sent SOL to the wallet.
    SolFromCreator,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::SolToCreator => "sol_to_creator",
            InteractionKind::SolFromCreator => "sol_from_creator",
        }
    }

    /// (lamports_in, lamports_out) deltas for the wallet's running sums.
    pub fn deltas(&self, lamports: i64) -> (i64, i64) {
        match self {
            InteractionKind::SolToCreator => (0, lamports),
            InteractionKind::SolFromCreator => (lamports, 0),
        }
    }
}

pub fn lamports_to_sol(lamports: i64) -> f64 {
    lamports as f64 / 1e9
}
