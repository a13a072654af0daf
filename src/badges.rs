//! Static badge catalog and the pure award-decision rules.
//!
//! Awards themselves are idempotent storage inserts; everything here only
//! decides WHICH badges a given rank/streak/interaction-count earns.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BadgeCategory {
    Quest,
    Rarity,
    Streak,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BadgeRarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BadgeDefinition {
    pub id: &'static str,
    pub category: BadgeCategory,
    pub rarity: BadgeRarity,
    pub label: &'static str,
    pub description: &'static str,
}

pub const FIRST_CLAIMER: &str = "FIRST_CLAIMER";
pub const TOP3_CLAIMER: &str = "TOP3_CLAIMER";

/// Streak thresholds and their badges, ascending.
pub const STREAK_TIERS: &[(i64, &str)] = &[
    (2, "STREAK_2"),
    (3, "STREAK_3"),
    (5, "STREAK_5"),
    (10, "STREAK_10"),
];

/// Interaction-count milestones and their badges, ascending.
pub const MEMORY_MILESTONES: &[(i32, &str)] = &[
    (1, "FIRST_CONTACT"),
    (5, "REGULAR"),
    (10, "INNER_CIRCLE"),
];

pub const CATALOG: &[BadgeDefinition] = &[
    BadgeDefinition {
        id: "RESPECT_PAID",
        category: BadgeCategory::Quest,
        rarity: BadgeRarity::Common,
        label: "Respect Paid",
        description: "Completed the SHOW RESPECT quest.",
    },
    BadgeDefinition {
        id: "EARLY_SUPPORTER",
        category: BadgeCategory::Quest,
        rarity: BadgeRarity::Common,
        label: "Early Supporter",
        description: "Completed the FIRST BLOOD quest.",
    },
    BadgeDefinition {
        id: "SIGNAL_SENDER",
        category: BadgeCategory::Quest,
        rarity: BadgeRarity::Common,
        label: "Signal Sender",
        description: "Completed the SIGNAL CHECK quest.",
    },
    BadgeDefinition {
        id: "FIRST_CLAIMER",
        category: BadgeCategory::Rarity,
        rarity: BadgeRarity::Rare,
        label: "First Claimer",
        description: "First verified claim of a quest hour.",
    },
    BadgeDefinition {
        id: "TOP3_CLAIMER",
        category: BadgeCategory::Rarity,
        rarity: BadgeRarity::Uncommon,
        label: "Top 3 Claimer",
        description: "Claimed a quest among the first three wallets.",
    },
    BadgeDefinition {
        id: "STREAK_2",
        category: BadgeCategory::Streak,
        rarity: BadgeRarity::Common,
        label: "Back to Back",
        description: "Claimed quests in 2 consecutive hours.",
    },
    BadgeDefinition {
        id: "STREAK_3",
        category: BadgeCategory::Streak,
        rarity: BadgeRarity::Uncommon,
        label: "Hot Streak",
        description: "Claimed quests in 3 consecutive hours.",
    },
    BadgeDefinition {
        id: "STREAK_5",
        category: BadgeCategory::Streak,
        rarity: BadgeRarity::Rare,
        label: "Unstoppable",
        description: "Claimed quests in 5 consecutive hours.",
    },
    BadgeDefinition {
        id: "STREAK_10",
        category: BadgeCategory::Streak,
        rarity: BadgeRarity::Legendary,
        label: "Eternal Flame",
        description: "Claimed quests in 10 consecutive hours.",
    },
    BadgeDefinition {
        id: "FIRST_CONTACT",
        category: BadgeCategory::Memory,
        rarity: BadgeRarity::Common,
        label: "First Contact",
        description: "First recorded interaction with the creator wallet.",
    },
    BadgeDefinition {
        id: "REGULAR",
        category: BadgeCategory::Memory,
        rarity: BadgeRarity::Uncommon,
        label: "Regular",
        description: "5 recorded interactions with the creator wallet.",
    },
    BadgeDefinition {
        id: "INNER_CIRCLE",
        category: BadgeCategory::Memory,
        rarity: BadgeRarity::Rare,
        label: "Inner Circle",
        description: "10 recorded interactions with the creator wallet.",
    },
];

pub fn badge(id: &str) -> Option<&'static BadgeDefinition> {
    CATALOG.iter().find(|b| b.id == id)
}

/// A badge the engine has decided to award, with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeGrant {
    pub badge_id: String,
    pub reason: String,
}

impl BadgeGrant {
    fn new(badge_id: &str, reason: String) -> Self {
        Self { badge_id: badge_id.to_string(), reason }
    }
}

/// Badges earned by a verified claim: the quest's own badge, the rank
/// badges, and every streak tier at or below the current streak. Tiers the
/// wallet already holds resolve to no-ops at the storage layer.
pub fn badges_for_claim(quest_id: &str, quest_badge_id: &str, rank: i64, streak: i64) -> Vec<BadgeGrant> {
    let mut grants = vec![BadgeGrant::new(
        quest_badge_id,
        format!("completed quest {quest_id}"),
    )];
    if rank == 1 {
        grants.push(BadgeGrant::new(FIRST_CLAIMER, "claimed rank 1".to_string()));
    }
    if rank <= 3 {
        grants.push(BadgeGrant::new(TOP3_CLAIMER, format!("claimed rank {rank}")));
    }
    for (threshold, badge_id) in STREAK_TIERS {
        if streak >= *threshold {
            grants.push(BadgeGrant::new(badge_id, format!("{streak}-hour claim streak")));
        }
    }
    grants
}

/// Memory milestones crossed by an interaction-count change. Crossing is
/// `previous < threshold <= new`, so a backfilled jump past several
/// thresholds awards all of them, and re-reaching a count never re-fires.
pub fn milestones_crossed(previous: i32, new: i32) -> Vec<BadgeGrant> {
    MEMORY_MILESTONES
        .iter()
        .filter(|(threshold, _)| previous < *threshold && *threshold <= new)
        .map(|(threshold, badge_id)| {
            BadgeGrant::new(badge_id, format!("{threshold} interactions recorded"))
        })
        .collect()
}
