//! Environment-driven configuration, read once at startup.

use std::str::FromStr;

use anyhow::{bail, Context};
use solana_sdk::pubkey::Pubkey;

/// Creator wallet the quests and the reputation ledger revolve around.
pub const DEFAULT_CREATOR_WALLET: &str = "6XiPyaiogYybJZUiryTR216io3YNrLfz1QhFPrELGWuA";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub creator_wallet: String,
    /// Bearer token for the ingestion webhook. Ingestion is disabled
    /// (503) until it is set.
    pub webhook_secret: Option<String>,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL missing. Set it in env vars.")?;

        let creator_wallet = std::env::var("CREATOR_WALLET")
            .unwrap_or_else(|_| DEFAULT_CREATOR_WALLET.to_string());
        if Pubkey::from_str(&creator_wallet).is_err() {
            bail!("CREATOR_WALLET is not a valid pubkey: {creator_wallet}");
        }

        let webhook_secret = std::env::var("WEBHOOK_SECRET")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        Ok(Self {
            database_url,
            creator_wallet,
            webhook_secret,
            host,
            port,
        })
    }
}
