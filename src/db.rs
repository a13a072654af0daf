//! Connection pool and schema provisioning.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

/// Idempotent schema setup, run at startup.
///
/// The two UNIQUE constraints are load-bearing: `quest_claims` serializes
/// concurrent claims for the same (wallet, hour) and `wallet_badges` makes
/// awards idempotent. The `quest_claims.id` sequence is the claim rank
/// tie-break.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS raw_events (
            id          bigserial PRIMARY KEY,
            signature   text NOT NULL UNIQUE,
            block_time  bigint,
            payload     jsonb NOT NULL,
            created_at  timestamptz NOT NULL DEFAULT now()
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS wallet_memory (
            wallet        text PRIMARY KEY,
            first_seen    timestamptz NOT NULL,
            last_seen     timestamptz NOT NULL,
            interactions  int NOT NULL DEFAULT 0,
            lamports_in   bigint NOT NULL DEFAULT 0,
            lamports_out  bigint NOT NULL DEFAULT 0,
            vibe          text NOT NULL DEFAULT 'neutral'
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS wallet_events (
            id               bigserial PRIMARY KEY,
            wallet           text NOT NULL,
            signature        text NOT NULL,
            kind             text NOT NULL,
            amount_lamports  bigint NOT NULL,
            counterparty     text NOT NULL,
            block_time       bigint NOT NULL,
            created_at       timestamptz NOT NULL DEFAULT now()
        )
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS wallet_events_wallet_idx ON wallet_events(wallet)
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS wallet_badges (
            id          bigserial PRIMARY KEY,
            wallet      text NOT NULL,
            badge_id    text NOT NULL,
            reason      text NOT NULL,
            created_at  timestamptz NOT NULL DEFAULT now(),
            UNIQUE (wallet, badge_id)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS quest_claims (
            id          bigserial PRIMARY KEY,
            quest_key   text NOT NULL,
            hour_index  bigint NOT NULL,
            wallet      text NOT NULL,
            signature   text NOT NULL UNIQUE,
            created_at  timestamptz NOT NULL DEFAULT now(),
            UNIQUE (wallet, hour_index)
        )
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS quest_claims_quest_key_idx ON quest_claims(quest_key)
        "#,
    ];

    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("schema ready");
    Ok(())
}
