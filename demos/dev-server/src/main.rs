//! Development server: an in-memory account store seeded with a few
//! players, listening on one port.
//!
//! Point a client at `ws://127.0.0.1:8080` and log in as any seeded
//! account. Everything is lost on restart — that's the point.

use std::sync::Arc;

use mangrove::prelude::*;

/// Accounts available out of the box. Username / password.
const SEED_ACCOUNTS: &[(&str, &str)] = &[
    ("alice", "mango"),
    ("bob", "mango"),
    ("carol", "mango"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let store = Arc::new(MemoryAccountStore::new());
    for (username, password) in SEED_ACCOUNTS {
        match signup(store.as_ref(), username, password).await {
            SignupOutcome::Ok => tracing::info!(username, "seeded dev account"),
            other => tracing::warn!(username, reply = %other, "seeding failed"),
        }
    }

    let addr = std::env::var("MANGROVE_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let server = MangroveServerBuilder::new()
        .bind(&addr)
        .build(Arc::clone(&store))
        .await?;

    tracing::info!(%addr, "dev server listening");
    server.run().await?;
    Ok(())
}
