// Copyright (c) 2022-2023 Yuki Kishimoto
// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

use std::time::Duration;

use nostr_engine_pool::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter("info,nostr_engine_pool::relay=debug")
        .init();

    let keys = Keys::generate();

    let pool = RelayPool::default();
    pool.add_relay("wss://relay.damus.io").await?;
    pool.add_relay("nos.lol").await?;

    let output = pool.connect().await;
    tracing::info!(success = output.success.len(), failed = output.failed.len(), "Connected.");

    // Stored notes
    let filter = Filter::new().kind(Kind::TEXT_NOTE).limit(10);
    let events = pool
        .fetch_events(vec![filter], Duration::from_secs(10))
        .await?;
    for event in events.iter() {
        tracing::info!(id = %event.id, created_at = %event.created_at, "Fetched event.");
    }

    // Live notes of our own key
    let mut sub = pool
        .subscribe(vec![Filter::new().author(keys.public_key())])
        .await;

    let event = EventBuilder::text_note("Hello from nostr-engine").sign_with_keys(&keys)?;
    let output = pool.send_event(&event, Duration::from_secs(10)).await?;
    tracing::info!(id = %output.id(), success = ?output.success, failed = ?output.failed, "Event sent.");

    if let Ok(Some(notification)) =
        tokio::time::timeout(Duration::from_secs(5), sub.recv()).await
    {
        tracing::info!(?notification, "Received notification.");
    }

    pool.unsubscribe(sub.ids()).await;
    pool.close_all().await;

    Ok(())
}
