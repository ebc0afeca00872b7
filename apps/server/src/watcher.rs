//! The order change watcher: bridges the store's change feed to the
//! broadcast hub.
//!
//! Subscribes once at startup (fatal if that fails), then forwards every
//! insert to the hub as a `new-order` event and checkpoints the resume token
//! so a restart replays whatever was missed instead of starting from "now".
//! Non-insert events are ignored by design: the notification layer only
//! announces new orders, never status edits made by other operators.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use orderdeck_core::feed::{
    ChangeFeedSubscription, ChangeOp, CheckpointStoreTrait, OrderChangeFeedTrait,
};

use crate::events::{ServerEvent, NEW_ORDER};
use crate::main_lib::AppState;

/// Checkpoint key for the singleton order watcher.
pub const ORDER_WATCHER: &str = "order-watcher";

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Opens the change-feed subscription and spawns the forwarding loop.
///
/// The initial subscription is awaited here so that a feed that cannot be
/// established aborts startup with a diagnostic instead of leaving the
/// process up with a silently non-real-time dashboard.
pub async fn start_order_watcher(state: Arc<AppState>) -> anyhow::Result<()> {
    let resume = state.checkpoints.load(ORDER_WATCHER)?;
    let subscription = state
        .change_feed
        .subscribe(resume)
        .await
        .context("Failed to open the order change feed subscription")?;
    tracing::info!(?resume, "Order change feed is now watching the orders collection");

    tokio::spawn(run_watcher(state, subscription));
    Ok(())
}

async fn run_watcher(state: Arc<AppState>, mut subscription: ChangeFeedSubscription) {
    let mut backoff = INITIAL_BACKOFF;
    loop {
        while let Some(event) = subscription.next().await {
            backoff = INITIAL_BACKOFF;
            if event.op != ChangeOp::Insert {
                continue;
            }
            let Some(order) = event.order else { continue };

            tracing::info!("New order detected: {}", order.id);
            match serde_json::to_value(&order) {
                Ok(payload) => state
                    .hub
                    .broadcast(ServerEvent::with_payload(NEW_ORDER, payload)),
                Err(err) => {
                    tracing::error!("Failed to serialize order {}: {}", order.id, err);
                    continue;
                }
            }

            // Checkpoint after broadcast: a crash in between replays the
            // insert, and clients collapse the duplicate by id.
            if let Err(err) = state.checkpoints.save(ORDER_WATCHER, event.token).await {
                tracing::warn!("Failed to persist watcher checkpoint: {}", err);
            }
        }

        // The feed closed underneath us. Resubscribe from the last persisted
        // token so replay covers the gap.
        loop {
            tracing::warn!("Order change feed ended, resubscribing in {:?}", backoff);
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(MAX_BACKOFF);

            let resume = match state.checkpoints.load(ORDER_WATCHER) {
                Ok(token) => token,
                Err(err) => {
                    tracing::warn!("Failed to load watcher checkpoint: {}", err);
                    continue;
                }
            };
            match state.change_feed.subscribe(resume).await {
                Ok(sub) => {
                    tracing::info!(?resume, "Order change feed resubscribed");
                    subscription = sub;
                    break;
                }
                Err(err) => {
                    tracing::warn!("Order change feed resubscription failed: {}", err);
                }
            }
        }
    }
}
