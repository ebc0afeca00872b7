//! Order change feed over the SQLite store.
//!
//! The writer actor publishes one event per committed mutation into a
//! broadcast channel. Subscribers get their own forwarding task which can
//! first replay rows committed after a resume token, then hand off to the
//! live channel with no gap and no duplicates. Inserts are keyed by the
//! monotonically increasing `seq` column, which doubles as the resume token.

use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use log::warn;
use tokio::sync::{broadcast, mpsc};

use orderdeck_core::errors::Result;
use orderdeck_core::feed::{
    ChangeEvent, ChangeFeedSubscription, ChangeOp, OrderChangeFeedTrait, ResumeToken,
};
use orderdeck_core::orders::Order;

use crate::db::{get_connection, DbPool};
use crate::errors::StorageError;
use crate::orders::model::OrderDB;
use crate::schema::orders;

const LIVE_CHANNEL_CAPACITY: usize = 256;

/// Sending side of the feed, held by the writer actor.
#[derive(Clone)]
pub struct ChangeFeedPublisher {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeedPublisher {
    /// Publishes one committed mutation. Lagging subscribers are not waited
    /// on; they recover by re-querying (see the subscriber task).
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }
}

/// Change feed handle: subscription side plus publisher construction.
pub struct SqliteChangeFeed {
    pool: Arc<DbPool>,
    tx: broadcast::Sender<ChangeEvent>,
}

impl SqliteChangeFeed {
    pub fn new(pool: Arc<DbPool>) -> Self {
        let (tx, _rx) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        Self { pool, tx }
    }

    /// Returns the publisher handle to wire into the writer actor.
    pub fn publisher(&self) -> ChangeFeedPublisher {
        ChangeFeedPublisher {
            tx: self.tx.clone(),
        }
    }
}

#[async_trait]
impl OrderChangeFeedTrait for SqliteChangeFeed {
    async fn subscribe(
        &self,
        resume_after: Option<ResumeToken>,
    ) -> Result<ChangeFeedSubscription> {
        // Attach to the live channel before querying the replay range, so
        // nothing committed in between is missed. The overlap is resolved by
        // the `last_insert` high-water mark below.
        let mut live = self.tx.subscribe();
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        let mut last_insert = resume_after.unwrap_or(0);
        if let Some(token) = resume_after {
            for order in load_inserts_after(&self.pool, token)? {
                last_insert = order.seq;
                if out_tx.send(ChangeEvent::inserted(order)).is_err() {
                    return Ok(ChangeFeedSubscription::new(out_rx));
                }
            }
        }

        let pool = self.pool.clone();
        tokio::spawn(async move {
            loop {
                match live.recv().await {
                    Ok(event) => {
                        // Replay overlap: drop inserts already delivered.
                        // Updates pass through regardless; their tokens refer
                        // to older rows and carry no ordering obligation here.
                        if event.op == ChangeOp::Insert {
                            if event.token <= last_insert {
                                continue;
                            }
                            last_insert = event.token;
                        }
                        if out_tx.send(event).is_err() {
                            return;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        // Too slow for the live channel: re-sync inserts from
                        // the store. Missed update events are dropped, which
                        // the watcher ignores anyway.
                        warn!("Change feed subscriber lagged by {missed} events, re-syncing");
                        let replayed = load_inserts_after(&pool, last_insert);
                        match replayed {
                            Ok(rows) => {
                                for order in rows {
                                    last_insert = order.seq;
                                    if out_tx.send(ChangeEvent::inserted(order)).is_err() {
                                        return;
                                    }
                                }
                            }
                            Err(err) => {
                                warn!("Change feed re-sync failed: {err}");
                                return;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        });

        Ok(ChangeFeedSubscription::new(out_rx))
    }
}

/// Loads orders committed after `after`, oldest first.
fn load_inserts_after(pool: &DbPool, after: ResumeToken) -> Result<Vec<Order>> {
    let mut conn = get_connection(pool)?;
    let rows = orders::table
        .filter(orders::seq.gt(after))
        .order(orders::seq.asc())
        .load::<OrderDB>(&mut conn)
        .map_err(StorageError::from)?;
    rows.into_iter().map(Order::try_from).collect()
}
