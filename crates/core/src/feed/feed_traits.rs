use async_trait::async_trait;
use tokio::sync::mpsc;

use super::change_event::{ChangeEvent, ResumeToken};
use crate::errors::Result;

/// A live change-feed subscription.
///
/// Events arrive in store commit order. The stream ends when the feed shuts
/// down; subscribers are expected to resubscribe from their last seen token.
pub struct ChangeFeedSubscription {
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
}

impl ChangeFeedSubscription {
    pub fn new(rx: mpsc::UnboundedReceiver<ChangeEvent>) -> Self {
        Self { rx }
    }

    /// Receives the next change event, or `None` once the feed has closed.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }
}

/// Trait for subscribing to committed order mutations.
#[async_trait]
pub trait OrderChangeFeedTrait: Send + Sync {
    /// Opens a subscription. With `resume_after`, mutations committed after
    /// that token are replayed first (as insert events), then live events
    /// follow with no gap and no duplicates.
    async fn subscribe(&self, resume_after: Option<ResumeToken>)
        -> Result<ChangeFeedSubscription>;
}

/// Trait for persisting a watcher's last processed resume token, so a restart
/// can request replay instead of resubscribing from "now".
#[async_trait]
pub trait CheckpointStoreTrait: Send + Sync {
    fn load(&self, watcher: &str) -> Result<Option<ResumeToken>>;
    async fn save(&self, watcher: &str, token: ResumeToken) -> Result<()>;
}
