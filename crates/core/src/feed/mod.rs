//! Change feed module.
//!
//! Defines the change-capture contract between the order store and the
//! server's watcher: one event per committed mutation, tagged with an
//! operation type and a monotonically increasing resume token. The SQLite
//! implementation lives in `orderdeck-storage-sqlite`.

mod change_event;
mod feed_traits;

pub use change_event::{ChangeEvent, ChangeOp, ResumeToken};
pub use feed_traits::{ChangeFeedSubscription, CheckpointStoreTrait, OrderChangeFeedTrait};
