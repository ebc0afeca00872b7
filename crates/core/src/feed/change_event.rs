//! Change feed event types.

use serde::{Deserialize, Serialize};

use crate::orders::Order;

/// Opaque marker allowing a subscription to resume from a known point rather
/// than from "now". Backed by the store's insertion sequence.
pub type ResumeToken = i64;

/// Operation type of a committed store mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

/// One committed mutation against the orders collection.
///
/// Insert and update events carry the full document; the watcher only acts on
/// inserts and ignores the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub token: ResumeToken,
    pub op: ChangeOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
}

impl ChangeEvent {
    pub fn inserted(order: Order) -> Self {
        Self {
            token: order.seq,
            op: ChangeOp::Insert,
            order: Some(order),
        }
    }

    pub fn updated(order: Order) -> Self {
        Self {
            token: order.seq,
            op: ChangeOp::Update,
            order: Some(order),
        }
    }
}
