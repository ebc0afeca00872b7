//! Client order view module.
//!
//! The in-memory state a dashboard client keeps: a one-time bulk snapshot
//! merged with the live push stream, two-dimensional filtering, and local
//! operator status edits.

mod order_view;


pub use order_view::{Filter, OrderView};
