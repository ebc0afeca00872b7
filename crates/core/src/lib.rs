//! Database-agnostic domain layer for the Orderdeck dashboard.
//!
//! This crate defines the order model, the repository and service traits the
//! storage layer implements, the change-feed contract consumed by the server's
//! watcher, and the client-side order view state machine. It has no Diesel or
//! HTTP dependencies; those live in `orderdeck-storage-sqlite` and
//! `orderdeck-server`.

pub mod errors;
pub mod feed;
pub mod orders;
pub mod view;

pub use errors::{DatabaseError, Error, Result, ValidationError};
