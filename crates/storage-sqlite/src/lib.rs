//! SQLite storage implementation for Orderdeck.
//!
//! This crate provides all database-related functionality using Diesel ORM
//! with SQLite. It implements the repository, change-feed and checkpoint
//! traits defined in `orderdeck-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - The single-writer actor that serializes commits and publishes change
//!   events post-commit, in commit order
//! - The order change feed with resume-token replay
//!
//! This crate is the only place in the application where Diesel dependencies
//! exist. `core` and the server are database-agnostic and work with traits.

pub mod checkpoints;
pub mod db;
pub mod errors;
pub mod feed;
pub mod orders;
pub mod schema;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, write_actor::spawn_writer, DbConnection,
    DbPool, WriteHandle,
};

// Re-export storage errors
pub use errors::StorageError;

pub use checkpoints::CheckpointRepository;
pub use feed::SqliteChangeFeed;
pub use orders::OrderRepository;

// Re-export from orderdeck-core for convenience
pub use orderdeck_core::errors::{DatabaseError, Error, Result};
