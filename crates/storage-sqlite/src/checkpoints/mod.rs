//! Watcher checkpoint persistence.

pub mod repository;

pub use repository::CheckpointRepository;
