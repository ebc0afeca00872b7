//! Order persistence: Diesel models and the repository implementation.

pub mod model;
pub mod repository;

pub use repository::OrderRepository;
