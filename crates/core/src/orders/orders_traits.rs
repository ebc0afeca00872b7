use async_trait::async_trait;

use crate::errors::Result;
use crate::orders::orders_model::{NewOrder, Order, OrderStatus};

/// Trait for order repository operations.
#[async_trait]
pub trait OrderRepositoryTrait: Send + Sync {
    /// Loads all orders, newest-created-first.
    fn load_orders(&self) -> Result<Vec<Order>>;

    /// Loads one order by id.
    fn get_order(&self, order_id: &str) -> Result<Order>;

    /// Inserts a new order and returns the stored record with its assigned
    /// id, sequence and timestamps.
    async fn insert_order(&self, new_order: NewOrder) -> Result<Order>;

    /// Sets the status of an existing order.
    async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Result<Order>;
}

/// Trait for order service operations.
#[async_trait]
pub trait OrderServiceTrait: Send + Sync {
    fn get_orders(&self) -> Result<Vec<Order>>;
    fn get_order(&self, order_id: &str) -> Result<Order>;
    async fn create_order(&self, new_order: NewOrder) -> Result<Order>;
    async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Result<Order>;
}
