use std::sync::Arc;

use log::debug;

use super::orders_model::{NewOrder, Order, OrderStatus};
use super::orders_traits::{OrderRepositoryTrait, OrderServiceTrait};
use crate::errors::Result;

/// Service for managing orders.
///
/// Validation happens here; persistence and change-feed emission are the
/// repository's concern.
pub struct OrderService {
    repository: Arc<dyn OrderRepositoryTrait>,
}

impl OrderService {
    /// Creates a new OrderService instance.
    pub fn new(repository: Arc<dyn OrderRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait::async_trait]
impl OrderServiceTrait for OrderService {
    /// Lists all orders, newest-created-first.
    fn get_orders(&self) -> Result<Vec<Order>> {
        self.repository.load_orders()
    }

    /// Retrieves an order by its id.
    fn get_order(&self, order_id: &str) -> Result<Order> {
        self.repository.get_order(order_id)
    }

    /// Validates and persists a new order. The committed insert is what the
    /// change feed picks up and the watcher broadcasts.
    async fn create_order(&self, new_order: NewOrder) -> Result<Order> {
        new_order.validate()?;
        debug!(
            "Creating order with {} item(s), total {}",
            new_order.items.len(),
            new_order.total_amount
        );
        self.repository.insert_order(new_order).await
    }

    /// Persists an operator status change. Emits a non-insert change event,
    /// which the watcher ignores.
    async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Result<Order> {
        self.repository.update_order_status(order_id, status).await
    }
}
