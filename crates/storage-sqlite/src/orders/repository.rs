use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::dsl::max;
use diesel::prelude::*;
use diesel::SqliteConnection;
use uuid::Uuid;

use orderdeck_core::errors::Result;
use orderdeck_core::feed::ChangeEvent;
use orderdeck_core::orders::{NewOrder, Order, OrderRepositoryTrait, OrderStatus};

use super::model::OrderDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::orders;

/// SQLite-backed order repository.
///
/// Reads go straight to the pool; writes go through the single-writer actor,
/// which also publishes the queued change events after commit.
pub struct OrderRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl OrderRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        OrderRepository { pool, writer }
    }
}

#[async_trait]
impl OrderRepositoryTrait for OrderRepository {
    fn load_orders(&self) -> Result<Vec<Order>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = orders::table
            .order(orders::seq.desc())
            .load::<OrderDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(Order::try_from).collect()
    }

    fn get_order(&self, order_id: &str) -> Result<Order> {
        let mut conn = get_connection(&self.pool)?;
        let row = orders::table
            .find(order_id)
            .first::<OrderDB>(&mut conn)
            .map_err(StorageError::from)?;
        Order::try_from(row)
    }

    async fn insert_order(&self, new_order: NewOrder) -> Result<Order> {
        self.writer
            .exec(move |conn: &mut SqliteConnection, changes| -> Result<Order> {
                // The writer serializes all inserts, so read-then-increment
                // of the sequence is race-free.
                let last_seq: Option<i64> = orders::table
                    .select(max(orders::seq))
                    .first(conn)
                    .map_err(StorageError::from)?;
                let now = Utc::now();

                let order = Order {
                    id: Uuid::new_v4().to_string(),
                    seq: last_seq.unwrap_or(0) + 1,
                    items: new_order.items,
                    total_amount: new_order.total_amount,
                    status: OrderStatus::Pending,
                    delivery_type: new_order.delivery_type,
                    scheduled_at: new_order.scheduled_at,
                    delivery_address: new_order.delivery_address,
                    created_at: now,
                    updated_at: now,
                };

                let row = OrderDB::try_from(&order)?;
                diesel::insert_into(orders::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                changes.push(ChangeEvent::inserted(order.clone()));
                Ok(order)
            })
            .await
    }

    async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Result<Order> {
        let order_id = order_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection, changes| -> Result<Order> {
                let now = Utc::now().to_rfc3339();
                diesel::update(orders::table.find(&order_id))
                    .set((
                        orders::status.eq(status.as_str()),
                        orders::updated_at.eq(&now),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let row = orders::table
                    .find(&order_id)
                    .first::<OrderDB>(conn)
                    .map_err(StorageError::from)?;
                let order = Order::try_from(row)?;

                changes.push(ChangeEvent::updated(order.clone()));
                Ok(order)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, write_actor::spawn_writer};
    use crate::feed::SqliteChangeFeed;
    use orderdeck_core::orders::{DeliveryAddress, DeliveryType, OrderItem};
    use tempfile::tempdir;

    /// Creates a repository plus its change feed over a temp database.
    /// The temp dir is returned to keep the database alive.
    fn create_test_repository() -> (OrderRepository, SqliteChangeFeed, tempfile::TempDir) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let db_path_str = db_path.to_string_lossy().to_string();

        let pool = create_pool(&db_path_str).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");

        let feed = SqliteChangeFeed::new(Arc::clone(&pool));
        let writer = spawn_writer((*pool).clone(), feed.publisher());

        let repo = OrderRepository::new(Arc::clone(&pool), writer);
        (repo, feed, temp_dir)
    }

    fn new_order(name: &str, unit_price: f64) -> NewOrder {
        NewOrder {
            items: vec![OrderItem {
                name: name.to_string(),
                quantity: 2,
                unit_price,
            }],
            total_amount: unit_price * 2.0,
            delivery_type: DeliveryType::Immediate,
            scheduled_at: None,
            delivery_address: DeliveryAddress {
                full_name: "Nina Park".to_string(),
                street: "5 Gangnam-daero".to_string(),
                city: "Seoul".to_string(),
                postal_code: "06035".to_string(),
                phone: Some("+82-10-0000-0000".to_string()),
            },
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_id_sequence_and_pending_status() {
        let (repo, _feed, _temp_dir) = create_test_repository();

        let first = repo.insert_order(new_order("Bibimbap", 10.0)).await.unwrap();
        let second = repo.insert_order(new_order("Kimchi", 4.0)).await.unwrap();

        assert!(!first.id.is_empty());
        assert_ne!(first.id, second.id);
        assert_eq!(first.seq, 1);
        assert_eq!(second.seq, 2);
        assert_eq!(first.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_load_orders_is_newest_first() {
        let (repo, _feed, _temp_dir) = create_test_repository();

        let first = repo.insert_order(new_order("A", 1.0)).await.unwrap();
        let second = repo.insert_order(new_order("B", 2.0)).await.unwrap();
        let third = repo.insert_order(new_order("C", 3.0)).await.unwrap();

        let listed = repo.load_orders().unwrap();
        let ids: Vec<&str> = listed.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec![third.id.as_str(), second.id.as_str(), first.id.as_str()]);
    }

    #[tokio::test]
    async fn test_round_trip_preserves_items_and_address() {
        let (repo, _feed, _temp_dir) = create_test_repository();

        let created = repo.insert_order(new_order("Japchae", 8.5)).await.unwrap();
        let loaded = repo.get_order(&created.id).unwrap();

        assert_eq!(loaded, created);
        assert_eq!(loaded.items[0].name, "Japchae");
        assert_eq!(loaded.delivery_address.city, "Seoul");
    }

    #[tokio::test]
    async fn test_update_status_persists_and_touches_updated_at() {
        let (repo, _feed, _temp_dir) = create_test_repository();

        let created = repo.insert_order(new_order("Mandu", 6.0)).await.unwrap();
        let updated = repo
            .update_order_status(&created.id, OrderStatus::OutForDelivery)
            .await
            .unwrap();

        assert_eq!(updated.status, OrderStatus::OutForDelivery);
        assert!(updated.updated_at >= created.updated_at);

        let reloaded = repo.get_order(&created.id).unwrap();
        assert_eq!(reloaded.status, OrderStatus::OutForDelivery);
    }

    #[tokio::test]
    async fn test_update_of_missing_order_is_not_found() {
        let (repo, _feed, _temp_dir) = create_test_repository();
        let result = repo
            .update_order_status("no-such-id", OrderStatus::Cancelled)
            .await;
        assert!(result.is_err());
    }
}
