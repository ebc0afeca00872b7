//! Database models for orders.
//!
//! Items and the delivery address are stored as JSON text; timestamps are
//! RFC3339 text columns, matching their wire form.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use orderdeck_core::errors::{Error, ValidationError};
use orderdeck_core::orders::{DeliveryType, Order, OrderStatus};

use crate::errors::StorageError;

/// Database model for one order row.
#[derive(Queryable, Identifiable, Insertable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OrderDB {
    pub id: String,
    pub seq: i64,
    pub items: String,
    pub total_amount: f64,
    pub status: String,
    pub delivery_type: String,
    pub scheduled_at: Option<String>,
    pub delivery_address: String,
    pub created_at: String,
    pub updated_at: String,
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>, Error> {
    let parsed = DateTime::parse_from_rfc3339(value).map_err(ValidationError::from)?;
    Ok(parsed.with_timezone(&Utc))
}

impl TryFrom<OrderDB> for Order {
    type Error = Error;

    fn try_from(db: OrderDB) -> Result<Self, Error> {
        let scheduled_at = db
            .scheduled_at
            .as_deref()
            .map(parse_datetime)
            .transpose()?;
        Ok(Order {
            items: serde_json::from_str(&db.items)
                .map_err(|e| Error::from(StorageError::from(e)))?,
            delivery_address: serde_json::from_str(&db.delivery_address)
                .map_err(|e| Error::from(StorageError::from(e)))?,
            status: OrderStatus::parse(&db.status)?,
            delivery_type: DeliveryType::parse(&db.delivery_type)?,
            scheduled_at,
            created_at: parse_datetime(&db.created_at)?,
            updated_at: parse_datetime(&db.updated_at)?,
            id: db.id,
            seq: db.seq,
            total_amount: db.total_amount,
        })
    }
}

impl TryFrom<&Order> for OrderDB {
    type Error = Error;

    fn try_from(order: &Order) -> Result<Self, Error> {
        Ok(OrderDB {
            id: order.id.clone(),
            seq: order.seq,
            items: serde_json::to_string(&order.items)
                .map_err(|e| Error::from(StorageError::from(e)))?,
            total_amount: order.total_amount,
            status: order.status.as_str().to_string(),
            delivery_type: order.delivery_type.as_str().to_string(),
            scheduled_at: order.scheduled_at.map(|dt| dt.to_rfc3339()),
            delivery_address: serde_json::to_string(&order.delivery_address)
                .map_err(|e| Error::from(StorageError::from(e)))?,
            created_at: order.created_at.to_rfc3339(),
            updated_at: order.updated_at.to_rfc3339(),
        })
    }
}
