//! Order domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

/// Allowed drift between a submitted total and the recomputed item sum.
/// Totals arrive as JSON numbers, so exact equality is too strict.
const TOTAL_AMOUNT_EPSILON: f64 = 1e-6;

/// Lifecycle status of an order.
///
/// The wire form is the display string shown on the dashboard
/// (e.g. `"Out for Delivery"`). Transitions are free-form: operators may set
/// any status from any other, so no state machine is enforced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    #[serde(rename = "Out for Delivery")]
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::OutForDelivery => "Out for Delivery",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "Pending" => Ok(OrderStatus::Pending),
            "Confirmed" => Ok(OrderStatus::Confirmed),
            "Out for Delivery" => Ok(OrderStatus::OutForDelivery),
            "Delivered" => Ok(OrderStatus::Delivered),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown order status '{}'",
                other
            ))
            .into()),
        }
    }
}

/// How the order is to be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DeliveryType {
    #[default]
    Immediate,
    Scheduled,
}

impl DeliveryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryType::Immediate => "Immediate",
            DeliveryType::Scheduled => "Scheduled",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "Immediate" => Ok(DeliveryType::Immediate),
            "Scheduled" => Ok(DeliveryType::Scheduled),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown delivery type '{}'",
                other
            ))
            .into()),
        }
    }
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// Structured postal address, immutable after order creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Domain model representing one customer purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Opaque unique id, assigned by the store at creation.
    pub id: String,
    /// Store insertion sequence. Doubles as the change-feed resume token.
    pub seq: i64,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub delivery_type: DeliveryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    pub delivery_address: DeliveryAddress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating an order. Id, sequence and timestamps are assigned by
/// the store; status always starts at `Pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    #[serde(default)]
    pub delivery_type: DeliveryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    pub delivery_address: DeliveryAddress,
}

impl NewOrder {
    /// Validates the creation invariants: at least one item, quantities >= 1,
    /// non-negative prices, total equal to the item sum, and a scheduled time
    /// when the delivery type is `Scheduled`.
    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(ValidationError::MissingField("items".to_string()).into());
        }
        for item in &self.items {
            if item.name.trim().is_empty() {
                return Err(ValidationError::MissingField("items[].name".to_string()).into());
            }
            if item.quantity < 1 {
                return Err(ValidationError::InvalidInput(format!(
                    "Item '{}' has quantity {}, minimum is 1",
                    item.name, item.quantity
                ))
                .into());
            }
            if item.unit_price < 0.0 || !item.unit_price.is_finite() {
                return Err(ValidationError::InvalidInput(format!(
                    "Item '{}' has an invalid unit price",
                    item.name
                ))
                .into());
            }
        }

        if self.total_amount < 0.0 || !self.total_amount.is_finite() {
            return Err(
                ValidationError::InvalidInput("Total amount must be non-negative".into()).into(),
            );
        }
        let computed: f64 = self.items.iter().map(OrderItem::line_total).sum();
        if (computed - self.total_amount).abs() > TOTAL_AMOUNT_EPSILON {
            return Err(ValidationError::InvalidInput(format!(
                "Total amount {} does not match item sum {}",
                self.total_amount, computed
            ))
            .into());
        }

        if self.delivery_type == DeliveryType::Scheduled && self.scheduled_at.is_none() {
            return Err(ValidationError::MissingField("scheduledAt".to_string()).into());
        }

        if self.delivery_address.full_name.trim().is_empty() {
            return Err(
                ValidationError::MissingField("deliveryAddress.fullName".to_string()).into(),
            );
        }
        if self.delivery_address.street.trim().is_empty() {
            return Err(ValidationError::MissingField("deliveryAddress.street".to_string()).into());
        }

        Ok(())
    }
}
