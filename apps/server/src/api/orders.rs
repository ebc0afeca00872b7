//! Order endpoints.
//!
//! Responses use the dashboard envelope `{success, data, error}` rather than
//! the bare-body style of the other routes; the dashboard snapshot path keys
//! off `success` to decide between rendering and the error banner.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use orderdeck_core::errors::Error as CoreError;
use orderdeck_core::orders::{NewOrder, Order, OrderServiceTrait, OrderStatus};

use crate::error::ApiResult;
use crate::main_lib::AppState;

#[derive(Serialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Bulk fetch, newest-created-first. Failures are reported inside the
/// envelope so the dashboard can show them without parsing error bodies.
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ApiEnvelope<Vec<Order>>>) {
    match state.order_service.get_orders() {
        Ok(orders) => (StatusCode::OK, Json(ApiEnvelope::ok(orders))),
        Err(err) => {
            tracing::error!("Failed to load orders: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiEnvelope::err(format!("Server Error: {}", err))),
            )
        }
    }
}

pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewOrder>,
) -> (StatusCode, Json<ApiEnvelope<Order>>) {
    match state.order_service.create_order(payload).await {
        Ok(order) => (StatusCode::CREATED, Json(ApiEnvelope::ok(order))),
        Err(err @ CoreError::Validation(_)) => {
            (StatusCode::BAD_REQUEST, Json(ApiEnvelope::err(err.to_string())))
        }
        Err(err) => {
            tracing::error!("Failed to create order: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiEnvelope::err(format!("Server Error: {}", err))),
            )
        }
    }
}

#[derive(Deserialize)]
pub struct StatusUpdateBody {
    pub status: OrderStatus,
}

/// Operator status change. Persists the new status and lets the change feed
/// carry the update event; the watcher ignores non-inserts, so no push
/// notification results.
pub async fn update_order_status(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<StatusUpdateBody>,
) -> ApiResult<Json<Order>> {
    let updated = state
        .order_service
        .update_order_status(&id, body.status)
        .await?;
    Ok(Json(updated))
}
