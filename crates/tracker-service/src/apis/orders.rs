//! Order API endpoint implementations.
//!
//! Handlers translate between HTTP and the order service: request bodies
//! in, order records out, and service errors mapped to status-coded JSON
//! error responses. Business rule violations surface as 422, a missing
//! order id as 404, malformed identifiers as 400 and everything else as
//! a generic 500.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::Json,
};
use tracker_order::OrderError;
use tracker_types::{APIError, CreateOrderRequest, Order, OrderStatus, UpdateOrderStatusRequest};
use uuid::Uuid;

use crate::server::AppState;

/// Maps order service errors to status-coded API errors.
fn map_order_error(e: OrderError) -> APIError {
	match e {
		OrderError::NotFound(_) => APIError::NotFound {
			error_type: "ORDER_NOT_FOUND".to_string(),
			message: e.to_string(),
		},
		OrderError::Transition(_) => APIError::UnprocessableEntity {
			error_type: "INVALID_TRANSITION".to_string(),
			message: e.to_string(),
		},
		OrderError::Invalid(_) => APIError::BadRequest {
			error_type: "INVALID_ORDER".to_string(),
			message: e.to_string(),
		},
		OrderError::Storage(_) => {
			tracing::error!(error = %e, "Order request failed");
			APIError::InternalServerError {
				error_type: "INTERNAL_ERROR".to_string(),
				message: "Internal server error".to_string(),
			}
		}
	}
}

/// Handles POST /orders requests.
pub async fn create_order(
	State(state): State<AppState>,
	Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), APIError> {
	let order = state
		.orders
		.create(&request.customer_name, request.amount)
		.await
		.map_err(map_order_error)?;
	Ok((StatusCode::CREATED, Json(order)))
}

/// Handles GET /orders requests.
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>, APIError> {
	Ok(Json(state.orders.list().await.map_err(map_order_error)?))
}

/// Handles GET /orders/{id} requests.
pub async fn get_order(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<Order>, APIError> {
	let id = parse_order_id(&id)?;
	Ok(Json(state.orders.get(id).await.map_err(map_order_error)?))
}

/// Handles GET /orders/status/{status} requests.
pub async fn list_orders_by_status(
	Path(status): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<Vec<Order>>, APIError> {
	let status: OrderStatus = status.parse().map_err(|_| APIError::BadRequest {
		error_type: "INVALID_STATUS".to_string(),
		message: format!("Unknown order status: {}", status),
	})?;
	Ok(Json(
		state
			.orders
			.list_by_status(status)
			.await
			.map_err(map_order_error)?,
	))
}

/// Handles PATCH /orders/{id}/status requests.
///
/// Triggers the status state machine and, on success, the event
/// publisher.
pub async fn update_order_status(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<Order>, APIError> {
	let id = parse_order_id(&id)?;
	Ok(Json(
		state
			.orders
			.update_status(id, request.status)
			.await
			.map_err(map_order_error)?,
	))
}

/// Validates the order ID path parameter.
fn parse_order_id(id: &str) -> Result<Uuid, APIError> {
	Uuid::parse_str(id).map_err(|_| APIError::BadRequest {
		error_type: "INVALID_ORDER_ID".to_string(),
		message: format!("Order ID must be a valid UUID: {}", id),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn malformed_order_id_is_a_bad_request() {
		let err = parse_order_id("not-a-uuid").unwrap_err();
		assert_eq!(err.status_code(), 400);
	}

	#[test]
	fn service_errors_map_to_distinct_statuses() {
		let not_found = map_order_error(OrderError::NotFound(Uuid::new_v4()));
		assert_eq!(not_found.status_code(), 404);

		let regression = map_order_error(OrderError::Transition(
			tracker_order::TransitionError::Regression {
				current: OrderStatus::Processed,
				requested: OrderStatus::Pending,
			},
		));
		assert_eq!(regression.status_code(), 422);

		let invalid = map_order_error(OrderError::Invalid("amount must be positive".into()));
		assert_eq!(invalid.status_code(), 400);

		let storage = map_order_error(OrderError::Storage("backend gone".into()));
		assert_eq!(storage.status_code(), 500);
		// Internal detail is logged, not echoed to the caller
		assert_eq!(storage.to_error_response().message, "Internal server error");
	}
}
