//! Event types published to the broker on order state changes.
//!
//! An event is an immutable snapshot of an order taken at the moment of a
//! state-changing operation. Events carry no sequence number; ordering
//! relies on the broker's per-topic FIFO behavior.

use crate::{Order, OrderStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durable topic carrying order events between the two sides.
pub const ORDER_EVENTS_TOPIC: &str = "orders.v1.order-events";

/// Wire form of an order snapshot.
///
/// Serialized as camelCase JSON with the status as one of the six
/// uppercase literals and the timestamp in ISO-8601.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEvent {
	/// Identifier of the order this event describes.
	pub id: Uuid,
	/// Customer name at the moment of the change.
	pub customer_name: String,
	/// Order amount.
	pub amount: Decimal,
	/// Status the order moved to.
	pub status: OrderStatus,
	/// Creation timestamp of the order.
	pub created_at: DateTime<Utc>,
}

impl OrderEvent {
	/// Takes a snapshot of an order in its post-write state.
	pub fn snapshot(order: &Order) -> Self {
		Self {
			id: order.id,
			customer_name: order.customer_name.clone(),
			amount: order.amount,
			status: order.status,
			created_at: order.created_at,
		}
	}
}
