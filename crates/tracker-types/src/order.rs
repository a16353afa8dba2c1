//! Order domain types for the tracker system.
//!
//! This module defines the order record and its status enumeration. The
//! status carries two explicit properties used by the transition rules:
//! a rank for the no-regression check and a terminal flag for the
//! no-further-change check. Both are spelled out as match tables rather
//! than derived from declaration order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Status of an order in the tracker system.
///
/// Declared in lifecycle order. `Canceled` ranks below `Completed` even
/// though both are terminal, so rank comparison alone would permit
/// `Canceled -> Completed`; callers must check [`OrderStatus::is_terminal`]
/// before comparing ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
	/// Order has been received and awaits processing.
	Pending,
	/// Order has been processed.
	Processed,
	/// Order has been handed to the carrier.
	Shipped,
	/// Order has reached the customer.
	Delivered,
	/// Order was canceled. Terminal.
	Canceled,
	/// Order is finalized. Terminal.
	Completed,
}

impl OrderStatus {
	/// Returns the rank used by the no-regression rule.
	pub fn rank(&self) -> u8 {
		match self {
			OrderStatus::Pending => 0,
			OrderStatus::Processed => 1,
			OrderStatus::Shipped => 2,
			OrderStatus::Delivered => 3,
			OrderStatus::Canceled => 4,
			OrderStatus::Completed => 5,
		}
	}

	/// Returns true if no further transition is permitted from this status.
	pub fn is_terminal(&self) -> bool {
		matches!(self, OrderStatus::Canceled | OrderStatus::Completed)
	}

	/// Returns an iterator over all OrderStatus variants, in rank order.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Pending,
			Self::Processed,
			Self::Shipped,
			Self::Delivered,
			Self::Canceled,
			Self::Completed,
		]
		.into_iter()
	}

	/// Returns the wire literal for this status.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Pending => "PENDING",
			OrderStatus::Processed => "PROCESSED",
			OrderStatus::Shipped => "SHIPPED",
			OrderStatus::Delivered => "DELIVERED",
			OrderStatus::Canceled => "CANCELED",
			OrderStatus::Completed => "COMPLETED",
		}
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned when parsing an unknown status literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown order status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for OrderStatus {
	type Err = ParseStatusError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"PENDING" => Ok(Self::Pending),
			"PROCESSED" => Ok(Self::Processed),
			"SHIPPED" => Ok(Self::Shipped),
			"DELIVERED" => Ok(Self::Delivered),
			"CANCELED" => Ok(Self::Canceled),
			"COMPLETED" => Ok(Self::Completed),
			other => Err(ParseStatusError(other.to_string())),
		}
	}
}

/// An order record owned by the order side of the system.
///
/// Mutated only through the status transition rules; never deleted.
/// The creation timestamp is set once at construction and is immutable
/// thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
	/// Unique identifier for this order.
	pub id: Uuid,
	/// Name of the customer who placed the order.
	pub customer_name: String,
	/// Order amount. Positive.
	pub amount: Decimal,
	/// Current status of the order.
	pub status: OrderStatus,
	/// Timestamp when this order was created.
	pub created_at: DateTime<Utc>,
}

impl Order {
	/// Creates a new order with a fresh id, status `Pending` and the
	/// current time as creation timestamp.
	///
	/// This is the only way orders come into existence; the initial
	/// status is never taken from client input.
	pub fn new(customer_name: impl Into<String>, amount: Decimal) -> Self {
		Self {
			id: Uuid::new_v4(),
			customer_name: customer_name.into(),
			amount,
			status: OrderStatus::Pending,
			created_at: Utc::now(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ranks_follow_declaration_order() {
		let ranks: Vec<u8> = OrderStatus::all().map(|s| s.rank()).collect();
		assert_eq!(ranks, vec![0, 1, 2, 3, 4, 5]);
	}

	#[test]
	fn only_canceled_and_completed_are_terminal() {
		for status in OrderStatus::all() {
			let expected =
				matches!(status, OrderStatus::Canceled | OrderStatus::Completed);
			assert_eq!(status.is_terminal(), expected, "{status}");
		}
	}

	#[test]
	fn status_round_trips_through_wire_literal() {
		for status in OrderStatus::all() {
			assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
		}
		assert!("SHIPPING".parse::<OrderStatus>().is_err());
	}

	#[test]
	fn new_order_is_pending() {
		let order = Order::new("Alice", Decimal::new(10000, 2));
		assert_eq!(order.status, OrderStatus::Pending);
		assert_eq!(order.customer_name, "Alice");
	}

	#[test]
	fn status_serializes_as_uppercase_literal() {
		let json = serde_json::to_string(&OrderStatus::Pending).unwrap();
		assert_eq!(json, "\"PENDING\"");
	}
}
