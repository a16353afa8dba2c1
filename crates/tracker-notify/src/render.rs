//! Rendering of order events into customer-facing notification text.
//!
//! One literal template per status, substituting the customer name where
//! the template calls for it. The mapping is total over the wire domain:
//! payloads carrying a status literal this build does not know fall back
//! to [`render_unknown`].

use tracker_types::{OrderEvent, OrderStatus};

/// Renders the notification message for a decoded order event.
pub fn render(event: &OrderEvent) -> String {
	let name = &event.customer_name;
	match event.status {
		OrderStatus::Pending => {
			format!("Hello {name}! We received your order. It is being processed")
		}
		OrderStatus::Processed => format!("{name}, your order has been processed"),
		OrderStatus::Shipped => {
			format!("Good news, {name}! Your order has shipped and is on its way.")
		}
		OrderStatus::Delivered => "Order delivered! Enjoy your purchase.".to_string(),
		OrderStatus::Canceled => {
			"Notice: your order was canceled. Check the details in the app.".to_string()
		}
		OrderStatus::Completed => {
			format!("Your order is complete. Thank you for trusting us, {name}!")
		}
	}
}

/// Renders the fallback message for a status literal this build does not
/// know.
pub fn render_unknown(status: &str) -> String {
	format!("Your order status changed to: {status}")
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;
	use rust_decimal::Decimal;
	use uuid::Uuid;

	fn event(status: OrderStatus) -> OrderEvent {
		OrderEvent {
			id: Uuid::new_v4(),
			customer_name: "Alice".to_string(),
			amount: Decimal::new(10000, 2),
			status,
			created_at: Utc::now(),
		}
	}

	#[test]
	fn templates_match_word_for_word() {
		let cases = [
			(
				OrderStatus::Pending,
				"Hello Alice! We received your order. It is being processed",
			),
			(OrderStatus::Processed, "Alice, your order has been processed"),
			(
				OrderStatus::Shipped,
				"Good news, Alice! Your order has shipped and is on its way.",
			),
			(OrderStatus::Delivered, "Order delivered! Enjoy your purchase."),
			(
				OrderStatus::Canceled,
				"Notice: your order was canceled. Check the details in the app.",
			),
			(
				OrderStatus::Completed,
				"Your order is complete. Thank you for trusting us, Alice!",
			),
		];
		for (status, expected) in cases {
			assert_eq!(render(&event(status)), expected, "{status}");
		}
	}

	#[test]
	fn delivered_and_canceled_carry_no_name() {
		for status in [OrderStatus::Delivered, OrderStatus::Canceled] {
			assert!(!render(&event(status)).contains("Alice"), "{status}");
		}
	}

	#[test]
	fn unknown_status_uses_fallback_template() {
		assert_eq!(
			render_unknown("ARCHIVED"),
			"Your order status changed to: ARCHIVED"
		);
	}
}
