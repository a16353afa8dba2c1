//! Notification module for the tracker system.
//!
//! This module owns the notification side of the pipeline: it consumes
//! order events from the broker, renders one customer-facing message per
//! event and fans it out to every connected push client through the
//! broadcast hub.

use std::sync::Arc;
use thiserror::Error;
use tracker_broker::BrokerService;
use tracker_types::OrderEvent;

pub mod hub;
pub mod render;

pub use hub::{BroadcastHub, ConnectionHandle};

/// Errors that can occur while running the notifier.
#[derive(Debug, Error)]
pub enum NotifyError {
	/// Error that occurs when the broker subscription cannot be established.
	#[error("Broker error: {0}")]
	Broker(String),
}

/// Engine driving the notification side.
///
/// Subscribes to the order-events topic and forwards each rendered
/// message to the hub. Delivery is at-least-once: duplicate events are
/// rendered and broadcast again, and a payload that cannot be handled is
/// logged and skipped — a bad message never stops the loop.
pub struct NotifierEngine {
	broker: Arc<BrokerService>,
	hub: BroadcastHub,
}

impl NotifierEngine {
	/// Creates a new NotifierEngine over the given broker and hub.
	pub fn new(broker: Arc<BrokerService>, hub: BroadcastHub) -> Self {
		Self { broker, hub }
	}

	/// Returns the hub this engine broadcasts through.
	pub fn hub(&self) -> &BroadcastHub {
		&self.hub
	}

	/// Main consumption loop.
	///
	/// Runs until the topic closes or Ctrl+C is received.
	pub async fn run(&self) -> Result<(), NotifyError> {
		let mut subscription = self
			.broker
			.subscribe_events()
			.await
			.map_err(|e| NotifyError::Broker(e.to_string()))?;
		tracing::info!("Notifier subscribed to order events");

		loop {
			tokio::select! {
				delivered = subscription.recv() => {
					match delivered {
						Some(payload) => self.handle_payload(&payload),
						None => break,
					}
				}

				// Shutdown signal
				_ = tokio::signal::ctrl_c() => {
					break;
				}
			}
		}

		tracing::info!("Notifier stopped");
		Ok(())
	}

	/// Handles one delivered payload end to end.
	fn handle_payload(&self, payload: &[u8]) {
		let message = match serde_json::from_slice::<OrderEvent>(payload) {
			Ok(event) => {
				tracing::info!(order_id = %event.id, status = %event.status, "Processing order status update");
				render::render(&event)
			}
			// The producer may be newer than this build; an unknown
			// status literal still gets the fallback message.
			Err(_) => match lenient_status(payload) {
				Some(status) => render::render_unknown(&status),
				None => {
					tracing::warn!("Discarding undecodable order event payload");
					return;
				}
			},
		};

		tracing::info!(message = %message, "Sending notification");
		self.hub.broadcast(&message);
	}
}

/// Extracts the raw status literal from a payload that failed typed
/// decoding.
fn lenient_status(payload: &[u8]) -> Option<String> {
	let value: serde_json::Value = serde_json::from_slice(payload).ok()?;
	value.get("status")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rust_decimal::Decimal;
	use std::time::Duration;
	use tracker_broker::implementations::memory::create_broker;
	use tracker_types::{Order, OrderStatus};

	fn engine() -> (Arc<NotifierEngine>, Arc<BrokerService>, BroadcastHub) {
		let broker = Arc::new(BrokerService::new(
			create_broker(&toml::Value::Table(Default::default())).unwrap(),
		));
		let hub = BroadcastHub::new(Duration::from_secs(600));
		let engine = Arc::new(NotifierEngine::new(Arc::clone(&broker), hub.clone()));
		(engine, broker, hub)
	}

	#[tokio::test]
	async fn renders_and_broadcasts_consumed_events() {
		let (engine, broker, hub) = engine();
		let mut connection = hub.subscribe();
		tokio::spawn({
			let engine = Arc::clone(&engine);
			async move { engine.run().await }
		});

		let mut order = Order::new("Alice", Decimal::new(10000, 2));
		order.status = OrderStatus::Shipped;
		broker
			.publish_event(&OrderEvent::snapshot(&order))
			.await
			.unwrap();

		assert_eq!(
			connection.recv().await.as_deref(),
			Some("Good news, Alice! Your order has shipped and is on its way.")
		);
	}

	#[tokio::test]
	async fn duplicate_events_broadcast_twice() {
		let (engine, broker, hub) = engine();
		let mut connection = hub.subscribe();
		tokio::spawn({
			let engine = Arc::clone(&engine);
			async move { engine.run().await }
		});

		let order = Order::new("Bob", Decimal::new(100, 0));
		let event = OrderEvent::snapshot(&order);
		broker.publish_event(&event).await.unwrap();
		broker.publish_event(&event).await.unwrap();

		let first = connection.recv().await.unwrap();
		let second = connection.recv().await.unwrap();
		assert_eq!(first, second);
	}

	#[tokio::test]
	async fn unknown_status_falls_back_to_generic_message() {
		let (engine, _broker, hub) = engine();
		let mut connection = hub.subscribe();

		let payload = serde_json::json!({
			"id": "8f2b61d4-6a0f-4f5e-9b1a-0c3d9d3f5a77",
			"customerName": "Alice",
			"amount": "100.00",
			"status": "ARCHIVED",
			"createdAt": "2026-02-25T12:00:00Z",
		});
		engine.handle_payload(serde_json::to_vec(&payload).unwrap().as_slice());

		assert_eq!(
			connection.recv().await.as_deref(),
			Some("Your order status changed to: ARCHIVED")
		);
	}

	#[tokio::test]
	async fn undecodable_payload_is_skipped() {
		let (engine, _broker, hub) = engine();
		let mut connection = hub.subscribe();

		engine.handle_payload(b"not json");
		engine.handle_payload(
			serde_json::to_vec(&serde_json::json!({"customerName": "Alice"}))
				.unwrap()
				.as_slice(),
		);

		// Nothing was broadcast; only an explicit close unblocks recv.
		connection.close();
		assert_eq!(connection.recv().await, None);
	}
}
