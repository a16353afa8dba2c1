//! Event broker module for the order tracker system.
//!
//! This module handles the hand-off of order events between the order
//! side and the notification side. It provides abstractions over durable
//! topic transports; delivery is at-least-once and consumers must
//! tolerate duplicates.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracker_types::{ConfigSchema, ImplementationRegistry, OrderEvent, ORDER_EVENTS_TOPIC};

/// Re-export implementations
pub mod implementations {
	pub mod memory;
}

/// Errors that can occur during broker operations.
#[derive(Debug, Error)]
pub enum BrokerError {
	/// Error that occurs when the broker rejects or drops a publish.
	#[error("Publish error: {0}")]
	Publish(String),
	/// Error that occurs when a subscription cannot be established.
	#[error("Subscribe error: {0}")]
	Subscribe(String),
	/// Error that occurs during serialization of an event payload.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// A live subscription to a topic.
///
/// Messages are raw payload bytes in the order the broker delivered
/// them. The subscription ends when the broker side closes.
pub struct Subscription {
	receiver: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl Subscription {
	/// Creates a subscription draining the given channel.
	pub fn new(receiver: mpsc::UnboundedReceiver<Vec<u8>>) -> Self {
		Self { receiver }
	}

	/// Receives the next delivered payload, or None when the topic closes.
	pub async fn recv(&mut self) -> Option<Vec<u8>> {
		self.receiver.recv().await
	}
}

/// Trait defining the interface for broker backends.
///
/// This trait must be implemented by any topic transport that wants to
/// integrate with the tracker system. Implementations provide
/// at-least-once delivery on named durable topics.
#[async_trait]
pub trait BrokerInterface: Send + Sync {
	/// Returns the configuration schema for this broker implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Publishes a payload to the named topic.
	async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError>;

	/// Subscribes to the named topic.
	///
	/// Payloads buffered while the topic had no subscriber are delivered
	/// to the first subscription before any new publishes.
	async fn subscribe(&self, topic: &str) -> Result<Subscription, BrokerError>;
}

/// Type alias for broker factory functions.
pub type BrokerFactory = fn(&toml::Value) -> Result<Box<dyn BrokerInterface>, BrokerError>;

/// Registry trait for broker implementations.
pub trait BrokerRegistry: ImplementationRegistry<Factory = BrokerFactory> {}

/// Get all registered broker implementations.
///
/// Returns a vector of (name, factory) tuples for all available broker
/// implementations, used to wire the configured backend at startup.
pub fn get_all_implementations() -> Vec<(&'static str, BrokerFactory)> {
	use implementations::memory;

	vec![(memory::Registry::NAME, memory::Registry::factory())]
}

/// Service that manages event transport over a boxed broker backend.
///
/// The BrokerService pins the order-events topic name and handles the
/// JSON encoding of event snapshots, so callers deal in typed events.
pub struct BrokerService {
	/// The underlying broker backend implementation.
	backend: Box<dyn BrokerInterface>,
}

impl BrokerService {
	/// Creates a new BrokerService with the specified backend.
	pub fn new(backend: Box<dyn BrokerInterface>) -> Self {
		Self { backend }
	}

	/// Publishes an order event snapshot to the order-events topic.
	pub async fn publish_event(&self, event: &OrderEvent) -> Result<(), BrokerError> {
		let payload =
			serde_json::to_vec(event).map_err(|e| BrokerError::Serialization(e.to_string()))?;
		self.backend.publish(ORDER_EVENTS_TOPIC, payload).await
	}

	/// Subscribes to the order-events topic.
	pub async fn subscribe_events(&self) -> Result<Subscription, BrokerError> {
		self.backend.subscribe(ORDER_EVENTS_TOPIC).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rust_decimal::Decimal;
	use tracker_types::Order;

	#[tokio::test]
	async fn publish_event_round_trips_through_backend() {
		let broker = BrokerService::new(
			implementations::memory::create_broker(&toml::Value::Table(Default::default()))
				.unwrap(),
		);
		let mut subscription = broker.subscribe_events().await.unwrap();

		let order = Order::new("Alice", Decimal::new(10000, 2));
		let event = OrderEvent::snapshot(&order);
		broker.publish_event(&event).await.unwrap();

		let payload = subscription.recv().await.unwrap();
		let decoded: OrderEvent = serde_json::from_slice(&payload).unwrap();
		assert_eq!(decoded.id, order.id);
		assert_eq!(decoded.customer_name, "Alice");
	}
}
