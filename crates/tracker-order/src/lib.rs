//! Order processing module for the tracker system.
//!
//! This module owns the order side of the pipeline: it validates and
//! applies status transitions, persists order records and publishes a
//! post-write snapshot event to the broker after every state-changing
//! operation.

use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use tracker_broker::BrokerService;
use tracker_storage::{StorageError, StorageService};
use tracker_types::{Order, OrderEvent, OrderStatus};
use uuid::Uuid;

pub mod state;
pub mod store;

pub use state::{transition, TransitionError};
pub use store::OrderStore;

/// Errors that can occur during order processing operations.
#[derive(Debug, Error)]
pub enum OrderError {
	/// Error that occurs when the requested order id does not exist.
	#[error("Order not found: {0}")]
	NotFound(Uuid),
	/// Error that occurs when a status transition violates the rules.
	#[error(transparent)]
	Transition(#[from] TransitionError),
	/// Error that occurs when a request violates the order data model.
	#[error("Invalid order: {0}")]
	Invalid(String),
	/// Error that occurs in the underlying record store.
	#[error("Storage error: {0}")]
	Storage(String),
}

impl OrderError {
	fn from_storage(e: StorageError) -> Self {
		OrderError::Storage(e.to_string())
	}
}

/// Service that owns order records and drives the event pipeline.
///
/// Every successful create or status update writes the record store
/// first, then publishes a snapshot event. A publish failure is logged
/// and swallowed: the write already committed and is not rolled back,
/// and there is no outbox or retry to close the gap.
pub struct OrderService {
	store: OrderStore,
	broker: Arc<BrokerService>,
}

impl OrderService {
	/// Creates a new OrderService over the given storage and broker.
	pub fn new(storage: Arc<StorageService>, broker: Arc<BrokerService>) -> Self {
		Self {
			store: OrderStore::new(storage),
			broker,
		}
	}

	/// Creates a new order for the given customer and amount.
	///
	/// The initial status is always `PENDING`, assigned by construction.
	pub async fn create(
		&self,
		customer_name: &str,
		amount: Decimal,
	) -> Result<Order, OrderError> {
		let customer_name = customer_name.trim();
		if customer_name.is_empty() {
			return Err(OrderError::Invalid("customer name is required".into()));
		}
		if amount <= Decimal::ZERO {
			return Err(OrderError::Invalid("amount must be positive".into()));
		}

		let order = Order::new(customer_name, amount);
		self.store.insert(&order).await?;
		tracing::info!(order_id = %order.id, "Created order");

		self.publish_snapshot(&order).await;
		Ok(order)
	}

	/// Retrieves an order by id.
	pub async fn get(&self, id: Uuid) -> Result<Order, OrderError> {
		self.store.get(id).await
	}

	/// Lists all orders, oldest first.
	pub async fn list(&self) -> Result<Vec<Order>, OrderError> {
		self.store.all().await
	}

	/// Lists all orders currently in the given status.
	pub async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, OrderError> {
		self.store.by_status(status).await
	}

	/// Moves an order to the requested status.
	///
	/// The transition rules are checked against the stored record; on
	/// success the new state is persisted and a snapshot event published.
	pub async fn update_status(
		&self,
		id: Uuid,
		requested: OrderStatus,
	) -> Result<Order, OrderError> {
		let mut order = self.store.get(id).await?;
		order.status = state::transition(order.status, requested)?;
		self.store.update(&order).await?;
		tracing::info!(order_id = %order.id, status = %order.status, "Updated order status");

		self.publish_snapshot(&order).await;
		Ok(order)
	}

	/// Publishes the post-write snapshot of an order, best effort.
	async fn publish_snapshot(&self, order: &Order) {
		let event = OrderEvent::snapshot(order);
		if let Err(e) = self.broker.publish_event(&event).await {
			tracing::warn!(order_id = %order.id, error = %e, "Failed to publish order event");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tracker_broker::implementations::memory::create_broker;
	use tracker_storage::implementations::memory::create_storage;

	fn empty_config() -> toml::Value {
		toml::Value::Table(Default::default())
	}

	fn service() -> (OrderService, Arc<BrokerService>) {
		let storage = Arc::new(StorageService::new(
			create_storage(&empty_config()).unwrap(),
		));
		let broker = Arc::new(BrokerService::new(create_broker(&empty_config()).unwrap()));
		(OrderService::new(storage, Arc::clone(&broker)), broker)
	}

	#[tokio::test]
	async fn create_starts_pending_and_publishes_snapshot() {
		let (service, broker) = service();
		let mut subscription = broker.subscribe_events().await.unwrap();

		let order = service
			.create("Alice", Decimal::new(10000, 2))
			.await
			.unwrap();
		assert_eq!(order.status, OrderStatus::Pending);

		let payload = subscription.recv().await.unwrap();
		let event: OrderEvent = serde_json::from_slice(&payload).unwrap();
		assert_eq!(event.id, order.id);
		assert_eq!(event.status, OrderStatus::Pending);
	}

	#[tokio::test]
	async fn create_rejects_blank_name_and_non_positive_amount() {
		let (service, _broker) = service();
		assert!(matches!(
			service.create("   ", Decimal::new(100, 0)).await,
			Err(OrderError::Invalid(_))
		));
		assert!(matches!(
			service.create("Alice", Decimal::ZERO).await,
			Err(OrderError::Invalid(_))
		));
	}

	#[tokio::test]
	async fn update_status_persists_and_publishes() {
		let (service, broker) = service();
		let order = service
			.create("Alice", Decimal::new(10000, 2))
			.await
			.unwrap();
		let mut subscription = broker.subscribe_events().await.unwrap();

		let updated = service
			.update_status(order.id, OrderStatus::Processed)
			.await
			.unwrap();
		assert_eq!(updated.status, OrderStatus::Processed);
		assert_eq!(
			service.get(order.id).await.unwrap().status,
			OrderStatus::Processed
		);

		let event: OrderEvent =
			serde_json::from_slice(&subscription.recv().await.unwrap()).unwrap();
		assert_eq!(event.status, OrderStatus::Processed);
	}

	#[tokio::test]
	async fn update_status_enforces_transition_rules() {
		let (service, _broker) = service();
		let order = service
			.create("Alice", Decimal::new(10000, 2))
			.await
			.unwrap();

		service
			.update_status(order.id, OrderStatus::Processed)
			.await
			.unwrap();
		assert!(matches!(
			service.update_status(order.id, OrderStatus::Pending).await,
			Err(OrderError::Transition(TransitionError::Regression { .. }))
		));

		service
			.update_status(order.id, OrderStatus::Canceled)
			.await
			.unwrap();
		assert!(matches!(
			service.update_status(order.id, OrderStatus::Shipped).await,
			Err(OrderError::Transition(TransitionError::Terminal { .. }))
		));
	}

	#[tokio::test]
	async fn missing_order_is_a_distinct_not_found() {
		let (service, _broker) = service();
		let id = Uuid::new_v4();
		assert!(matches!(
			service.get(id).await,
			Err(OrderError::NotFound(missing)) if missing == id
		));
		assert!(matches!(
			service.update_status(id, OrderStatus::Processed).await,
			Err(OrderError::NotFound(_))
		));
	}

	#[tokio::test]
	async fn listing_filters_by_status() {
		let (service, _broker) = service();
		let a = service.create("Alice", Decimal::new(100, 0)).await.unwrap();
		let b = service.create("Bob", Decimal::new(200, 0)).await.unwrap();
		service
			.update_status(b.id, OrderStatus::Processed)
			.await
			.unwrap();

		assert_eq!(service.list().await.unwrap().len(), 2);

		let pending = service
			.list_by_status(OrderStatus::Pending)
			.await
			.unwrap();
		assert_eq!(pending.len(), 1);
		assert_eq!(pending[0].id, a.id);

		assert!(service
			.list_by_status(OrderStatus::Shipped)
			.await
			.unwrap()
			.is_empty());
	}
}
