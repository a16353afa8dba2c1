//! Typed persistence for order records.
//!
//! Thin layer over the generic storage service that pins the orders
//! namespace, maps the backend's missing-key error to a distinct
//! not-found signal and keeps listings in a stable order.

use crate::OrderError;
use std::sync::Arc;
use tracker_storage::{StorageError, StorageService};
use tracker_types::{Order, OrderStatus, StorageKey};
use uuid::Uuid;

/// Order record store backed by the configured storage backend.
pub struct OrderStore {
	storage: Arc<StorageService>,
}

impl OrderStore {
	/// Creates a new OrderStore over the given storage service.
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Persists a newly created order.
	pub async fn insert(&self, order: &Order) -> Result<(), OrderError> {
		self.storage
			.store(StorageKey::Orders.as_str(), &order.id.to_string(), order)
			.await
			.map_err(OrderError::from_storage)
	}

	/// Retrieves an order by id.
	pub async fn get(&self, id: Uuid) -> Result<Order, OrderError> {
		self.storage
			.retrieve(StorageKey::Orders.as_str(), &id.to_string())
			.await
			.map_err(|e| match e {
				StorageError::NotFound => OrderError::NotFound(id),
				other => OrderError::from_storage(other),
			})
	}

	/// Returns all orders, oldest first.
	pub async fn all(&self) -> Result<Vec<Order>, OrderError> {
		let mut orders: Vec<Order> = self
			.storage
			.retrieve_all(StorageKey::Orders.as_str())
			.await
			.map_err(OrderError::from_storage)?;
		orders.sort_by_key(|order| (order.created_at, order.id));
		Ok(orders)
	}

	/// Returns all orders currently in the given status, oldest first.
	pub async fn by_status(&self, status: OrderStatus) -> Result<Vec<Order>, OrderError> {
		let mut orders = self.all().await?;
		orders.retain(|order| order.status == status);
		Ok(orders)
	}

	/// Persists a new state for an existing order.
	pub async fn update(&self, order: &Order) -> Result<(), OrderError> {
		self.storage
			.update(StorageKey::Orders.as_str(), &order.id.to_string(), order)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => OrderError::NotFound(order.id),
				other => OrderError::from_storage(other),
			})
	}
}
