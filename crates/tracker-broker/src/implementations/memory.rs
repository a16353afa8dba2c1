//! In-process broker backend for the tracker service.
//!
//! This module provides a memory-based implementation of the
//! BrokerInterface trait. Each topic fans published payloads out to
//! every live subscriber; payloads published while a topic has no
//! subscriber are buffered and flushed to the first one that attaches,
//! approximating a durable queue within a single process.

use crate::{BrokerError, BrokerInterface, Subscription};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::{mpsc, Mutex};
use tracker_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};

/// Default cap on payloads buffered per topic while no subscriber is attached.
const DEFAULT_BACKLOG: usize = 1024;

/// Per-topic state: live subscriber channels plus the not-yet-consumed backlog.
struct TopicState {
	subscribers: Vec<mpsc::UnboundedSender<Vec<u8>>>,
	backlog: VecDeque<Vec<u8>>,
}

impl TopicState {
	fn new() -> Self {
		Self {
			subscribers: Vec::new(),
			backlog: VecDeque::new(),
		}
	}
}

/// In-process broker implementation.
pub struct MemoryBroker {
	topics: Mutex<HashMap<String, TopicState>>,
	backlog_limit: usize,
}

impl MemoryBroker {
	/// Creates a new MemoryBroker with the given per-topic backlog cap.
	pub fn new(backlog_limit: usize) -> Self {
		Self {
			topics: Mutex::new(HashMap::new()),
			backlog_limit,
		}
	}
}

impl Default for MemoryBroker {
	fn default() -> Self {
		Self::new(DEFAULT_BACKLOG)
	}
}

#[async_trait]
impl BrokerInterface for MemoryBroker {
	async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
		let mut topics = self.topics.lock().await;
		let state = topics
			.entry(topic.to_string())
			.or_insert_with(TopicState::new);

		// Drop subscribers whose receiving side has gone away
		state
			.subscribers
			.retain(|sender| sender.send(payload.clone()).is_ok());

		if state.subscribers.is_empty() {
			if state.backlog.len() >= self.backlog_limit {
				state.backlog.pop_front();
				tracing::warn!(topic, "Backlog full, dropping oldest buffered payload");
			}
			state.backlog.push_back(payload);
		}

		Ok(())
	}

	async fn subscribe(&self, topic: &str) -> Result<Subscription, BrokerError> {
		let mut topics = self.topics.lock().await;
		let state = topics
			.entry(topic.to_string())
			.or_insert_with(TopicState::new);

		let (sender, receiver) = mpsc::unbounded_channel();

		// Flush payloads that arrived before anyone was listening
		for payload in state.backlog.drain(..) {
			sender
				.send(payload)
				.map_err(|e| BrokerError::Subscribe(e.to_string()))?;
		}
		state.subscribers.push(sender);

		Ok(Subscription::new(receiver))
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryBrokerSchema)
	}
}

/// Configuration schema for MemoryBroker.
pub struct MemoryBrokerSchema;

impl ConfigSchema for MemoryBrokerSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![], // No required fields
			vec![Field::new(
				"backlog",
				FieldType::Integer {
					min: Some(1),
					max: None,
				},
			)],
		);
		schema.validate(config)
	}
}

/// Registry entry for the in-process broker backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = crate::BrokerFactory;

	fn factory() -> Self::Factory {
		create_broker
	}
}

impl crate::BrokerRegistry for Registry {}

/// Factory function to create an in-process broker from configuration.
///
/// Configuration parameters:
/// - `backlog`: Max payloads buffered per topic while no subscriber is
///   attached (default: 1024)
pub fn create_broker(config: &toml::Value) -> Result<Box<dyn BrokerInterface>, BrokerError> {
	let backlog_limit = config
		.get("backlog")
		.and_then(|v| v.as_integer())
		.map(|v| v as usize)
		.unwrap_or(DEFAULT_BACKLOG);

	Ok(Box::new(MemoryBroker::new(backlog_limit)))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn delivers_to_live_subscriber() {
		let broker = MemoryBroker::default();
		let mut sub = broker.subscribe("t").await.unwrap();

		broker.publish("t", b"one".to_vec()).await.unwrap();
		assert_eq!(sub.recv().await.unwrap(), b"one".to_vec());
	}

	#[tokio::test]
	async fn buffers_until_first_subscriber() {
		let broker = MemoryBroker::default();
		broker.publish("t", b"one".to_vec()).await.unwrap();
		broker.publish("t", b"two".to_vec()).await.unwrap();

		let mut sub = broker.subscribe("t").await.unwrap();
		assert_eq!(sub.recv().await.unwrap(), b"one".to_vec());
		assert_eq!(sub.recv().await.unwrap(), b"two".to_vec());
	}

	#[tokio::test]
	async fn fans_out_to_every_subscriber() {
		let broker = MemoryBroker::default();
		let mut a = broker.subscribe("t").await.unwrap();
		let mut b = broker.subscribe("t").await.unwrap();

		broker.publish("t", b"msg".to_vec()).await.unwrap();
		assert_eq!(a.recv().await.unwrap(), b"msg".to_vec());
		assert_eq!(b.recv().await.unwrap(), b"msg".to_vec());
	}

	#[tokio::test]
	async fn dropped_subscriber_is_pruned_on_publish() {
		let broker = MemoryBroker::default();
		let sub = broker.subscribe("t").await.unwrap();
		drop(sub);

		let mut live = broker.subscribe("t").await.unwrap();
		broker.publish("t", b"msg".to_vec()).await.unwrap();
		assert_eq!(live.recv().await.unwrap(), b"msg".to_vec());
	}

	#[tokio::test]
	async fn backlog_cap_drops_oldest() {
		let broker = MemoryBroker::new(2);
		broker.publish("t", b"one".to_vec()).await.unwrap();
		broker.publish("t", b"two".to_vec()).await.unwrap();
		broker.publish("t", b"three".to_vec()).await.unwrap();

		let mut sub = broker.subscribe("t").await.unwrap();
		assert_eq!(sub.recv().await.unwrap(), b"two".to_vec());
		assert_eq!(sub.recv().await.unwrap(), b"three".to_vec());
	}
}
