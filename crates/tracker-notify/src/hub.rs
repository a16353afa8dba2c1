//! Broadcast hub holding the currently open push connections.
//!
//! The registry is a copy-on-write map: mutations clone the map and swap
//! it in, while `broadcast` iterates the snapshot current at the moment
//! it starts. Subscribe, broadcast and removal run from independent
//! triggers (client arrivals, broker messages, timeouts, failed sends)
//! and never block each other on a shared lock.
//!
//! Connections added mid-broadcast do not receive that message;
//! connections removed mid-broadcast just fail their send harmlessly.

use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Messages buffered per connection before the client counts as stalled.
const CONNECTION_BUFFER: usize = 32;

struct HubInner {
	connections: ArcSwap<HashMap<Uuid, mpsc::Sender<String>>>,
	idle_timeout: Duration,
}

/// Fan-out hub for rendered notification messages.
///
/// Cheap to clone; all clones share the same registry.
#[derive(Clone)]
pub struct BroadcastHub {
	inner: Arc<HubInner>,
}

impl BroadcastHub {
	/// Creates a hub whose connections time out after `idle_timeout`
	/// without a message.
	pub fn new(idle_timeout: Duration) -> Self {
		Self {
			inner: Arc::new(HubInner {
				connections: ArcSwap::from_pointee(HashMap::new()),
				idle_timeout,
			}),
		}
	}

	/// Registers a new connection and returns its handle.
	///
	/// The connection is visible to `broadcast` as soon as this returns.
	/// Dropping the handle deregisters it.
	pub fn subscribe(&self) -> ConnectionHandle {
		let (sender, receiver) = mpsc::channel(CONNECTION_BUFFER);
		let id = Uuid::new_v4();

		self.inner.connections.rcu(|current| {
			let mut next = HashMap::clone(current);
			next.insert(id, sender.clone());
			next
		});

		tracing::debug!(connection_id = %id, "Registered push connection");
		ConnectionHandle {
			id,
			receiver,
			hub: self.clone(),
		}
	}

	/// Delivers a message to every currently registered connection.
	///
	/// A connection whose send fails is removed from the registry;
	/// delivery continues to the remaining connections and no error is
	/// raised to the caller. With no registered connections this is a
	/// no-op.
	pub fn broadcast(&self, message: &str) {
		let snapshot = self.inner.connections.load_full();
		if snapshot.is_empty() {
			return;
		}

		let mut dropped = 0usize;
		for (id, sender) in snapshot.iter() {
			if sender.try_send(message.to_string()).is_err() {
				self.remove(*id);
				dropped += 1;
				tracing::warn!(connection_id = %id, "Failed to push message, removing connection");
			}
		}
		tracing::debug!(
			delivered = snapshot.len() - dropped,
			dropped,
			"Broadcast complete"
		);
	}

	/// Number of currently registered connections.
	pub fn connection_count(&self) -> usize {
		self.inner.connections.load().len()
	}

	fn idle_timeout(&self) -> Duration {
		self.inner.idle_timeout
	}

	fn remove(&self, id: Uuid) {
		self.inner.connections.rcu(|current| {
			let mut next = HashMap::clone(current);
			next.remove(&id);
			next
		});
	}
}

/// One open push connection.
///
/// The transport layer drains messages with [`ConnectionHandle::recv`]
/// and drops the handle when the stream ends, which deregisters the
/// connection.
pub struct ConnectionHandle {
	id: Uuid,
	receiver: mpsc::Receiver<String>,
	hub: BroadcastHub,
}

impl ConnectionHandle {
	/// Identifier of this connection.
	pub fn id(&self) -> Uuid {
		self.id
	}

	/// Receives the next broadcast message.
	///
	/// Returns None when the connection should end: the inactivity
	/// timeout elapsed without a message, or the connection was closed.
	pub async fn recv(&mut self) -> Option<String> {
		match tokio::time::timeout(self.hub.idle_timeout(), self.receiver.recv()).await {
			Ok(message) => message,
			Err(_elapsed) => {
				tracing::debug!(connection_id = %self.id, "Push connection idle timeout");
				None
			}
		}
	}

	/// Explicitly closes the connection.
	///
	/// Subsequent broadcasts fail their send to this connection and
	/// evict it; already buffered messages can still be drained.
	pub fn close(&mut self) {
		self.receiver.close();
	}
}

impl Drop for ConnectionHandle {
	fn drop(&mut self) {
		self.hub.remove(self.id);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn hub() -> BroadcastHub {
		BroadcastHub::new(Duration::from_secs(600))
	}

	#[tokio::test]
	async fn broadcast_without_connections_is_a_noop() {
		let hub = hub();
		hub.broadcast("nobody listening");
		assert_eq!(hub.connection_count(), 0);
	}

	#[tokio::test]
	async fn broadcast_reaches_every_connection() {
		let hub = hub();
		let mut a = hub.subscribe();
		let mut b = hub.subscribe();
		assert_eq!(hub.connection_count(), 2);

		hub.broadcast("hello");
		assert_eq!(a.recv().await.as_deref(), Some("hello"));
		assert_eq!(b.recv().await.as_deref(), Some("hello"));
	}

	#[tokio::test]
	async fn failed_connection_is_evicted_and_others_still_receive() {
		let hub = hub();
		let mut a = hub.subscribe();
		let mut b = hub.subscribe();

		a.close();
		hub.broadcast("still here");

		assert_eq!(hub.connection_count(), 1);
		assert_eq!(b.recv().await.as_deref(), Some("still here"));
	}

	#[tokio::test]
	async fn dropping_a_handle_deregisters_it() {
		let hub = hub();
		let a = hub.subscribe();
		let _b = hub.subscribe();
		assert_eq!(hub.connection_count(), 2);

		drop(a);
		assert_eq!(hub.connection_count(), 1);
	}

	#[tokio::test]
	async fn duplicate_broadcasts_are_delivered_twice() {
		let hub = hub();
		let mut a = hub.subscribe();

		hub.broadcast("same");
		hub.broadcast("same");
		assert_eq!(a.recv().await.as_deref(), Some("same"));
		assert_eq!(a.recv().await.as_deref(), Some("same"));
	}

	#[tokio::test]
	async fn stalled_connection_is_evicted_once_its_buffer_fills() {
		let hub = hub();
		let _stalled = hub.subscribe();
		let mut live = hub.subscribe();

		// One more than the per-connection buffer; the stalled client
		// never drains, so the last send fails and evicts it.
		for i in 0..=CONNECTION_BUFFER {
			hub.broadcast(&format!("message {i}"));
			if i < CONNECTION_BUFFER {
				assert_eq!(live.recv().await.as_deref(), Some(format!("message {i}").as_str()));
			}
		}
		assert_eq!(hub.connection_count(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn idle_connection_times_out() {
		let hub = BroadcastHub::new(Duration::from_secs(600));
		let mut handle = hub.subscribe();

		// No broadcast arrives; paused time advances past the window.
		assert_eq!(handle.recv().await, None);

		drop(handle);
		assert_eq!(hub.connection_count(), 0);
	}
}
