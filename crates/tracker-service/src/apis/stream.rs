//! Notification stream endpoint implementation.
//!
//! One long-lived GET producing a `text/event-stream` body. Each
//! broadcast message becomes one SSE event whose data payload is the
//! rendered string, with no structured envelope. The stream ends when
//! the connection's inactivity timeout elapses; dropping the handle at
//! that point deregisters the connection from the hub.

use axum::{
	extract::State,
	response::sse::{Event, Sse},
};
use futures::Stream;
use std::convert::Infallible;
use tracker_notify::BroadcastHub;

/// Handles GET /notifications/stream requests.
pub async fn stream(
	State(hub): State<BroadcastHub>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
	let mut handle = hub.subscribe();
	tracing::info!(connection_id = %handle.id(), "Client subscribed to notification stream");

	let stream = async_stream::stream! {
		while let Some(message) = handle.recv().await {
			yield Ok(Event::default().data(message));
		}
		tracing::info!(connection_id = %handle.id(), "Notification stream closed");
	};

	Sse::new(stream)
}
