//! HTTP servers for the order tracker.
//!
//! Two routers: the order API on the order side and the notification
//! stream on the notification side. Both carry a permissive CORS layer;
//! everything behind them is delegated to the apis modules.

use crate::apis::{orders, stream};
use axum::{
	routing::{get, patch, post},
	Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracker_config::{ApiConfig, NotifierConfig};
use tracker_notify::BroadcastHub;
use tracker_order::OrderService;

/// Shared application state for the order API.
#[derive(Clone)]
pub struct AppState {
	/// Order service processing API requests.
	pub orders: Arc<OrderService>,
}

/// Starts the HTTP server for the order API.
pub async fn start_api_server(
	api_config: ApiConfig,
	order_service: Arc<OrderService>,
) -> std::io::Result<()> {
	let app_state = AppState {
		orders: order_service,
	};

	let app = Router::new()
		.route("/orders", post(orders::create_order).get(orders::list_orders))
		.route("/orders/{id}", get(orders::get_order))
		.route("/orders/status/{status}", get(orders::list_orders_by_status))
		.route("/orders/{id}/status", patch(orders::update_order_status))
		.layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
		.with_state(app_state);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Order API server starting on {}", bind_address);

	axum::serve(listener, app).await
}

/// Starts the HTTP server for the notification stream.
pub async fn start_stream_server(
	notifier_config: NotifierConfig,
	hub: BroadcastHub,
) -> std::io::Result<()> {
	let app = Router::new()
		.route("/notifications/stream", get(stream::stream))
		.layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
		.with_state(hub);

	let bind_address = format!("{}:{}", notifier_config.host, notifier_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Notification stream server starting on {}", bind_address);

	axum::serve(listener, app).await
}
