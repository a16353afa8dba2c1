//! Main entry point for the order tracker service.
//!
//! This binary hosts both sides of the pipeline: the order API that
//! validates transitions and publishes events, and the notification side
//! that consumes them and pushes rendered messages to connected clients.
//! The two sides communicate only through the configured broker backend,
//! so either side can be disabled to run them as separate processes.

use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracker_broker::{BrokerFactory, BrokerService};
use tracker_config::Config;
use tracker_notify::{BroadcastHub, NotifierEngine};
use tracker_order::OrderService;
use tracker_storage::{StorageFactory, StorageService};

mod apis;
mod server;

/// Command-line arguments for the tracker service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the tracker service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Wires the configured storage and broker backends
/// 5. Serves the enabled sides until interrupted
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started tracker");

	// Load configuration
	let config = Config::from_file(args.config.to_str().unwrap()).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let storage = Arc::new(create_storage(&config)?);
	let broker = Arc::new(create_broker(&config)?);

	let orders = Arc::new(OrderService::new(storage, Arc::clone(&broker)));

	let api_enabled = config.api.as_ref().is_some_and(|api| api.enabled);
	let notifier_enabled = config.notifier.as_ref().is_some_and(|n| n.enabled);

	match (api_enabled, notifier_enabled) {
		(true, true) => {
			let api_config = config.api.clone().unwrap();
			let notifier_config = config.notifier.clone().unwrap();
			let hub = BroadcastHub::new(Duration::from_secs(
				notifier_config.connection_timeout_seconds,
			));
			let engine = NotifierEngine::new(broker, hub.clone());

			tokio::select! {
				result = server::start_api_server(api_config, orders) => {
					tracing::info!("Order API server finished");
					result?;
				}
				result = server::start_stream_server(notifier_config, hub) => {
					tracing::info!("Stream server finished");
					result?;
				}
				result = engine.run() => {
					tracing::info!("Notifier finished");
					result?;
				}
			}
		}
		(true, false) => {
			let api_config = config.api.clone().unwrap();
			tokio::select! {
				result = server::start_api_server(api_config, orders) => {
					tracing::info!("Order API server finished");
					result?;
				}
				_ = tokio::signal::ctrl_c() => {}
			}
		}
		(false, true) => {
			let notifier_config = config.notifier.clone().unwrap();
			let hub = BroadcastHub::new(Duration::from_secs(
				notifier_config.connection_timeout_seconds,
			));
			let engine = NotifierEngine::new(broker, hub.clone());

			tokio::select! {
				result = server::start_stream_server(notifier_config, hub) => {
					tracing::info!("Stream server finished");
					result?;
				}
				result = engine.run() => {
					tracing::info!("Notifier finished");
					result?;
				}
			}
		}
		// Rejected by Config::validate already
		(false, false) => unreachable!("config validation requires an enabled side"),
	}

	tracing::info!("Stopped tracker");
	Ok(())
}

/// Creates the storage service from the configured backend.
fn create_storage(config: &Config) -> Result<StorageService, Box<dyn std::error::Error>> {
	let factories: HashMap<&str, StorageFactory> =
		tracker_storage::get_all_implementations().into_iter().collect();

	let primary = config.storage.primary.as_str();
	let factory = factories
		.get(primary)
		.ok_or_else(|| format!("Unknown storage implementation '{}'", primary))?;

	let impl_config = implementation_config(&config.storage.implementations, primary);
	let backend = factory(&impl_config)?;
	backend.config_schema().validate(&impl_config)?;
	tracing::info!(component = "storage", implementation = %primary, "Loaded");

	Ok(StorageService::new(backend))
}

/// Creates the broker service from the configured backend.
fn create_broker(config: &Config) -> Result<BrokerService, Box<dyn std::error::Error>> {
	let factories: HashMap<&str, BrokerFactory> =
		tracker_broker::get_all_implementations().into_iter().collect();

	let primary = config.broker.primary.as_str();
	let factory = factories
		.get(primary)
		.ok_or_else(|| format!("Unknown broker implementation '{}'", primary))?;

	let impl_config = implementation_config(&config.broker.implementations, primary);
	let backend = factory(&impl_config)?;
	backend.config_schema().validate(&impl_config)?;
	tracing::info!(component = "broker", implementation = %primary, "Loaded");

	Ok(BrokerService::new(backend))
}

/// Returns the implementation's config section, or an empty table for
/// implementations that need none.
fn implementation_config(
	implementations: &HashMap<String, toml::Value>,
	name: &str,
) -> toml::Value {
	implementations
		.get(name)
		.cloned()
		.unwrap_or_else(|| toml::Value::Table(Default::default()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use tracker_config::{BrokerConfig, ServiceConfig, StorageConfig};

	fn config(storage_primary: &str, broker_primary: &str) -> Config {
		Config {
			service: ServiceConfig {
				id: "test".to_string(),
			},
			storage: StorageConfig {
				primary: storage_primary.to_string(),
				implementations: HashMap::new(),
			},
			broker: BrokerConfig {
				primary: broker_primary.to_string(),
				implementations: HashMap::new(),
			},
			api: None,
			notifier: None,
		}
	}

	#[test]
	fn configured_backends_are_wired() {
		let config = config("memory", "memory");
		assert!(create_storage(&config).is_ok());
		assert!(create_broker(&config).is_ok());
	}

	#[test]
	fn unknown_implementation_names_fail_at_wiring_time() {
		let config = config("redis", "rabbitmq");
		assert!(create_storage(&config).is_err());
		assert!(create_broker(&config).is_err());
	}
}
