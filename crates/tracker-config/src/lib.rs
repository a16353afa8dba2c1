//! Configuration module for the order tracker system.
//!
//! This module provides structures and utilities for managing tracker
//! configuration. It supports loading configuration from TOML files with
//! `${VAR}` / `${VAR:-default}` environment-variable resolution and
//! validates that all required configuration values are properly set.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the order tracker.
///
/// Contains the service identity, the storage and broker backend
/// selections and the two optional HTTP surfaces: the order API and the
/// notification stream.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Configuration specific to this tracker instance.
	pub service: ServiceConfig,
	/// Configuration for the order record storage backend.
	pub storage: StorageConfig,
	/// Configuration for the event broker backend.
	pub broker: BrokerConfig,
	/// Configuration for the order HTTP API server.
	pub api: Option<ApiConfig>,
	/// Configuration for the notification stream server.
	pub notifier: Option<NotifierConfig>,
}

/// Configuration specific to the tracker instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Unique identifier for this tracker instance.
	pub id: String,
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	#[serde(default)]
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the event broker.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrokerConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of broker implementation names to their configurations.
	#[serde(default)]
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the order HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the order API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
}

/// Configuration for the notification stream server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifierConfig {
	/// Whether the notification side is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the stream server to.
	#[serde(default = "default_host")]
	pub host: String,
	/// Port to bind the stream server to.
	#[serde(default = "default_notifier_port")]
	pub port: u16,
	/// Seconds a push connection may stay idle before it is closed.
	/// Defaults to 600 seconds (10 minutes) if not specified.
	#[serde(default = "default_connection_timeout_seconds")]
	pub connection_timeout_seconds: u64,
}

/// Returns the default bind host for both servers.
fn default_host() -> String {
	"127.0.0.1".to_string()
}

/// Returns the default order API port.
fn default_api_port() -> u16 {
	8080
}

/// Returns the default notification stream port.
fn default_notifier_port() -> u16 {
	8081
}

/// Returns the default push-connection inactivity timeout in seconds.
fn default_connection_timeout_seconds() -> u64 {
	600 // Default to 10 minutes
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024; // 1MB
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let full_match = cap.get(0).unwrap();
		let var_name = cap.get(1).unwrap().as_str();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)))
				}
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a TOML file.
	///
	/// Environment variables are resolved before parsing and the result
	/// is validated before it is returned.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let raw = tokio::fs::read_to_string(path).await?;
		let resolved = resolve_env_vars(&raw)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}

	/// Validates the configuration to ensure all required fields are properly set.
	///
	/// - Ensures the service id is not empty
	/// - Validates that the storage and broker primary implementations
	///   are named and configured
	/// - Ensures at least one of the api and notifier sections is enabled
	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.is_empty() {
			return Err(ConfigError::Validation("Service ID cannot be empty".into()));
		}

		if self.storage.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Storage primary implementation cannot be empty".into(),
			));
		}
		if self.broker.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Broker primary implementation cannot be empty".into(),
			));
		}

		let api_enabled = self.api.as_ref().is_some_and(|api| api.enabled);
		let notifier_enabled = self.notifier.as_ref().is_some_and(|n| n.enabled);
		if !api_enabled && !notifier_enabled {
			return Err(ConfigError::Validation(
				"At least one of [api] and [notifier] must be enabled".into(),
			));
		}

		Ok(())
	}
}
