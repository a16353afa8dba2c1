//! File-based storage backend implementation for the tracker service.
//!
//! Stores each value as one JSON file on the filesystem, providing simple
//! persistence without requiring external dependencies. Writes go through
//! a temp-file-then-rename step so a crashed write never leaves a
//! half-written record behind.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tracker_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};

/// File-based storage implementation.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
}

impl FileStorage {
	/// Creates a new FileStorage instance with the specified base path.
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	/// Converts a storage key to a filesystem-safe file path.
	///
	/// Sanitizes the key by replacing problematic characters and
	/// appending a .json extension.
	fn get_file_path(&self, key: &str) -> PathBuf {
		let safe_key = sanitize(key);
		self.base_path.join(format!("{}.json", safe_key))
	}
}

/// Replaces path-hostile characters so keys map to flat file names.
fn sanitize(key: &str) -> String {
	key.replace(['/', ':'], "_")
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.get_file_path(key);

		match fs::read(&path).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		// Create parent directory if it doesn't exist
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		// Write atomically by writing to temp file then renaming
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		match fs::remove_file(&path).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		Ok(self.get_file_path(key).exists())
	}

	async fn scan(&self, prefix: &str) -> Result<Vec<Vec<u8>>, StorageError> {
		let safe_prefix = sanitize(prefix);

		let mut entries = match fs::read_dir(&self.base_path).await {
			Ok(entries) => entries,
			// A namespace that was never written to is just empty
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let mut paths = Vec::new();
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new("json")) {
				continue;
			}
			let matches = path
				.file_stem()
				.and_then(|s| s.to_str())
				.is_some_and(|stem| stem.starts_with(&safe_prefix));
			if matches {
				paths.push(path);
			}
		}
		paths.sort();

		let mut values = Vec::with_capacity(paths.len());
		for path in paths {
			let data = fs::read(&path)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
			values.push(data);
		}
		Ok(values)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![], // No required fields
			vec![
				Field::new("storage_path", FieldType::String).with_validator(|value| {
					if value.as_str().is_some_and(|s| s.is_empty()) {
						Err("storage_path must not be empty".into())
					} else {
						Ok(())
					}
				}),
			],
		);
		schema.validate(config)
	}
}

/// Registry entry for the file storage backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = crate::StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl crate::StorageRegistry for Registry {}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for file storage (default: "./data/storage")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/storage")
		.to_string();

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}
