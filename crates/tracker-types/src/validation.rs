//! Configuration validation utilities for the tracker system.
//!
//! Provides a small type-safe framework for validating the TOML sections
//! that pluggable implementations receive. Schemas declare required and
//! optional fields with types and optional custom validators.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// Error that occurs when a required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// Error that occurs when a field has an invalid value.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// Error that occurs when field type is incorrect.
	#[error("Type mismatch for field '{field}': expected {expected}")]
	TypeMismatch { field: String, expected: String },
}

/// Represents the type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	/// A string value.
	String,
	/// An integer value with optional minimum and maximum bounds.
	Integer {
		/// Minimum allowed value (inclusive).
		min: Option<i64>,
		/// Maximum allowed value (inclusive).
		max: Option<i64>,
	},
	/// A boolean value (true/false).
	Boolean,
}

/// Type alias for field validator functions.
///
/// Validators can perform additional checks beyond type checking. They
/// receive the TOML value and return an error message if validation fails.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A field in a configuration schema.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl Field {
	/// Creates a new field with the given name and type.
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Adds a custom validator to this field.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, value: &toml::Value) -> Result<(), ValidationError> {
		match &self.field_type {
			FieldType::String => {
				if value.as_str().is_none() {
					return Err(ValidationError::TypeMismatch {
						field: self.name.clone(),
						expected: "string".into(),
					});
				}
			}
			FieldType::Integer { min, max } => {
				let Some(n) = value.as_integer() else {
					return Err(ValidationError::TypeMismatch {
						field: self.name.clone(),
						expected: "integer".into(),
					});
				};
				if min.is_some_and(|min| n < min) || max.is_some_and(|max| n > max) {
					return Err(ValidationError::InvalidValue {
						field: self.name.clone(),
						message: format!("{} out of bounds", n),
					});
				}
			}
			FieldType::Boolean => {
				if value.as_bool().is_none() {
					return Err(ValidationError::TypeMismatch {
						field: self.name.clone(),
						expected: "boolean".into(),
					});
				}
			}
		}

		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}

		Ok(())
	}
}

/// Defines a validation schema for a TOML configuration section.
///
/// A schema consists of required fields that must be present and optional
/// fields that may be present.
pub struct Schema {
	required: Vec<Field>,
	optional: Vec<Field>,
}

impl Schema {
	/// Creates a new schema from required and optional field lists.
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML value against this schema.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		for field in &self.required {
			match config.get(&field.name) {
				Some(value) => field.check(value)?,
				None => return Err(ValidationError::MissingField(field.name.clone())),
			}
		}
		for field in &self.optional {
			if let Some(value) = config.get(&field.name) {
				field.check(value)?;
			}
		}
		Ok(())
	}
}

/// Trait implemented by every pluggable implementation to validate its
/// own configuration section before initialization.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}
