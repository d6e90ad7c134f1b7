//! Minimal structural schema validation
//!
//! Covers a small structural subset: type checks, object properties and
//! required fields, array item schemas and length bounds, string length
//! bounds, and numeric ranges. Failures carry the JSON path of the
//! offending value. This is a boundary collaborator for extracted values,
//! not a JSON-Schema implementation.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{Error, Result};

/// Structural description a value is validated against
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// Object with per-property schemas and required field names
    Object {
        /// Schemas for known properties; unknown properties pass
        properties: HashMap<String, Schema>,
        /// Property names that must be present
        required: Vec<String>,
    },
    /// Array with an optional item schema and length bounds
    Array {
        /// Schema every element must satisfy
        items: Option<Box<Schema>>,
        /// Minimum element count
        min_items: Option<usize>,
        /// Maximum element count
        max_items: Option<usize>,
    },
    /// String with optional length bounds
    String {
        /// Minimum length in characters
        min_length: Option<usize>,
        /// Maximum length in characters
        max_length: Option<usize>,
    },
    /// Number with an optional inclusive range
    Number {
        /// Inclusive lower bound
        minimum: Option<f64>,
        /// Inclusive upper bound
        maximum: Option<f64>,
    },
    /// Boolean
    Boolean,
    /// Null
    Null,
}

impl Schema {
    /// Object schema from property pairs and required names
    pub fn object(
        properties: impl IntoIterator<Item = (String, Schema)>,
        required: impl IntoIterator<Item = String>,
    ) -> Self {
        Self::Object {
            properties: properties.into_iter().collect(),
            required: required.into_iter().collect(),
        }
    }

    /// Array schema with an item schema and no length bounds
    pub fn array(items: Schema) -> Self {
        Self::Array {
            items: Some(Box::new(items)),
            min_items: None,
            max_items: None,
        }
    }

    /// Unbounded string schema
    pub fn string() -> Self {
        Self::String {
            min_length: None,
            max_length: None,
        }
    }

    /// Number schema with an optional inclusive range
    pub fn number(minimum: Option<f64>, maximum: Option<f64>) -> Self {
        Self::Number { minimum, maximum }
    }
}

/// Validates values against a [`Schema`], with a depth guard
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    max_depth: usize,
}

impl SchemaValidator {
    const DEFAULT_MAX_DEPTH: usize = 32;

    /// Create a validator with the default depth limit
    pub fn new() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    /// Create a validator with a custom depth limit
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Validate `value` against `schema`
    ///
    /// Returns [`Error::SchemaValidation`] with the path of the first
    /// failing value; validation stops at the first failure.
    pub fn validate(&self, value: &Value, schema: &Schema) -> Result<()> {
        self.validate_at(value, schema, "$", 0)
    }

    fn validate_at(&self, value: &Value, schema: &Schema, path: &str, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(Error::schema_validation(
                path,
                format!("nesting depth exceeds {}", self.max_depth),
            ));
        }

        match schema {
            Schema::Object {
                properties,
                required,
            } => {
                let object = value.as_object().ok_or_else(|| {
                    Error::schema_validation(path, format!("expected object, got {}", kind(value)))
                })?;
                for name in required {
                    if !object.contains_key(name) {
                        return Err(Error::schema_validation(
                            path,
                            format!("missing required field '{name}'"),
                        ));
                    }
                }
                for (name, property_schema) in properties {
                    if let Some(property) = object.get(name) {
                        let child = format!("{path}.{name}");
                        self.validate_at(property, property_schema, &child, depth + 1)?;
                    }
                }
                Ok(())
            }
            Schema::Array {
                items,
                min_items,
                max_items,
            } => {
                let array = value.as_array().ok_or_else(|| {
                    Error::schema_validation(path, format!("expected array, got {}", kind(value)))
                })?;
                if let Some(min) = min_items {
                    if array.len() < *min {
                        return Err(Error::schema_validation(
                            path,
                            format!("length {} below minimum {min}", array.len()),
                        ));
                    }
                }
                if let Some(max) = max_items {
                    if array.len() > *max {
                        return Err(Error::schema_validation(
                            path,
                            format!("length {} above maximum {max}", array.len()),
                        ));
                    }
                }
                if let Some(item_schema) = items {
                    for (index, item) in array.iter().enumerate() {
                        let child = format!("{path}[{index}]");
                        self.validate_at(item, item_schema, &child, depth + 1)?;
                    }
                }
                Ok(())
            }
            Schema::String {
                min_length,
                max_length,
            } => {
                let string = value.as_str().ok_or_else(|| {
                    Error::schema_validation(path, format!("expected string, got {}", kind(value)))
                })?;
                let length = string.chars().count();
                if let Some(min) = min_length {
                    if length < *min {
                        return Err(Error::schema_validation(
                            path,
                            format!("length {length} below minimum {min}"),
                        ));
                    }
                }
                if let Some(max) = max_length {
                    if length > *max {
                        return Err(Error::schema_validation(
                            path,
                            format!("length {length} above maximum {max}"),
                        ));
                    }
                }
                Ok(())
            }
            Schema::Number { minimum, maximum } => {
                let number = value.as_f64().ok_or_else(|| {
                    Error::schema_validation(path, format!("expected number, got {}", kind(value)))
                })?;
                if let Some(min) = minimum {
                    if number < *min {
                        return Err(Error::schema_validation(
                            path,
                            format!("{number} below minimum {min}"),
                        ));
                    }
                }
                if let Some(max) = maximum {
                    if number > *max {
                        return Err(Error::schema_validation(
                            path,
                            format!("{number} above maximum {max}"),
                        ));
                    }
                }
                Ok(())
            }
            Schema::Boolean => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err(Error::schema_validation(
                        path,
                        format!("expected boolean, got {}", kind(value)),
                    ))
                }
            }
            Schema::Null => {
                if value.is_null() {
                    Ok(())
                } else {
                    Err(Error::schema_validation(
                        path,
                        format!("expected null, got {}", kind(value)),
                    ))
                }
            }
        }
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
