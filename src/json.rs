//! JSON text in and out, with validation at the boundary.
//!
//! Decoding validates the freshly decoded value; encoding validates before
//! writing. On success the decoded/encoded result passes through unchanged.
//! Each function has a `_with` form taking a [`Validator`]; its `enabled`
//! switch applies, while error paths always start at [`ROOT_LABEL`].
use std::io::{Read, Write};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::error::ValidationError;
use crate::matcher::Validator;
use crate::template::Template;
use crate::value::Value;

/// Root label of every error path produced here.
pub const ROOT_LABEL: &str = "json validation";

#[derive(Debug, Error)]
pub enum JsonError {
    #[error("invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// Typed decoding failed after the template passed.
    #[error("at JSON path {path} → {message}")]
    Decode { path: String, message: String },
}

/// Decode and validate against `template`.
pub fn from_str(src: &str, template: &Template) -> Result<Value, JsonError> {
    from_str_with(&Validator::default(), src, template)
}

pub fn from_str_with(validator: &Validator, src: &str, template: &Template) -> Result<Value, JsonError> {
    let value = Value::from(serde_json::from_str::<serde_json::Value>(src)?);
    validator.validate_at(&value, template, ROOT_LABEL)?;
    Ok(value)
}

pub fn from_slice(bytes: &[u8], template: &Template) -> Result<Value, JsonError> {
    from_slice_with(&Validator::default(), bytes, template)
}

pub fn from_slice_with(validator: &Validator, bytes: &[u8], template: &Template) -> Result<Value, JsonError> {
    let value = Value::from(serde_json::from_slice::<serde_json::Value>(bytes)?);
    validator.validate_at(&value, template, ROOT_LABEL)?;
    Ok(value)
}

pub fn from_reader<R: Read>(reader: R, template: &Template) -> Result<Value, JsonError> {
    from_reader_with(&Validator::default(), reader, template)
}

pub fn from_reader_with<R: Read>(validator: &Validator, reader: R, template: &Template) -> Result<Value, JsonError> {
    let value = Value::from(serde_json::from_reader::<_, serde_json::Value>(reader)?);
    validator.validate_at(&value, template, ROOT_LABEL)?;
    Ok(value)
}

/// Validate against `template`, then deserialize into `T` with JSON-path context in errors.
pub fn from_str_as<T: DeserializeOwned>(src: &str, template: &Template) -> Result<T, JsonError> {
    from_str_as_with(&Validator::default(), src, template)
}

pub fn from_str_as_with<T: DeserializeOwned>(
    validator: &Validator,
    src: &str,
    template: &Template,
) -> Result<T, JsonError> {
    let json: serde_json::Value = serde_json::from_str(src)?;
    validator.validate_at(&Value::from(&json), template, ROOT_LABEL)?;
    serde_path_to_error::deserialize::<_, T>(json).map_err(|err| JsonError::Decode {
        path: err.path().to_string(),
        message: err.into_inner().to_string(),
    })
}

/// Validate against `template`, then encode.
pub fn to_string(value: &Value, template: &Template) -> Result<String, JsonError> {
    to_string_with(&Validator::default(), value, template)
}

pub fn to_string_with(validator: &Validator, value: &Value, template: &Template) -> Result<String, JsonError> {
    validator.validate_at(value, template, ROOT_LABEL)?;
    Ok(serde_json::to_string(&serde_json::Value::from(value))?)
}

pub fn to_string_pretty(value: &Value, template: &Template) -> Result<String, JsonError> {
    to_string_pretty_with(&Validator::default(), value, template)
}

pub fn to_string_pretty_with(validator: &Validator, value: &Value, template: &Template) -> Result<String, JsonError> {
    validator.validate_at(value, template, ROOT_LABEL)?;
    Ok(serde_json::to_string_pretty(&serde_json::Value::from(value))?)
}

pub fn to_writer<W: Write>(writer: W, value: &Value, template: &Template) -> Result<(), JsonError> {
    to_writer_with(&Validator::default(), writer, value, template)
}

pub fn to_writer_with<W: Write>(
    validator: &Validator,
    writer: W,
    value: &Value,
    template: &Template,
) -> Result<(), JsonError> {
    validator.validate_at(value, template, ROOT_LABEL)?;
    Ok(serde_json::to_writer(writer, &serde_json::Value::from(value))?)
}
