//! JSON text codec over canonical values.
//!
//! Parsing and encoding are delegated to `serde_json`; these functions only
//! convert the resulting trees with [`make_immutable`] / [`make_mutable`].
//! Object key order in the output follows `serde_json`'s map (sorted).

use std::io;

use crate::convert::{make_immutable, make_mutable};
use crate::error::Result;
use crate::value::Value;

/// Parses JSON text into canonical values.
///
/// # Errors
///
/// [`Error::Json`](crate::Error::Json) on malformed input;
/// [`Error::UnsupportedKeyOrValue`](crate::Error::UnsupportedKeyOrValue)
/// for integers outside `i64`.
pub fn from_str(text: &str) -> Result<Value> {
    let tree: serde_json::Value = serde_json::from_str(text)?;
    make_immutable(&tree)
}

/// Parses JSON from a reader into canonical values.
///
/// # Errors
///
/// Same as [`from_str`], plus I/O failures reported as
/// [`Error::Json`](crate::Error::Json).
pub fn from_reader<R: io::Read>(reader: R) -> Result<Value> {
    let tree: serde_json::Value = serde_json::from_reader(reader)?;
    make_immutable(&tree)
}

/// Encodes canonical values as compact JSON text.
///
/// # Errors
///
/// [`Error::UnsupportedKeyOrValue`](crate::Error::UnsupportedKeyOrValue)
/// for bytes, tuples, opaque values, non-text keys and non-finite floats.
pub fn to_string(value: &Value) -> Result<String> {
    let tree: serde_json::Value = make_mutable(value)?;
    Ok(serde_json::to_string(&tree)?)
}

/// Encodes canonical values as JSON into a writer.
///
/// # Errors
///
/// Same as [`to_string`], plus write failures reported as
/// [`Error::Json`](crate::Error::Json).
pub fn to_writer<W: io::Write>(writer: W, value: &Value) -> Result<()> {
    let tree: serde_json::Value = make_mutable(value)?;
    serde_json::to_writer(writer, &tree)?;
    Ok(())
}
