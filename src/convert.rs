//! Structural copy between host trees and canonical values.
//!
//! [`make_immutable`] walks any tree that implements [`Visit`] bottom-up and
//! routes every mapping and sequence through the canonicalization tables.
//! [`make_mutable`] expands maps and vectors back into a host tree that
//! implements [`Rebuild`]; the result shares no identity with the source.
//!
//! Both are implemented here for [`serde_json::Value`].

use serde_json::{Map, Number};

use crate::error::{Error, Result};
use crate::map::PersistentMap;
use crate::value::Value;
use crate::vector::PersistentVector;

/// How a host node looks to [`make_immutable`].
pub enum Shape<'a, T: ?Sized> {
    /// Key/value container; keys are already converted.
    Mapping(Vec<(Value, &'a T)>),
    /// Ordered container.
    Sequence(Vec<&'a T>),
    /// Leaf value.
    Scalar(Value),
}

/// A host tree that can be read into canonical values.
pub trait Visit {
    /// Describes this node.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedKeyOrValue`] for content with no [`Value`] form.
    fn shape(&self) -> Result<Shape<'_, Self>>;
}

/// A host tree that can be rebuilt from canonical values.
pub trait Rebuild: Sized {
    /// Builds a mapping node from converted pairs.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedKeyOrValue`] if a key cannot be represented.
    fn mapping(pairs: Vec<(Value, Self)>) -> Result<Self>;

    /// Builds a sequence node from converted elements.
    ///
    /// # Errors
    ///
    /// Implementation-defined.
    fn sequence(items: Vec<Self>) -> Result<Self>;

    /// Builds a leaf node from a non-container value.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedKeyOrValue`] if the value cannot be represented.
    fn scalar(value: &Value) -> Result<Self>;
}

/// Recursively converts a host tree into canonical values.
///
/// Idempotent: a [`Value`] is its own immutable form.
///
/// # Errors
///
/// Propagates [`Visit::shape`] failures.
pub fn make_immutable<T: Visit + ?Sized>(node: &T) -> Result<Value> {
    match node.shape()? {
        Shape::Mapping(pairs) => {
            let pairs = pairs
                .into_iter()
                .map(|(k, child)| Ok((k, make_immutable(child)?)))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Map(PersistentMap::from_pairs(pairs)))
        }
        Shape::Sequence(items) => {
            let items = items
                .into_iter()
                .map(make_immutable)
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::List(PersistentVector::from_values(items)))
        }
        Shape::Scalar(value) => Ok(value),
    }
}

/// Recursively converts canonical values into a host tree.
///
/// # Errors
///
/// Propagates [`Rebuild`] failures.
pub fn make_mutable<T: Rebuild>(value: &Value) -> Result<T> {
    match value {
        Value::Map(m) => {
            let pairs = m
                .iter()
                .map(|(k, v)| Ok((k.clone(), make_mutable(v)?)))
                .collect::<Result<Vec<_>>>()?;
            T::mapping(pairs)
        }
        Value::List(l) => {
            let items = l.iter().map(make_mutable).collect::<Result<Vec<_>>>()?;
            T::sequence(items)
        }
        other => T::scalar(other),
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

impl Visit for Value {
    fn shape(&self) -> Result<Shape<'_, Self>> {
        Ok(Shape::Scalar(self.clone()))
    }
}

// ---------------------------------------------------------------------------
// serde_json
// ---------------------------------------------------------------------------

impl Visit for serde_json::Value {
    fn shape(&self) -> Result<Shape<'_, Self>> {
        Ok(match self {
            Self::Null => Shape::Scalar(Value::Null),
            Self::Bool(b) => Shape::Scalar(Value::Bool(*b)),
            Self::Number(n) => Shape::Scalar(number(n)?),
            Self::String(s) => Shape::Scalar(Value::text(s)),
            Self::Array(items) => Shape::Sequence(items.iter().collect()),
            Self::Object(map) => {
                Shape::Mapping(map.iter().map(|(k, v)| (Value::text(k), v)).collect())
            }
        })
    }
}

fn number(n: &Number) -> Result<Value> {
    if let Some(i) = n.as_i64() {
        Ok(Value::Int(i))
    } else if n.is_u64() {
        Err(Error::UnsupportedKeyOrValue(format!(
            "integer {n} does not fit in i64"
        )))
    } else {
        n.as_f64()
            .map(Value::Float)
            .ok_or_else(|| Error::UnsupportedKeyOrValue(format!("number {n}")))
    }
}

impl Rebuild for serde_json::Value {
    fn mapping(pairs: Vec<(Value, Self)>) -> Result<Self> {
        let mut map = Map::with_capacity(pairs.len());
        for (k, v) in pairs {
            let key = match k {
                Value::Text(key) => key,
                other => {
                    return Err(Error::UnsupportedKeyOrValue(format!(
                        "{} key {other:?} in JSON object",
                        other.type_name()
                    )));
                }
            };
            map.insert(key.to_string(), v);
        }
        Ok(Self::Object(map))
    }

    fn sequence(items: Vec<Self>) -> Result<Self> {
        Ok(Self::Array(items))
    }

    fn scalar(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Int(i) => Ok(Self::Number((*i).into())),
            Value::Float(x) => Number::from_f64(*x).map(Self::Number).ok_or_else(|| {
                Error::UnsupportedKeyOrValue(format!("non-finite float {x}"))
            }),
            Value::Text(s) => Ok(Self::String(s.to_string())),
            other => Err(Error::UnsupportedKeyOrValue(format!(
                "{} value {other:?} in JSON",
                other.type_name()
            ))),
        }
    }
}
