//! Values stored in canonical containers.
//!
//! Equality is **strict by type**: `Int(3)` and `Float(3.0)` are different
//! values, floats compare by bit pattern, and opaque host objects compare by
//! identity. Nested maps and vectors compare by identity, which coincides with
//! deep equality because every container is canonical.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::digest::Sha1;
use crate::fingerprint::Fingerprint;
use crate::map::PersistentMap;
use crate::vector::PersistentVector;

// Inline fingerprint kinds.
const KIND_NULL: u8 = 1;
const KIND_BOOL: u8 = 2;
const KIND_INT: u8 = 3;
const KIND_FLOAT: u8 = 4;
const KIND_TEXT: u8 = 5;
const KIND_BYTES: u8 = 6;
const KIND_OPAQUE: u8 = 7;

/// A value that can be used as a key, map value or sequence element.
#[derive(Clone)]
pub enum Value {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating-point number, compared by bit pattern.
    Float(f64),
    /// Unicode text.
    Text(Arc<str>),
    /// Byte string.
    Bytes(Arc<[u8]>),
    /// Immutable tuple; a compound key hashed element by element.
    Tuple(Arc<[Self]>),
    /// Canonical map.
    Map(PersistentMap),
    /// Canonical vector.
    List(PersistentVector),
    /// Host object compared by identity.
    Opaque(Opaque),
}

/// A host object with identity semantics.
///
/// Two `Opaque` values are equal only if they wrap the same allocation.
#[derive(Clone)]
pub struct Opaque(Arc<dyn Any + Send + Sync>);

impl Opaque {
    /// Wraps a host object.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(object: T) -> Self {
        Self(Arc::new(object))
    }

    /// Returns the wrapped object if it has type `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Address of the shared allocation, used as identity.
    #[must_use]
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for Opaque {}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<opaque {:#x}>", self.addr())
    }
}

// ---------------------------------------------------------------------------
// Constructors & accessors
// ---------------------------------------------------------------------------

impl Value {
    /// Builds a text value.
    #[must_use]
    pub fn text(s: impl AsRef<str>) -> Self {
        Self::Text(Arc::from(s.as_ref()))
    }

    /// Builds a byte-string value.
    #[must_use]
    pub fn bytes(b: impl AsRef<[u8]>) -> Self {
        Self::Bytes(Arc::from(b.as_ref()))
    }

    /// Builds a tuple from its elements.
    #[must_use]
    pub fn tuple<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Self>,
    {
        Self::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Wraps a host object with identity semantics.
    #[must_use]
    pub fn opaque<T: Any + Send + Sync>(object: T) -> Self {
        Self::Opaque(Opaque::new(object))
    }

    /// Returns the text if this is a [`Text`](Self::Text) value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(&**s),
            _ => None,
        }
    }

    /// Returns the integer if this is an [`Int`](Self::Int) value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the map if this is a [`Map`](Self::Map) value.
    #[must_use]
    pub const fn as_map(&self) -> Option<&PersistentMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the vector if this is a [`List`](Self::List) value.
    #[must_use]
    pub const fn as_list(&self) -> Option<&PersistentVector> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// Short name of the variant, for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Tuple(_) => "tuple",
            Self::Map(_) => "map",
            Self::List(_) => "list",
            Self::Opaque(_) => "opaque",
        }
    }

    /// Returns `true` if the value belongs to the JSON grammar: null, booleans,
    /// integers, floats, text, and containers whose own flag is set.
    ///
    /// O(1): container flags are cached at construction.
    #[must_use]
    pub fn is_json_compatible(&self) -> bool {
        match self {
            Self::Null | Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Text(_) => true,
            Self::Map(m) => m.is_json_compatible(),
            Self::List(l) => l.is_json_compatible(),
            Self::Bytes(_) | Self::Tuple(_) | Self::Opaque(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Content hashing
// ---------------------------------------------------------------------------

impl Value {
    /// Computes the 160-bit content fingerprint.
    ///
    /// Scalars whose payload fits in [`INLINE_MAX`](crate::fingerprint::INLINE_MAX)
    /// bytes are packed inline; longer text/bytes and all tuples and
    /// containers are digested from their canonical encoding.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        let inline = match self {
            Self::Null => Fingerprint::inline(KIND_NULL, &[]),
            Self::Bool(b) => Fingerprint::inline(KIND_BOOL, &[u8::from(*b)]),
            Self::Int(i) => Fingerprint::inline(KIND_INT, &i.to_le_bytes()),
            Self::Float(x) => Fingerprint::inline(KIND_FLOAT, &x.to_bits().to_le_bytes()),
            Self::Text(s) => Fingerprint::inline(KIND_TEXT, s.as_bytes()),
            Self::Bytes(b) => Fingerprint::inline(KIND_BYTES, b),
            Self::Opaque(o) => Fingerprint::inline(KIND_OPAQUE, &(o.addr() as u64).to_le_bytes()),
            Self::Tuple(_) | Self::Map(_) | Self::List(_) => None,
        };
        inline.unwrap_or_else(|| {
            let mut ctx = Sha1::new();
            self.feed(&mut ctx);
            Fingerprint::from_bytes(ctx.finalize())
        })
    }

    /// Feeds the canonical byte encoding into `ctx`.
    ///
    /// Three-byte type tag followed by a little-endian payload; variable-size
    /// payloads are length-prefixed so concatenations stay unambiguous.
    pub fn feed(&self, ctx: &mut Sha1) {
        match self {
            Self::Null => {
                ctx.update(b"nul");
            }
            Self::Bool(b) => {
                ctx.update(b"bol").update(&[u8::from(*b)]);
            }
            Self::Int(i) => {
                ctx.update(b"lon").update(&i.to_le_bytes());
            }
            Self::Float(x) => {
                ctx.update(b"flt").update(&x.to_bits().to_le_bytes());
            }
            Self::Text(s) => {
                ctx.update(b"unc").update(&len_bytes(s.len())).update(s.as_bytes());
            }
            Self::Bytes(b) => {
                ctx.update(b"byt").update(&len_bytes(b.len())).update(b);
            }
            Self::Tuple(items) => {
                ctx.update(b"tpl").update(&len_bytes(items.len()));
                for item in items.iter() {
                    item.feed(ctx);
                }
            }
            Self::Map(m) => {
                ctx.update(b"map")
                    .update(&len_bytes(m.len()))
                    .update(m.fingerprint().as_bytes());
            }
            Self::List(l) => {
                ctx.update(b"lst")
                    .update(&len_bytes(l.len()))
                    .update(l.fingerprint().as_bytes());
            }
            Self::Opaque(o) => {
                ctx.update(b"obj").update(&(o.addr() as u64).to_le_bytes());
            }
        }
    }
}

const fn len_bytes(len: usize) -> [u8; 8] {
    (len as u64).to_le_bytes()
}

// ---------------------------------------------------------------------------
// Strict equality
// ---------------------------------------------------------------------------

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a.ptr_eq(b),
            (Self::List(a), Self::List(b)) => a.ptr_eq(b),
            (Self::Opaque(a), Self::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(x) => x.to_bits().hash(state),
            Self::Text(s) => s.hash(state),
            Self::Bytes(b) => b.hash(state),
            Self::Tuple(items) => items.hash(state),
            Self::Map(m) => m.fingerprint().hash(state),
            Self::List(l) => l.fingerprint().hash(state),
            Self::Opaque(o) => o.addr().hash(state),
        }
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(Arc::from(s))
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(Arc::from(b))
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(Arc::from(b))
    }
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}

impl From<PersistentMap> for Value {
    fn from(m: PersistentMap) -> Self {
        Self::Map(m)
    }
}

impl From<PersistentVector> for Value {
    fn from(l: PersistentVector) -> Self {
        Self::List(l)
    }
}

impl From<Opaque> for Value {
    fn from(o: Opaque) -> Self {
        Self::Opaque(o)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Text(s) => write!(f, "{:?}", &**s),
            Self::Bytes(b) => write!(f, "b\"{}\"", b.escape_ascii()),
            Self::Tuple(items) => {
                let mut t = f.debug_tuple("");
                for item in items.iter() {
                    t.field(item);
                }
                t.finish()
            }
            Self::Map(m) => fmt::Debug::fmt(m, f),
            Self::List(l) => fmt::Debug::fmt(l, f),
            Self::Opaque(o) => fmt::Debug::fmt(o, f),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
