//! Value model and typed views
//!
//! Storage operates over a closed, tagged [`Value`] type rather than
//! unconstrained dynamic values: every backend and the codec match over the
//! same exhaustive set of shapes, and the archived wire form can only ever
//! decode back into one of them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A storable value
///
/// The variant set doubles as the deserialization allow-list for the
/// archived data policy: a blob tagged with anything outside this set fails
/// to decode instead of materializing an unknown type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    #[serde(rename = "uint")]
    UInt(u64),
    /// Floating point number
    Float(f64),
    /// Boolean
    Bool(bool),
    /// UTF-8 string
    String(String),
    /// Opaque byte blob, base64 in the archived form
    Bytes(#[serde(with = "base64_bytes")] Vec<u8>),
    /// Point in time (UTC)
    Timestamp(DateTime<Utc>),
    /// Ordered sequence of values
    Array(Vec<Value>),
    /// String-keyed mapping of values
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Human-readable name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Timestamp(_) => "timestamp",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }
}

/// Base64 representation for byte blobs inside the archived JSON form
mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::Int(v.into())
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int(v.into())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::UInt(v.into())
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::UInt(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UInt(v.into())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

/// Checked extraction of a native type from a [`Value`]
///
/// Integer extraction accepts both the signed and unsigned variants when
/// the stored number fits the target width; it never truncates. Everything
/// else matches its own variant only.
pub trait FromValue: Sized {
    /// Extract `Self` from the value, or `None` on a type mismatch
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_from_value_for_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::Int(v) => (*v).try_into().ok(),
                        Value::UInt(v) => (*v).try_into().ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_from_value_for_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v as f32),
            _ => None,
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bytes(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Timestamp(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

/// Read-only typed view over a retrieved value
///
/// Every accessor attempts a checked coercion and returns `None` on
/// mismatch; nothing here panics or raises.
#[derive(Debug, Clone, Default)]
pub struct StorageValue(Option<Value>);

impl StorageValue {
    /// Wrap a retrieved value (or its absence)
    pub fn new(value: Option<Value>) -> Self {
        Self(value)
    }

    /// The underlying value, if any
    pub fn any(&self) -> Option<&Value> {
        self.0.as_ref()
    }

    fn coerce<T: FromValue>(&self) -> Option<T> {
        self.0.as_ref().and_then(T::from_value)
    }

    // Signed integers

    pub fn as_i8(&self) -> Option<i8> {
        self.coerce()
    }
    pub fn as_i16(&self) -> Option<i16> {
        self.coerce()
    }
    pub fn as_i32(&self) -> Option<i32> {
        self.coerce()
    }
    pub fn as_i64(&self) -> Option<i64> {
        self.coerce()
    }

    // Unsigned integers

    pub fn as_u8(&self) -> Option<u8> {
        self.coerce()
    }
    pub fn as_u16(&self) -> Option<u16> {
        self.coerce()
    }
    pub fn as_u32(&self) -> Option<u32> {
        self.coerce()
    }
    pub fn as_u64(&self) -> Option<u64> {
        self.coerce()
    }

    // Floating point

    pub fn as_f32(&self) -> Option<f32> {
        self.coerce()
    }
    pub fn as_f64(&self) -> Option<f64> {
        self.coerce()
    }

    // Other scalars

    pub fn as_bool(&self) -> Option<bool> {
        self.coerce()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.0.as_ref()? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self.0.as_ref()? {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        self.coerce()
    }

    // Collections

    pub fn as_array(&self) -> Option<&[Value]> {
        match self.0.as_ref()? {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self.0.as_ref()? {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Coerce an array whose elements all extract as `T`
    ///
    /// A single mismatching element fails the whole coercion.
    pub fn array_of<T: FromValue>(&self) -> Option<Vec<T>> {
        self.as_array()?.iter().map(T::from_value).collect()
    }

    /// Coerce a map whose values all extract as `T`
    pub fn map_of<T: FromValue>(&self) -> Option<BTreeMap<String, T>> {
        self.as_map()?
            .iter()
            .map(|(k, v)| T::from_value(v).map(|v| (k.clone(), v)))
            .collect()
    }
}

impl From<Option<Value>> for StorageValue {
    fn from(value: Option<Value>) -> Self {
        Self(value)
    }
}
