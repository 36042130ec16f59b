//! Typed handler results.
//!
//! A [`ResultValue`] fixes the JSON literal shape of a handler's answer when it is
//! built, so the serializer never has to guess how to render it.

use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Discriminant of a [`ResultValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Int,
    Float,
    String,
    Bool,
    Array,
    Object,
}

impl ResultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKind::Int => "int",
            ResultKind::Float => "float",
            ResultKind::String => "string",
            ResultKind::Bool => "bool",
            ResultKind::Array => "array",
            ResultKind::Object => "object",
        }
    }
}

/// A value produced by a handler, tagged with the JSON kind it encodes to.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultValue {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Array(Vec<Value>),
    Object(serde_json::Map<String, Value>),
}

impl ResultValue {
    pub fn kind(&self) -> ResultKind {
        match self {
            ResultValue::Int(_) => ResultKind::Int,
            ResultValue::Float(_) => ResultKind::Float,
            ResultValue::String(_) => ResultKind::String,
            ResultValue::Bool(_) => ResultKind::Bool,
            ResultValue::Array(_) => ResultKind::Array,
            ResultValue::Object(_) => ResultKind::Object,
        }
    }

    /// Encode any serializable value, requiring it to come out as a JSON array.
    pub fn array<T: Serialize + ?Sized>(value: &T) -> Result<Self, ResultError> {
        match serde_json::to_value(value)? {
            Value::Array(items) => Ok(ResultValue::Array(items)),
            other => Err(ResultError::Shape {
                expected: ResultKind::Array,
                found: json_kind(&other),
            }),
        }
    }

    /// Encode any serializable value, requiring it to come out as a JSON object.
    pub fn object<T: Serialize + ?Sized>(value: &T) -> Result<Self, ResultError> {
        match serde_json::to_value(value)? {
            Value::Object(map) => Ok(ResultValue::Object(map)),
            other => Err(ResultError::Shape {
                expected: ResultKind::Object,
                found: json_kind(&other),
            }),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            ResultValue::Int(n) => Value::from(*n),
            ResultValue::Float(f) => Value::from(*f),
            ResultValue::String(s) => Value::String(s.clone()),
            ResultValue::Bool(b) => Value::Bool(*b),
            ResultValue::Array(items) => Value::Array(items.clone()),
            ResultValue::Object(map) => Value::Object(map.clone()),
        }
    }
}

// Non-finite floats have no JSON literal; serde_json writes them as `null`.
impl Serialize for ResultValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ResultValue::Int(n) => serializer.serialize_i64(*n),
            ResultValue::Float(f) => serializer.serialize_f64(*f),
            ResultValue::String(s) => serializer.serialize_str(s),
            ResultValue::Bool(b) => serializer.serialize_bool(*b),
            ResultValue::Array(items) => items.serialize(serializer),
            ResultValue::Object(map) => map.serialize(serializer),
        }
    }
}

impl From<i64> for ResultValue {
    fn from(n: i64) -> Self {
        ResultValue::Int(n)
    }
}

impl From<f64> for ResultValue {
    fn from(f: f64) -> Self {
        ResultValue::Float(f)
    }
}

impl From<bool> for ResultValue {
    fn from(b: bool) -> Self {
        ResultValue::Bool(b)
    }
}

impl From<String> for ResultValue {
    fn from(s: String) -> Self {
        ResultValue::String(s)
    }
}

impl From<&str> for ResultValue {
    fn from(s: &str) -> Self {
        ResultValue::String(s.to_string())
    }
}

/// Failure to build an array or object result
#[derive(Debug, Error)]
pub enum ResultError {
    #[error("result encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("expected result to encode as {}, got {found}", .expected.as_str())]
    Shape {
        expected: ResultKind,
        found: &'static str,
    },
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
