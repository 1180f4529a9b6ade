//! Scalar values held by primitive fields.

use core::fmt;

/// Type of a primitive field. Fixed by the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// `bool`
    Bool,
    /// `i32`
    Int32,
    /// `i64`
    Int64,
    /// `f32`
    Float32,
    /// UTF-8 string
    String,
    /// Opaque byte blob
    Bytes,
}

impl PrimitiveKind {
    /// Stable wire tag.
    pub const fn tag(self) -> u8 {
        match self {
            PrimitiveKind::Bool => 0,
            PrimitiveKind::Int32 => 1,
            PrimitiveKind::Int64 => 2,
            PrimitiveKind::Float32 => 3,
            PrimitiveKind::String => 4,
            PrimitiveKind::Bytes => 5,
        }
    }

    /// Inverse of [`tag`](Self::tag).
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(PrimitiveKind::Bool),
            1 => Some(PrimitiveKind::Int32),
            2 => Some(PrimitiveKind::Int64),
            3 => Some(PrimitiveKind::Float32),
            4 => Some(PrimitiveKind::String),
            5 => Some(PrimitiveKind::Bytes),
            _ => None,
        }
    }

    /// Lowercase name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Int32 => "int32",
            PrimitiveKind::Int64 => "int64",
            PrimitiveKind::Float32 => "float32",
            PrimitiveKind::String => "string",
            PrimitiveKind::Bytes => "bytes",
        }
    }
}

/// A scalar value.
///
/// Equality on [`Value::Float32`] is bitwise, so `NaN == NaN` and `0.0 != -0.0`.
/// Snapshots round-trip floats exactly and the graph compares what it stores.
#[derive(Debug, Clone)]
pub enum Value {
    /// Boolean
    Bool(bool),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 32-bit float
    Float32(f32),
    /// UTF-8 string
    String(String),
    /// Opaque bytes
    Bytes(Vec<u8>),
}

impl Value {
    /// Kind of this value.
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Value::Bool(_) => PrimitiveKind::Bool,
            Value::Int32(_) => PrimitiveKind::Int32,
            Value::Int64(_) => PrimitiveKind::Int64,
            Value::Float32(_) => PrimitiveKind::Float32,
            Value::String(_) => PrimitiveKind::String,
            Value::Bytes(_) => PrimitiveKind::Bytes,
        }
    }

    /// Zero value of the given kind.
    pub fn zero(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Bool => Value::Bool(false),
            PrimitiveKind::Int32 => Value::Int32(0),
            PrimitiveKind::Int64 => Value::Int64(0),
            PrimitiveKind::Float32 => Value::Float32(0.0),
            PrimitiveKind::String => Value::String(String::new()),
            PrimitiveKind::Bytes => Value::Bytes(Vec::new()),
        }
    }

    /// Returns the boolean, if this is a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the integer, if this is a [`Value::Int32`].
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the integer, if this is a [`Value::Int64`].
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the float, if this is a [`Value::Float32`].
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string, if this is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the bytes, if this is a [`Value::Bytes`].
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float32(a), Value::Float32(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v:?}"),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_equality_is_bitwise() {
        assert_eq!(Value::Float32(f32::NAN), Value::Float32(f32::NAN));
        assert_ne!(Value::Float32(0.0), Value::Float32(-0.0));
    }

    #[test]
    fn kinds_round_trip_through_tags() {
        for kind in [
            PrimitiveKind::Bool,
            PrimitiveKind::Int32,
            PrimitiveKind::Int64,
            PrimitiveKind::Float32,
            PrimitiveKind::String,
            PrimitiveKind::Bytes,
        ] {
            assert_eq!(PrimitiveKind::from_tag(kind.tag()), Some(kind));
            assert_eq!(Value::zero(kind).kind(), kind);
        }
        assert_eq!(PrimitiveKind::from_tag(99), None);
    }

    #[test]
    fn accessors_match_variant() {
        assert_eq!(Value::from(3).as_i32(), Some(3));
        assert_eq!(Value::from(3).as_f32(), None);
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::from(vec![1u8, 2]).as_bytes(), Some(&[1u8, 2][..]));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(9i64).as_i64(), Some(9));
    }

    #[test]
    fn mixed_kinds_are_unequal() {
        assert_ne!(Value::Int32(0), Value::Int64(0));
    }
}
