//! Parsed values and byte-order selection.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Byte order for multi-byte primitive reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Least-significant byte first.
    Little,
    /// Most-significant byte first.
    Big,
}

/// A value produced by executing one opcode.
///
/// Values are dynamically shaped: the description decides what each field
/// yields, and back-references carry whatever the referenced field produced.
/// The engine performs no coercion between variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Signed integer (two's complement reads).
    Int(i64),
    /// Unsigned integer (unsigned reads, varints, cursor positions).
    UInt(u64),
    /// IEEE 754 floating point, widened to 64 bits.
    Float(f64),
    /// Single-byte boolean (nonzero is true).
    Bool(bool),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Decoded string, or the hex rendering of raw bytes.
    Str(String),
    /// Ordered sequence produced by a list opcode.
    List(Vec<Value>),
    /// Keyed record of a nested structure, in declared field order.
    Record(IndexMap<String, Value>),
    /// Positional tuple: a structure in positional output mode, or an
    /// evaluated argument group.
    Tuple(Vec<Value>),
}

impl Value {
    /// Interpret the value as a length or count.
    ///
    /// Only non-negative integers qualify; anything else is `None`.
    pub fn as_len(&self) -> Option<usize> {
        match self {
            Value::Int(v) => usize::try_from(*v).ok(),
            Value::UInt(v) => usize::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Interpret the value as a seek offset.
    pub fn as_offset(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Interpret the value as a signed integer, for diagnostics and match
    /// discriminants.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::UInt(v) => i64::try_from(*v).ok(),
            Value::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Look up a record field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Index into a list or tuple.
    pub fn at(&self, index: usize) -> Option<&Value> {
        match self {
            Value::List(items) | Value::Tuple(items) => items.get(index),
            _ => None,
        }
    }
}
