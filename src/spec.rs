//! Structure descriptions: the declarative input lowered by the compiler.
//!
//! A [`StructSpec`] is an ordered list of `(name, reader)` pairs. Each
//! [`ReaderSpec`] names one of the typed readers; operand positions that
//! take a value (lengths, counts, discriminants, offsets, arguments) are
//! [`SourceSpec`]s, which may be a literal, a reference to an earlier field,
//! or an inline reader evaluated in place.
//!
//! Descriptions are plain data. Nothing here touches a stream; the compiler
//! turns a description into a [`Program`](crate::program::Program) and the
//! interpreter does the reading.

use std::fmt;
use std::sync::Arc;

use crate::stream::SeekMode;
use crate::value::{ByteOrder, Value};

/// A user-provided callable invoked by `Call` fields.
///
/// Callables receive the evaluated argument values in declared order and are
/// opaque to the engine: whatever failure they report aborts the parse as
/// [`Error::Callback`](crate::error::Error::Callback).
#[derive(Clone)]
pub struct UserFn(Arc<dyn Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync>);

impl UserFn {
    /// Wrap a function as a callable field.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the callable.
    pub(crate) fn call(&self, args: &[Value]) -> std::result::Result<Value, String> {
        (self.0)(args)
    }
}

impl fmt::Debug for UserFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UserFn")
    }
}

/// A value producer for an operand position.
#[derive(Debug, Clone)]
pub enum SourceSpec {
    /// Literal integer.
    Lit(i64),
    /// Reference to a field declared earlier at the same nesting level.
    Var(String),
    /// Inline reader executed in place.
    Read(Box<ReaderSpec>),
}

impl From<i64> for SourceSpec {
    fn from(value: i64) -> Self {
        SourceSpec::Lit(value)
    }
}

impl From<i32> for SourceSpec {
    fn from(value: i32) -> Self {
        SourceSpec::Lit(i64::from(value))
    }
}

impl From<u32> for SourceSpec {
    fn from(value: u32) -> Self {
        SourceSpec::Lit(i64::from(value))
    }
}

impl From<&str> for SourceSpec {
    fn from(name: &str) -> Self {
        SourceSpec::Var(name.to_string())
    }
}

impl From<ReaderSpec> for SourceSpec {
    fn from(reader: ReaderSpec) -> Self {
        SourceSpec::Read(Box::new(reader))
    }
}

/// One field's typed reader.
#[derive(Debug, Clone)]
pub enum ReaderSpec {
    /// Signed integer of `bits` width, two's complement.
    Int {
        /// Width in bits: nonzero multiple of 8, at most 64.
        bits: u16,
        /// Explicit byte order, or the parse default when `None`.
        order: Option<ByteOrder>,
    },
    /// Unsigned integer of `bits` width.
    UInt {
        /// Width in bits: nonzero multiple of 8, at most 64.
        bits: u16,
        /// Explicit byte order, or the parse default when `None`.
        order: Option<ByteOrder>,
    },
    /// IEEE 754 float of 32 or 64 bits.
    Float {
        /// Width in bits: 32 or 64.
        bits: u16,
        /// Explicit byte order, or the float default when `None`.
        order: Option<ByteOrder>,
    },
    /// Single-byte boolean.
    Bool,
    /// Unsigned LEB128 varint.
    Uvarint,
    /// Current cursor offset, captured without reading.
    Pos,
    /// Raw bytes of the given length.
    Bytes(SourceSpec),
    /// Decoded string of the given byte length.
    Str {
        /// Byte length of the encoded string.
        len: SourceSpec,
        /// Encoding label, or the parse default when `None`.
        encoding: Option<String>,
    },
    /// Literal captured as the field's value without reading.
    Const(Value),
    /// Nested structure.
    Struct(StructSpec),
    /// `count` repetitions of an element reader.
    List {
        /// Element count.
        count: SourceSpec,
        /// Reader executed once per element.
        elem: Box<ReaderSpec>,
    },
    /// Branch on a discriminant: branch `i` is selected by discriminant `i`.
    Match {
        /// Discriminant source, indexing the branch table 0-based.
        on: SourceSpec,
        /// Branch readers in ascending discriminant order.
        arms: Vec<ReaderSpec>,
    },
    /// Run the inner reader, then restore the cursor.
    Peek(Box<ReaderSpec>),
    /// Move the cursor. Produces no value; the field name is dropped.
    Seek {
        /// Target offset, interpreted per `mode`.
        offset: SourceSpec,
        /// Cursor movement mode.
        mode: SeekMode,
    },
    /// Invoke a user callable with evaluated arguments.
    Call {
        /// The callable.
        func: UserFn,
        /// Argument sources, evaluated in declared order.
        args: Vec<SourceSpec>,
    },
    /// Positional tuple of evaluated sources.
    Group(Vec<SourceSpec>),
}

impl ReaderSpec {
    /// Unsigned integer in the parse's default byte order.
    pub fn uint(bits: u16) -> Self {
        ReaderSpec::UInt { bits, order: None }
    }

    /// Unsigned big-endian integer.
    pub fn uint_be(bits: u16) -> Self {
        ReaderSpec::UInt {
            bits,
            order: Some(ByteOrder::Big),
        }
    }

    /// Unsigned little-endian integer.
    pub fn uint_le(bits: u16) -> Self {
        ReaderSpec::UInt {
            bits,
            order: Some(ByteOrder::Little),
        }
    }

    /// Signed integer in the parse's default byte order.
    pub fn int(bits: u16) -> Self {
        ReaderSpec::Int { bits, order: None }
    }

    /// Signed big-endian integer.
    pub fn int_be(bits: u16) -> Self {
        ReaderSpec::Int {
            bits,
            order: Some(ByteOrder::Big),
        }
    }

    /// Signed little-endian integer.
    pub fn int_le(bits: u16) -> Self {
        ReaderSpec::Int {
            bits,
            order: Some(ByteOrder::Little),
        }
    }

    /// Float in the parse's default float order.
    pub fn float(bits: u16) -> Self {
        ReaderSpec::Float { bits, order: None }
    }

    /// Raw bytes of the given length.
    pub fn bytes(len: impl Into<SourceSpec>) -> Self {
        ReaderSpec::Bytes(len.into())
    }

    /// String of the given byte length in the parse's default encoding.
    pub fn string(len: impl Into<SourceSpec>) -> Self {
        ReaderSpec::Str {
            len: len.into(),
            encoding: None,
        }
    }

    /// String of the given byte length in an explicit encoding.
    pub fn string_as(len: impl Into<SourceSpec>, encoding: impl Into<String>) -> Self {
        ReaderSpec::Str {
            len: len.into(),
            encoding: Some(encoding.into()),
        }
    }

    /// `count` repetitions of an element reader.
    pub fn list(count: impl Into<SourceSpec>, elem: ReaderSpec) -> Self {
        ReaderSpec::List {
            count: count.into(),
            elem: Box::new(elem),
        }
    }

    /// Branch table selected by a discriminant.
    pub fn match_on(on: impl Into<SourceSpec>, arms: Vec<ReaderSpec>) -> Self {
        ReaderSpec::Match {
            on: on.into(),
            arms,
        }
    }

    /// Run the inner reader, then restore the cursor.
    pub fn peek(inner: ReaderSpec) -> Self {
        ReaderSpec::Peek(Box::new(inner))
    }

    /// Move the cursor.
    pub fn seek(offset: impl Into<SourceSpec>, mode: SeekMode) -> Self {
        ReaderSpec::Seek {
            offset: offset.into(),
            mode,
        }
    }

    /// Invoke a user callable with evaluated arguments.
    pub fn call(func: UserFn, args: Vec<SourceSpec>) -> Self {
        ReaderSpec::Call { func, args }
    }
}

/// An ordered, named sequence of readers describing one binary layout.
#[derive(Debug, Clone, Default)]
pub struct StructSpec {
    fields: Vec<(String, ReaderSpec)>,
}

impl StructSpec {
    /// Create an empty description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Names must be unique within the structure; the
    /// compiler rejects duplicates.
    pub fn field(mut self, name: impl Into<String>, reader: ReaderSpec) -> Self {
        self.fields.push((name.into(), reader));
        self
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the description declares no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Declared fields in order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &ReaderSpec)> {
        self.fields.iter().map(|(n, r)| (n.as_str(), r))
    }
}
