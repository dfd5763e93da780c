//! Opcode definitions for the compiled parsing program.
//!
//! Opcodes are the positional instructions the interpreter executes. They are
//! **data, not behavior**: each variant carries its fully-resolved payload and
//! the interpreter supplies the semantics.
//!
//! # Design Rules
//!
//! 1. **No residual description** - Nested structures are compiled to
//!    sub-programs at compile time; no [`ReaderSpec`](crate::spec::ReaderSpec)
//!    survives into a program.
//! 2. **No name lookups at run time** - Symbolic `Var` references are resolved
//!    to positional [`Source::Ref`] indices by the compiler; the interpreter
//!    only indexes the current frame.
//! 3. **Fail loudly** - Structurally invalid opcodes (bad widths, empty branch
//!    tables, anonymous opcodes in value position) are compile errors, never
//!    silent run-time fallbacks.

use encoding_rs::Encoding;

use crate::program::Program;
use crate::spec::UserFn;
use crate::stream::SeekMode;
use crate::value::{ByteOrder, Value};

/// A value producer for an opcode parameter: length, count, discriminant,
/// offset, or argument.
#[derive(Debug, Clone)]
pub enum Source {
    /// Literal integer.
    Lit(i64),
    /// Positional back-reference into the current frame's captured values.
    ///
    /// The slot index is always resolved by the compiler to a named slot
    /// strictly earlier in the same frame. `path` projects into the
    /// referenced value: record fields by name, list/tuple elements by
    /// numeric segment (a dotted `p.a` reference compiles to slot-of-`p`
    /// plus path `["a"]`).
    Ref {
        /// Slot index in the current frame.
        index: usize,
        /// Projection segments applied to the slot value, outermost first.
        path: Vec<String>,
    },
    /// Inline opcode executed in place; its value is the operand.
    Inline(Box<Op>),
}

/// A compiled, positional instruction.
#[derive(Debug, Clone)]
pub enum Op {
    /// Read a primitive integer.
    Int {
        /// Width in bits (validated: nonzero multiple of 8, at most 64).
        bits: u16,
        /// Whether to sign-extend (two's complement).
        signed: bool,
        /// Explicit byte order; the context default applies when `None`.
        order: Option<ByteOrder>,
    },
    /// Read an IEEE 754 float.
    Float {
        /// Width in bits (validated: 32 or 64).
        bits: u16,
        /// Explicit byte order; the context float default applies when `None`.
        order: Option<ByteOrder>,
    },
    /// Read raw bytes; rendered as a lowercase hex string when the context's
    /// hex flag is set.
    Bytes {
        /// Byte length.
        len: Source,
    },
    /// Read and decode a string.
    Str {
        /// Byte length of the encoded string.
        len: Source,
        /// Per-field encoding; the context default applies when `None`.
        encoding: Option<&'static Encoding>,
    },
    /// Read an unsigned LEB128 varint.
    Uvarint,
    /// Read a single byte as a boolean.
    Bool,
    /// Capture a literal without touching the stream.
    Const(Value),
    /// Push a frame, execute the sub-program, pop, capture the result.
    Struct(Program),
    /// Execute the element opcode `count` times; capture the sequence.
    List {
        /// Element count.
        count: Source,
        /// Element opcode, executed against the enclosing frame.
        elem: Box<Op>,
    },
    /// Execute the branch selected by the discriminant.
    Match {
        /// Discriminant, indexing the branch table 0-based.
        on: Source,
        /// Branch opcodes in ascending discriminant order. Never empty.
        arms: Vec<Op>,
    },
    /// Save the cursor, execute the inner opcode, restore the cursor.
    Peek(Box<Op>),
    /// Move the cursor. Anonymous: occupies a program slot but captures no
    /// value and carries no name.
    Seek {
        /// Target offset, interpreted per `mode`.
        offset: Source,
        /// Cursor movement mode.
        mode: SeekMode,
    },
    /// Capture the current cursor offset.
    Pos,
    /// Evaluate arguments, invoke the user callable, capture its return.
    Call {
        /// The callable.
        func: UserFn,
        /// Argument sources, evaluated in declared order.
        args: Vec<Source>,
    },
    /// Capture a positional tuple of evaluated sources.
    Group(Vec<Source>),
}

impl Op {
    /// Whether executing this opcode captures a value.
    ///
    /// `Seek` is the only anonymous opcode: it runs for its cursor side
    /// effect and contributes neither a value nor a name.
    pub fn produces_value(&self) -> bool {
        !matches!(self, Op::Seek { .. })
    }
}
