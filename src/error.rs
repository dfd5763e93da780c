//! Error types for structure compilation and parsing.
//!
//! # Error Categories
//!
//! - **Compile-time errors**: [`Error::UnresolvedReference`], [`Error::DuplicateField`],
//!   [`Error::Program`]
//! - **Stream errors**: [`Error::UnexpectedEnd`], [`Error::InvalidSeek`], [`Error::Io`]
//! - **Value errors**: [`Error::InvalidLength`], [`Error::NoMatch`], [`Error::Decode`],
//!   [`Error::MalformedVarint`]
//! - **User errors**: [`Error::Callback`]
//!
//! # Error Handling Policy
//!
//! No error is recovered within the engine: the description is authoritative,
//! and any mismatch between it and the input stream aborts the parse. Errors
//! surface at the public entry wrapped in [`Error::Field`], which attaches the
//! failing field's name and the stream offset where its read began.

use thiserror::Error;

/// Parse result type alias.
///
/// Convenience type for functions that may fail with an engine error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while compiling a structure description or executing a
/// compiled program against a byte stream.
#[derive(Debug, Error)]
pub enum Error {
    /// The stream ran out of bytes mid-read.
    ///
    /// Reads are exact: a primitive reader that needs `wanted` bytes fails
    /// rather than returning a short buffer.
    #[error("unexpected end of stream at offset {offset}: wanted {wanted} bytes")]
    UnexpectedEnd {
        /// Stream offset when the read gave up.
        offset: u64,
        /// Number of bytes the reader asked for.
        wanted: usize,
    },

    /// A length or count source evaluated to a negative or non-integer value.
    ///
    /// References used as lengths are not coerced; the referenced field must
    /// have produced a non-negative integer.
    #[error("invalid length: {found}")]
    InvalidLength {
        /// Rendering of the offending value.
        found: String,
    },

    /// A `Var` reference names a field not declared earlier at the same
    /// nesting level.
    ///
    /// References resolve strictly backwards: a field can only refer to
    /// fields declared before it, and never across structure boundaries.
    #[error("unresolved reference to field `{name}`")]
    UnresolvedReference {
        /// The name that failed to resolve.
        name: String,
    },

    /// A field name was declared twice within one structure.
    #[error("duplicate field `{name}` in structure description")]
    DuplicateField {
        /// The repeated name.
        name: String,
    },

    /// A match discriminant fell outside the branch table.
    ///
    /// Branches are indexed positionally: the discriminant selects branch
    /// `0..arms` and anything else is fatal.
    #[error("match discriminant {index} out of range for {arms} branches")]
    NoMatch {
        /// The evaluated discriminant.
        index: i64,
        /// Number of branches in the table.
        arms: usize,
    },

    /// String bytes could not be decoded under the selected encoding.
    #[error("cannot decode string as {encoding}")]
    Decode {
        /// Name of the encoding that rejected the bytes.
        encoding: &'static str,
    },

    /// An encoding label did not name a known encoding.
    #[error("unknown encoding label `{label}`")]
    UnknownEncoding {
        /// The unrecognized label.
        label: String,
    },

    /// A user callable reported a failure.
    ///
    /// Callables are opaque to the engine; whatever they report is carried
    /// through verbatim.
    #[error("user callable failed: {message}")]
    Callback {
        /// Failure description from the callable.
        message: String,
    },

    /// A seek targeted a negative position.
    #[error("invalid seek to offset {offset}")]
    InvalidSeek {
        /// The offending target offset.
        offset: i64,
    },

    /// A varint continued past the width of a 64-bit integer.
    #[error("varint exceeds 64 bits")]
    MalformedVarint,

    /// The description or compiled program is internally inconsistent.
    ///
    /// This covers malformed opcodes: invalid integer widths, empty branch
    /// tables, anonymous opcodes in value position, and similar structural
    /// defects caught at compile time.
    #[error("malformed program: {message}")]
    Program {
        /// Description of the structural defect.
        message: String,
    },

    /// The underlying reader failed for a reason other than clean exhaustion.
    #[error("stream i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper attaching the failing field and stream offset to an error.
    ///
    /// This is the shape parse errors surface in at the public entry. Nested
    /// structures produce a chain of these, outermost field first. Anonymous
    /// slots report the field name `_`.
    #[error("field `{field}` at offset {offset}: {source}")]
    Field {
        /// Name of the field whose execution failed.
        field: String,
        /// Stream offset where the field's opcode started executing.
        offset: u64,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap this error with the field name and start offset it occurred in.
    pub(crate) fn at_field(self, field: &str, offset: u64) -> Self {
        Error::Field {
            field: field.to_string(),
            offset,
            source: Box::new(self),
        }
    }
}
