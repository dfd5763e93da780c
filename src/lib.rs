//! Declarative binary-format parsing.
//!
//! A binary layout is described as an ordered collection of named fields,
//! each paired with a typed reader. The description is compiled into a
//! linear opcode program with symbolic field references resolved into
//! positional back-references, and an interpreter executes the program
//! against a seekable byte stream, producing a keyed record or a positional
//! tuple of the parsed values.
//!
//! # Architecture
//!
//! - [`spec`] - Structure descriptions: [`StructSpec`], [`ReaderSpec`],
//!   [`SourceSpec`]
//! - [`compiler`] - Description → [`Program`] lowering and reference
//!   resolution
//! - [`opcode`] - The compiled instruction set: [`Op`], [`Source`]
//! - [`interp`] - Program execution against a stream and context
//! - [`stream`] - Seekable cursor with primitive typed readers
//! - [`context`] - Per-parse state: captured values, defaults, flags
//! - [`value`] - Parsed values and byte-order selection
//! - [`error`] - Error types
//!
//! Compiled programs are immutable and freely reusable across parses; the
//! per-parse context is constructed fresh at every entry, so independent
//! parses never observe each other.
//!
//! # Example
//!
//! ```
//! use binform::{parse_struct, ParseOptions, ReaderSpec, StructSpec, Value};
//!
//! let spec = StructSpec::new()
//!     .field("len", ReaderSpec::uint(8))
//!     .field("body", ReaderSpec::string("len"));
//!
//! let parsed = parse_struct(&spec, b"\x05hello", &ParseOptions::default()).unwrap();
//! assert_eq!(parsed.get("len"), Some(&Value::UInt(5)));
//! assert_eq!(parsed.get("body"), Some(&Value::Str("hello".to_string())));
//! ```

pub mod compiler;
pub mod context;
pub mod error;
pub mod interp;
pub mod opcode;
pub mod program;
pub mod spec;
pub mod stream;
pub mod value;

use std::io::{Cursor, Read, Seek};

pub use compiler::Compiler;
pub use context::{Context, OutputMode, ParseOptions};
pub use error::{Error, Result};
pub use interp::Interpreter;
pub use opcode::{Op, Source};
pub use program::Program;
pub use spec::{ReaderSpec, SourceSpec, StructSpec, UserFn};
pub use stream::{SeekMode, Stream};
pub use value::{ByteOrder, Value};

/// Either a structure description or an already-compiled program.
///
/// [`parse_struct`] accepts both: descriptions are compiled on the fly,
/// programs pass through untouched, so handing a compiled program back in
/// is a no-op by construction.
#[derive(Debug, Clone, Copy)]
pub enum StructSource<'a> {
    /// A description, compiled before execution.
    Spec(&'a StructSpec),
    /// A pre-compiled program, executed as-is.
    Program(&'a Program),
}

impl<'a> From<&'a StructSpec> for StructSource<'a> {
    fn from(spec: &'a StructSpec) -> Self {
        StructSource::Spec(spec)
    }
}

impl<'a> From<&'a Program> for StructSource<'a> {
    fn from(program: &'a Program) -> Self {
        StructSource::Program(program)
    }
}

/// Compile a structure description into a reusable program.
///
/// Pure function of the description: parse options affect execution, not
/// compilation.
///
/// # Errors
///
/// Returns an error when the description is structurally invalid; see
/// [`Compiler::compile`].
pub fn compile_struct(spec: &StructSpec) -> Result<Program> {
    Compiler::compile(spec)
}

/// Parse a byte slice against a description or pre-compiled program.
///
/// # Errors
///
/// Returns a compile error for an invalid description, or an execution
/// error wrapped with the failing field's name and stream offset.
pub fn parse_struct<'a>(
    source: impl Into<StructSource<'a>>,
    data: &[u8],
    options: &ParseOptions,
) -> Result<Value> {
    parse_struct_reader(source, Cursor::new(data), options)
}

/// Parse an arbitrary seekable reader (e.g. a `BufReader<File>`) against a
/// description or pre-compiled program.
///
/// The reader is owned by the parse for its duration; the engine retains
/// nothing from it afterwards.
///
/// # Errors
///
/// Returns a compile error for an invalid description, or an execution
/// error wrapped with the failing field's name and stream offset.
pub fn parse_struct_reader<'a, R: Read + Seek>(
    source: impl Into<StructSource<'a>>,
    reader: R,
    options: &ParseOptions,
) -> Result<Value> {
    let source = source.into();
    let compiled;
    let program = match source {
        StructSource::Spec(spec) => {
            compiled = Compiler::compile(spec)?;
            &compiled
        }
        StructSource::Program(program) => program,
    };
    let mut stream = Stream::new(reader);
    let ctx = Context::new(options)?;
    Interpreter::new(&mut stream, ctx).run(program)
}
