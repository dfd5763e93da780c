//! Compiler from structure descriptions to opcode programs.
//!
//! This module implements the lowering pass that converts a [`StructSpec`]
//! into a [`Program`]: a linear opcode sequence with symbolic `Var`
//! references resolved into positional back-references.
//!
//! # Compilation Strategy
//!
//! 1. Walk the declared fields in order, one pass.
//! 2. Lower each reader to an [`Op`], resolving `Var` references against the
//!    names declared strictly earlier in this frame.
//! 3. Recursively compile nested structure specs into sub-programs; no
//!    description object survives into the program.
//! 4. Validate structure as we go: widths, branch tables, encoding labels,
//!    and value positions are checked here, never at run time.
//!
//! A reference to a name declared later (or not at all) is a compile-time
//! error; so is a duplicated field name. Seek fields occupy a program slot
//! but enter neither the name table nor the output record.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::opcode::{Op, Source};
use crate::program::Program;
use crate::spec::{ReaderSpec, SourceSpec, StructSpec};

/// A single-frame lowering pass.
///
/// Each nesting level gets its own compiler instance with a fresh name
/// table; references never cross structure boundaries.
pub struct Compiler {
    /// Field name to slot index, in declaration order.
    names: IndexMap<String, usize>,
    program: Program,
}

impl Compiler {
    /// Compile a structure description into a program.
    ///
    /// # Errors
    ///
    /// Returns an error if the description is structurally invalid:
    /// - a `Var` reference to a name not declared earlier in the same frame
    /// - a duplicated field name
    /// - an integer width that is zero, not a multiple of 8, or above 64
    /// - a float width other than 32 or 64
    /// - an empty `Match` branch table
    /// - an anonymous reader (`Seek`) in a position that must produce a
    ///   value: under `Peek`, as a list element, a match branch, or an
    ///   inline source
    /// - an unknown encoding label
    pub fn compile(spec: &StructSpec) -> Result<Program> {
        debug!(fields = spec.len(), "compiling structure description");
        let mut compiler = Self {
            names: IndexMap::new(),
            program: Program::new(),
        };
        for (name, reader) in spec.fields() {
            let op = compiler.lower(reader)?;
            if let Op::Seek { .. } = op {
                compiler.program.push(None, op);
                continue;
            }
            if compiler.names.contains_key(name) {
                return Err(Error::DuplicateField {
                    name: name.to_string(),
                });
            }
            let index = compiler.program.push(Some(name.to_string()), op);
            compiler.names.insert(name.to_string(), index);
        }
        Ok(compiler.program)
    }

    /// Lower one reader to an opcode.
    fn lower(&mut self, reader: &ReaderSpec) -> Result<Op> {
        match reader {
            ReaderSpec::Int { bits, order } => {
                check_int_width(*bits)?;
                Ok(Op::Int {
                    bits: *bits,
                    signed: true,
                    order: *order,
                })
            }
            ReaderSpec::UInt { bits, order } => {
                check_int_width(*bits)?;
                Ok(Op::Int {
                    bits: *bits,
                    signed: false,
                    order: *order,
                })
            }
            ReaderSpec::Float { bits, order } => {
                if !matches!(bits, 32 | 64) {
                    return Err(Error::Program {
                        message: format!("float width must be 32 or 64 bits, got {bits}"),
                    });
                }
                Ok(Op::Float {
                    bits: *bits,
                    order: *order,
                })
            }
            ReaderSpec::Bool => Ok(Op::Bool),
            ReaderSpec::Uvarint => Ok(Op::Uvarint),
            ReaderSpec::Pos => Ok(Op::Pos),
            ReaderSpec::Bytes(len) => Ok(Op::Bytes {
                len: self.lower_source(len)?,
            }),
            ReaderSpec::Str { len, encoding } => {
                let encoding = encoding
                    .as_deref()
                    .map(|label| {
                        encoding_rs::Encoding::for_label(label.as_bytes()).ok_or_else(|| {
                            Error::UnknownEncoding {
                                label: label.to_string(),
                            }
                        })
                    })
                    .transpose()?;
                Ok(Op::Str {
                    len: self.lower_source(len)?,
                    encoding,
                })
            }
            ReaderSpec::Const(value) => Ok(Op::Const(value.clone())),
            ReaderSpec::Struct(spec) => Ok(Op::Struct(Compiler::compile(spec)?)),
            ReaderSpec::List { count, elem } => {
                let count = self.lower_source(count)?;
                let elem = self.lower_value_op(elem, "list element")?;
                Ok(Op::List {
                    count,
                    elem: Box::new(elem),
                })
            }
            ReaderSpec::Match { on, arms } => {
                if arms.is_empty() {
                    return Err(Error::Program {
                        message: "match branch table is empty".to_string(),
                    });
                }
                let on = self.lower_source(on)?;
                let arms = arms
                    .iter()
                    .map(|arm| self.lower_value_op(arm, "match branch"))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Op::Match { on, arms })
            }
            ReaderSpec::Peek(inner) => {
                let inner = self.lower_value_op(inner, "peek target")?;
                Ok(Op::Peek(Box::new(inner)))
            }
            ReaderSpec::Seek { offset, mode } => Ok(Op::Seek {
                offset: self.lower_source(offset)?,
                mode: *mode,
            }),
            ReaderSpec::Call { func, args } => Ok(Op::Call {
                func: func.clone(),
                args: self.lower_sources(args)?,
            }),
            ReaderSpec::Group(items) => Ok(Op::Group(self.lower_sources(items)?)),
        }
    }

    /// Lower a reader required to produce a value.
    fn lower_value_op(&mut self, reader: &ReaderSpec, position: &str) -> Result<Op> {
        let op = self.lower(reader)?;
        if !op.produces_value() {
            return Err(Error::Program {
                message: format!("{position} must produce a value, got a seek"),
            });
        }
        Ok(op)
    }

    /// Lower an operand source, resolving `Var` references positionally.
    ///
    /// A dotted reference (`p.a`) resolves its first segment against the
    /// frame's name table; the remaining segments become a projection into
    /// the referenced value, applied at run time.
    fn lower_source(&mut self, source: &SourceSpec) -> Result<Source> {
        match source {
            SourceSpec::Lit(value) => Ok(Source::Lit(*value)),
            SourceSpec::Var(name) => {
                let mut segments = name.split('.');
                let head = segments.next().unwrap_or_default();
                let index = self.names.get(head).copied().ok_or_else(|| {
                    Error::UnresolvedReference {
                        name: name.clone(),
                    }
                })?;
                Ok(Source::Ref {
                    index,
                    path: segments.map(str::to_string).collect(),
                })
            }
            SourceSpec::Read(reader) => {
                let op = self.lower_value_op(reader, "inline source")?;
                Ok(Source::Inline(Box::new(op)))
            }
        }
    }

    fn lower_sources(&mut self, sources: &[SourceSpec]) -> Result<Vec<Source>> {
        sources.iter().map(|s| self.lower_source(s)).collect()
    }
}

fn check_int_width(bits: u16) -> Result<()> {
    if bits == 0 || bits % 8 != 0 || bits > 64 {
        return Err(Error::Program {
            message: format!("integer width must be a nonzero multiple of 8 up to 64, got {bits}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests;
