//! Tree-walking interpreter for compiled programs.
//!
//! Executes a [`Program`] against a [`Stream`] with a [`Context`], one slot
//! at a time, capturing each non-anonymous opcode's value at its slot index.
//!
//! # Design Principles
//!
//! 1. **No name lookups** - Back-references index the current frame directly;
//!    the compiler already resolved every symbolic name.
//! 2. **Fail loudly** - Any mismatch between the program and the stream
//!    aborts the parse; there is no recovery and no silent fallback.
//! 3. **Scoped state** - All mutable state lives in the context value and the
//!    stream; the interpreter keeps nothing across parses.
//!
//! Errors are wrapped with the failing field's name and the stream offset
//! where its opcode started, outermost field first.

use std::io::{Read, Seek};

use tracing::{debug, trace};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::opcode::{Op, Source};
use crate::program::Program;
use crate::stream::{SeekMode, Stream};
use crate::value::Value;

/// Executes compiled programs against a byte stream.
pub struct Interpreter<'a, R> {
    stream: &'a mut Stream<R>,
    ctx: Context,
}

impl<'a, R: Read + Seek> Interpreter<'a, R> {
    /// Pair a stream with a fresh per-parse context.
    pub fn new(stream: &'a mut Stream<R>, ctx: Context) -> Self {
        Self { stream, ctx }
    }

    /// Execute a program, producing the top-level record or tuple.
    ///
    /// # Errors
    ///
    /// Returns an error when any opcode fails: stream exhaustion, invalid
    /// lengths, out-of-range match discriminants, decode failures, seek
    /// violations, or user-callable failures. The error carries the failing
    /// field's name and start offset.
    pub fn run(&mut self, program: &Program) -> Result<Value> {
        debug!(slots = program.len(), "executing program");
        self.run_frame(program)
    }

    /// Execute a program in a fresh frame and shape its output.
    fn run_frame(&mut self, program: &Program) -> Result<Value> {
        self.ctx.push_frame(program.len());
        for (name, op) in program.slots() {
            let offset = self.stream.position()?;
            trace!(field = name.unwrap_or("_"), offset, "executing opcode");
            let value = self
                .exec(op)
                .map_err(|e| e.at_field(name.unwrap_or("_"), offset))?;
            self.ctx.capture(value);
        }
        Ok(self.ctx.pop_frame(program))
    }

    /// Execute one opcode. `None` marks an anonymous slot.
    fn exec(&mut self, op: &Op) -> Result<Option<Value>> {
        match op {
            Op::Int {
                bits,
                signed,
                order,
            } => {
                let order = order.unwrap_or(self.ctx.byte_order);
                let value = if *signed {
                    Value::Int(self.stream.read_int(*bits, order)?)
                } else {
                    Value::UInt(self.stream.read_uint(*bits, order)?)
                };
                Ok(Some(value))
            }
            Op::Float { bits, order } => {
                let order = order.unwrap_or(self.ctx.float_order);
                Ok(Some(Value::Float(self.stream.read_float(*bits, order)?)))
            }
            Op::Bytes { len } => {
                let len = self.eval_len(len)?;
                let buf = self.stream.read_exact(len)?;
                Ok(Some(if self.ctx.bytes_to_hex {
                    Value::Str(hex::encode(&buf))
                } else {
                    Value::Bytes(buf)
                }))
            }
            Op::Str { len, encoding } => {
                let len = self.eval_len(len)?;
                let buf = self.stream.read_exact(len)?;
                let encoding = encoding.unwrap_or(self.ctx.encoding);
                let decoded = encoding
                    .decode_without_bom_handling_and_without_replacement(&buf)
                    .ok_or(Error::Decode {
                        encoding: encoding.name(),
                    })?;
                Ok(Some(Value::Str(decoded.into_owned())))
            }
            Op::Uvarint => Ok(Some(Value::UInt(self.stream.read_uvarint()?))),
            Op::Bool => Ok(Some(Value::Bool(self.stream.read_bool()?))),
            Op::Const(value) => Ok(Some(value.clone())),
            Op::Struct(program) => Ok(Some(self.run_frame(program)?)),
            Op::List { count, elem } => {
                let count = self.eval_len(count)?;
                let mut items = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    items.push(self.exec_value(elem)?);
                }
                Ok(Some(Value::List(items)))
            }
            Op::Match { on, arms } => {
                let discriminant = self.eval(on)?;
                let index = match &discriminant {
                    Value::Int(v) => *v,
                    Value::UInt(v) => i64::try_from(*v).unwrap_or(i64::MAX),
                    Value::Bool(v) => i64::from(*v),
                    other => {
                        return Err(Error::Program {
                            message: format!("match discriminant must be an integer, got {other:?}"),
                        })
                    }
                };
                if index < 0 || index as usize >= arms.len() {
                    return Err(Error::NoMatch {
                        index,
                        arms: arms.len(),
                    });
                }
                Ok(Some(self.exec_value(&arms[index as usize])?))
            }
            Op::Peek(inner) => {
                let pos = self.stream.position()?;
                let value = self.exec_value(inner)?;
                self.stream.seek(pos as i64, SeekMode::Start)?;
                Ok(Some(value))
            }
            Op::Seek { offset, mode } => {
                let target = self.eval(offset)?;
                let target = target.as_offset().ok_or_else(|| Error::Program {
                    message: format!("seek offset must be an integer, got {target:?}"),
                })?;
                self.stream.seek(target, *mode)?;
                Ok(None)
            }
            Op::Pos => Ok(Some(Value::UInt(self.stream.position()?))),
            Op::Call { func, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>>>()?;
                let value = func
                    .call(&args)
                    .map_err(|message| Error::Callback { message })?;
                Ok(Some(value))
            }
            Op::Group(items) => {
                let items = items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Some(Value::Tuple(items)))
            }
        }
    }

    /// Execute an opcode required to produce a value.
    ///
    /// The compiler guarantees value positions never hold anonymous opcodes;
    /// hitting one here is a program defect.
    fn exec_value(&mut self, op: &Op) -> Result<Value> {
        self.exec(op)?.ok_or_else(|| Error::Program {
            message: "anonymous opcode in value position".to_string(),
        })
    }

    /// Evaluate an operand source: literal, back-reference, or inline opcode.
    fn eval(&mut self, source: &Source) -> Result<Value> {
        match source {
            Source::Lit(value) => Ok(Value::Int(*value)),
            Source::Ref { index, path } => {
                let mut value = self.ctx.slot(*index)?;
                for segment in path {
                    value = project(value, segment).ok_or_else(|| Error::UnresolvedReference {
                        name: segment.clone(),
                    })?;
                }
                Ok(value.clone())
            }
            Source::Inline(op) => self.exec_value(op),
        }
    }

    /// Evaluate a source as a length or count.
    fn eval_len(&mut self, source: &Source) -> Result<usize> {
        let value = self.eval(source)?;
        value.as_len().ok_or_else(|| Error::InvalidLength {
            found: format!("{value:?}"),
        })
    }
}

/// Apply one projection segment: record fields by name, list/tuple elements
/// by numeric segment.
fn project<'v>(value: &'v Value, segment: &str) -> Option<&'v Value> {
    match segment.parse::<usize>() {
        Ok(index) => value.at(index),
        Err(_) => value.get(segment),
    }
}
