//! Per-parse evaluation context.
//!
//! The context is a value threaded through the interpreter, constructed
//! fresh at every top-level parse entry: field values captured so far
//! (stacked per nesting level), default byte orders, default encoding, and
//! render flags. Nothing here is process-wide, so independent parses on
//! independent streams are trivially safe to run in parallel.

use encoding_rs::Encoding;
use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::program::Program;
use crate::value::{ByteOrder, Value};

/// Output shape for structure frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Ordered name-to-value record; anonymous slots are dropped.
    #[default]
    Keyed,
    /// Ordered tuple of the non-anonymous values.
    Positional,
}

/// Options accepted by the public parse entry.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Default integer byte order.
    pub order: ByteOrder,
    /// Float byte order; derived from `order` when unset.
    pub float_order: Option<ByteOrder>,
    /// Default string encoding label.
    pub encoding: String,
    /// Render raw-byte fields as lowercase hex strings.
    pub bytes_to_hex: bool,
    /// Output shape, applied uniformly at every nesting level.
    pub output: OutputMode,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            order: ByteOrder::Little,
            float_order: None,
            encoding: "utf-8".to_string(),
            bytes_to_hex: false,
            output: OutputMode::Keyed,
        }
    }
}

/// One nesting level's captured values.
///
/// Slot `i` holds the value captured by program slot `i`; anonymous slots
/// stay `None`.
#[derive(Debug, Default)]
struct Frame {
    slots: Vec<Option<Value>>,
}

/// Per-parse evaluation state.
#[derive(Debug)]
pub struct Context {
    frames: Vec<Frame>,
    pub(crate) byte_order: ByteOrder,
    pub(crate) float_order: ByteOrder,
    pub(crate) encoding: &'static Encoding,
    pub(crate) bytes_to_hex: bool,
    pub(crate) output: OutputMode,
}

impl Context {
    /// Build a fresh context from parse options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEncoding`] when the default encoding label
    /// does not name a known encoding.
    pub fn new(options: &ParseOptions) -> Result<Self> {
        let encoding = Encoding::for_label(options.encoding.as_bytes()).ok_or_else(|| {
            Error::UnknownEncoding {
                label: options.encoding.clone(),
            }
        })?;
        Ok(Self {
            frames: Vec::new(),
            byte_order: options.order,
            float_order: options.float_order.unwrap_or(options.order),
            encoding,
            bytes_to_hex: options.bytes_to_hex,
            output: options.output,
        })
    }

    /// Enter a nesting level. Defaults are inherited, not pushed.
    pub(crate) fn push_frame(&mut self, slot_count: usize) {
        self.frames.push(Frame {
            slots: Vec::with_capacity(slot_count),
        });
    }

    /// Capture a slot value in the current frame (`None` for anonymous
    /// slots). Slots land at the index of the opcode that produced them.
    pub(crate) fn capture(&mut self, value: Option<Value>) {
        let frame = self.frames.last_mut().expect("capture outside a frame");
        frame.slots.push(value);
    }

    /// Resolve a positional back-reference in the current frame.
    pub(crate) fn slot(&self, index: usize) -> Result<&Value> {
        self.frames
            .last()
            .and_then(|frame| frame.slots.get(index))
            .and_then(|slot| slot.as_ref())
            .ok_or_else(|| Error::Program {
                message: format!("reference to unpopulated slot {index}"),
            })
    }

    /// Leave a nesting level, shaping its slots per the output mode.
    pub(crate) fn pop_frame(&mut self, program: &Program) -> Value {
        let frame = self.frames.pop().expect("pop outside a frame");
        match self.output {
            OutputMode::Keyed => {
                let mut record = IndexMap::with_capacity(frame.slots.len());
                for (name, slot) in program.names().iter().zip(frame.slots) {
                    if let (Some(name), Some(value)) = (name, slot) {
                        record.insert(name.clone(), value);
                    }
                }
                Value::Record(record)
            }
            OutputMode::Positional => {
                Value::Tuple(frame.slots.into_iter().flatten().collect())
            }
        }
    }
}
