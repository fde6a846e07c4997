use std::fmt;

use proccode::codec::CodecError;

#[derive(Debug)]
pub enum BlockError {
    /// Reverse sync met an input that is neither a label nor a populated name slot.
    UnexpectedInputKind { index: usize, found: String },
    /// An editor-only command was used on a block that is not a mutator root.
    NotEditable(&'static str),
    NoSuchInput(usize),
    NoSuchSlot(String),
    /// The slot only ever holds generated content (reporters, name editors).
    SlotLocked { block_type: &'static str, slot: String },
    /// The content's output does not fit the slot's check.
    Incompatible { slot: String, found: String },
    Codec(CodecError),
}

impl fmt::Display for BlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockError::UnexpectedInputKind { index, found } => {
                write!(f, "unexpected input kind at {}: {}", index, found)
            }
            BlockError::NotEditable(block_type) => {
                write!(f, "{} does not support signature editing", block_type)
            }
            BlockError::NoSuchInput(index) => write!(f, "no editable label at input {}", index),
            BlockError::NoSuchSlot(id) => write!(f, "no slot for argument {}", id),
            BlockError::SlotLocked { block_type, slot } => {
                write!(f, "slot {} of {} does not accept dropped blocks", slot, block_type)
            }
            BlockError::Incompatible { slot, found } => {
                write!(f, "{} cannot be plugged into slot {}", found, slot)
            }
            BlockError::Codec(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for BlockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BlockError::Codec(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CodecError> for BlockError {
    fn from(error: CodecError) -> Self {
        BlockError::Codec(error)
    }
}
