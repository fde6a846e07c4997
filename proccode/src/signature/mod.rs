pub mod argument;

use std::fmt;

use crate::signature::argument::Argument;

/// The type of a procedure parameter, written after `%` in a proc-code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentType {
    /// `%n`
    Number,
    /// `%b`
    Boolean,
    /// `%s`
    String,
}

impl ArgumentType {
    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'n' => Some(ArgumentType::Number),
            'b' => Some(ArgumentType::Boolean),
            's' => Some(ArgumentType::String),
            _ => None,
        }
    }

    pub fn tag(self) -> char {
        match self {
            ArgumentType::Number => 'n',
            ArgumentType::Boolean => 'b',
            ArgumentType::String => 's',
        }
    }

    pub fn is_boolean(self) -> bool {
        matches!(self, ArgumentType::Boolean)
    }
}

impl fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.tag())
    }
}

/// One piece of a procedure signature: literal text or a typed slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal label text, already unescaped.
    Label(String),
    /// A typed parameter. Its id, name and default live in the matching [`Argument`].
    Parameter(ArgumentType),
}

impl Segment {
    pub fn label(text: impl Into<String>) -> Self {
        Segment::Label(text.into())
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self, Segment::Parameter(_))
    }
}

/// A typed parameter joined with its argument record.
#[derive(Debug, Clone, Copy)]
pub struct Parameter<'a> {
    /// Position among the parameters (labels are not counted).
    pub index: usize,
    pub kind: ArgumentType,
    pub argument: &'a Argument,
}

impl Parameter<'_> {
    pub fn id(&self) -> &str {
        &self.argument.id
    }

    pub fn display_name(&self) -> &str {
        &self.argument.name
    }
}

/// A decoded signature segment with parameters resolved against the argument list.
#[derive(Debug, Clone)]
pub enum Part<'a> {
    Label(String),
    Parameter(Parameter<'a>),
}
