use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};

/// Errors raised while decoding a proc-code or reading a mutation record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A `%` not followed by `n`, `b` or `s`. `tag` is `None` at end of input.
    InvalidParameterType {
        tag: Option<char>,
        span: Range<usize>,
    },
    /// A mutation attribute is missing or cannot be interpreted.
    MalformedMutation { field: &'static str, reason: String },
}

impl CodecError {
    pub fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        CodecError::MalformedMutation {
            field,
            reason: reason.into(),
        }
    }

    /// Convert to a codespan-reporting Diagnostic. For `InvalidParameterType`
    /// the label points into the proc-code registered as `file_id`.
    pub fn to_diagnostic(&self, file_id: usize) -> Diagnostic<usize> {
        match self {
            CodecError::InvalidParameterType { span, .. } => Diagnostic::error()
                .with_message(self.to_string())
                .with_labels(vec![
                    Label::primary(file_id, span.clone())
                        .with_message("expected %n, %b or %s"),
                ])
                .with_notes(vec!["a literal percent sign is written as \\%".to_string()]),
            CodecError::MalformedMutation { field, .. } => Diagnostic::error()
                .with_message(self.to_string())
                .with_notes(vec![format!("while reading attribute `{}`", field)]),
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::InvalidParameterType { tag: Some(tag), .. } => {
                write!(f, "invalid parameter type: %{}", tag)
            }
            CodecError::InvalidParameterType { tag: None, .. } => {
                write!(f, "invalid parameter type: dangling %")
            }
            CodecError::MalformedMutation { field, reason } => {
                write!(f, "malformed mutation: {}: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for CodecError {}
