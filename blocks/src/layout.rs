use std::fmt;

use crate::host::Host;
use crate::input::{Check, Input};

/// A one-line text picture of a block's inputs.
///
/// Labels appear as-is, value slots as `(text)` and boolean slots as
/// `<text>`, where `text` is the plugged-in block's field text or, for
/// blocks without one, its opcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    tokens: Vec<String>,
}

impl Layout {
    pub fn of(inputs: &[Input], host: &dyn Host) -> Self {
        let tokens = inputs
            .iter()
            .map(|input| match input {
                Input::Label { text, .. } => text.clone(),
                Input::Value(slot) => {
                    let inner = slot
                        .target()
                        .map(|content| match host.field_text(content) {
                            Some(text) => text.to_string(),
                            None => host
                                .kind(content)
                                .map(|kind| kind.opcode().to_string())
                                .unwrap_or_default(),
                        })
                        .unwrap_or_default();
                    match slot.check {
                        Some(Check::Boolean) => format!("<{}>", inner),
                        None => format!("({})", inner),
                    }
                }
                Input::Statement { name } => format!("{{{}}}", name),
            })
            .collect();
        Layout { tokens }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tokens.join(" "))
    }
}
