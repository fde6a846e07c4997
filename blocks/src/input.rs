use crate::host::{ContentId, ContentKind, ShadowTemplate};

/// Connection check on a value input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Boolean,
}

/// A value input: one parameter slot, keyed by the parameter id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueInput {
    /// The parameter id this slot belongs to.
    pub name: String,
    pub check: Option<Check>,
    target: Option<ContentId>,
    shadow: Option<ShadowTemplate>,
}

impl ValueInput {
    pub fn new(name: impl Into<String>, check: Option<Check>) -> Self {
        ValueInput {
            name: name.into(),
            check,
            target: None,
            shadow: None,
        }
    }

    pub fn target(&self) -> Option<ContentId> {
        self.target
    }

    pub fn shadow_template(&self) -> Option<&ShadowTemplate> {
        self.shadow.as_ref()
    }

    pub fn set_shadow_template(&mut self, template: Option<ShadowTemplate>) {
        self.shadow = template;
    }

    /// Whether content of `kind` may be plugged into this slot.
    pub fn accepts(&self, kind: &ContentKind) -> bool {
        match self.check {
            Some(Check::Boolean) => kind.is_boolean(),
            None => true,
        }
    }

    pub(crate) fn attach(&mut self, content: ContentId) {
        self.target = Some(content);
    }

    pub(crate) fn take_target(&mut self) -> Option<ContentId> {
        self.target.take()
    }
}

/// One row element of a procedure block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Literal text. `editable` labels are text fields the user can rename.
    Label {
        name: Option<String>,
        text: String,
        editable: bool,
    },
    Value(ValueInput),
    /// A statement input. Procedure prototypes never create one.
    Statement { name: String },
}

impl Input {
    pub fn as_value(&self) -> Option<&ValueInput> {
        match self {
            Input::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_value_mut(&mut self) -> Option<&mut ValueInput> {
        match self {
            Input::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Input::Label { .. } => "label",
            Input::Value(_) => "value",
            Input::Statement { .. } => "statement",
        }
    }
}
