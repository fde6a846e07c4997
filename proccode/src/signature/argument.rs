/// Everything known about one procedure parameter besides its type.
///
/// The id is the join key across signature edits: it is generated once,
/// persisted in `argumentids`, and never reused for a different parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Argument {
    pub id: String,
    /// Editor-visible name. Empty on caller blocks, which do not persist names.
    pub name: String,
    /// Default value. Empty on caller blocks.
    pub default: String,
}

impl Argument {
    pub fn new(id: impl Into<String>) -> Self {
        Argument {
            id: id.into(),
            name: String::new(),
            default: String::new(),
        }
    }

    pub fn named(id: impl Into<String>, name: impl Into<String>, default: impl Into<String>) -> Self {
        Argument {
            id: id.into(),
            name: name.into(),
            default: default.into(),
        }
    }
}
