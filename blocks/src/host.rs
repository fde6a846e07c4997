use std::fmt;

/// Handle to a content block owned by the host workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(pub usize);

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kinds of content block a procedure slot can hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// `math_number` placeholder.
    MathNumber,
    /// `text` placeholder; also the name editor for `%n`/`%s` on the mutator root.
    Text,
    /// `argument_reporter_string_number`
    ArgumentReporterStringNumber,
    /// `argument_reporter_boolean`
    ArgumentReporterBoolean,
    /// `boolean_textinput`: the name editor for `%b` on the mutator root.
    BooleanTextInput,
    /// Any other block, typically something the user dropped in.
    Other { opcode: String, boolean: bool },
}

impl ContentKind {
    pub fn user(opcode: impl Into<String>) -> Self {
        ContentKind::Other {
            opcode: opcode.into(),
            boolean: false,
        }
    }

    pub fn user_boolean(opcode: impl Into<String>) -> Self {
        ContentKind::Other {
            opcode: opcode.into(),
            boolean: true,
        }
    }

    pub fn opcode(&self) -> &str {
        match self {
            ContentKind::MathNumber => "math_number",
            ContentKind::Text => "text",
            ContentKind::ArgumentReporterStringNumber => "argument_reporter_string_number",
            ContentKind::ArgumentReporterBoolean => "argument_reporter_boolean",
            ContentKind::BooleanTextInput => "boolean_textinput",
            ContentKind::Other { opcode, .. } => opcode,
        }
    }

    /// Whether the block's output connection is boolean-typed.
    pub fn is_boolean(&self) -> bool {
        match self {
            ContentKind::ArgumentReporterBoolean | ContentKind::BooleanTextInput => true,
            ContentKind::Other { boolean, .. } => *boolean,
            _ => false,
        }
    }

    /// Name of the field holding the block's displayed text, if it has one.
    pub fn field_name(&self) -> Option<&'static str> {
        match self {
            ContentKind::MathNumber => Some("NUM"),
            ContentKind::Text | ContentKind::BooleanTextInput => Some("TEXT"),
            ContentKind::ArgumentReporterStringNumber | ContentKind::ArgumentReporterBoolean => {
                Some("VALUE")
            }
            ContentKind::Other { .. } => None,
        }
    }
}

/// The default content a value slot regenerates whenever it is emptied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowTemplate {
    pub kind: ContentKind,
    pub value: String,
}

/// Capabilities the procedure blocks need from the editor that hosts them.
///
/// Content blocks belong to the host. Procedure blocks only hold
/// [`ContentId`]s and ask the host to create, connect and dispose them.
pub trait Host {
    fn new_block(&mut self, kind: ContentKind) -> ContentId;

    /// Dispose a content block. Unknown ids are ignored.
    fn dispose(&mut self, id: ContentId);

    fn kind(&self, id: ContentId) -> Option<&ContentKind>;

    fn is_shadow(&self, id: ContentId) -> bool;

    fn set_shadow(&mut self, id: ContentId, shadow: bool);

    /// Text of the block's primary field (see [`ContentKind::field_name`]).
    fn field_text(&self, id: ContentId) -> Option<&str>;

    fn set_field_text(&mut self, id: ContentId, text: &str);

    /// Record that `child` is plugged into input `input` of block `parent`.
    fn connect(&mut self, child: ContentId, parent: &str, input: &str);

    fn disconnect(&mut self, child: ContentId);

    /// Prepare a freshly created content block for display.
    fn init_render(&mut self, id: ContentId);

    /// Lay out and draw the procedure block `block_id` from scratch.
    fn render(&mut self, block_id: &str);

    /// A new globally unique id.
    fn gen_uid(&mut self) -> String;
}
