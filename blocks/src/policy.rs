use proccode::signature::{ArgumentType, Parameter};
use tracing::{Level, event};

use crate::host::{ContentId, ContentKind, Host, ShadowTemplate};
use crate::input::{Input, ValueInput};

/// Default a fresh caller number placeholder starts with.
pub const NUMBER_DEFAULT: &str = "99";
/// Default a fresh caller text placeholder starts with.
pub const STRING_DEFAULT: &str = "hello world";
/// Number a caller slot regenerates after salvaged content is pulled out.
pub const RESPAWN_NUMBER_DEFAULT: &str = "10";

/// What the populate step did with a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Populated {
    /// The salvaged content was plugged back in and must leave the salvage map.
    Reattached,
    /// Fresh placeholder content was created.
    Created,
    /// The slot was left empty.
    Empty,
}

/// Everything a populate policy may touch besides the slot itself.
pub struct PopulateContext<'a> {
    pub host: &'a mut dyn Host,
    /// Id of the procedure block owning the slot.
    pub block_id: &'a str,
    /// True while the owning block is an insertion marker.
    pub preview: bool,
}

impl PopulateContext<'_> {
    fn plug(&mut self, content: ContentId, slot: &mut ValueInput) {
        slot.attach(content);
        self.host.connect(content, self.block_id, &slot.name);
    }

    /// Create a shadow block of `kind` showing `text` and plug it into `slot`.
    fn spawn(&mut self, kind: ContentKind, text: &str, slot: &mut ValueInput) -> ContentId {
        let content = self.host.new_block(kind);
        self.host.set_field_text(content, text);
        self.host.set_shadow(content, true);
        if !self.preview {
            self.host.init_render(content);
        }
        self.plug(content, slot);
        content
    }
}

/// Decides what goes into a freshly built parameter slot.
pub trait PopulatePolicy: Sync {
    /// Fill `slot` for `parameter`. `salvaged` is whatever sat under the same
    /// parameter id before the rebuild; it is only plugged in again if the
    /// policy returns [`Populated::Reattached`].
    fn populate(
        &self,
        cx: &mut PopulateContext<'_>,
        parameter: Parameter<'_>,
        salvaged: Option<ContentId>,
        slot: &mut ValueInput,
    ) -> Populated;
}

/// External call sites: keep whatever the user plugged in, else spawn defaults.
#[derive(Debug)]
pub struct CallerPopulate;

impl CallerPopulate {
    fn respawn_template(kind: ArgumentType) -> Option<ShadowTemplate> {
        match kind {
            ArgumentType::Number => Some(ShadowTemplate {
                kind: ContentKind::MathNumber,
                value: RESPAWN_NUMBER_DEFAULT.to_string(),
            }),
            ArgumentType::String => Some(ShadowTemplate {
                kind: ContentKind::Text,
                value: STRING_DEFAULT.to_string(),
            }),
            ArgumentType::Boolean => None,
        }
    }
}

impl PopulatePolicy for CallerPopulate {
    fn populate(
        &self,
        cx: &mut PopulateContext<'_>,
        parameter: Parameter<'_>,
        salvaged: Option<ContentId>,
        slot: &mut ValueInput,
    ) -> Populated {
        if let Some(content) = salvaged {
            if cx.host.kind(content).is_some_and(|kind| slot.accepts(kind)) {
                cx.plug(content, slot);
                slot.set_shadow_template(Self::respawn_template(parameter.kind));
                return Populated::Reattached;
            }
        }

        let (kind, value) = match parameter.kind {
            ArgumentType::Number => (ContentKind::MathNumber, NUMBER_DEFAULT),
            ArgumentType::String => (ContentKind::Text, STRING_DEFAULT),
            // Boolean call slots stay empty.
            ArgumentType::Boolean => return Populated::Empty,
        };
        cx.spawn(kind.clone(), value, slot);
        slot.set_shadow_template(Some(ShadowTemplate {
            kind,
            value: value.to_string(),
        }));
        Populated::Created
    }
}

/// Prototype inside a definition: every slot holds an argument reporter.
#[derive(Debug)]
pub struct ArgumentReporterPopulate;

impl PopulatePolicy for ArgumentReporterPopulate {
    fn populate(
        &self,
        cx: &mut PopulateContext<'_>,
        parameter: Parameter<'_>,
        salvaged: Option<ContentId>,
        slot: &mut ValueInput,
    ) -> Populated {
        let wanted = if parameter.kind.is_boolean() {
            ContentKind::ArgumentReporterBoolean
        } else {
            ContentKind::ArgumentReporterStringNumber
        };
        reuse_or_spawn(cx, parameter, salvaged, slot, wanted)
    }
}

/// Mutator root: every slot holds an editable name field.
#[derive(Debug)]
pub struct MutatorRootPopulate;

impl PopulatePolicy for MutatorRootPopulate {
    fn populate(
        &self,
        cx: &mut PopulateContext<'_>,
        parameter: Parameter<'_>,
        salvaged: Option<ContentId>,
        slot: &mut ValueInput,
    ) -> Populated {
        let wanted = if parameter.kind.is_boolean() {
            ContentKind::BooleanTextInput
        } else {
            ContentKind::Text
        };
        reuse_or_spawn(cx, parameter, salvaged, slot, wanted)
    }
}

/// Reattach `salvaged` if it is exactly `wanted`, relabelled with the
/// parameter's display name; otherwise spawn a new `wanted` shadow.
fn reuse_or_spawn(
    cx: &mut PopulateContext<'_>,
    parameter: Parameter<'_>,
    salvaged: Option<ContentId>,
    slot: &mut ValueInput,
    wanted: ContentKind,
) -> Populated {
    let name = parameter.display_name();
    match salvaged {
        Some(content) if cx.host.kind(content) == Some(&wanted) => {
            cx.host.set_field_text(content, name);
            cx.plug(content, slot);
            Populated::Reattached
        }
        _ => {
            let content = cx.spawn(wanted, name, slot);
            event!(Level::TRACE, "spawned {} for {:?}", content, name);
            Populated::Created
        }
    }
}

/// How literal text between parameters is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPolicy {
    /// A fixed label.
    Plain,
    /// A named text field the user can edit.
    Editable,
}

impl LabelPolicy {
    pub fn make(self, host: &mut dyn Host, text: String) -> Input {
        match self {
            LabelPolicy::Plain => Input::Label {
                name: None,
                text,
                editable: false,
            },
            LabelPolicy::Editable => Input::Label {
                name: Some(host.gen_uid()),
                text,
                editable: true,
            },
        }
    }
}
