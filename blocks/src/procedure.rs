use proccode::ProcedureState;
use proccode::codec::{self, CodecError};
use proccode::mutation::Mutation;
use proccode::signature::argument::Argument;
use tracing::{Level, event};

use crate::error::BlockError;
use crate::host::{ContentId, ContentKind, Host};
use crate::input::{Input, ValueInput};
use crate::layout::Layout;
use crate::reconciler::Reconciler;
use crate::variant::BlockConfig;

/// Text appended by [`ProcedureBlock::append_label`].
pub const NEW_LABEL_TEXT: &str = "label text";
pub const NEW_BOOLEAN_NAME: &str = "boolean";
pub const NEW_BOOLEAN_DEFAULT: &str = "false";
pub const NEW_STRING_NUMBER_NAME: &str = "string or number";
pub const NEW_STRING_NUMBER_DEFAULT: &str = "";

/// A caller, internal caller or mutator root block.
///
/// The block owns its [`ProcedureState`] and its inputs; the content plugged
/// into those inputs belongs to the [`Host`].
#[derive(Debug)]
pub struct ProcedureBlock {
    id: String,
    config: BlockConfig,
    state: ProcedureState,
    inputs: Vec<Input>,
    rendered: bool,
    insertion_marker: bool,
}

impl ProcedureBlock {
    /// An empty block with a host-generated id.
    pub fn new(config: BlockConfig, host: &mut dyn Host) -> Self {
        Self::with_id(config, host.gen_uid())
    }

    pub fn with_id(config: BlockConfig, id: impl Into<String>) -> Self {
        ProcedureBlock {
            id: id.into(),
            config,
            state: ProcedureState::default(),
            inputs: Vec::new(),
            rendered: false,
            insertion_marker: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> BlockConfig {
        self.config
    }

    pub fn proc_code(&self) -> &str {
        &self.state.proc_code
    }

    pub fn state(&self) -> &ProcedureState {
        &self.state
    }

    pub fn warp(&self) -> bool {
        self.state.warp
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    /// The slot for parameter `id`.
    pub fn slot(&self, id: &str) -> Option<&ValueInput> {
        self.inputs
            .iter()
            .filter_map(Input::as_value)
            .find(|slot| slot.name == id)
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    pub fn set_rendered(&mut self, rendered: bool) {
        self.rendered = rendered;
    }

    pub fn is_insertion_marker(&self) -> bool {
        self.insertion_marker
    }

    pub fn set_insertion_marker(&mut self, insertion_marker: bool) {
        self.insertion_marker = insertion_marker;
    }

    pub fn layout(&self, host: &dyn Host) -> Layout {
        Layout::of(&self.inputs, host)
    }

    // Serialization

    pub fn to_mutation(&self) -> Mutation {
        self.state.to_mutation(self.config.mutation_kind)
    }

    pub fn mutation_xml(&self) -> Result<String, CodecError> {
        self.to_mutation().to_xml()
    }

    /// Replace the block's state with `mutation` and rebuild the inputs.
    ///
    /// The record is validated as a whole first; on error the block is untouched.
    /// Returns user content orphaned by the rebuild.
    pub fn load_mutation(
        &mut self,
        host: &mut dyn Host,
        mutation: &Mutation,
    ) -> Result<Vec<ContentId>, BlockError> {
        let state = ProcedureState::from_mutation(mutation, self.config.mutation_kind)?;
        event!(
            Level::DEBUG,
            "loading {:?} into {} {}",
            state.proc_code,
            self.config.block_type,
            self.id
        );
        self.state = state;
        self.update_display(host)
    }

    pub fn load_mutation_xml(
        &mut self,
        host: &mut dyn Host,
        source: &str,
    ) -> Result<Vec<ContentId>, BlockError> {
        let mutation = Mutation::parse_xml(source, self.config.mutation_kind)?;
        self.load_mutation(host, &mutation)
    }

    // Display

    /// Rebuild the inputs to match the current state. Returns orphaned user content.
    pub fn update_display(&mut self, host: &mut dyn Host) -> Result<Vec<ContentId>, BlockError> {
        self.with_rendering_suspended(host, |block, host| -> Result<_, BlockError> {
            let reconciled = Reconciler::new(host, block.config, &block.id)
                .preview(block.insertion_marker)
                .reconcile(&block.state, &mut block.inputs)?;
            block.inputs = reconciled.inputs;
            Ok(reconciled.orphans)
        })
    }

    /// Run `f` with `rendered` forced off, then restore it and, if the block
    /// was rendered and is not an insertion marker, re-render. This happens
    /// whatever `f` returns.
    fn with_rendering_suspended<T>(
        &mut self,
        host: &mut dyn Host,
        f: impl FnOnce(&mut Self, &mut dyn Host) -> T,
    ) -> T {
        let was_rendered = std::mem::replace(&mut self.rendered, false);
        let out = f(&mut *self, &mut *host);
        self.rendered = was_rendered;
        if was_rendered && !self.insertion_marker {
            host.render(&self.id);
        }
        out
    }

    /// Pull user content out of parameter `id`'s slot. A slot with a shadow
    /// template refills itself with a fresh placeholder. Shadows cannot be
    /// pulled out; `None` is returned for them and for empty slots.
    pub fn detach_argument(&mut self, host: &mut dyn Host, id: &str) -> Option<ContentId> {
        let preview = self.insertion_marker;
        let slot = self
            .inputs
            .iter_mut()
            .filter_map(Input::as_value_mut)
            .find(|slot| slot.name == id)?;
        let content = slot.target()?;
        if host.is_shadow(content) {
            return None;
        }

        slot.take_target();
        host.disconnect(content);
        if let Some(template) = slot.shadow_template().cloned() {
            let shadow = host.new_block(template.kind);
            host.set_field_text(shadow, &template.value);
            host.set_shadow(shadow, true);
            if !preview {
                host.init_render(shadow);
            }
            slot.attach(shadow);
            host.connect(shadow, &self.id, &slot.name);
        }
        Some(content)
    }

    /// Plug `content` into parameter `id`'s slot, as a drop from the user would.
    /// A placeholder already there is disposed; user content already there is
    /// disconnected and returned. Content already sitting in another slot of
    /// this block moves; the slot it leaves respawns its placeholder.
    ///
    /// Only call sites take drops. Reporter and name-editor slots fail with
    /// [`BlockError::SlotLocked`].
    pub fn plug_argument(
        &mut self,
        host: &mut dyn Host,
        id: &str,
        content: ContentId,
    ) -> Result<Option<ContentId>, BlockError> {
        let slot = self
            .inputs
            .iter()
            .filter_map(Input::as_value)
            .find(|slot| slot.name == id)
            .ok_or_else(|| BlockError::NoSuchSlot(id.to_string()))?;
        if !self.config.accepts_drops {
            return Err(BlockError::SlotLocked {
                block_type: self.config.block_type,
                slot: id.to_string(),
            });
        }

        match host.kind(content) {
            Some(kind) if slot.accepts(kind) => {}
            found => {
                return Err(BlockError::Incompatible {
                    slot: id.to_string(),
                    found: found.map_or("disposed content", |k| k.opcode()).to_string(),
                });
            }
        }

        let holder = self
            .inputs
            .iter()
            .filter_map(Input::as_value)
            .find(|other| other.target() == Some(content))
            .map(|other| other.name.clone());
        match holder {
            Some(name) if name == id => return Ok(None),
            Some(name) => {
                if self.detach_argument(host, &name).is_none() {
                    return Err(BlockError::Incompatible {
                        slot: id.to_string(),
                        found: format!("placeholder of slot {}", name),
                    });
                }
            }
            None => {}
        }

        let slot = self
            .inputs
            .iter_mut()
            .filter_map(Input::as_value_mut)
            .find(|slot| slot.name == id)
            .ok_or_else(|| BlockError::NoSuchSlot(id.to_string()))?;
        let previous = match slot.take_target() {
            Some(old) if host.is_shadow(old) => {
                host.dispose(old);
                None
            }
            Some(old) => {
                host.disconnect(old);
                Some(old)
            }
            None => None,
        };
        slot.attach(content);
        host.connect(content, &self.id, &slot.name);
        Ok(previous)
    }

    /// Append an input the host created directly.
    pub fn append_input(&mut self, input: Input) {
        self.inputs.push(input);
    }

    /// Tear the block down: placeholders are disposed, user content is
    /// disconnected and returned.
    pub fn dispose(self, host: &mut dyn Host) -> Vec<ContentId> {
        let mut detached = Vec::new();
        for mut input in self.inputs {
            let Some(slot) = input.as_value_mut() else {
                continue;
            };
            let Some(content) = slot.take_target() else {
                continue;
            };
            if host.is_shadow(content) {
                host.dispose(content);
            } else {
                host.disconnect(content);
                detached.push(content);
            }
        }
        detached
    }

    // Editing (mutator root only)

    pub fn append_label(&mut self, host: &mut dyn Host) -> Result<Vec<ContentId>, BlockError> {
        self.require_editable()?;
        self.state.proc_code.push(' ');
        self.state.proc_code.push_str(NEW_LABEL_TEXT);
        self.update_display(host)
    }

    pub fn append_boolean(&mut self, host: &mut dyn Host) -> Result<Vec<ContentId>, BlockError> {
        self.append_parameter(host, 'b', NEW_BOOLEAN_NAME, NEW_BOOLEAN_DEFAULT)
    }

    pub fn append_string_number(
        &mut self,
        host: &mut dyn Host,
    ) -> Result<Vec<ContentId>, BlockError> {
        self.append_parameter(host, 's', NEW_STRING_NUMBER_NAME, NEW_STRING_NUMBER_DEFAULT)
    }

    fn append_parameter(
        &mut self,
        host: &mut dyn Host,
        tag: char,
        name: &str,
        default: &str,
    ) -> Result<Vec<ContentId>, BlockError> {
        self.require_editable()?;
        let id = host.gen_uid();
        event!(Level::DEBUG, "appending %{} parameter {}", tag, id);
        self.state.proc_code.push_str(" %");
        self.state.proc_code.push(tag);
        self.state.arguments.push(Argument::named(id, name, default));
        self.update_display(host)
    }

    /// Change the text of the editable label at `index`.
    pub fn set_label_text(&mut self, index: usize, new_text: &str) -> Result<(), BlockError> {
        match self.inputs.get_mut(index) {
            Some(Input::Label {
                text,
                editable: true,
                ..
            }) => {
                *text = new_text.to_string();
                Ok(())
            }
            _ => Err(BlockError::NoSuchInput(index)),
        }
    }

    /// Rebuild the state from what the inputs currently show.
    ///
    /// Labels contribute their text, name editors contribute `%b` or `%s`
    /// plus the slot's id and the editor's text. Defaults are kept for ids
    /// that survive. The state is only replaced if every input is understood.
    pub fn derive_signature_from_slots(&mut self, host: &dyn Host) -> Result<(), BlockError> {
        self.require_editable()?;

        let mut code = Vec::with_capacity(self.inputs.len());
        let mut arguments = Vec::new();
        for (index, input) in self.inputs.iter().enumerate() {
            match input {
                Input::Label { text, .. } => code.push(codec::escape(text)),
                Input::Value(slot) => {
                    let content = slot
                        .target()
                        .ok_or_else(|| unexpected(index, "empty value slot"))?;
                    let tag = match host.kind(content) {
                        Some(ContentKind::BooleanTextInput) => "%b",
                        Some(ContentKind::Text) => "%s",
                        Some(other) => return Err(unexpected(index, other.opcode())),
                        None => return Err(unexpected(index, "disposed content")),
                    };
                    let name = host.field_text(content).unwrap_or_default();
                    let default = self
                        .state
                        .argument(&slot.name)
                        .map(|a| a.default.as_str())
                        .unwrap_or_default();
                    arguments.push(Argument::named(slot.name.clone(), name, default));
                    code.push(tag.to_string());
                }
                other => return Err(unexpected(index, other.kind_name())),
            }
        }

        self.state.proc_code = code.join(" ");
        self.state.arguments = arguments;
        event!(Level::DEBUG, "derived {:?} from inputs", self.state.proc_code);
        Ok(())
    }

    fn require_editable(&self) -> Result<(), BlockError> {
        if self.config.editable {
            Ok(())
        } else {
            Err(BlockError::NotEditable(self.config.block_type))
        }
    }
}

fn unexpected(index: usize, found: &str) -> BlockError {
    BlockError::UnexpectedInputKind {
        index,
        found: found.to_string(),
    }
}
