use std::collections::BTreeMap;

use proccode::ProcedureState;
use proccode::codec::CodecError;
use proccode::signature::Part;
use tracing::{Level, event};

use crate::host::{ContentId, Host};
use crate::input::{Check, Input, ValueInput};
use crate::policy::{PopulateContext, Populated};
use crate::variant::BlockConfig;

/// Content pulled out of the old slots, keyed by parameter id, waiting to be
/// plugged back in.
#[derive(Debug, Default)]
pub struct SalvageMap {
    entries: BTreeMap<String, ContentId>,
}

impl SalvageMap {
    pub fn get(&self, id: &str) -> Option<ContentId> {
        self.entries.get(id).copied()
    }

    pub fn insert(&mut self, id: String, content: ContentId) {
        self.entries.insert(id, content);
    }

    pub fn remove(&mut self, id: &str) -> Option<ContentId> {
        self.entries.remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of one reconciliation pass.
#[derive(Debug)]
pub struct Reconciled {
    pub inputs: Vec<Input>,
    /// User content whose parameter disappeared. Detached, still alive.
    pub orphans: Vec<ContentId>,
}

/// Rebuilds a procedure block's inputs to match its state.
///
/// A pass runs in four phases, each usable on its own:
/// 1. [`detach`](Reconciler::detach) pulls content out of every slot into a [`SalvageMap`];
/// 2. [`clear`](Reconciler::clear) drops the old inputs;
/// 3. [`rebuild`](Reconciler::rebuild) creates new inputs, reusing salvage where the policy allows;
/// 4. [`sweep`](Reconciler::sweep) disposes leftover shadows and reports leftover user content.
pub struct Reconciler<'a> {
    host: &'a mut dyn Host,
    config: BlockConfig,
    block_id: &'a str,
    preview: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(host: &'a mut dyn Host, config: BlockConfig, block_id: &'a str) -> Self {
        Reconciler {
            host,
            config,
            block_id,
            preview: false,
        }
    }

    /// Reconcile on behalf of an insertion marker: new content is not prepared for display.
    pub fn preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    /// Run all four phases. The state is decoded before anything is touched,
    /// so an undecodable state leaves `inputs` as they were.
    pub fn reconcile(
        &mut self,
        state: &ProcedureState,
        inputs: &mut Vec<Input>,
    ) -> Result<Reconciled, CodecError> {
        let parts = state.parts()?;

        let mut salvage = self.detach(inputs);
        let salvaged = salvage.len();
        self.clear(std::mem::take(inputs));
        let rebuilt = self.rebuild(parts, &mut salvage);
        let orphans = self.sweep(salvage);

        event!(
            Level::DEBUG,
            "reconciled {} {}: {} input(s), {} salvaged, {} orphaned",
            self.config.block_type,
            self.block_id,
            rebuilt.len(),
            salvaged,
            orphans.len()
        );

        Ok(Reconciled {
            inputs: rebuilt,
            orphans,
        })
    }

    /// Disconnect the content of every slot without disposing it.
    ///
    /// Shadow templates are dropped first so the emptied slots do not respawn.
    pub fn detach(&mut self, inputs: &mut [Input]) -> SalvageMap {
        let mut salvage = SalvageMap::default();
        for slot in inputs.iter_mut().filter_map(Input::as_value_mut) {
            slot.set_shadow_template(None);
            if let Some(content) = slot.take_target() {
                self.host.disconnect(content);
                salvage.insert(slot.name.clone(), content);
            }
        }
        salvage
    }

    /// Drop every input. Anything still plugged in is disposed with its slot.
    pub fn clear(&mut self, inputs: Vec<Input>) {
        for input in inputs {
            if let Input::Value(mut slot) = input {
                if let Some(content) = slot.take_target() {
                    self.host.dispose(content);
                }
            }
        }
    }

    /// Create one input per part, in order. Salvaged content that gets plugged
    /// back in is removed from `salvage`.
    pub fn rebuild(&mut self, parts: Vec<Part<'_>>, salvage: &mut SalvageMap) -> Vec<Input> {
        let mut inputs = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Part::Label(text) => {
                    inputs.push(self.config.labels.make(&mut *self.host, text));
                }
                Part::Parameter(parameter) => {
                    let check = parameter.kind.is_boolean().then_some(Check::Boolean);
                    let mut slot = ValueInput::new(parameter.id(), check);
                    let salvaged = salvage.get(parameter.id());

                    let mut cx = PopulateContext {
                        host: &mut *self.host,
                        block_id: self.block_id,
                        preview: self.preview,
                    };
                    let populated = self
                        .config
                        .populate
                        .populate(&mut cx, parameter, salvaged, &mut slot);
                    if populated == Populated::Reattached {
                        salvage.remove(parameter.id());
                    }

                    event!(
                        Level::TRACE,
                        "slot {} ({}): {:?}",
                        parameter.id(),
                        parameter.kind,
                        populated
                    );
                    inputs.push(Input::Value(slot));
                }
            }
        }
        inputs
    }

    /// Dispose leftover shadow content. Leftover user content is returned,
    /// detached but alive.
    pub fn sweep(&mut self, salvage: SalvageMap) -> Vec<ContentId> {
        let mut orphans = Vec::new();
        for (id, content) in salvage.entries {
            if self.host.is_shadow(content) {
                self.host.dispose(content);
            } else {
                event!(Level::DEBUG, "orphaned {} from removed parameter {}", content, id);
                orphans.push(content);
            }
        }
        orphans
    }
}
