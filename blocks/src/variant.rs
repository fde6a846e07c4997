use std::fmt;

use proccode::mutation::MutationKind;

use crate::policy::{
    ArgumentReporterPopulate, CallerPopulate, LabelPolicy, MutatorRootPopulate, PopulatePolicy,
};

/// What distinguishes the three procedure block types. They share every
/// algorithm and differ only in these values.
#[derive(Clone, Copy)]
pub struct BlockConfig {
    pub block_type: &'static str,
    pub mutation_kind: MutationKind,
    pub populate: &'static dyn PopulatePolicy,
    pub labels: LabelPolicy,
    /// Whether the signature can be edited in place (append commands, reverse sync).
    pub editable: bool,
    /// Whether user content may be dropped into parameter slots.
    pub accepts_drops: bool,
}

/// A call site in a script.
pub const CALLER: BlockConfig = BlockConfig {
    block_type: "procedures_callnoreturn",
    mutation_kind: MutationKind::Caller,
    populate: &CallerPopulate,
    labels: LabelPolicy::Plain,
    editable: false,
    accepts_drops: true,
};

/// The prototype shown inside a definition hat.
pub const INTERNAL_CALLER: BlockConfig = BlockConfig {
    block_type: "procedures_callnoreturn_internal",
    mutation_kind: MutationKind::Definition,
    populate: &ArgumentReporterPopulate,
    labels: LabelPolicy::Plain,
    editable: false,
    accepts_drops: false,
};

/// The prototype being edited in the procedure editor.
pub const MUTATOR_ROOT: BlockConfig = BlockConfig {
    block_type: "procedures_mutator_root",
    mutation_kind: MutationKind::Definition,
    populate: &MutatorRootPopulate,
    labels: LabelPolicy::Editable,
    editable: true,
    accepts_drops: false,
};

impl fmt::Debug for BlockConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockConfig")
            .field("block_type", &self.block_type)
            .field("mutation_kind", &self.mutation_kind)
            .field("labels", &self.labels)
            .finish()
    }
}
