pub mod codec;
pub mod mutation;
pub mod signature;

use std::collections::HashSet;

use crate::codec::CodecError;
use crate::mutation::{ARGUMENT_DEFAULTS, ARGUMENT_IDS, ARGUMENT_NAMES, Mutation, MutationKind};
use crate::signature::argument::Argument;
use crate::signature::{Parameter, Part, Segment};

/// The configuration a procedure block owns: its proc-code, one argument
/// record per parameter (in order), and the warp flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcedureState {
    pub proc_code: String,
    pub arguments: Vec<Argument>,
    pub warp: bool,
}

impl ProcedureState {
    /// Decode the proc-code.
    pub fn segments(&self) -> Result<Vec<Segment>, CodecError> {
        codec::decode(&self.proc_code)
    }

    /// Decode the proc-code and pair each parameter with its argument record.
    pub fn parts(&self) -> Result<Vec<Part<'_>>, CodecError> {
        let segments = self.segments()?;
        let expected = segments.iter().filter(|s| s.is_parameter()).count();
        if expected != self.arguments.len() {
            return Err(count_mismatch(expected, self.arguments.len()));
        }

        let mut index = 0;
        let parts = segments
            .into_iter()
            .map(|segment| match segment {
                Segment::Label(text) => Part::Label(text),
                Segment::Parameter(kind) => {
                    let parameter = Parameter {
                        index,
                        kind,
                        argument: &self.arguments[index],
                    };
                    index += 1;
                    Part::Parameter(parameter)
                }
            })
            .collect();
        Ok(parts)
    }

    pub fn argument(&self, id: &str) -> Option<&Argument> {
        self.arguments.iter().find(|a| a.id == id)
    }

    /// Build a state from a mutation record, validating it as a whole.
    ///
    /// `Definition` records must carry names and defaults parallel to the ids.
    pub fn from_mutation(mutation: &Mutation, kind: MutationKind) -> Result<Self, CodecError> {
        let segments = codec::decode(&mutation.proc_code)?;
        let expected = segments.iter().filter(|s| s.is_parameter()).count();
        let ids = &mutation.argument_ids;
        if ids.len() != expected {
            return Err(count_mismatch(expected, ids.len()));
        }

        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(id.as_str()) {
                return Err(CodecError::malformed(
                    ARGUMENT_IDS,
                    format!("duplicate argument id {:?}", id),
                ));
            }
        }

        let (names, defaults) = match kind {
            MutationKind::Caller => (None, None),
            MutationKind::Definition => {
                let names = parallel(mutation.argument_names.as_deref(), ARGUMENT_NAMES, ids.len())?;
                let defaults = parallel(
                    mutation.argument_defaults.as_deref(),
                    ARGUMENT_DEFAULTS,
                    ids.len(),
                )?;
                (Some(names), Some(defaults))
            }
        };

        let arguments = ids
            .iter()
            .enumerate()
            .map(|(i, id)| Argument {
                id: id.clone(),
                name: names.map(|n| n[i].clone()).unwrap_or_default(),
                default: defaults.map(|d| d[i].clone()).unwrap_or_default(),
            })
            .collect();

        Ok(ProcedureState {
            proc_code: mutation.proc_code.clone(),
            arguments,
            warp: mutation.warp,
        })
    }

    pub fn to_mutation(&self, kind: MutationKind) -> Mutation {
        let argument_ids = self.arguments.iter().map(|a| a.id.clone()).collect();
        let (argument_names, argument_defaults) = match kind {
            MutationKind::Caller => (None, None),
            MutationKind::Definition => (
                Some(self.arguments.iter().map(|a| a.name.clone()).collect()),
                Some(self.arguments.iter().map(|a| a.default.clone()).collect()),
            ),
        };
        Mutation {
            proc_code: self.proc_code.clone(),
            argument_ids,
            warp: self.warp,
            argument_names,
            argument_defaults,
        }
    }
}

fn parallel<'a>(
    list: Option<&'a [String]>,
    field: &'static str,
    len: usize,
) -> Result<&'a [String], CodecError> {
    let list = list.ok_or_else(|| CodecError::malformed(field, "missing attribute"))?;
    if list.len() != len {
        return Err(CodecError::malformed(
            field,
            format!("expected {} entries to match argumentids, got {}", len, list.len()),
        ));
    }
    Ok(list)
}

fn count_mismatch(expected: usize, got: usize) -> CodecError {
    CodecError::malformed(
        ARGUMENT_IDS,
        format!("proc code has {} parameter(s) but {} id(s) were given", expected, got),
    )
}
