use xmltree::{Element, EmitterConfig};

use crate::codec::CodecError;

/// Name of the element a mutation is stored on.
pub const ELEMENT_NAME: &str = "mutation";

pub const PROCCODE: &str = "proccode";
pub const ARGUMENT_IDS: &str = "argumentids";
pub const ARGUMENT_NAMES: &str = "argumentnames";
pub const ARGUMENT_DEFAULTS: &str = "argumentdefaults";
pub const WARP: &str = "warp";

/// Which attributes a block persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// `proccode`, `argumentids`, `warp`.
    Caller,
    /// Caller attributes plus `argumentnames` and `argumentdefaults`.
    Definition,
}

/// The persisted markup record of a procedure block.
///
/// ```xml
/// <mutation proccode="move %n steps" argumentids='["a"]' warp="false"/>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub proc_code: String,
    pub argument_ids: Vec<String>,
    pub warp: bool,
    /// Present only on definition records.
    pub argument_names: Option<Vec<String>>,
    /// Present only on definition records.
    pub argument_defaults: Option<Vec<String>>,
}

impl Mutation {
    pub fn kind(&self) -> MutationKind {
        if self.argument_names.is_some() || self.argument_defaults.is_some() {
            MutationKind::Definition
        } else {
            MutationKind::Caller
        }
    }

    /// Read every attribute `kind` requires. Nothing is returned unless all of them parse.
    pub fn from_element(element: &Element, kind: MutationKind) -> Result<Self, CodecError> {
        if element.name != ELEMENT_NAME {
            return Err(CodecError::malformed(
                "mutation",
                format!("expected <{}>, found <{}>", ELEMENT_NAME, element.name),
            ));
        }

        let proc_code = attribute(element, PROCCODE)?.to_string();
        let argument_ids = json_list(element, ARGUMENT_IDS)?;
        let warp = parse_warp(attribute(element, WARP)?)?;
        let (argument_names, argument_defaults) = match kind {
            MutationKind::Caller => (None, None),
            MutationKind::Definition => (
                Some(json_list(element, ARGUMENT_NAMES)?),
                Some(json_list(element, ARGUMENT_DEFAULTS)?),
            ),
        };

        Ok(Mutation {
            proc_code,
            argument_ids,
            warp,
            argument_names,
            argument_defaults,
        })
    }

    pub fn parse_xml(source: &str, kind: MutationKind) -> Result<Self, CodecError> {
        let element = Element::parse(source.as_bytes())
            .map_err(|e| CodecError::malformed("mutation", e.to_string()))?;
        Self::from_element(&element, kind)
    }

    pub fn to_element(&self) -> Element {
        let mut element = Element::new(ELEMENT_NAME);
        element
            .attributes
            .insert(PROCCODE.to_string(), self.proc_code.clone());
        element
            .attributes
            .insert(ARGUMENT_IDS.to_string(), to_json(&self.argument_ids));
        if let Some(names) = &self.argument_names {
            element
                .attributes
                .insert(ARGUMENT_NAMES.to_string(), to_json(names));
        }
        if let Some(defaults) = &self.argument_defaults {
            element
                .attributes
                .insert(ARGUMENT_DEFAULTS.to_string(), to_json(defaults));
        }
        element
            .attributes
            .insert(WARP.to_string(), self.warp.to_string());
        element
    }

    pub fn to_xml(&self) -> Result<String, CodecError> {
        let mut out = Vec::new();
        let config = EmitterConfig::new().write_document_declaration(false);
        self.to_element()
            .write_with_config(&mut out, config)
            .map_err(|e| CodecError::malformed("mutation", e.to_string()))?;
        String::from_utf8(out).map_err(|e| CodecError::malformed("mutation", e.to_string()))
    }
}

fn attribute<'a>(element: &'a Element, field: &'static str) -> Result<&'a str, CodecError> {
    element
        .attributes
        .get(field)
        .map(|s| s.as_str())
        .ok_or_else(|| CodecError::malformed(field, "missing attribute"))
}

fn json_list(element: &Element, field: &'static str) -> Result<Vec<String>, CodecError> {
    let raw = attribute(element, field)?;
    serde_json::from_str(raw).map_err(|e| CodecError::malformed(field, e.to_string()))
}

fn parse_warp(raw: &str) -> Result<bool, CodecError> {
    match raw {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(CodecError::malformed(
            WARP,
            format!("expected \"true\" or \"false\", got {:?}", other),
        )),
    }
}

fn to_json(list: &[String]) -> String {
    serde_json::Value::from(list.to_vec()).to_string()
}
