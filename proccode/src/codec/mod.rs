pub mod error;

pub use error::CodecError;

use crate::signature::{ArgumentType, Segment};

/// Render segments as a proc-code: space separated, `%` in labels escaped.
pub fn encode(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Label(text) => escape(text),
            Segment::Parameter(kind) => kind.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a proc-code into label and parameter segments.
///
/// Text around parameter tokens is trimmed and unescaped; empty text yields
/// no segment, so `"%n"` decodes to a lone parameter and `""` to nothing.
pub fn decode(proc_code: &str) -> Result<Vec<Segment>, CodecError> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut chars = proc_code.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        match c {
            '\\' => {
                if let Some(&(_, '%')) = chars.peek() {
                    chars.next();
                }
            }
            '%' => {
                push_label(&mut segments, &proc_code[text_start..offset]);
                let Some((tag_offset, tag)) = chars.next() else {
                    return Err(CodecError::InvalidParameterType {
                        tag: None,
                        span: offset..offset + 1,
                    });
                };
                let end = tag_offset + tag.len_utf8();
                let kind = ArgumentType::from_tag(tag).ok_or(CodecError::InvalidParameterType {
                    tag: Some(tag),
                    span: offset..end,
                })?;
                segments.push(Segment::Parameter(kind));
                text_start = end;
            }
            _ => {}
        }
    }
    push_label(&mut segments, &proc_code[text_start..]);

    Ok(segments)
}

/// Escape literal `%` so it is not read back as a parameter token.
pub fn escape(text: &str) -> String {
    text.replace('%', "\\%")
}

pub fn unescape(text: &str) -> String {
    text.replace("\\%", "%")
}

fn push_label(segments: &mut Vec<Segment>, raw: &str) {
    let text = unescape(raw.trim());
    if !text.is_empty() {
        segments.push(Segment::Label(text));
    }
}
