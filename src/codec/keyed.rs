//! Keyed-document mode: the whole file is one YAML mapping from page ids to
//! comment sequences.
//!
//! Unlike front-matter mode, a missing top-level structure is not an error
//! here: an empty or non-mapping document is synthesized as an empty
//! mapping, so the first comment on a fresh data file just works.

use serde_yaml::{Mapping, Value};

use crate::types::Comment;

use super::{dump, push_comment, transport, CodecError};

/// Appends a comment to the sequence stored under `page_id`.
pub fn append_comment(
    transport_content: &str,
    page_id: &str,
    comment: &Comment,
) -> Result<String, CodecError> {
    let text = transport::decode(transport_content)?;

    let value: Value = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_yaml::from_str(&text)?
    };
    let mut document = match value {
        Value::Mapping(mapping) => mapping,
        _ => Mapping::new(),
    };

    push_comment(&mut document, page_id, comment)?;
    Ok(transport::encode(&dump(&document)?))
}
