//! Content codec: reversible transform between a file's stored transport
//! representation and its structured, editable form.
//!
//! Two addressing modes share one contract: given the transport bytes and a
//! comment, return new transport bytes with the comment appended and
//! everything else preserved:
//!
//! - [`front_matter`]: the comment joins the `comments` sequence inside a
//!   delimited front-matter block; the document body is untouched
//!   byte-for-byte.
//! - [`keyed`]: the whole file is one YAML mapping from page ids to comment
//!   sequences.

pub mod front_matter;
pub mod keyed;
pub mod transport;

use serde_yaml::{Mapping, Value};
use thiserror::Error;

use crate::types::{Comment, PageTarget};

/// An error while decoding, editing or re-encoding stored content.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("content is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("content is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// No delimited front-matter block at all. Distinct from an
    /// empty-but-present block, which is valid.
    #[error("no front matter in the file")]
    MissingFrontMatter,

    #[error("could not parse structured block as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("could not parse structured block as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Appends a comment to transport-encoded content in the mode selected by the
/// page target.
pub fn append_comment(
    transport_content: &str,
    target: &PageTarget,
    comment: &Comment,
) -> Result<String, CodecError> {
    match target {
        PageTarget::FrontMatter { .. } => front_matter::append_comment(transport_content, comment),
        PageTarget::KeyedDocument { id, .. } => {
            keyed::append_comment(transport_content, id, comment)
        }
    }
}

/// Appends `comment` to the sequence at `key`, synthesizing an empty sequence
/// when the key is absent or holds a non-sequence value.
fn push_comment(mapping: &mut Mapping, key: &str, comment: &Comment) -> Result<(), CodecError> {
    let entry = mapping
        .entry(Value::String(key.to_string()))
        .or_insert_with(|| Value::Sequence(Vec::new()));
    if !entry.is_sequence() {
        *entry = Value::Sequence(Vec::new());
    }
    if let Value::Sequence(seq) = entry {
        seq.push(serde_yaml::to_value(comment)?);
    }
    Ok(())
}

/// Serializes a mapping to YAML with blank-line runs collapsed.
fn dump(mapping: &Mapping) -> Result<String, CodecError> {
    let yaml = serde_yaml::to_string(mapping)?;
    Ok(collapse_blank_runs(&yaml))
}

/// Collapses every run of three or more consecutive newlines to exactly
/// three (i.e. at most two blank lines survive re-serialization).
fn collapse_blank_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = 0usize;
    for ch in text.chars() {
        if ch == '\n' {
            run += 1;
            if run <= 3 {
                out.push(ch);
            }
        } else {
            run = 0;
            out.push(ch);
        }
    }
    out
}
