//! Front-matter mode: the comment joins the `comments` sequence inside the
//! document's delimited structured block.
//!
//! A document is `---<newline><block><newline>---<body>`. The block is YAML
//! unless its first non-whitespace character is `{`, in which case it is
//! JSON (and is converted to YAML on re-serialization, as the original
//! format does). The body, everything after the closing delimiter, is
//! preserved byte-for-byte.

use serde_yaml::{Mapping, Value};

use crate::types::Comment;

use super::{dump, push_comment, transport, CodecError};

/// The sequence field comments are stored under.
const COMMENTS_KEY: &str = "comments";

/// Appends a comment to the front matter of a transport-encoded document.
pub fn append_comment(transport_content: &str, comment: &Comment) -> Result<String, CodecError> {
    let text = transport::decode(transport_content)?;
    let doc = split(&text)?;

    let mut front = parse_block(doc.block)?;
    push_comment(&mut front, COMMENTS_KEY, comment)?;
    let yaml = dump(&front)?;

    Ok(transport::encode(&format!("---\n{yaml}---{}", doc.body)))
}

struct Document<'a> {
    /// The structured block between the delimiters, without them.
    block: &'a str,
    /// Everything after the closing `---`, leading newline included.
    body: &'a str,
}

/// Splits a document into its front-matter block and body.
///
/// The opening delimiter must sit at byte 0; the closing delimiter is the
/// first subsequent line break followed by `---`. A document without both
/// delimiters has no front matter at all and is malformed for this mode.
fn split(text: &str) -> Result<Document<'_>, CodecError> {
    let rest = text
        .strip_prefix("---")
        .ok_or(CodecError::MissingFrontMatter)?;
    // Zero-length block: the closing delimiter follows immediately.
    if let Some(body) = rest.strip_prefix("\n---").or_else(|| rest.strip_prefix("\r---")) {
        return Ok(Document { block: "", body });
    }
    let rest = match rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix("\n")) {
        Some(r) => r,
        None => return Err(CodecError::MissingFrontMatter),
    };

    let close = match (rest.find("\n---"), rest.find("\r---")) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return Err(CodecError::MissingFrontMatter),
    };

    Ok(Document {
        block: &rest[..close],
        // Skip the line break and the three dashes; keep what follows.
        body: &rest[close + 4..],
    })
}

/// Parses the structured block into a mapping.
///
/// An empty or non-mapping block is treated as an empty mapping (valid, just
/// without fields yet); a block starting with `{` is parsed as JSON.
fn parse_block(block: &str) -> Result<Mapping, CodecError> {
    let trimmed = block.trim_start();
    let value: Value = if trimmed.is_empty() {
        Value::Null
    } else if trimmed.starts_with('{') {
        let json: serde_json::Value = serde_json::from_str(block)?;
        serde_yaml::to_value(json)?
    } else {
        serde_yaml::from_str(block)?
    };

    Ok(match value {
        Value::Mapping(mapping) => mapping,
        _ => Mapping::new(),
    })
}
