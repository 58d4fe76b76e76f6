//! Comment records and the public commenter projection.
//!
//! A [`Commenter`] is the only view of a user that ever reaches a repository:
//! it carries a display name, a profile url and a picture, never tokens or
//! internal ids. Display name and comment content are HTML-entity-encoded at
//! construction so stored records are inert when a site template renders them
//! unescaped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The identity provider a commenter authenticated with.
///
/// `Full` is a site owner commenting through their own account; the others
/// are comment-only identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommenterKind {
    Full,
    Github,
    Twitter,
    Facebook,
}

/// Redacted public projection of a commenting identity.
///
/// Immutable once constructed; the constructor owns the entity-encoding of
/// the display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commenter {
    #[serde(rename = "type")]
    kind: CommenterKind,
    display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    picture: Option<String>,
}

impl Commenter {
    pub fn new(
        kind: CommenterKind,
        display_name: &str,
        url: Option<String>,
        picture: Option<String>,
    ) -> Self {
        Commenter {
            kind,
            display_name: html_escape(display_name),
            url,
            picture,
        }
    }

    pub fn kind(&self) -> CommenterKind {
        self.kind
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn picture(&self) -> Option<&str> {
        self.picture.as_deref()
    }

    /// The human-readable author line used in commit messages and review
    /// request notes: `name` or `name (url)`.
    pub fn display_line(&self) -> String {
        match &self.url {
            Some(url) => format!("{} ({})", self.display_name, url),
            None => self.display_name.clone(),
        }
    }
}

impl fmt::Display for Commenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_line())
    }
}

/// One stored comment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub author: Commenter,
    pub content: String,
    pub date: DateTime<Utc>,
}

impl Comment {
    /// Builds the record for a comment submitted now.
    ///
    /// The date is set here, by the pipeline, never taken from the client.
    /// Content is entity-encoded so embedded markup is stored inert.
    pub fn submitted(author: Commenter, content: &str) -> Self {
        Comment {
            author,
            content: html_escape(content),
            date: Utc::now(),
        }
    }
}

/// Minimal HTML entity encoding for text destined for site templates.
fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}
