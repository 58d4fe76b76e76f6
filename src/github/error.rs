//! GitHub API error types.
//!
//! The pipeline cares about three conditions it can act on (a missing
//! path/ref, a non-file entry, a revision-token conflict) and treats
//! everything else as an opaque API failure to log and surface generically.
//! There is deliberately no retry classification here: the pipeline never
//! retries (every failure aborts the run and releases the repository lock).

use thiserror::Error;

/// An error from the hosting platform API.
#[derive(Debug, Error)]
pub enum HostError {
    /// The requested path, ref or resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The located entry is not a file.
    #[error("{name} is not a file but a {kind}")]
    NotAFile { name: String, kind: String },

    /// A write precondition failed (stale revision token, HTTP 409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other API failure: network, auth, rate limit, 5xx.
    #[error("github api error{}: {message}", fmt_status(.status))]
    Api {
        status: Option<u16>,
        message: String,
        #[source]
        source: Option<octocrab::Error>,
    },
}

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {code})"),
        None => String::new(),
    }
}

impl HostError {
    /// Creates an opaque API error without an octocrab source.
    pub fn api(message: impl Into<String>) -> Self {
        HostError::Api {
            status: None,
            message: message.into(),
            source: None,
        }
    }

    /// Categorizes an octocrab error, attaching `context` to the conditions
    /// the pipeline distinguishes.
    ///
    /// 404 maps to [`HostError::NotFound`] and 409 to [`HostError::Conflict`];
    /// everything else stays an opaque [`HostError::Api`].
    pub fn from_octocrab(err: octocrab::Error, context: &str) -> Self {
        match status_of(&err) {
            Some(404) => HostError::NotFound(context.to_string()),
            Some(409) => HostError::Conflict(context.to_string()),
            status => HostError::Api {
                status,
                message: err.to_string(),
                source: Some(err),
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, HostError::NotFound(_))
    }
}

/// Extracts the HTTP status code from an octocrab error, if present.
///
/// The `GitHub` variant exposes the status directly; for the transport-level
/// variants we fall back to sniffing the message, which is fragile but safe:
/// a missed code just means the error stays an opaque `Api` failure.
fn status_of(err: &octocrab::Error) -> Option<u16> {
    if let octocrab::Error::GitHub { source, .. } = err {
        return Some(source.status_code.as_u16());
    }

    let text = err.to_string();
    for code in [404u16, 409, 401, 403, 422, 429, 500, 502, 503] {
        if text.contains(&code.to_string()) {
            return Some(code);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_includes_status_when_known() {
        let with_status = HostError::Api {
            status: Some(502),
            message: "bad gateway".into(),
            source: None,
        };
        assert_eq!(
            with_status.to_string(),
            "github api error (HTTP 502): bad gateway"
        );

        let without = HostError::api("connection reset");
        assert_eq!(without.to_string(), "github api error: connection reset");
    }

    #[test]
    fn not_a_file_names_the_kind() {
        let err = HostError::NotAFile {
            name: "assets".into(),
            kind: "dir".into(),
        };
        assert_eq!(err.to_string(), "assets is not a file but a dir");
    }
}
