//! Error taxonomy for principal-store backends.
//!
//! The admin tool signals almost everything through its error stream while
//! exiting zero, so the only way to tell "already satisfied" from "broken" is
//! the diagnostic text. All of that pattern matching happens here, once, at
//! the backend boundary; the reconciler only ever sees typed error kinds.

use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Diagnostic `kadmin.local` emits when `add_principal` hits an existing entry.
pub const ALREADY_EXISTS_PHRASE: &str = "Principal or policy already exists while creating";

/// Diagnostic `kadmin.local` emits when `delprinc` finds nothing to delete.
pub const NOT_FOUND_PHRASE: &str = "Principal does not exist while deleting principal";

#[derive(Error, Debug)]
pub enum StoreError {
    /// Create found the principal already in place. Not a real failure; the
    /// reconciler maps it to a no-op success.
    #[error("principal {0} already exists")]
    AlreadyExists(String),

    /// Delete found nothing to remove. Also mapped to a no-op success.
    #[error("principal {0} does not exist")]
    NotFound(String),

    /// Any other backend diagnostic, carried verbatim.
    #[error("{0}")]
    Diagnostic(String),

    /// The tool exited non-zero without writing a diagnostic. The observed
    /// tool always exits zero and talks through stderr, so this is a guard
    /// against a genuinely broken installation, not a normal path.
    #[error("{tool} failed with {status} and produced no diagnostic output")]
    Exit { tool: String, status: ExitStatus },

    /// The tool could not be started at all.
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The backend call did not finish within the configured deadline.
    #[error("{target} did not respond within {timeout:?}")]
    Timeout { target: String, timeout: Duration },

    /// The backend has no implementation of this operation.
    #[error("{operation} is not supported by the {backend} backend")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },

    /// Transport-level failure talking to the cluster-manager API.
    #[cfg(feature = "cm")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the cluster-manager API.
    #[cfg(feature = "cm")]
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },
}

impl StoreError {
    /// True when the store was already in the state the call asked for.
    pub fn is_already_satisfied(&self) -> bool {
        matches!(self, StoreError::AlreadyExists(_) | StoreError::NotFound(_))
    }
}

/// Classify an `add_principal` diagnostic.
#[cfg(feature = "kadmin")]
pub(crate) fn classify_create(principal: &str, diagnostic: &str) -> StoreError {
    if diagnostic.contains(ALREADY_EXISTS_PHRASE) {
        StoreError::AlreadyExists(principal.to_string())
    } else {
        StoreError::Diagnostic(diagnostic.to_string())
    }
}

/// Classify a `delprinc` diagnostic.
#[cfg(feature = "kadmin")]
pub(crate) fn classify_delete(principal: &str, diagnostic: &str) -> StoreError {
    if diagnostic.contains(NOT_FOUND_PHRASE) {
        StoreError::NotFound(principal.to_string())
    } else {
        StoreError::Diagnostic(diagnostic.to_string())
    }
}

/// Classify a `change_password` diagnostic. There is no idempotent phrase for
/// a password change, so every diagnostic is a real failure, including the
/// create/delete phrases should the tool ever emit them here.
#[cfg(feature = "kadmin")]
pub(crate) fn classify_change(diagnostic: &str) -> StoreError {
    StoreError::Diagnostic(diagnostic.to_string())
}

#[cfg(all(test, feature = "kadmin"))]
mod tests {
    use super::*;

    #[test]
    fn test_create_phrase_maps_to_already_exists() {
        let diagnostic = format!(
            "add_principal: {} \"alice@EXAMPLE.LOCAL\".\n",
            ALREADY_EXISTS_PHRASE
        );
        let error = classify_create("alice@EXAMPLE.LOCAL", &diagnostic);
        assert!(matches!(error, StoreError::AlreadyExists(ref p) if p == "alice@EXAMPLE.LOCAL"));
        assert!(error.is_already_satisfied());
    }

    #[test]
    fn test_delete_phrase_maps_to_not_found() {
        let diagnostic = format!("delete_principal: {} \"bob\".\n", NOT_FOUND_PHRASE);
        let error = classify_delete("bob", &diagnostic);
        assert!(matches!(error, StoreError::NotFound(ref p) if p == "bob"));
        assert!(error.is_already_satisfied());
    }

    #[test]
    fn test_unknown_diagnostics_are_carried_verbatim() {
        let diagnostic = "add_principal: Operation requires ``add'' privilege\n";
        let error = classify_create("alice", diagnostic);
        match error {
            StoreError::Diagnostic(text) => assert_eq!(text, diagnostic),
            other => panic!("expected Diagnostic, got {other:?}"),
        }
    }

    #[test]
    fn test_cross_operation_phrases_do_not_match() {
        // The delete phrase on a create (and vice versa) is an ordinary
        // failure, not an idempotent no-op.
        let error = classify_create("alice", NOT_FOUND_PHRASE);
        assert!(matches!(error, StoreError::Diagnostic(_)));

        let error = classify_delete("alice", ALREADY_EXISTS_PHRASE);
        assert!(matches!(error, StoreError::Diagnostic(_)));
    }

    #[test]
    fn test_change_has_no_idempotent_carve_out() {
        let error = classify_change(ALREADY_EXISTS_PHRASE);
        assert!(matches!(error, StoreError::Diagnostic(_)));
        assert!(!error.is_already_satisfied());
    }

    #[test]
    fn test_diagnostic_display_is_the_raw_text() {
        let error = StoreError::Diagnostic("raw tool output\n".to_string());
        assert_eq!(error.to_string(), "raw tool output\n");
    }
}
