//! Visibility error types
//!
//! Error codes:
//! - ZEPHYR_POLICY_PARSE (FATAL)
//! - ZEPHYR_TRAVERSAL_EXHAUSTED (control flow, never logged as an error)
//! - ZEPHYR_ILLEGAL_STATE (FATAL)
//! - ZEPHYR_CONCURRENT_MODIFICATION (FATAL to the traversal instance)
//! - ZEPHYR_AGGREGATE_MISMATCH (FATAL)

use thiserror::Error;

/// Result type for visibility operations
pub type VisibilityResult<T> = Result<T, VisibilityError>;

/// A visibility expression could not be parsed by the policy evaluator.
///
/// Never retried: the expression will not change between attempts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed visibility expression {expression:?}: {reason}")]
pub struct PolicyParseError {
    expression: String,
    reason: String,
}

impl PolicyParseError {
    /// Create a parse error for the given raw expression
    pub fn new(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    /// The raw expression that failed to parse
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Why the evaluator rejected it
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Why a removal through a traversal was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IllegalStateKind {
    /// `remove_last` before any successful `next`
    NothingReturned,
    /// `remove_last` already called since the last `next`
    AlreadyRemoved,
}

impl IllegalStateKind {
    fn describe(&self) -> &'static str {
        match self {
            IllegalStateKind::NothingReturned => "no element has been returned yet",
            IllegalStateKind::AlreadyRemoved => "element already removed since the last advance",
        }
    }
}

impl std::fmt::Display for IllegalStateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

/// Errors raised by visibility-filtered traversal and the queries built on it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VisibilityError {
    /// The policy evaluator rejected a visibility expression
    #[error("Policy evaluation failed: {0}")]
    PolicyParse(#[from] PolicyParseError),

    /// The traversal has no further visible element
    #[error("No further visible element")]
    Exhausted,

    /// Removal invoked out of sequence
    #[error("Illegal traversal state: {0}")]
    IllegalState(IllegalStateKind),

    /// The aggregate changed structurally behind the traversal's back
    #[error("Concurrent modification: expected version {expected}, found {actual}")]
    ConcurrentModification {
        /// Version the traversal was bound to
        expected: u64,
        /// Version observed on the aggregate
        actual: u64,
    },

    /// The traversal was stepped against an aggregate it was not created from
    #[error("Traversal bound to aggregate {bound} was used with aggregate {given}")]
    AggregateMismatch {
        /// Aggregate the traversal was created from
        bound: String,
        /// Aggregate passed to the step
        given: String,
    },
}

impl VisibilityError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            VisibilityError::PolicyParse(_) => "ZEPHYR_POLICY_PARSE",
            VisibilityError::Exhausted => "ZEPHYR_TRAVERSAL_EXHAUSTED",
            VisibilityError::IllegalState(_) => "ZEPHYR_ILLEGAL_STATE",
            VisibilityError::ConcurrentModification { .. } => "ZEPHYR_CONCURRENT_MODIFICATION",
            VisibilityError::AggregateMismatch { .. } => "ZEPHYR_AGGREGATE_MISMATCH",
        }
    }

    /// Everything except exhaustion must abort the caller's current operation
    pub fn is_fatal(&self) -> bool {
        !matches!(self, VisibilityError::Exhausted)
    }

    /// Callers should discard the traversal and re-query
    pub fn requires_restart(&self) -> bool {
        matches!(self, VisibilityError::ConcurrentModification { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(VisibilityError::Exhausted.code(), "ZEPHYR_TRAVERSAL_EXHAUSTED");
        assert_eq!(
            VisibilityError::IllegalState(IllegalStateKind::AlreadyRemoved).code(),
            "ZEPHYR_ILLEGAL_STATE"
        );
        assert_eq!(
            VisibilityError::ConcurrentModification { expected: 1, actual: 2 }.code(),
            "ZEPHYR_CONCURRENT_MODIFICATION"
        );
    }

    #[test]
    fn test_exhaustion_is_not_fatal() {
        assert!(!VisibilityError::Exhausted.is_fatal());
        assert!(VisibilityError::from(PolicyParseError::new("(", "unbalanced")).is_fatal());
    }

    #[test]
    fn test_only_comodification_requires_restart() {
        assert!(VisibilityError::ConcurrentModification { expected: 3, actual: 4 }.requires_restart());
        assert!(!VisibilityError::IllegalState(IllegalStateKind::NothingReturned).requires_restart());
    }

    #[test]
    fn test_parse_error_display_names_expression() {
        let err = PolicyParseError::new("A&&B", "empty term");
        let display = err.to_string();
        assert!(display.contains("A&&B"));
        assert!(display.contains("empty term"));
    }
}
