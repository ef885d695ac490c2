//! Policy evaluation seam
//!
//! The traversal never interprets a visibility expression itself. It asks a
//! `PolicyEvaluator`, so the expression grammar can be swapped without
//! touching any filtering logic.

use super::authorizations::{Authorizations, VisibilityExpression};
use super::errors::PolicyParseError;

/// Decides whether a caller holding `authorizations` may see a value guarded
/// by `expression`.
///
/// Implementations must be deterministic: identical inputs always produce
/// identical results. A malformed expression is an error, never a silent
/// allow or deny.
pub trait PolicyEvaluator: Send + Sync + std::fmt::Debug {
    fn evaluate(
        &self,
        expression: &VisibilityExpression,
        authorizations: &Authorizations,
    ) -> Result<bool, PolicyParseError>;
}

/// Default evaluator: single-label policies.
///
/// - A blank expression is unguarded and visible to everyone.
/// - Otherwise the expression must be exactly one label built from
///   `[A-Za-z0-9_-:./]`, and is visible iff the caller holds that label.
///   Surrounding whitespace is not stripped: `" X "` is malformed.
///
/// Boolean combinations are rejected as malformed; deployments that need
/// them supply their own evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelEvaluator;

impl LabelEvaluator {
    fn is_label_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.' | '/')
    }
}

impl PolicyEvaluator for LabelEvaluator {
    fn evaluate(
        &self,
        expression: &VisibilityExpression,
        authorizations: &Authorizations,
    ) -> Result<bool, PolicyParseError> {
        let label = expression.as_str();
        if label.trim().is_empty() {
            return Ok(true);
        }
        if label.trim() != label {
            return Err(PolicyParseError::new(label, "leading or trailing whitespace"));
        }

        if let Some(bad) = label.chars().find(|c| !Self::is_label_char(*c)) {
            return Err(PolicyParseError::new(
                expression.as_str(),
                format!("unsupported character {:?}", bad),
            ));
        }

        Ok(authorizations.contains(label))
    }
}
