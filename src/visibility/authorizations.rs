//! Visibility expressions and authorization sets
//!
//! Both are opaque to the traversal: expressions are carried from the data
//! owner to the evaluator untouched, and authorizations are only ever handed
//! to the evaluator.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Access policy attached to a single value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisibilityExpression(String);

impl VisibilityExpression {
    pub fn new(expression: impl Into<String>) -> Self {
        Self(expression.into())
    }

    /// An expression that guards nothing
    pub fn unguarded() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VisibilityExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VisibilityExpression {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for VisibilityExpression {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The credential labels a caller currently holds.
///
/// Labels are kept sorted so that two sets holding the same labels compare
/// and print identically.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Authorizations {
    labels: BTreeSet<String>,
}

impl Authorizations {
    /// A caller holding no labels
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Authorizations {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl fmt::Display for Authorizations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        write!(f, "{{{}}}", joined.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorizations_deduplicate_and_sort() {
        let auths = Authorizations::new(["Y", "X", "Y"]);
        assert_eq!(auths.len(), 2);
        assert_eq!(auths.iter().collect::<Vec<_>>(), vec!["X", "Y"]);
        assert_eq!(auths.to_string(), "{X,Y}");
    }

    #[test]
    fn test_empty_authorizations() {
        let auths = Authorizations::empty();
        assert!(auths.is_empty());
        assert!(!auths.contains("X"));
    }

    #[test]
    fn test_expression_serializes_as_plain_string() {
        let expr = VisibilityExpression::new("ADMIN");
        assert_eq!(serde_json::to_string(&expr).unwrap(), "\"ADMIN\"");
    }
}
