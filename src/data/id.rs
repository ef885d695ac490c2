//! Identifier assignment for values and aggregates

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque unique identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Uid {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Uid {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<Uuid> for Uid {
    fn from(u: Uuid) -> Self {
        Self(u.to_string())
    }
}

/// Source of fresh identifiers
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> Uid;
}

/// Random v4 UUIDs. Used whenever the caller does not inject a generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> Uid {
        Uid::from(Uuid::new_v4())
    }
}

/// Deterministic `<prefix>-<n>` identifiers, starting at 1.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self) -> Uid {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        Uid(format!("{}-{}", self.prefix, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_uuid_generator_unique() {
        let generator = UuidGenerator;
        let ids: HashSet<Uid> = (0..100).map(|_| generator.generate()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_uuid_generator_parses_back() {
        let id = UuidGenerator.generate();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_sequential_generator_is_deterministic() {
        let generator = SequentialIdGenerator::new("cv");
        assert_eq!(generator.generate().as_str(), "cv-1");
        assert_eq!(generator.generate().as_str(), "cv-2");
        assert_eq!(generator.generate().as_str(), "cv-3");
    }
}
