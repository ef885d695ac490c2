//! Flat key-value projection of an aggregate
//!
//! A `Record` is what a sink receives: the aggregate id as the row key and
//! one `(label, value)` entry per visible value, in traversal order.

use serde::{Deserialize, Serialize};

use crate::data::{SecureAggregate, Uid};
use crate::visibility::{Authorizations, VisibilityResult};

/// A single labeled cell of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    label: String,
    value: String,
}

impl Entry {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Row key plus ordered entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    row_key: Uid,
    entries: Vec<Entry>,
}

impl Record {
    pub fn new(row_key: impl Into<Uid>) -> Self {
        Self {
            row_key: row_key.into(),
            entries: Vec::new(),
        }
    }

    /// Project the values of `aggregate` visible to `authorizations`.
    ///
    /// Labels are the value categories. Nothing hidden from
    /// `authorizations` reaches the record.
    pub fn from_aggregate(aggregate: &SecureAggregate, authorizations: &Authorizations) -> VisibilityResult<Self> {
        let mut record = Record::new(aggregate.id().clone());
        for value in aggregate.visible(authorizations) {
            let value = value?;
            record.push(value.category(), value.value());
        }
        Ok(record)
    }

    pub fn push(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.entries.push(Entry::new(label, value));
    }

    pub fn row_key(&self) -> &Uid {
        &self.row_key
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
