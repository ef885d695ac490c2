//! Secure aggregate - the unit of access control
//!
//! An ordered collection of `CategorizedValue`s from a single source feed.
//!
//! ## Storage
//!
//! Values live in an arena of slots. Removal tombstones the slot instead of
//! shifting its successors, so a slot index is stable for the lifetime of
//! the aggregate (until `compact`). Insertion order is preserved across
//! every read and after every removal.
//!
//! ## Versioning
//!
//! Every structural change (append, removal, compaction) bumps a
//! monotonically increasing version. Traversals capture the version when
//! they are created and refuse to step once it has moved, which also catches
//! a same-size remove-then-add.
//!
//! ## Reads
//!
//! Every read goes through a `VisibilityTraversal`. There is no unfiltered
//! accessor for the stored values.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use super::categorized_value::CategorizedValue;
use super::id::{IdGenerator, Uid, UuidGenerator};
use crate::observability::Event;
use crate::visibility::{
    Authorizations, LabelEvaluator, PolicyEvaluator, VisibilityError, VisibilityResult,
    VisibilityTraversal, VisibleIter,
};

/// An ordered, access-controlled collection of categorized values.
pub struct SecureAggregate {
    id: Uid,
    feed_name: String,
    slots: Vec<Option<CategorizedValue>>,
    live: usize,
    version: u64,
    evaluator: Arc<dyn PolicyEvaluator>,
}

impl SecureAggregate {
    /// Create an empty aggregate with a fresh random id.
    pub fn new(feed_name: impl Into<String>) -> Self {
        Self::generated(&UuidGenerator, feed_name)
    }

    /// Create an empty aggregate whose id comes from `generator`.
    pub fn generated(generator: &dyn IdGenerator, feed_name: impl Into<String>) -> Self {
        Self::with_id(generator.generate(), feed_name)
    }

    /// Create an empty aggregate with an explicit id.
    pub fn with_id(id: impl Into<Uid>, feed_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            feed_name: feed_name.into(),
            slots: Vec::new(),
            live: 0,
            version: 0,
            evaluator: Arc::new(LabelEvaluator),
        }
    }

    /// Replace the policy evaluator used by every traversal of this aggregate.
    pub fn with_evaluator<E: PolicyEvaluator + 'static>(self, evaluator: E) -> Self {
        self.with_shared_evaluator(Arc::new(evaluator))
    }

    /// Like `with_evaluator`, for an evaluator shared between aggregates.
    pub fn with_shared_evaluator(mut self, evaluator: Arc<dyn PolicyEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn id(&self) -> &Uid {
        &self.id
    }

    pub fn feed_name(&self) -> &str {
        &self.feed_name
    }

    /// Number of stored values, regardless of visibility.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Current structural version.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn evaluator(&self) -> &dyn PolicyEvaluator {
        self.evaluator.as_ref()
    }

    /// Append a single value.
    pub fn add(&mut self, value: CategorizedValue) {
        self.add_all(std::iter::once(value));
    }

    /// Append values in iteration order.
    pub fn add_all<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = CategorizedValue>,
    {
        let before = self.slots.len();
        self.slots.extend(values.into_iter().map(Some));
        let added = self.slots.len() - before;
        if added > 0 {
            self.live += added;
            self.version += 1;
        }
    }

    /// Bind a fresh traversal to the current contents and `authorizations`.
    pub fn begin_traversal(&self, authorizations: &Authorizations) -> VisibilityTraversal {
        VisibilityTraversal::new(self, authorizations.clone())
    }

    /// Borrowing iterator over the values visible to `authorizations`.
    pub fn visible(&self, authorizations: &Authorizations) -> VisibleIter<'_> {
        VisibleIter::new(self, self.begin_traversal(authorizations))
    }

    /// Visible values whose category equals `category`, in order.
    pub fn find_by_category(
        &self,
        category: &str,
        authorizations: &Authorizations,
    ) -> VisibilityResult<Vec<CategorizedValue>> {
        self.visible_where(authorizations, |cv| cv.category() == category)
    }

    /// Visible values whose metadata equals `metadata`, in order.
    pub fn find_by_metadata(
        &self,
        metadata: &str,
        authorizations: &Authorizations,
    ) -> VisibilityResult<Vec<CategorizedValue>> {
        self.visible_where(authorizations, |cv| cv.metadata() == metadata)
    }

    /// Distinct metadata values across everything visible, sorted.
    pub fn metadata_keys(&self, authorizations: &Authorizations) -> VisibilityResult<BTreeSet<String>> {
        self.visible(authorizations)
            .map(|r| r.map(|cv| cv.metadata().to_string()))
            .collect()
    }

    /// Everything visible to `authorizations`, in order.
    pub fn to_visible_list(&self, authorizations: &Authorizations) -> VisibilityResult<Vec<CategorizedValue>> {
        self.visible_where(authorizations, |_| true)
    }

    /// Remove the value with `target`'s id, if the caller can see it.
    ///
    /// `Ok(false)` means absent or not visible; the two are deliberately
    /// indistinguishable.
    pub fn remove(&mut self, target: &CategorizedValue, authorizations: &Authorizations) -> VisibilityResult<bool> {
        match self.seek_visible(target.id(), authorizations)? {
            Some(mut traversal) => {
                traversal.remove_last(self)?;
                debug!(event = %Event::ValueRemoved, aggregate = %self.id, value = %target.id());
                Ok(true)
            }
            None => {
                debug!(event = %Event::RemovalRefused, aggregate = %self.id);
                Ok(false)
            }
        }
    }

    /// Replace the metadata of the value with `target`'s id, under the same
    /// visibility rule as `remove`. Not a structural change.
    pub fn set_metadata(
        &mut self,
        target: &CategorizedValue,
        metadata: impl Into<String>,
        authorizations: &Authorizations,
    ) -> VisibilityResult<bool> {
        match self.seek_visible(target.id(), authorizations)? {
            Some(traversal) => {
                traversal.last_mut(self)?.set_metadata(metadata);
                debug!(event = %Event::MetadataUpdated, aggregate = %self.id, value = %target.id());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drop tombstones left by removals. Invalidates every outstanding
    /// traversal if anything was dropped.
    pub fn compact(&mut self) {
        if self.slots.len() == self.live {
            return;
        }
        self.slots.retain(Option::is_some);
        self.version += 1;
    }

    fn visible_where<F>(&self, authorizations: &Authorizations, keep: F) -> VisibilityResult<Vec<CategorizedValue>>
    where
        F: Fn(&CategorizedValue) -> bool,
    {
        let mut out = Vec::new();
        for cv in self.visible(authorizations) {
            let cv = cv?;
            if keep(cv) {
                out.push(cv.clone());
            }
        }
        Ok(out)
    }

    /// Returns a traversal positioned just after the first visible value with
    /// `id`, or `None` if no visible value has it.
    fn seek_visible(&self, id: &Uid, authorizations: &Authorizations) -> VisibilityResult<Option<VisibilityTraversal>> {
        let mut traversal = self.begin_traversal(authorizations);
        loop {
            match traversal.next(self) {
                Ok(cv) if cv.id() == id => return Ok(Some(traversal)),
                Ok(_) => {}
                Err(VisibilityError::Exhausted) => return Ok(None),
                Err(e) => return Err(e),
            }
        }
    }

    // Slot access for traversals.

    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn slot(&self, index: usize) -> Option<&CategorizedValue> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut CategorizedValue> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    /// Tombstone a live slot, bumping the version.
    pub(crate) fn tombstone(&mut self, index: usize) -> Option<CategorizedValue> {
        let removed = self.slots.get_mut(index)?.take()?;
        self.live -= 1;
        self.version += 1;
        Some(removed)
    }
}

// Slot contents stay out of Debug output; they are only reachable through
// a traversal.
impl fmt::Debug for SecureAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureAggregate")
            .field("id", &self.id)
            .field("feed_name", &self.feed_name)
            .field("len", &self.live)
            .field("version", &self.version)
            .field("evaluator", &self.evaluator)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct AggregateRef<'a> {
    id: &'a Uid,
    feed_name: &'a str,
    items: Vec<&'a CategorizedValue>,
}

#[derive(Deserialize)]
struct AggregateRepr {
    id: Uid,
    feed_name: String,
    items: Vec<CategorizedValue>,
}

impl Serialize for SecureAggregate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        AggregateRef {
            id: &self.id,
            feed_name: &self.feed_name,
            items: self.slots.iter().flatten().collect(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecureAggregate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = AggregateRepr::deserialize(deserializer)?;
        let mut aggregate = SecureAggregate::with_id(repr.id, repr.feed_name);
        aggregate.add_all(repr.items);
        aggregate.version = 0;
        Ok(aggregate)
    }
}
