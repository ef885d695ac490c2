//! Visibility-filtering traversal
//!
//! A `VisibilityTraversal` is a detached cursor: it holds a position, the
//! caller's authorizations and the aggregate version it was bound to, but no
//! borrow of the aggregate. Each step is handed the aggregate explicitly.
//!
//! ## Rules
//!
//! 1. Only values whose expression evaluates to `true` under the bound
//!    authorizations are ever returned.
//! 2. Values are returned in slot order; tombstones and hidden values are
//!    skipped.
//! 3. Every step first verifies the aggregate identity and version. Any
//!    structural change the traversal did not make itself is reported as
//!    `ConcurrentModification`.
//! 4. At most one `remove_last` per successful `next`.
//! 5. Evaluator failures propagate. A malformed expression is neither
//!    visible nor hidden.
//!
//! Removal tombstones the slot, so the cursor never moves backwards and no
//! index bookkeeping is required after a removal.

use std::iter::FusedIterator;

use tracing::{error, warn};

use super::authorizations::Authorizations;
use super::errors::{IllegalStateKind, VisibilityError, VisibilityResult};
use crate::data::{CategorizedValue, SecureAggregate, Uid};
use crate::observability::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastReturned {
    Nothing,
    At(usize),
    Removed,
}

/// Authorization-bound cursor over a `SecureAggregate`.
#[derive(Debug)]
pub struct VisibilityTraversal {
    aggregate_id: Uid,
    authorizations: Authorizations,
    cursor: usize,
    expected_version: u64,
    last: LastReturned,
}

impl VisibilityTraversal {
    pub(crate) fn new(aggregate: &SecureAggregate, authorizations: Authorizations) -> Self {
        Self {
            aggregate_id: aggregate.id().clone(),
            authorizations,
            cursor: 0,
            expected_version: aggregate.version(),
            last: LastReturned::Nothing,
        }
    }

    pub fn aggregate_id(&self) -> &Uid {
        &self.aggregate_id
    }

    pub fn authorizations(&self) -> &Authorizations {
        &self.authorizations
    }

    /// Aggregate version this traversal will accept on its next step.
    pub fn expected_version(&self) -> u64 {
        self.expected_version
    }

    /// Look ahead for another visible value without consuming it.
    ///
    /// Idempotent: repeated calls re-scan from the same position.
    pub fn has_more(&self, aggregate: &SecureAggregate) -> VisibilityResult<bool> {
        self.check(aggregate)?;
        Ok(self.scan(aggregate)?.is_some())
    }

    /// Advance to the next visible value and return it.
    ///
    /// Fails with `Exhausted` when no visible value remains.
    pub fn next<'a>(&mut self, aggregate: &'a SecureAggregate) -> VisibilityResult<&'a CategorizedValue> {
        self.check(aggregate)?;
        match self.scan(aggregate)? {
            Some((index, value)) => {
                self.cursor = index + 1;
                self.last = LastReturned::At(index);
                Ok(value)
            }
            None => {
                self.cursor = aggregate.slot_count();
                Err(VisibilityError::Exhausted)
            }
        }
    }

    /// Remove the value most recently returned by `next`, handing it back.
    pub fn remove_last(&mut self, aggregate: &mut SecureAggregate) -> VisibilityResult<CategorizedValue> {
        let index = self.last_index()?;
        self.check(aggregate)?;

        let removed = aggregate
            .tombstone(index)
            .ok_or_else(|| self.comodification(aggregate))?;

        self.last = LastReturned::Removed;
        self.expected_version = aggregate.version();
        Ok(removed)
    }

    /// Mutable access to the value most recently returned by `next`.
    ///
    /// Only the value's metadata is mutable, so this can never change what
    /// the traversal would filter.
    pub fn last_mut<'a>(&self, aggregate: &'a mut SecureAggregate) -> VisibilityResult<&'a mut CategorizedValue> {
        let index = self.last_index()?;
        self.check(aggregate)?;
        let err = self.comodification(aggregate);
        aggregate.slot_mut(index).ok_or(err)
    }

    fn last_index(&self) -> VisibilityResult<usize> {
        match self.last {
            LastReturned::At(index) => Ok(index),
            LastReturned::Nothing => Err(VisibilityError::IllegalState(IllegalStateKind::NothingReturned)),
            LastReturned::Removed => Err(VisibilityError::IllegalState(IllegalStateKind::AlreadyRemoved)),
        }
    }

    fn check(&self, aggregate: &SecureAggregate) -> VisibilityResult<()> {
        if aggregate.id() != &self.aggregate_id {
            return Err(VisibilityError::AggregateMismatch {
                bound: self.aggregate_id.to_string(),
                given: aggregate.id().to_string(),
            });
        }

        if aggregate.version() != self.expected_version {
            warn!(
                event = %Event::ConcurrentModificationDetected,
                aggregate = %self.aggregate_id,
                expected = self.expected_version,
                actual = aggregate.version()
            );
            return Err(self.comodification(aggregate));
        }

        Ok(())
    }

    fn comodification(&self, aggregate: &SecureAggregate) -> VisibilityError {
        VisibilityError::ConcurrentModification {
            expected: self.expected_version,
            actual: aggregate.version(),
        }
    }

    /// First visible slot at or after the cursor.
    fn scan<'a>(&self, aggregate: &'a SecureAggregate) -> VisibilityResult<Option<(usize, &'a CategorizedValue)>> {
        for index in self.cursor..aggregate.slot_count() {
            let Some(value) = aggregate.slot(index) else {
                continue;
            };
            if self.is_visible(aggregate, value)? {
                return Ok(Some((index, value)));
            }
        }
        Ok(None)
    }

    fn is_visible(&self, aggregate: &SecureAggregate, value: &CategorizedValue) -> VisibilityResult<bool> {
        aggregate
            .evaluator()
            .evaluate(value.visibility(), &self.authorizations)
            .map_err(|e| {
                error!(
                    event = %Event::PolicyEvaluationFailed,
                    aggregate = %self.aggregate_id,
                    value = %value.id(),
                    error = %e
                );
                VisibilityError::from(e)
            })
    }
}

/// Borrowing iterator over the visible values of an aggregate.
///
/// Yields `Err` at most once, then ends.
#[derive(Debug)]
pub struct VisibleIter<'a> {
    aggregate: &'a SecureAggregate,
    traversal: VisibilityTraversal,
    done: bool,
}

impl<'a> VisibleIter<'a> {
    pub(crate) fn new(aggregate: &'a SecureAggregate, traversal: VisibilityTraversal) -> Self {
        Self {
            aggregate,
            traversal,
            done: false,
        }
    }
}

impl<'a> Iterator for VisibleIter<'a> {
    type Item = VisibilityResult<&'a CategorizedValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.traversal.next(self.aggregate) {
            Ok(value) => Some(Ok(value)),
            Err(VisibilityError::Exhausted) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for VisibleIter<'_> {}
