//! Visibility filtering
//!
//! This module provides:
//! - `VisibilityExpression` - Opaque access policy attached to a value
//! - `Authorizations` - The labels a caller holds
//! - `PolicyEvaluator` - Injected capability deciding visibility
//! - `VisibilityTraversal` - Authorization-bound cursor with authorized removal
//! - `VisibleIter` - Borrowing iterator built on the traversal
//!
//! Every read of a `SecureAggregate` goes through a traversal. This is the
//! only place access control is enforced.

mod authorizations;
mod errors;
mod evaluator;
mod traversal;

pub use authorizations::{Authorizations, VisibilityExpression};
pub use errors::{IllegalStateKind, PolicyParseError, VisibilityError, VisibilityResult};
pub use evaluator::{LabelEvaluator, PolicyEvaluator};
pub use traversal::{VisibilityTraversal, VisibleIter};
