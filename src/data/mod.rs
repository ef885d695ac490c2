//! Secure data model
//!
//! - `CategorizedValue` - A labeled value guarded by a visibility expression
//! - `SecureAggregate` - Ordered collection of values from one feed
//! - `Uid` / `IdGenerator` - Identifier assignment

mod aggregate;
mod categorized_value;
mod id;

pub use aggregate::SecureAggregate;
pub use categorized_value::CategorizedValue;
pub use id::{IdGenerator, SequentialIdGenerator, Uid, UuidGenerator};
