//! Observability
//!
//! Structured logging goes through `tracing`. Each call site tags its line
//! with an `event` field drawn from [`Event`]:
//!
//! ```ignore
//! tracing::warn!(event = %Event::ConcurrentModificationDetected, aggregate = %id);
//! ```
//!
//! Installing a subscriber is the embedding application's job.

mod events;

pub use events::Event;
