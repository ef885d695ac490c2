//! zephyr-secure - Visibility-filtered secure aggregates
//!
//! Ordered collections of labeled values, each guarded by a visibility
//! expression, read and mutated only through authorization-bound
//! traversals.
//!
//! ```
//! use zephyr_secure::data::{CategorizedValue, SecureAggregate};
//! use zephyr_secure::visibility::Authorizations;
//!
//! let mut event = SecureAggregate::new("netflow");
//! event.add(CategorizedValue::new("src_ip", "10.0.0.1", "ipv4", "NET", "origin"));
//! event.add(CategorizedValue::new("user", "alice", "string", "PII", "origin"));
//!
//! let visible = event.to_visible_list(&Authorizations::new(["NET"])).unwrap();
//! assert_eq!(visible.len(), 1);
//! assert_eq!(visible[0].category(), "src_ip");
//! ```

pub mod data;
pub mod observability;
pub mod output;
pub mod visibility;
