//! Output surface
//!
//! Sinks receive an aggregate as a flat key-value write: the aggregate id as
//! the row key and its visible `(category, value)` pairs as cells. Sinks
//! follow an `open` / `write` / `flush` / `close` lifecycle.
//!
//! This module provides:
//! - `Record` / `Entry` - The flat projection handed to sinks
//! - `OutputSink` - Sink lifecycle trait
//! - `MemorySink` - Buffering in-memory sink
//! - `FileSink` - Checksummed JSON-lines sink
//! - `SinkConfig` - Sink configuration

mod config;
mod errors;
mod file;
mod memory;
mod record;

pub use config::SinkConfig;
pub use errors::{OutputError, OutputResult};
pub use file::{Cell, FileSink};
pub use memory::MemorySink;
pub use record::{Entry, Record};

use crate::data::SecureAggregate;
use crate::visibility::Authorizations;

/// Lifecycle of a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkState {
    /// Built but not yet opened
    #[default]
    Created,
    /// Accepting writes
    Open,
    /// Sealed; every further operation except `close` fails
    Closed,
}

impl SinkState {
    pub(crate) fn ensure_open(self) -> OutputResult<()> {
        match self {
            SinkState::Open => Ok(()),
            SinkState::Created => Err(OutputError::NotOpen),
            SinkState::Closed => Err(OutputError::Closed),
        }
    }

    /// State after a successful `open`.
    pub(crate) fn opened(self) -> OutputResult<SinkState> {
        match self {
            SinkState::Closed => Err(OutputError::Closed),
            _ => Ok(SinkState::Open),
        }
    }
}

/// Destination for aggregate records.
///
/// Batching, retry and connection handling belong to implementations.
pub trait OutputSink: Send + std::fmt::Debug {
    fn open(&mut self) -> OutputResult<()>;

    fn write(&mut self, record: &Record) -> OutputResult<()>;

    fn flush(&mut self) -> OutputResult<()>;

    /// Flush pending writes and seal the sink. Closing twice is a no-op.
    fn close(&mut self) -> OutputResult<()>;
}

/// Write the values of `aggregate` visible to `authorizations` as one record.
///
/// Returns the number of cells written. An aggregate with nothing visible
/// produces no write at all.
pub fn write_aggregate(
    sink: &mut dyn OutputSink,
    aggregate: &SecureAggregate,
    authorizations: &Authorizations,
) -> OutputResult<usize> {
    let record = Record::from_aggregate(aggregate, authorizations)?;
    if record.is_empty() {
        return Ok(0);
    }
    sink.write(&record)?;
    Ok(record.len())
}
