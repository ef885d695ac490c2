//! In-memory sink
//!
//! Buffers written records until `flush`, then moves them to the committed
//! list. Useful for tests and for embedding applications that batch
//! elsewhere.

use tracing::debug;

use super::errors::OutputResult;
use super::record::Record;
use super::{OutputSink, SinkState};
use crate::observability::Event;

#[derive(Debug, Default)]
pub struct MemorySink {
    state: SinkState,
    pending: Vec<Record>,
    committed: Vec<Record>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SinkState {
        self.state
    }

    /// Records written but not yet flushed
    pub fn pending(&self) -> &[Record] {
        &self.pending
    }

    /// Records that survived a flush
    pub fn committed(&self) -> &[Record] {
        &self.committed
    }
}

impl OutputSink for MemorySink {
    fn open(&mut self) -> OutputResult<()> {
        self.state = self.state.opened()?;
        debug!(event = %Event::SinkOpened, sink = "memory");
        Ok(())
    }

    fn write(&mut self, record: &Record) -> OutputResult<()> {
        self.state.ensure_open()?;
        self.pending.push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.state.ensure_open()?;
        let flushed = self.pending.len();
        self.committed.append(&mut self.pending);
        debug!(event = %Event::SinkFlushed, sink = "memory", records = flushed);
        Ok(())
    }

    fn close(&mut self) -> OutputResult<()> {
        if self.state == SinkState::Open {
            self.flush()?;
        }
        self.state = SinkState::Closed;
        debug!(event = %Event::SinkClosed, sink = "memory");
        Ok(())
    }
}
