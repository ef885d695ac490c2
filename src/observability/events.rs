//! Observable events
//!
//! Every log line emitted by this crate carries one of these as its `event`
//! field, so log consumers can match on a fixed vocabulary.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Traversal
    /// A traversal observed a structural change it did not make
    ConcurrentModificationDetected,
    /// The policy evaluator rejected a visibility expression
    PolicyEvaluationFailed,

    // Aggregate mutation
    /// An authorized removal succeeded
    ValueRemoved,
    /// A removal matched nothing the caller can see
    RemovalRefused,
    /// An authorized metadata update succeeded
    MetadataUpdated,

    // Output
    /// Sink configuration loaded
    ConfigLoaded,
    /// Sink opened for writing
    SinkOpened,
    /// Record handed to a sink
    RecordWritten,
    /// Pending writes pushed to the backing store
    SinkFlushed,
    /// Sink closed
    SinkClosed,
    /// A stored cell failed checksum verification
    SinkCorruption,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConcurrentModificationDetected => "CONCURRENT_MODIFICATION",
            Event::PolicyEvaluationFailed => "POLICY_EVALUATION_FAILED",

            Event::ValueRemoved => "VALUE_REMOVED",
            Event::RemovalRefused => "REMOVAL_REFUSED",
            Event::MetadataUpdated => "METADATA_UPDATED",

            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SinkOpened => "SINK_OPENED",
            Event::RecordWritten => "RECORD_WRITTEN",
            Event::SinkFlushed => "SINK_FLUSHED",
            Event::SinkClosed => "SINK_CLOSED",
            Event::SinkCorruption => "SINK_CORRUPTION",
        }
    }

    /// Events that end the operation that raised them
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Event::ConcurrentModificationDetected | Event::PolicyEvaluationFailed | Event::SinkCorruption
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
