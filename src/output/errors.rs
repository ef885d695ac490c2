//! Output error types
//!
//! Error codes:
//! - ZEPHYR_SINK_NOT_OPEN (ERROR)
//! - ZEPHYR_SINK_CLOSED (ERROR)
//! - ZEPHYR_SINK_IO (ERROR)
//! - ZEPHYR_SINK_SERIALIZATION (ERROR)
//! - ZEPHYR_SINK_CONFIG (ERROR)
//! - ZEPHYR_SINK_CORRUPTED (FATAL)
//! - visibility codes pass through unchanged

use std::io;

use thiserror::Error;

use crate::visibility::VisibilityError;

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Errors raised by output sinks
#[derive(Debug, Error)]
pub enum OutputError {
    /// Write or flush before `open`
    #[error("Sink is not open")]
    NotOpen,

    /// Any operation after `close`
    #[error("Sink is closed")]
    Closed,

    /// Underlying I/O failure
    #[error("I/O error: {context}")]
    Io {
        /// What the sink was doing
        context: String,
        #[source]
        source: io::Error,
    },

    /// A cell could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration failed validation
    #[error("Invalid sink configuration: {0}")]
    InvalidConfig(String),

    /// A stored line failed checksum verification
    #[error("Corrupted cell at line {line}")]
    Corrupted {
        /// 1-based line number
        line: usize,
    },

    /// Building the record failed
    #[error(transparent)]
    Visibility(#[from] VisibilityError),
}

impl OutputError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        OutputError::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            OutputError::NotOpen => "ZEPHYR_SINK_NOT_OPEN",
            OutputError::Closed => "ZEPHYR_SINK_CLOSED",
            OutputError::Io { .. } => "ZEPHYR_SINK_IO",
            OutputError::Serialization(_) => "ZEPHYR_SINK_SERIALIZATION",
            OutputError::InvalidConfig(_) => "ZEPHYR_SINK_CONFIG",
            OutputError::Corrupted { .. } => "ZEPHYR_SINK_CORRUPTED",
            OutputError::Visibility(e) => e.code(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        match self {
            OutputError::Corrupted { .. } => true,
            OutputError::Visibility(e) => e.is_fatal(),
            _ => false,
        }
    }
}
