//! Append-only JSON-lines sink
//!
//! Each cell is written as one line:
//!
//! ```text
//! {"crc":<u32>,"cell":{"row":..,"family":..,"qualifier":..,"value":..}}
//! ```
//!
//! The checksum covers the serialized `cell` object. `read_cells` verifies
//! every line and reports the first mismatch as corruption.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::config::SinkConfig;
use super::errors::{OutputError, OutputResult};
use super::record::Record;
use super::{OutputSink, SinkState};
use crate::observability::Event;

/// One stored key-value cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub row: String,
    pub family: String,
    pub qualifier: String,
    pub value: String,
}

#[derive(Serialize, Deserialize)]
struct FramedCell {
    crc: u32,
    cell: Cell,
}

#[derive(Debug)]
pub struct FileSink {
    config: SinkConfig,
    writer: Option<BufWriter<File>>,
    state: SinkState,
    unflushed: usize,
}

impl FileSink {
    /// Build a sink from a validated configuration. Nothing is touched on
    /// disk until `open`.
    pub fn new(config: SinkConfig) -> OutputResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            writer: None,
            state: SinkState::Created,
            unflushed: 0,
        })
    }

    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    pub fn state(&self) -> SinkState {
        self.state
    }

    /// Read back every cell in `path`, verifying checksums.
    pub fn read_cells(path: &Path) -> OutputResult<Vec<Cell>> {
        let file = File::open(path)
            .map_err(|e| OutputError::io(format!("Failed to open sink file: {}", path.display()), e))?;

        let mut cells = Vec::new();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line_no = i + 1;
            let line = line.map_err(|e| OutputError::io(format!("Failed to read line {}", line_no), e))?;
            if line.trim().is_empty() {
                continue;
            }

            let framed: FramedCell = serde_json::from_str(&line).map_err(|_| corrupted(path, line_no))?;
            let payload = serde_json::to_vec(&framed.cell)?;
            if checksum(&payload) != framed.crc {
                return Err(corrupted(path, line_no));
            }
            cells.push(framed.cell);
        }
        Ok(cells)
    }

    fn writer(&mut self) -> OutputResult<&mut BufWriter<File>> {
        self.state.ensure_open()?;
        self.writer.as_mut().ok_or(OutputError::NotOpen)
    }

    /// Serialize every cell of `record` into one buffer of framed lines.
    fn encode_record(&self, record: &Record) -> OutputResult<Vec<u8>> {
        let mut buf = Vec::new();
        for entry in record {
            let cell = Cell {
                row: record.row_key().to_string(),
                family: self.config.column_family.clone(),
                qualifier: entry.label().to_string(),
                value: entry.value().to_string(),
            };
            let payload = serde_json::to_vec(&cell)?;
            let framed = FramedCell {
                crc: checksum(&payload),
                cell,
            };
            serde_json::to_writer(&mut buf, &framed)?;
            buf.push(b'\n');
        }
        Ok(buf)
    }
}

/// CRC32 (IEEE) over a serialized cell.
fn checksum(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

fn corrupted(path: &Path, line: usize) -> OutputError {
    error!(event = %Event::SinkCorruption, path = %path.display(), line);
    OutputError::Corrupted { line }
}

impl OutputSink for FileSink {
    fn open(&mut self) -> OutputResult<()> {
        if self.state == SinkState::Open {
            return Ok(());
        }
        let next = self.state.opened()?;

        let path = &self.config.path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                OutputError::io(format!("Failed to create directory: {}", parent.display()), e)
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| OutputError::io(format!("Failed to open sink file: {}", path.display()), e))?;

        self.writer = Some(BufWriter::new(file));
        self.state = next;
        info!(event = %Event::SinkOpened, sink = "file", path = %path.display());
        Ok(())
    }

    fn write(&mut self, record: &Record) -> OutputResult<()> {
        self.state.ensure_open()?;
        // A record reaches the writer whole or not at all.
        let block = self.encode_record(record)?;
        self.writer()?
            .write_all(&block)
            .map_err(|e| OutputError::io("Failed to append record", e))?;
        debug!(event = %Event::RecordWritten, row = %record.row_key(), cells = record.len());

        self.unflushed += 1;
        if self.config.flush_threshold > 0 && self.unflushed >= self.config.flush_threshold {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        let writer = self.writer()?;
        writer
            .flush()
            .map_err(|e| OutputError::io("Failed to flush sink", e))?;
        writer
            .get_ref()
            .sync_data()
            .map_err(|e| OutputError::io("Failed to sync sink", e))?;

        debug!(event = %Event::SinkFlushed, sink = "file", records = self.unflushed);
        self.unflushed = 0;
        Ok(())
    }

    fn close(&mut self) -> OutputResult<()> {
        if self.state == SinkState::Open {
            self.flush()?;
        }
        self.writer = None;
        self.state = SinkState::Closed;
        info!(event = %Event::SinkClosed, sink = "file", path = %self.config.path.display());
        Ok(())
    }
}
