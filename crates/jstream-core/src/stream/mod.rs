//! Incremental value extraction from a byte stream
//!
//! [`StreamExtractor`] pulls chunks from any [`Read`] source into a growable
//! buffer, repeatedly asks the boundary detector for one complete value,
//! and yields values in the exact order their bytes appear in the source.
//! The consumed prefix is dropped with a cursor advance after each
//! extraction, so long streams never pay quadratic copy costs.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use bytes::{Buf, BytesMut};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::parser::{BoundaryDetector, Extraction};

/// Configuration for stream extraction
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExtractorConfig {
    /// Bytes requested from the source per read
    pub chunk_size: usize,
    /// Upper bound on buffered bytes without a complete value
    pub max_buffer_size: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            chunk_size: 8192,
            max_buffer_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Per-session extraction counters
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamStats {
    /// Values yielded so far
    pub values_yielded: u64,
    /// Total bytes read from the source
    pub bytes_read: u64,
    /// Largest buffer length observed
    pub buffer_high_water: usize,
}

/// Extraction session state
#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    /// Awaiting more input from the source
    Filling,
    /// Buffer may hold one or more extractable values
    Draining,
    /// Source exhausted or session failed; terminal
    Finished,
}

/// Pull-based extractor yielding one decoded value at a time
///
/// Implements [`Iterator`] over `Result<Value>`. A syntax error, encoding
/// error, or truncated stream is fatal for the session: the error is
/// yielded once and the iterator then terminates. Values yielded before
/// the failure remain valid. The extractor is not restartable; construct
/// a new one over a new source instead.
pub struct StreamExtractor<R> {
    source: R,
    detector: BoundaryDetector,
    config: ExtractorConfig,
    buffer: BytesMut,
    /// Length of the leading buffer region known to be valid UTF-8
    valid_utf8: usize,
    /// Bytes dropped from the front of the buffer so far
    consumed_total: u64,
    state: State,
    source_eof: bool,
    stats: StreamStats,
}

impl<R: Read> StreamExtractor<R> {
    /// Create an extractor over `source` with default configuration
    pub fn new(source: R) -> Self {
        Self::with_config(source, ExtractorConfig::default())
    }

    /// Create an extractor with custom configuration
    pub fn with_config(source: R, config: ExtractorConfig) -> Self {
        Self {
            source,
            detector: BoundaryDetector::new(),
            config,
            buffer: BytesMut::new(),
            valid_utf8: 0,
            consumed_total: 0,
            state: State::Filling,
            source_eof: false,
            stats: StreamStats::default(),
        }
    }

    /// Get extraction counters for this session
    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Whether the session has reached its terminal state
    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    /// Read one chunk from the source and append it to the buffer
    ///
    /// Sets the EOF flag when the source reports end-of-stream.
    fn fill(&mut self) -> Result<()> {
        let mut chunk = vec![0u8; self.config.chunk_size];
        let n = self.source.read(&mut chunk)?;
        if n == 0 {
            self.source_eof = true;
            return Ok(());
        }

        self.buffer.extend_from_slice(&chunk[..n]);
        self.stats.bytes_read += n as u64;
        self.stats.buffer_high_water = self.stats.buffer_high_water.max(self.buffer.len());
        trace!(bytes = n, buffered = self.buffer.len(), "read chunk");

        if self.buffer.len() > self.config.max_buffer_size {
            return Err(Error::buffer(format!(
                "Buffered {} bytes without a complete value (limit {})",
                self.buffer.len(),
                self.config.max_buffer_size
            )));
        }

        self.validate_utf8()
    }

    /// Extend the validated UTF-8 prefix over newly appended bytes
    ///
    /// A multi-byte sequence split at a chunk boundary is left for the next
    /// read; an invalid sequence is an immediate encoding error.
    fn validate_utf8(&mut self) -> Result<()> {
        match std::str::from_utf8(&self.buffer[self.valid_utf8..]) {
            Ok(_) => {
                self.valid_utf8 = self.buffer.len();
                Ok(())
            }
            Err(err) if err.error_len().is_none() => {
                self.valid_utf8 += err.valid_up_to();
                Ok(())
            }
            Err(err) => {
                let offset = self.consumed_total as usize + self.valid_utf8 + err.valid_up_to();
                Err(Error::encoding(offset, err.to_string()))
            }
        }
    }

    /// Drop the consumed prefix and keep the remainder as the new buffer
    fn compact(&mut self, consumed: usize) {
        self.buffer.advance(consumed);
        self.valid_utf8 -= consumed;
        self.consumed_total += consumed as u64;
    }

    /// Classify the buffered remainder once the source is exhausted
    fn finish(&mut self) -> Option<Result<Value>> {
        if self.valid_utf8 < self.buffer.len() {
            // trailing bytes of an unfinished multi-byte character
            let offset = self.consumed_total as usize + self.valid_utf8;
            return Some(Err(Error::encoding(
                offset,
                "incomplete multi-byte sequence at end of stream",
            )));
        }
        if self.buffer.iter().all(|b| b.is_ascii_whitespace()) {
            debug!(values = self.stats.values_yielded, "stream drained cleanly");
            return None;
        }
        Some(Err(Error::truncated(self.buffer.len())))
    }
}

impl StreamExtractor<BufReader<File>> {
    /// Stream values from a file on disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> Iterator for StreamExtractor<R> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                State::Finished => return None,
                State::Draining => match self.detector.try_extract(&self.buffer[..self.valid_utf8]) {
                    Extraction::Complete { value, consumed } => {
                        self.compact(consumed);
                        self.stats.values_yielded += 1;
                        trace!(
                            consumed,
                            total = self.stats.values_yielded,
                            "extracted value"
                        );
                        return Some(Ok(value));
                    }
                    Extraction::Incomplete => {
                        self.state = State::Filling;
                    }
                    Extraction::Syntax { offset, message } => {
                        self.state = State::Finished;
                        let absolute = self.consumed_total as usize + offset;
                        return Some(Err(Error::malformed(absolute, message)));
                    }
                },
                State::Filling => {
                    if self.source_eof {
                        self.state = State::Finished;
                        return self.finish();
                    }
                    match self.fill() {
                        Ok(()) => self.state = State::Draining,
                        Err(err) => {
                            self.state = State::Finished;
                            return Some(Err(err));
                        }
                    }
                }
            }
        }
    }
}
