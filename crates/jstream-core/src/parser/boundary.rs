//! Value boundary detection over the serde_json decode engine
//!
//! Attempts to decode exactly one complete top-level value at the start of
//! a buffer and reports how many bytes it consumed. The grammar itself is
//! delegated to serde_json; this module only performs the
//! complete-vs-incomplete-vs-malformed triage and the consumed-length
//! accounting that stream extraction depends on.

use serde_json::Value;

/// Outcome of one extraction attempt against the head of a buffer
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// A complete value was decoded
    Complete {
        /// The decoded value
        value: Value,
        /// Bytes consumed, including separator whitespace after the value
        consumed: usize,
    },
    /// The buffer is a strict prefix of a valid value; wait for more bytes
    Incomplete,
    /// The buffer can never begin a valid value
    Syntax {
        /// Byte offset of the offending input within the buffer
        offset: usize,
        /// Error description from the decode engine
        message: String,
    },
}

/// Detects one complete value at the start of a byte buffer
///
/// The detector never requires the whole stream to be present. An
/// unterminated string or an object missing its closing brace yields
/// [`Extraction::Incomplete`], while a bareword or an unescaped control
/// character yields [`Extraction::Syntax`] so callers do not wait for
/// bytes that can never complete the value.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundaryDetector;

impl BoundaryDetector {
    /// Create a new boundary detector
    pub fn new() -> Self {
        Self
    }

    /// Attempt to decode one complete value from the start of `buffer`
    ///
    /// Whitespace immediately following the value is counted as consumed,
    /// so consecutive whitespace-separated values extract cleanly. An
    /// empty or all-whitespace buffer is [`Extraction::Incomplete`].
    pub fn try_extract(&self, buffer: &[u8]) -> Extraction {
        let mut values = serde_json::Deserializer::from_slice(buffer).into_iter::<Value>();

        match values.next() {
            None => Extraction::Incomplete,
            Some(Ok(value)) => {
                let mut consumed = values.byte_offset();
                while consumed < buffer.len() && buffer[consumed].is_ascii_whitespace() {
                    consumed += 1;
                }
                Extraction::Complete { value, consumed }
            }
            Some(Err(err)) if err.is_eof() => Extraction::Incomplete,
            Some(Err(err)) => Extraction::Syntax {
                offset: offset_in(buffer, err.line(), err.column()),
                message: err.to_string(),
            },
        }
    }
}

/// Translate the engine's line/column position into a byte offset
pub(crate) fn offset_in(input: &[u8], line: usize, column: usize) -> usize {
    let mut line_start = 0;
    let mut lines_to_skip = line.saturating_sub(1);
    for (idx, byte) in input.iter().enumerate() {
        if lines_to_skip == 0 {
            break;
        }
        if *byte == b'\n' {
            lines_to_skip -= 1;
            line_start = idx + 1;
        }
    }
    (line_start + column.saturating_sub(1)).min(input.len())
}
