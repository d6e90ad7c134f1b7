//! JSON decoding entry points
//!
//! The grammar itself is delegated to serde_json. This module exposes the
//! whole-buffer decode used on the read side of the pipeline and the
//! incremental boundary detector used by stream extraction.

pub mod boundary;

pub use boundary::{BoundaryDetector, Extraction};

use crate::error::{Error, Result};
use serde_json::Value;

/// Decode a complete buffer into a single value
///
/// Unlike [`BoundaryDetector::try_extract`], the input must hold exactly
/// one value (plus optional surrounding whitespace); anything else is
/// [`Error::Malformed`] with the byte offset of the offending input.
pub fn parse(input: &[u8]) -> Result<Value> {
    serde_json::from_slice(input).map_err(|err| {
        Error::malformed(
            boundary::offset_in(input, err.line(), err.column()),
            err.to_string(),
        )
    })
}
