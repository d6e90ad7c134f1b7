//! # jstream
//!
//! Incremental extraction of JSON values from byte streams, paired with
//! adaptive compression that trials effort levels per input instead of
//! assuming a fixed one.
//!
//! The two halves compose but stand alone:
//! - [`StreamExtractor`] splits a stream of concatenated or
//!   whitespace-separated values into individually decoded documents
//!   without buffering the whole input.
//! - [`AdaptiveCompressor`] decides whether compression is worthwhile,
//!   picks the level with the smallest output, and decompresses
//!   losslessly, tolerating pass-through payloads.
//! - [`Pipeline`] wires them together behind a
//!   `[1-byte level][payload]` record format.

#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod compression;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod schema;
pub mod stream;

pub use compression::{
    AdaptiveCompressor, CompressionStats, CompressorConfig, MIN_COMPRESS_SIZE, PASS_THROUGH_LEVEL,
    SAMPLE_SIZE, is_compressed,
};
pub use error::{Error, Result};
pub use parser::{BoundaryDetector, Extraction, parse};
pub use pipeline::Pipeline;
pub use schema::{Schema, SchemaValidator};
pub use stream::{ExtractorConfig, StreamExtractor, StreamStats};

/// Re-export commonly used types
pub mod prelude {
    pub use super::{
        AdaptiveCompressor, BoundaryDetector, CompressionStats, CompressorConfig, Error,
        Extraction, ExtractorConfig, Pipeline, Result, Schema, SchemaValidator, StreamExtractor,
        StreamStats,
    };
}
