//! Composition of stream extraction and adaptive compression
//!
//! Write side: each extracted value is serialized back to bytes, compressed,
//! and framed as `[1-byte level_used][payload]` for storage or transmission.
//! Read side: stored records are unframed, decompressed, and decoded back
//! into values. The pipeline buffers nothing of its own.

use std::io::Read;

use serde_json::Value;

use crate::compression::{AdaptiveCompressor, CompressionStats, PASS_THROUGH_LEVEL};
use crate::error::{Error, Result};
use crate::parser;
use crate::stream::StreamExtractor;

/// Write/read pipeline over the extractor and compressor
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    compressor: AdaptiveCompressor,
}

impl Pipeline {
    /// Create a pipeline with a default compressor
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pipeline around an existing compressor
    pub fn with_compressor(compressor: AdaptiveCompressor) -> Self {
        Self { compressor }
    }

    /// Serialize and compress one value into a framed record
    ///
    /// The first record byte is the effort level that produced the payload;
    /// [`PASS_THROUGH_LEVEL`] marks an uncompressed payload.
    pub fn encode_value(&self, value: &Value) -> Result<(Vec<u8>, CompressionStats)> {
        let (payload, stats) = self.compressor.compress_value(value)?;
        let mut record = Vec::with_capacity(payload.len() + 1);
        record.push(stats.level_used as u8);
        record.extend_from_slice(&payload);
        Ok((record, stats))
    }

    /// Map an extraction session into framed records
    ///
    /// Records come out in the order values appear in the source. Extraction
    /// errors pass through unchanged.
    pub fn encode_stream<'a, R: Read + 'a>(
        &'a self,
        extractor: StreamExtractor<R>,
    ) -> impl Iterator<Item = Result<Vec<u8>>> + 'a {
        extractor.map(move |value| {
            let value = value?;
            let (record, _) = self.encode_value(&value)?;
            Ok(record)
        })
    }

    /// Decode one framed record back into a value
    pub fn decode(&self, record: &[u8]) -> Result<Value> {
        let (&level, payload) = record
            .split_first()
            .ok_or_else(|| Error::decompression("Empty record"))?;
        let bytes = if u32::from(level) == PASS_THROUGH_LEVEL {
            payload.to_vec()
        } else {
            self.compressor.inflate(payload)?
        };
        parser::parse(&bytes)
    }

    /// Decode a sequence of framed records, stopping at the first error
    pub fn decode_all<'a>(
        &self,
        records: impl IntoIterator<Item = &'a [u8]>,
    ) -> Result<Vec<Value>> {
        records.into_iter().map(|record| self.decode(record)).collect()
    }
}
