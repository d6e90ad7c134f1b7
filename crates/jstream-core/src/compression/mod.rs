//! Adaptive compression with trial-based level selection
//!
//! The compressor does not assume a fixed effort level. A cheap prefix
//! sample first decides whether compression is worthwhile at all; when it
//! is, every level in the configured range is trialled in parallel and the
//! smallest output wins. Decompression is tolerant of pass-through input
//! and guarded against decompression bombs.
//!
//! Policy for the sampler's negative verdict: compression is skipped
//! entirely and the input bytes are returned verbatim with
//! `level_used == PASS_THROUGH_LEVEL`. The sampler never narrows the level
//! search; it only gates it.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Level recorded when a payload is stored uncompressed
pub const PASS_THROUGH_LEVEL: u32 = 0;

/// Inputs below this size are never worth compressing
pub const MIN_COMPRESS_SIZE: usize = 1024;

/// Prefix length sampled when estimating compressibility
pub const SAMPLE_SIZE: usize = 1024;

/// Configuration for adaptive compression
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CompressorConfig {
    /// Highest effort level trialled; the search range is `[1, max_level]`
    pub max_level: u32,
    /// Inputs shorter than this skip compression outright
    pub min_size: usize,
    /// Prefix length used for the sampling trial
    pub sample_size: usize,
    /// Upper bound on decompressed output, against decompression bombs
    pub max_decompressed_size: usize,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            max_level: 6,
            min_size: MIN_COMPRESS_SIZE,
            sample_size: SAMPLE_SIZE,
            max_decompressed_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Outcome of one compress call
///
/// Produced fresh per call and owned by the caller; no state is shared
/// between calls.
#[derive(Debug, Clone)]
pub struct CompressionStats {
    /// Input length in bytes
    pub original_size: usize,
    /// Output length in bytes
    pub compressed_size: usize,
    /// `compressed_size / original_size`; 1.0 for empty input
    pub ratio: f64,
    /// Winning effort level, or [`PASS_THROUGH_LEVEL`]
    pub level_used: u32,
    /// Wall-clock time spent in the call
    pub elapsed: Duration,
}

impl CompressionStats {
    fn new(original_size: usize, compressed_size: usize, level_used: u32, start: Instant) -> Self {
        let ratio = if original_size == 0 {
            1.0
        } else {
            compressed_size as f64 / original_size as f64
        };
        Self {
            original_size,
            compressed_size,
            ratio,
            level_used,
            elapsed: start.elapsed(),
        }
    }
}

/// One trialled level during selection; discarded after the best is chosen
struct Candidate {
    level: u32,
    bytes: Vec<u8>,
}

/// Compressor that picks the best effort level per input
#[derive(Debug, Clone, Default)]
pub struct AdaptiveCompressor {
    config: CompressorConfig,
}

impl AdaptiveCompressor {
    /// Create a compressor with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compressor with custom configuration
    pub fn with_config(config: CompressorConfig) -> Self {
        Self { config }
    }

    /// Estimate whether full compression is likely worthwhile
    ///
    /// Inputs below the minimum size are never compressed. Otherwise a
    /// single trial pass over a prefix sample must shrink the sample, or
    /// the data is assumed already dense. This is a heuristic: a prefix
    /// whose compressibility differs from the rest can mislead it.
    pub fn should_compress(&self, data: &[u8]) -> bool {
        if data.len() < self.config.min_size {
            return false;
        }
        let sample = &data[..data.len().min(self.config.sample_size)];
        match deflate(sample, Compression::default()) {
            Ok(trial) => trial.len() < sample.len(),
            Err(_) => false,
        }
    }

    /// Compress `data`, trialling every level in `[1, max_level]`
    ///
    /// The smallest output wins; ties prefer the lowest level. When the
    /// sampler rejects the input, when every trial fails, or when the best
    /// trial is not smaller than the input, the input bytes are returned
    /// verbatim with `level_used == PASS_THROUGH_LEVEL`.
    pub fn compress(&self, data: &[u8]) -> Result<(Vec<u8>, CompressionStats)> {
        let start = Instant::now();
        let original_size = data.len();

        if !self.should_compress(data) {
            let stats = CompressionStats::new(original_size, original_size, PASS_THROUGH_LEVEL, start);
            return Ok((data.to_vec(), stats));
        }

        // Trials are independent pure transforms; fan out and keep the
        // minimum. The (size, level) key makes the winner deterministic.
        let best = (1..=self.config.max_level)
            .into_par_iter()
            .filter_map(|level| match deflate(data, Compression::new(level)) {
                Ok(bytes) => Some(Candidate { level, bytes }),
                Err(err) => {
                    warn!(level, error = %err, "compression trial failed, level skipped");
                    None
                }
            })
            .min_by_key(|candidate| (candidate.bytes.len(), candidate.level));

        match best {
            Some(candidate) if candidate.bytes.len() < original_size => {
                let stats = CompressionStats::new(
                    original_size,
                    candidate.bytes.len(),
                    candidate.level,
                    start,
                );
                debug!(
                    level = stats.level_used,
                    ratio = stats.ratio,
                    "selected compression level"
                );
                Ok((candidate.bytes, stats))
            }
            _ => {
                let stats =
                    CompressionStats::new(original_size, original_size, PASS_THROUGH_LEVEL, start);
                Ok((data.to_vec(), stats))
            }
        }
    }

    /// Decompress `data`, tolerating pass-through input
    ///
    /// Input without a zlib header is returned verbatim; this is how
    /// pass-through payloads decode when the caller did not track
    /// `level_used`. Input that carries a header but fails to inflate is
    /// [`Error::Decompression`]. Callers that know whether a payload was
    /// compressed should use [`AdaptiveCompressor::inflate`] instead.
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        if !is_compressed(data) {
            return Ok(data.to_vec());
        }
        self.inflate(data)
    }

    /// Inflate a payload known to be compressed
    ///
    /// Output is capped at `max_decompressed_size`; exceeding the cap or
    /// hitting a corrupt stream is [`Error::Decompression`].
    pub fn inflate(&self, data: &[u8]) -> Result<Vec<u8>> {
        let limit = self.config.max_decompressed_size;
        let mut output = Vec::new();
        let mut decoder = ZlibDecoder::new(data).take(limit as u64 + 1);
        decoder
            .read_to_end(&mut output)
            .map_err(|err| Error::decompression(err.to_string()))?;
        if output.len() > limit {
            return Err(Error::decompression(format!(
                "Decompressed output exceeds {limit} byte limit"
            )));
        }
        Ok(output)
    }

    /// Serialize a value and compress the result
    pub fn compress_value(&self, value: &Value) -> Result<(Vec<u8>, CompressionStats)> {
        let bytes = serde_json::to_vec(value).map_err(|err| Error::serialization(err.to_string()))?;
        self.compress(&bytes)
    }

    /// Decompress a payload and decode it as a value
    pub fn decompress_value(&self, data: &[u8]) -> Result<Value> {
        let bytes = self.decompress(data)?;
        crate::parser::parse(&bytes)
    }
}

/// Whether `data` starts with a zlib stream header
pub fn is_compressed(data: &[u8]) -> bool {
    if data.len() < 2 {
        return false;
    }
    // CM must be deflate and the CMF/FLG pair a multiple of 31
    data[0] & 0x0f == 8 && (u16::from(data[0]) << 8 | u16::from(data[1])) % 31 == 0
}

/// One zlib pass over `data` at the given level
fn deflate(data: &[u8], level: Compression) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), level);
    encoder
        .write_all(data)
        .map_err(|err| Error::compression(level.level(), err.to_string()))?;
    encoder
        .finish()
        .map_err(|err| Error::compression(level.level(), err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_small_input_is_never_compressed() {
        let compressor = AdaptiveCompressor::new();
        assert!(!compressor.should_compress(b""));
        assert!(!compressor.should_compress(b"tiny"));
        assert!(!compressor.should_compress(&vec![b'a'; MIN_COMPRESS_SIZE - 1]));
    }

    #[test]
    fn test_redundant_input_is_worth_compressing() {
        let compressor = AdaptiveCompressor::new();
        assert!(compressor.should_compress(&vec![b'a'; 4096]));
    }

    #[test]
    fn test_repeated_data_selects_smallest_level() {
        let compressor = AdaptiveCompressor::new();
        let data = vec![b'z'; 10_000];
        let (bytes, stats) = compressor.compress(&data).unwrap();

        assert!(stats.level_used >= 1);
        assert!(stats.compressed_size < stats.original_size);
        assert!(stats.ratio < 1.0);

        // the winner must match an exhaustive manual search
        let smallest = (1..=6)
            .map(|level| deflate(&data, Compression::new(level)).unwrap().len())
            .min()
            .unwrap();
        assert_eq!(bytes.len(), smallest);

        assert_eq!(compressor.decompress(&bytes).unwrap(), data);
    }

    #[test]
    fn test_sampler_veto_returns_input_verbatim() {
        let compressor = AdaptiveCompressor::new();
        let data = b"below the size threshold".to_vec();
        let (bytes, stats) = compressor.compress(&data).unwrap();
        assert_eq!(bytes, data);
        assert_eq!(stats.level_used, PASS_THROUGH_LEVEL);
        assert_eq!(stats.compressed_size, stats.original_size);
    }

    #[test]
    fn test_empty_input_round_trips() {
        let compressor = AdaptiveCompressor::new();
        let (bytes, stats) = compressor.compress(b"").unwrap();
        assert!(bytes.is_empty());
        assert_eq!(stats.level_used, PASS_THROUGH_LEVEL);
        assert_eq!(stats.ratio, 1.0);
        assert!(compressor.decompress(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_decompress_tolerates_uncompressed_input() {
        let compressor = AdaptiveCompressor::new();
        let data = b"plain text that was never compressed";
        assert_eq!(compressor.decompress(data).unwrap(), data);
    }

    #[test]
    fn test_corrupt_stream_is_an_error() {
        let compressor = AdaptiveCompressor::new();
        let (mut bytes, stats) = compressor.compress(&vec![b'q'; 4096]).unwrap();
        assert!(stats.level_used >= 1);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        bytes[last / 2] ^= 0xFF;
        assert!(matches!(
            compressor.decompress(&bytes),
            Err(Error::Decompression(_))
        ));
    }

    #[test]
    fn test_decompression_bomb_limit() {
        let compressor = AdaptiveCompressor::new();
        let (bytes, _) = compressor.compress(&vec![0u8; 100_000]).unwrap();

        let strict = AdaptiveCompressor::with_config(CompressorConfig {
            max_decompressed_size: 1024,
            ..Default::default()
        });
        assert!(matches!(
            strict.inflate(&bytes),
            Err(Error::Decompression(_))
        ));
    }

    #[test]
    fn test_value_round_trip() {
        let compressor = AdaptiveCompressor::new();
        let value = json!({"rows": [{"id": 1, "tag": "alpha"}, {"id": 2, "tag": "beta"}], "note": "short"});
        let (bytes, _) = compressor.compress_value(&value).unwrap();
        assert_eq!(compressor.decompress_value(&bytes).unwrap(), value);
    }

    #[test]
    fn test_is_compressed_recognizes_zlib_output() {
        let data = deflate(b"some payload", Compression::default()).unwrap();
        assert!(is_compressed(&data));
        assert!(!is_compressed(b"{}"));
        assert!(!is_compressed(b""));
        assert!(!is_compressed(b"x"));
    }

    #[test]
    fn test_stats_are_per_call() {
        let compressor = AdaptiveCompressor::new();
        let (_, first) = compressor.compress(&vec![b'a'; 2048]).unwrap();
        let (_, second) = compressor.compress(b"tiny").unwrap();
        // the second call owes nothing to the first's trial history
        assert!(first.level_used >= 1);
        assert_eq!(second.level_used, PASS_THROUGH_LEVEL);
    }
}
