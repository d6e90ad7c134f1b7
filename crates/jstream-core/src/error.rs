//! Error types for stream extraction and adaptive compression

/// Result type alias for jstream operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for jstream operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Stream ended in the middle of a value
    #[error("Stream truncated mid-value with {buffered} bytes buffered")]
    Truncated {
        /// Bytes still buffered when the source ended
        buffered: usize,
    },

    /// Byte sequence cannot begin a valid JSON value
    #[error("Malformed JSON at byte {offset}: {message}")]
    Malformed {
        /// Absolute byte offset of the offending input
        offset: usize,
        /// Error description from the decode engine
        message: String,
    },

    /// Invalid UTF-8 in the input stream
    #[error("Invalid UTF-8 at byte {offset}: {message}")]
    Encoding {
        /// Absolute byte offset of the invalid sequence
        offset: usize,
        /// Error description
        message: String,
    },

    /// Codec failure during a compression trial
    #[error("Compression failed at level {level}: {message}")]
    Compression {
        /// Effort level that failed
        level: u32,
        /// Error description
        message: String,
    },

    /// Corrupt or oversized payload during decompression
    #[error("Decompression failed: {0}")]
    Decompression(String),

    /// Serialization of a decoded value failed
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Buffer limit exceeded
    #[error("Buffer error: {0}")]
    Buffer(String),

    /// I/O error while reading from the byte source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema validation error
    #[error("Schema validation failed at {path}: {message}")]
    SchemaValidation {
        /// JSON path where validation failed
        path: String,
        /// Failure reason
        message: String,
    },
}

impl Error {
    /// Create a truncated-stream error
    pub fn truncated(buffered: usize) -> Self {
        Self::Truncated { buffered }
    }

    /// Create a malformed JSON error
    pub fn malformed(offset: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            offset,
            message: message.into(),
        }
    }

    /// Create an encoding error
    pub fn encoding(offset: usize, message: impl Into<String>) -> Self {
        Self::Encoding {
            offset,
            message: message.into(),
        }
    }

    /// Create a compression error for a specific level
    pub fn compression(level: u32, message: impl Into<String>) -> Self {
        Self::Compression {
            level,
            message: message.into(),
        }
    }

    /// Create a decompression error
    pub fn decompression(message: impl Into<String>) -> Self {
        Self::Decompression(message.into())
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Create a buffer error
    pub fn buffer(message: impl Into<String>) -> Self {
        Self::Buffer(message.into())
    }

    /// Create a schema validation error
    pub fn schema_validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaValidation {
            path: path.into(),
            message: message.into(),
        }
    }
}
