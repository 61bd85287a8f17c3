//! # Error Types
//!
//! Custom error types for btlq using `thiserror`.
//!
//! Two families are kept apart: [`DecodeError`] covers everything that can
//! go wrong while parsing a vendor quality report, and [`BtlqError`] covers
//! the tooling around it (configuration, capture files, the record journal).

use thiserror::Error;

/// Wire-level failures while decoding a vendor quality report.
///
/// None of these are fatal to the caller: a failed decode produces no
/// record and the event is dropped. [`DecodeError::is_benign`] separates
/// "this buffer is not the kind of report we decode" from actual
/// malformed-stream conditions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Buffer is below the minimum size for the claimed format
    #[error("report of {len} bytes is below the {min} byte minimum")]
    TooShort { len: usize, min: usize },

    /// Vendor event does not carry the extended telemetry sub-opcode
    #[error("sub-opcode 0x{found:02x} is not extended telemetry")]
    WrongSubopcode { found: u8 },

    /// Vendor event does not carry the quality report subevent code
    #[error("subevent 0x{found:02x} is not a quality report")]
    WrongSubevent { found: u8 },

    /// Telemetry subevent tag is not in the dispatch table
    #[error("unknown telemetry subevent 0x{id:02x}")]
    UnknownSubevent { id: u8 },

    /// Declared TLV length disagrees with the table entry for the tag
    #[error("invalid length {length} for subevent 0x{id:02x}")]
    LengthMismatch { id: u8, length: u8 },

    /// TLV value would extend past the end of the event buffer
    #[error("subevent 0x{id:02x} exceeds the buffer end")]
    BufferOverrun { id: u8 },

    /// Well-formed telemetry stream that is not a link quality report
    #[error("telemetry event type {event_type} is not a link quality report")]
    UnsupportedEventType { event_type: u8 },
}

impl DecodeError {
    /// Whether the failure means "not a report we decode" rather than a
    /// malformed stream.
    ///
    /// Mixed capture streams routinely contain telemetry subtypes and
    /// vendor events this crate does not handle; those decode attempts end
    /// here and should be counted as skips, not errors.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            Self::WrongSubopcode { .. }
                | Self::WrongSubevent { .. }
                | Self::UnsupportedEventType { .. }
        )
    }
}

/// Main error type for the btlq tooling
#[derive(Debug, Error)]
pub enum BtlqError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Capture line is not valid JSON
    #[error("Capture line error: {0}")]
    Json(#[from] serde_json::Error),

    /// Capture payload is not valid hex
    #[error("Capture payload error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Quality report decode failures surfaced through tool paths
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Result type alias for btlq
pub type Result<T> = std::result::Result<T, BtlqError>;
