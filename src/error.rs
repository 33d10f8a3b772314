//! Error types for platelight.
//!
//! Format errors (malformed CSV rows, bad numeric fields, unrecognized
//! location shapes) are fatal to loading the file that contains them and
//! carry enough context to report the offending row. Panel communication
//! failures are deliberately absent from this enum: they surface as
//! per-frame booleans so navigation keeps working on a partially-lit panel.

use thiserror::Error;

/// Main error type for platelight.
#[derive(Error, Debug)]
pub enum PlatelightError {
    /// A CSV row did not split into exactly 9 comma-delimited fields.
    #[error("line '{line}' contains {field_count} comma-delimited fields, must be exactly 9")]
    MalformedRow { line: String, field_count: usize },

    /// A numeric CSV field (volume, concentration, weight) failed to parse.
    #[error("line '{line}': field '{field}' is not a valid number")]
    NumericParse { line: String, field: &'static str },

    /// A location string did not match any of the accepted segment counts.
    #[error("location '{location}' has {segment_count} colon-delimited segments, must be 3, 5, 6, or 7")]
    InvalidLocationFormat {
        location: String,
        segment_count: usize,
    },

    /// Navigation requires at least one request.
    #[error("cannot navigate an empty request store")]
    EmptyStore,

    /// A record could not be written to the binary well-map export.
    #[error("cannot export barcode '{barcode}': {reason}")]
    ExportFormat { barcode: String, reason: String },

    /// IO errors (file reads, export writes).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port open/enumeration errors.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

/// Result type alias for platelight operations.
pub type Result<T> = std::result::Result<T, PlatelightError>;

impl PlatelightError {
    /// Create a malformed-row error.
    pub fn malformed_row(line: impl Into<String>, field_count: usize) -> Self {
        Self::MalformedRow {
            line: line.into(),
            field_count,
        }
    }

    /// Create a numeric field parse error.
    pub fn numeric_parse(line: impl Into<String>, field: &'static str) -> Self {
        Self::NumericParse {
            line: line.into(),
            field,
        }
    }

    /// Create an export format error.
    pub fn export_format(barcode: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExportFormat {
            barcode: barcode.into(),
            reason: reason.into(),
        }
    }
}
