use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur when the
/// tool consolidates extraction output or emits the report workbook.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when both extraction origins produced no entries.
    #[error("nothing to consolidate: both extraction origins were empty")]
    EmptyInput,

    /// Raised when grouping loses or duplicates a record across the
    /// taxonomy buckets.
    #[error("category taxonomy violated: {0}")]
    CategoryTaxonomy(String),

    /// Raised when a non-empty consolidated collection yields no category
    /// tables.
    #[error("consolidated records produced no category tables")]
    EmptyCategory,

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
