use thiserror::Error;

// ---------------------------------------------------------------------------
// Load errors
// ---------------------------------------------------------------------------

/// Errors raised while turning a source file into a [`Dataset`](super::model::Dataset).
///
/// Load errors are fatal: no partially cleaned dataset is ever returned.
#[derive(Error, Debug)]
pub enum LoadError {
    /// A required column is absent from the header row.
    #[error("missing required column '{0}'")]
    Schema(String),

    /// A kept row holds a value that cannot be read as its column's type.
    #[error("row {row}: '{value}' in column '{column}' is not a valid {expected}")]
    TypeCoercion {
        /// 1-based data row (header excluded).
        row: usize,
        column: String,
        value: String,
        expected: &'static str,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

/// Result type for loading operations.
pub type Result<T> = std::result::Result<T, LoadError>;
