use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while reading a dataset from disk.
///
/// Loading is the only fallible step: once a table is in memory, filtering
/// and aggregation are total.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("row {row}, column '{column}': {reason}")]
    InvalidValue {
        row: usize,
        column: String,
        reason: String,
    },

    #[error("malformed {format} data: {message}")]
    Malformed {
        format: &'static str,
        message: String,
    },
}

impl LoadError {
    pub(crate) fn invalid(row: usize, column: &str, reason: impl Into<String>) -> Self {
        LoadError::InvalidValue {
            row,
            column: column.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(format: &'static str, err: impl std::fmt::Display) -> Self {
        LoadError::Malformed {
            format,
            message: err.to_string(),
        }
    }
}

impl From<csv::Error> for LoadError {
    fn from(err: csv::Error) -> Self {
        LoadError::malformed("CSV", err)
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::malformed("JSON", err)
    }
}

impl From<parquet::errors::ParquetError> for LoadError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        LoadError::malformed("Parquet", err)
    }
}

impl From<arrow::error::ArrowError> for LoadError {
    fn from(err: arrow::error::ArrowError) -> Self {
        LoadError::malformed("Parquet", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_lists_every_name() {
        let err = LoadError::MissingColumns(vec!["genre".into(), "streams".into()]);
        assert_eq!(err.to_string(), "missing required column(s): genre, streams");
    }

    #[test]
    fn invalid_value_names_row_and_column() {
        let err = LoadError::invalid(3, "streams", "'abc' is not a whole number");
        assert_eq!(
            err.to_string(),
            "row 3, column 'streams': 'abc' is not a whole number"
        );
    }
}
