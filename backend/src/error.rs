//! Error types for the cleansheet pipeline.
//!
//! - [`ReadError`] - Upload decoding (file type, CSV, spreadsheet)
//! - [`TransformError`] - Fixed-schema transform failures
//! - [`ExportError`] - CSV / workbook serialization failures
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Conversion is automatic via `From`, so `?` works across layers.

use thiserror::Error;

// =============================================================================
// Read Errors
// =============================================================================

/// Errors while turning uploaded bytes into a [`crate::models::Table`].
#[derive(Debug, Error)]
pub enum ReadError {
    /// Extension other than `.csv` / `.xlsx`.
    #[error("Unsupported file type: '{0}'. Please upload a .csv or .xlsx file")]
    UnsupportedFileType(String),

    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV content.
    #[error("Invalid CSV format: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed workbook content.
    #[error("Invalid spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::XlsxError),

    /// Workbook without any sheet.
    #[error("Spreadsheet has no worksheet")]
    NoWorksheet,

    /// Empty file.
    #[error("File is empty")]
    EmptyFile,

    /// No header row found.
    #[error("No headers found")]
    NoHeaders,
}

// =============================================================================
// Transform Errors
// =============================================================================

/// Errors from the fixed-schema transform.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A required source column is absent.
    #[error("Missing required column: '{0}'")]
    MissingRequiredColumn(String),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while serializing a cleaned table.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV export failed: {0}")]
    CsvBuffer(String),

    #[error("Spreadsheet export failed: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    /// Unknown `format` value.
    #[error("Unknown export format: '{0}' (expected csv or xlsx)")]
    UnknownFormat(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors, as surfaced to the user.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Read(#[from] ReadError),

    #[error("{0}")]
    Transform(#[from] TransformError),

    #[error("{0}")]
    Export(#[from] ExportError),
}

impl PipelineError {
    /// True when the failure is caused by the uploaded file rather than by us.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, PipelineError::Export(ExportError::Csv(_) | ExportError::CsvBuffer(_) | ExportError::Spreadsheet(_)))
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

pub type ReadResult<T> = Result<T, ReadError>;
pub type TransformResult<T> = Result<T, TransformError>;
pub type ExportResult<T> = Result<T, ExportError>;
pub type PipelineResult<T> = Result<T, PipelineError>;
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // ReadError -> PipelineError
        let pipeline_err: PipelineError = ReadError::EmptyFile.into();
        assert!(pipeline_err.to_string().contains("empty"));
        assert!(pipeline_err.is_user_error());

        // TransformError -> PipelineError
        let transform_err = TransformError::MissingRequiredColumn("Content URL".into());
        let pipeline_err: PipelineError = transform_err.into();
        assert!(pipeline_err.to_string().contains("Content URL"));
        assert!(pipeline_err.is_user_error());
    }

    #[test]
    fn test_export_failure_is_not_user_error() {
        let err: PipelineError = ExportError::CsvBuffer("flush".into()).into();
        assert!(!err.is_user_error());

        let err: PipelineError = ExportError::UnknownFormat("pdf".into()).into();
        assert!(err.is_user_error());
    }

    #[test]
    fn test_unsupported_type_message() {
        let err = ReadError::UnsupportedFileType("report.pdf".into());
        let msg = err.to_string();
        assert!(msg.contains("report.pdf"));
        assert!(msg.contains(".xlsx"));
    }
}
