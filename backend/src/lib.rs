//! # Cleansheet - backlink sheet cleaner
//!
//! Cleansheet takes an uploaded `.csv` or `.xlsx` backlink export, keeps the
//! bare domain of each `Content URL` together with its rating and traffic,
//! adds the contact columns, and hands the result back as CSV or as a
//! `Datos Limpios` workbook.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ .csv / .xlsx│────▶│   Parser    │────▶│   Cleaner   │────▶│   Export    │
//! │  (upload)   │     │ (by suffix) │     │ (fixed cols)│     │ (csv/xlsx)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cleansheet::{clean_bytes, ExportFormat};
//!
//! let report = clean_bytes("links.csv", &std::fs::read("links.csv")?)?;
//! let download = report.export(ExportFormat::Xlsx)?;
//! std::fs::write(download.file_name(), &download.bytes)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Layered error types
//! - [`models`] - Table, file kinds, warnings and the output schema
//! - [`parser`] - CSV / XLSX reading
//! - [`transform`] - Cleaning rules and pipeline
//! - [`export`] - CSV / XLSX writing
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Reading
pub mod parser;

// Cleaning
pub mod transform;

// Writing
pub mod export;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ExportError, PipelineError, ReadError, ServerError, TransformError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Cell, CleanWarning, FileKind, Table, OUTPUT_COLUMNS};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_csv_bytes, parse_csv_str, parse_file,
    parse_upload, parse_xlsx_bytes, ParseResult,
};

// =============================================================================
// Re-exports - Cleaning
// =============================================================================

pub use transform::{
    clean_and_export, clean_bytes, clean_file, clean_table, extract_domain, CleanOutcome,
    CleanReport, Download, InputInfo,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{export_table, to_csv_bytes, to_xlsx_bytes, ExportFormat, SHEET_NAME};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, UploadResponse};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, ServerConfig};
}
