//! High-level pipeline API: read → clean → export.
//!
//! Every call is request-scoped. The uploaded bytes and file name go in,
//! a [`CleanReport`] (and optionally a [`Download`]) comes out; nothing is
//! kept between calls.
//!
//! # Example
//!
//! ```rust,ignore
//! use cleansheet::{clean_file, ExportFormat};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = clean_file(Path::new("backlinks.xlsx"))?;
//!     let download = report.export(ExportFormat::Csv)?;
//!     std::fs::write(download.file_name(), &download.bytes)?;
//!     Ok(())
//! }
//! ```

use serde::Serialize;
use std::path::Path;

use super::cleaner::clean_table;
use crate::api::logs::{log_info, log_success, log_warning};
use crate::error::PipelineResult;
use crate::export::{export_table, ExportFormat};
use crate::models::{CleanWarning, FileKind, Table};
use crate::parser::{parse_file, parse_upload, ParseResult};

/// Result of cleaning one upload
#[derive(Debug, Clone, Serialize)]
pub struct CleanReport {
    /// Cleaned table in output column order
    pub table: Table,

    /// Non-fatal findings (missing key columns)
    pub warnings: Vec<CleanWarning>,

    /// What was read from the upload
    pub input_info: InputInfo,
}

/// Upload information
#[derive(Debug, Clone, Serialize)]
pub struct InputInfo {
    pub file_name: String,
    pub kind: FileKind,
    pub encoding: Option<String>,
    pub delimiter: Option<char>,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// An encoded cleaned table, ready to hand to the user.
#[derive(Debug, Clone)]
pub struct Download {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl Download {
    pub fn file_name(&self) -> &'static str {
        self.format.file_name()
    }

    pub fn media_type(&self) -> &'static str {
        self.format.media_type()
    }
}

impl CleanReport {
    /// Encode the cleaned table.
    pub fn export(&self, format: ExportFormat) -> PipelineResult<Download> {
        log_info(format!("Exporting {} rows as {}...", self.table.row_count(), format.extension()));
        let bytes = export_table(&self.table, format)?;
        log_success(format!("{} ready ({} bytes)", format.file_name(), bytes.len()));
        Ok(Download { format, bytes })
    }
}

/// Clean an uploaded file given its name and raw bytes.
///
/// The reader is chosen from `file_name` alone.
pub fn clean_bytes(file_name: &str, bytes: &[u8]) -> PipelineResult<CleanReport> {
    log_info(format!("Reading {} ({} bytes)...", file_name, bytes.len()));
    let parse_result = parse_upload(file_name, bytes)?;
    clean_parsed(file_name, parse_result)
}

/// Clean a file on disk.
pub fn clean_file(path: &Path) -> PipelineResult<CleanReport> {
    log_info(format!("Reading {}...", path.display()));
    let parse_result = parse_file(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    clean_parsed(&file_name, parse_result)
}

/// Clean and encode in one step.
pub fn clean_and_export(
    file_name: &str,
    bytes: &[u8],
    format: ExportFormat,
) -> PipelineResult<(CleanReport, Download)> {
    let report = clean_bytes(file_name, bytes)?;
    let download = report.export(format)?;
    Ok((report, download))
}

/// Internal: clean an already-parsed upload
fn clean_parsed(file_name: &str, parse_result: ParseResult) -> PipelineResult<CleanReport> {
    let ParseResult { table, kind, encoding, delimiter } = parse_result;

    if let Some(ref enc) = encoding {
        log_success(format!("Detected encoding: {}", enc));
    }
    if let Some(d) = delimiter {
        log_success(format!("Detected separator: '{}'", format_delimiter(d)));
    }
    log_success(format!("Read {} rows, {} columns ({})", table.row_count(), table.columns().len(), kind));

    let input_info = InputInfo {
        file_name: file_name.to_string(),
        kind,
        encoding,
        delimiter,
        headers: table.columns().to_vec(),
        row_count: table.row_count(),
    };

    log_info("Cleaning columns...");
    let outcome = clean_table(&table)?;

    for warning in &outcome.warnings {
        log_warning(warning.to_string());
    }
    log_success(format!(
        "Cleaned {} rows into columns: {}",
        outcome.table.row_count(),
        outcome.table.columns().join(", ")
    ));

    Ok(CleanReport {
        table: outcome.table,
        warnings: outcome.warnings,
        input_info,
    })
}

/// Format delimiter for display
fn format_delimiter(d: char) -> &'static str {
    match d {
        ';' => ";",
        ',' => ",",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}
