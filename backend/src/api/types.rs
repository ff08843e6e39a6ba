//! REST API types for the upload preview.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::export::ExportFormat;
use crate::transform::pipeline::CleanReport;

/// Response sent after an upload has been cleaned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Status: "ready", "warning", "error"
    pub status: String,

    /// Output columns, in order
    pub columns: Vec<String>,

    /// Cleaned rows keyed by column name
    pub rows: Vec<Value>,

    /// Human-readable warnings
    pub warnings: Vec<String>,

    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub total_rows: usize,
    pub input: InputMetadata,
    pub downloads: Vec<DownloadOption>,
    pub processed_at: String,
}

/// Uploaded file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputMetadata {
    pub file_name: String,
    pub kind: String,
    pub encoding: Option<String>,
    pub delimiter: Option<String>,
    pub row_count: usize,
    pub columns: Vec<String>,
}

/// A format the cleaned table can be downloaded in
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadOption {
    pub format: ExportFormat,
    pub file_name: String,
    pub media_type: String,
}

impl From<ExportFormat> for DownloadOption {
    fn from(format: ExportFormat) -> Self {
        Self {
            format,
            file_name: format.file_name().to_string(),
            media_type: format.media_type().to_string(),
        }
    }
}

impl From<CleanReport> for UploadResponse {
    fn from(report: CleanReport) -> Self {
        let rows = report.table.to_records();
        let info = report.input_info;

        UploadResponse {
            job_id: Uuid::new_v4().to_string(),
            status: if report.warnings.is_empty() { "ready" } else { "warning" }.to_string(),
            columns: report.table.columns().to_vec(),
            warnings: report.warnings.iter().map(ToString::to_string).collect(),
            metadata: ResponseMetadata {
                total_rows: rows.len(),
                input: InputMetadata {
                    file_name: info.file_name,
                    kind: info.kind.to_string(),
                    encoding: info.encoding,
                    delimiter: info.delimiter.map(|d| d.to_string()),
                    row_count: info.row_count,
                    columns: info.headers,
                },
                downloads: vec![ExportFormat::Csv.into(), ExportFormat::Xlsx.into()],
                processed_at: chrono::Utc::now().to_rfc3339(),
            },
            rows,
        }
    }
}

/// Error category shown to the frontend
pub fn error_kind(err: &PipelineError) -> &'static str {
    use crate::error::{ReadError, TransformError};

    match err {
        PipelineError::Read(ReadError::UnsupportedFileType(_)) => "unsupportedFileType",
        PipelineError::Transform(TransformError::MissingRequiredColumn(_)) => "missingRequiredColumn",
        PipelineError::Read(_) => "unexpectedParseError",
        PipelineError::Export(_) => "exportError",
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "columns": [],
        "rows": [],
        "warnings": []
    })
}

/// Create an error response for a pipeline failure
pub fn pipeline_error_response(err: &PipelineError) -> Value {
    let mut body = error_response(&err.to_string());
    body["kind"] = json!(error_kind(err));
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ReadError, TransformError};
    use crate::transform::pipeline::clean_bytes;

    #[test]
    fn test_upload_response_from_report() {
        let report = clean_bytes("a.csv", b"Content URL\nhttps://a.com/x\n").unwrap();
        let response = UploadResponse::from(report);

        assert_eq!(response.status, "warning");
        assert_eq!(response.columns, vec!["Content URL", "Email", "WhatsApp"]);
        assert_eq!(response.rows[0]["Content URL"], "a.com");
        assert_eq!(response.warnings.len(), 1);
        assert_eq!(response.metadata.input.kind, "csv");
        assert_eq!(response.metadata.downloads[1].file_name, "datos_limpios.xlsx");
    }

    #[test]
    fn test_error_response_shape() {
        let err: PipelineError = TransformError::MissingRequiredColumn("Content URL".into()).into();
        let body = pipeline_error_response(&err);

        assert_eq!(body["status"], "error");
        assert_eq!(body["kind"], "missingRequiredColumn");
        assert!(body["error"].as_str().unwrap().contains("Content URL"));
    }

    #[test]
    fn test_error_kinds() {
        let err: PipelineError = ReadError::UnsupportedFileType("a.txt".into()).into();
        assert_eq!(error_kind(&err), "unsupportedFileType");

        let err: PipelineError = ReadError::NoHeaders.into();
        assert_eq!(error_kind(&err), "unexpectedParseError");
    }
}
