//! Upload reader: CSV or XLSX bytes into a [`Table`].
//!
//! Dispatch is decided by the file name only (see [`FileKind::from_file_name`]).
//! CSV input gets encoding and delimiter auto-detection; XLSX input is read
//! from its first worksheet. No schema logic lives here.

use calamine::{Data, Reader, Xlsx};
use std::io::Cursor;
use std::path::Path;

use crate::error::{ReadError, ReadResult};
use crate::models::{Cell, FileKind, Table};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed table
    pub table: Table,
    /// Which reader was used
    pub kind: FileKind,
    /// Detected encoding (CSV only)
    pub encoding: Option<String>,
    /// Detected delimiter (CSV only)
    pub delimiter: Option<char>,
}

/// Detect the encoding of raw bytes.
///
/// Valid UTF-8 (with or without BOM) is always `utf-8`; chardet is only
/// consulted for bytes that are not. Anything it reports outside the
/// Latin family falls back to `windows-1252`, which decodes every byte.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if std::str::from_utf8(body).is_ok() {
        return "utf-8".to_string();
    }

    let result = chardet::detect(body);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "iso-8859-15" => "iso-8859-15".to_string(),
        _ => "windows-1252".to_string(),
    }
}

/// Decode bytes to string using the specified encoding.
///
/// `iso-8859-1` is decoded as `windows-1252`, its WHATWG superset.
/// Invalid UTF-8 is decoded lossily rather than rejected.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        "iso-8859-15" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the delimiter by counting occurrences in the first line.
/// Falls back to `,` when none of the candidates appear.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse an upload, choosing the reader from `file_name`.
pub fn parse_upload(file_name: &str, bytes: &[u8]) -> ReadResult<ParseResult> {
    match FileKind::from_file_name(file_name)? {
        FileKind::Csv => parse_csv_bytes(bytes),
        FileKind::Xlsx => parse_xlsx_bytes(bytes),
    }
}

/// Parse a file on disk, choosing the reader from its name.
pub fn parse_file<P: AsRef<Path>>(path: P) -> ReadResult<ParseResult> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    // Reject by name before touching the disk.
    FileKind::from_file_name(&name)?;

    let bytes = std::fs::read(path)?;
    parse_upload(&name, &bytes)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_csv_bytes(bytes: &[u8]) -> ReadResult<ParseResult> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(ReadError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    let table = parse_csv_str(&content, delimiter)?;

    Ok(ParseResult {
        table,
        kind: FileKind::Csv,
        encoding: Some(encoding),
        delimiter: Some(delimiter),
    })
}

/// Parse decoded CSV text with an explicit delimiter.
///
/// Empty cells are absent; short rows are padded. Blank lines are skipped,
/// but a line of bare delimiters (`,,`) is kept as a row of absent cells.
pub fn parse_csv_str(content: &str, delimiter: char) -> ReadResult<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ReadError::NoHeaders);
    }

    let mut table = Table::new(normalize_headers(headers));

    for record in reader.records() {
        let record = record?;
        if record.len() == 1 && record[0].is_empty() {
            continue;
        }
        table.push_row(record.iter().map(text_cell).collect());
    }

    Ok(table)
}

/// Parse the first worksheet of an XLSX workbook.
pub fn parse_xlsx_bytes(bytes: &[u8]) -> ReadResult<ParseResult> {
    if bytes.is_empty() {
        return Err(ReadError::EmptyFile);
    }

    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ReadError::NoWorksheet)??;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or(ReadError::NoHeaders)?
        .iter()
        .map(|c| data_cell(c).unwrap_or_default())
        .collect();

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ReadError::NoHeaders);
    }

    let mut table = Table::new(normalize_headers(headers));

    for row in rows {
        table.push_row(row.iter().map(data_cell).collect());
    }

    Ok(ParseResult {
        table,
        kind: FileKind::Xlsx,
        encoding: None,
        delimiter: None,
    })
}

fn text_cell(raw: &str) -> Cell {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Spreadsheet cell to text. Whole floats lose the trailing `.0`.
fn data_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", *f as i64)),
        other => Some(other.to_string()),
    }
}

/// Name empty headers `Unnamed: N` and suffix duplicates with `.1`, `.2`,
/// ... so every column name is unique. Names are otherwise kept literally.
pub fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());

    for (i, header) in raw.into_iter().enumerate() {
        let base = if header.is_empty() {
            format!("Unnamed: {}", i)
        } else {
            header
        };

        let mut name = base.clone();
        let mut n = 1;
        while out.contains(&name) {
            name = format!("{}.{}", base, n);
            n += 1;
        }
        out.push(name);
    }

    out
}
