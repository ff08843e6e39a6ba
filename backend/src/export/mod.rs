//! Download encoders for cleaned tables.
//!
//! | Format | File name            | Media type |
//! |--------|----------------------|------------|
//! | CSV    | `datos_limpios.csv`  | `text/csv` |
//! | XLSX   | `datos_limpios.xlsx` | `application/vnd.openxmlformats-officedocument.spreadsheetml.sheet` |
//!
//! Neither format writes an index column.

use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{ExportError, ExportResult};
use crate::models::{Table, DOMAIN_RATING, WEBSITE_TRAFFIC};

/// Columns whose values may be stored as spreadsheet numbers.
const NUMERIC_COLUMNS: [&str; 2] = [DOMAIN_RATING, WEBSITE_TRAFFIC];

/// Most significant digits an XLSX number keeps.
const MAX_NUMERIC_DIGITS: usize = 15;

/// Name of the only worksheet in exported workbooks.
pub const SHEET_NAME: &str = "Datos Limpios";

/// Download format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    #[default]
    Xlsx,
}

impl ExportFormat {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Csv => "datos_limpios.csv",
            Self::Xlsx => "datos_limpios.xlsx",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "excel" => Ok(Self::Xlsx),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

/// Encode `table` in the requested format.
pub fn export_table(table: &Table, format: ExportFormat) -> ExportResult<Vec<u8>> {
    match format {
        ExportFormat::Csv => to_csv_bytes(table),
        ExportFormat::Xlsx => to_xlsx_bytes(table),
    }
}

/// UTF-8 CSV, header first. Absent cells are written as empty fields.
pub fn to_csv_bytes(table: &Table) -> ExportResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::CsvBuffer(e.to_string()))
}

/// Single-sheet workbook named [`SHEET_NAME`] with a bold header row.
///
/// Everything is written as text except `Domain Rating` and `Website Traffic`
/// values that survive a trip through a spreadsheet number unchanged.
pub fn to_xlsx_bytes(table: &Table) -> ExportResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, name) in table.columns().iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, name, &header_format)?;
    }

    let numeric: Vec<bool> = table
        .columns()
        .iter()
        .map(|c| NUMERIC_COLUMNS.contains(&c.as_str()))
        .collect();

    for (r, row) in table.rows().iter().enumerate() {
        let r = (r + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let as_number = numeric[col];
            let col = col as u16;
            match cell.as_deref() {
                None | Some("") => {}
                Some(text) => match numeric_value(text).filter(|_| as_number) {
                    Some(n) => {
                        sheet.write_number(r, col, n)?;
                    }
                    None => {
                        sheet.write_string(r, col, text)?;
                    }
                },
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// `text` as a number, only when writing it back gives the same text.
fn numeric_value(text: &str) -> Option<f64> {
    if text.chars().filter(char::is_ascii_digit).count() > MAX_NUMERIC_DIGITS {
        return None;
    }
    let n = text.parse::<f64>().ok().filter(|n| n.is_finite())?;
    (n.to_string() == text).then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{Data, Reader, Xlsx};
    use std::io::Cursor;

    fn cleaned() -> Table {
        let mut t = Table::new(
            ["Content URL", "Domain Rating", "Website Traffic", "Email", "WhatsApp"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        );
        t.push_row(vec![
            Some("example.com".into()),
            Some("45".into()),
            Some("1000".into()),
            Some(String::new()),
            Some(String::new()),
        ]);
        t.push_row(vec![None, Some("7".into()), None, Some("a@b.c".into()), Some(String::new())]);
        t
    }

    #[test]
    fn test_csv_export() {
        let bytes = to_csv_bytes(&cleaned()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Content URL,Domain Rating,Website Traffic,Email,WhatsApp");
        assert_eq!(lines[1], "example.com,45,1000,,");
        assert_eq!(lines[2], ",7,,a@b.c,");
    }

    #[test]
    fn test_csv_export_quotes_delimiters() {
        let mut t = Table::new(vec!["Content URL".into()]);
        t.push_row(vec![Some("a.com,b".into())]);
        let text = String::from_utf8(to_csv_bytes(&t).unwrap()).unwrap();
        assert_eq!(text, "Content URL\n\"a.com,b\"\n");
    }

    #[test]
    fn test_xlsx_export_sheet_and_cells() {
        let bytes = to_xlsx_bytes(&cleaned()).unwrap();

        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec![SHEET_NAME.to_string()]);

        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        assert_eq!(range.get_value((0, 0)), Some(&Data::String("Content URL".into())));
        assert_eq!(range.get_value((1, 0)), Some(&Data::String("example.com".into())));
        assert_eq!(range.get_value((1, 1)), Some(&Data::Float(45.0)));
        assert_eq!(range.get_value((2, 3)), Some(&Data::String("a@b.c".into())));
    }

    #[test]
    fn test_format_parsing_and_names() {
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!(".XLSX".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert!("pdf".parse::<ExportFormat>().is_err());

        assert_eq!(ExportFormat::Csv.file_name(), "datos_limpios.csv");
        assert_eq!(ExportFormat::Csv.media_type(), "text/csv");
        assert_eq!(ExportFormat::Xlsx.file_name(), "datos_limpios.xlsx");
        assert!(ExportFormat::Xlsx.media_type().ends_with("spreadsheetml.sheet"));
    }

    #[test]
    fn test_numeric_value() {
        assert_eq!(numeric_value("45"), Some(45.0));
        assert_eq!(numeric_value("1.5"), Some(1.5));
        assert_eq!(numeric_value(""), None);
        assert_eq!(numeric_value(" 4"), None);
        assert_eq!(numeric_value("inf"), None);
        assert_eq!(numeric_value("example.com"), None);
        assert_eq!(numeric_value("0012"), None);
        assert_eq!(numeric_value("+34600111222"), None);
        assert_eq!(numeric_value("1e3"), None);
        assert_eq!(numeric_value("2.50"), None);
        assert_eq!(numeric_value("12345678901234567890"), None);
    }

    #[test]
    fn test_xlsx_export_keeps_text_that_looks_numeric() {
        let mut t = Table::new(
            ["Content URL", "Domain Rating", "Website Traffic", "Email", "WhatsApp"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        );
        t.push_row(vec![
            Some("123".into()),
            Some("007".into()),
            Some("12345678901234567890".into()),
            Some("0012".into()),
            Some("+34600111222".into()),
        ]);
        t.push_row(vec![
            Some("a.com".into()),
            Some("3".into()),
            Some("1000".into()),
            Some("600111222".into()),
            Some("34600111222".into()),
        ]);

        let bytes = to_xlsx_bytes(&t).unwrap();
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();

        let text = |s: &str| Some(Data::String(s.to_string()));
        assert_eq!(range.get_value((1, 0)).cloned(), text("123"));
        assert_eq!(range.get_value((1, 1)).cloned(), text("007"));
        assert_eq!(range.get_value((1, 2)).cloned(), text("12345678901234567890"));
        assert_eq!(range.get_value((1, 3)).cloned(), text("0012"));
        assert_eq!(range.get_value((1, 4)).cloned(), text("+34600111222"));
        assert_eq!(range.get_value((2, 1)), Some(&Data::Float(3.0)));
        assert_eq!(range.get_value((2, 2)), Some(&Data::Float(1000.0)));
        assert_eq!(range.get_value((2, 3)).cloned(), text("600111222"));
        assert_eq!(range.get_value((2, 4)).cloned(), text("34600111222"));
    }
}
