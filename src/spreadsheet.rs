//! Guest spreadsheet parsing
//!
//! Reads the first sheet of an xlsx/xls workbook or a CSV file into guest
//! rows. The first row is the header; `name`, `ladies`, `gents` and
//! `children` columns are located by case-insensitive header text.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use thiserror::Error;

/// Accepted upload formats
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SheetFormat {
    Xlsx,
    Xls,
    Csv,
}

impl SheetFormat {
    /// Format from the file extension (case-insensitive)
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, ext) = file_name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" => Some(SheetFormat::Xlsx),
            "xls" => Some(SheetFormat::Xls),
            "csv" => Some(SheetFormat::Csv),
            _ => None,
        }
    }

    /// Whether the uploaded content type is plausible for this format
    pub fn accepts_content_type(&self, content_type: &str) -> bool {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        if mime.is_empty() || mime == "application/octet-stream" {
            return true;
        }
        match self {
            SheetFormat::Xlsx => {
                mime == "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            SheetFormat::Xls => mime == "application/vnd.ms-excel",
            SheetFormat::Csv => matches!(
                mime.as_str(),
                "text/csv" | "application/csv" | "text/plain" | "application/vnd.ms-excel"
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Failed to read spreadsheet: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet has no sheets")]
    NoSheet,
}

/// One data row of the sheet
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuestRow {
    /// Trimmed name; `None` when blank or missing
    pub name: Option<String>,
    pub ladies: i32,
    pub gents: i32,
    pub children: i32,
}

/// Read the first sheet as rows of cell text
pub fn read_cells(format: SheetFormat, bytes: &[u8]) -> Result<Vec<Vec<String>>, SheetError> {
    match format {
        SheetFormat::Csv => read_csv(bytes),
        SheetFormat::Xlsx | SheetFormat::Xls => read_workbook(bytes),
    }
}

fn read_csv(bytes: &[u8]) -> Result<Vec<Vec<String>>, SheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

fn read_workbook(bytes: &[u8]) -> Result<Vec<Vec<String>>, SheetError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook.worksheet_range_at(0).ok_or(SheetError::NoSheet)??;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        other => other.to_string(),
    }
}

/// Map cell rows to guest rows. The first row is the header; rows with every
/// cell blank are dropped.
pub fn guest_rows(cells: Vec<Vec<String>>) -> Vec<GuestRow> {
    let mut iter = cells.into_iter();
    let Some(header) = iter.next() else {
        return Vec::new();
    };

    let position = |field: &str| {
        header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(field))
    };
    let name_col = position("name");
    let ladies_col = position("ladies");
    let gents_col = position("gents");
    let children_col = position("children");

    let cell = |row: &[String], col: Option<usize>| -> Option<String> {
        col.and_then(|c| row.get(c)).map(|v| v.trim().to_string())
    };

    iter.filter(|row| row.iter().any(|c| !c.trim().is_empty()))
        .map(|row| GuestRow {
            name: cell(&row, name_col).filter(|n| !n.is_empty()),
            ladies: parse_count(cell(&row, ladies_col).as_deref().unwrap_or("")),
            gents: parse_count(cell(&row, gents_col).as_deref().unwrap_or("")),
            children: parse_count(cell(&row, children_col).as_deref().unwrap_or("")),
        })
        .collect()
}

/// Leading integer of the text (`"2"`, `"2.7"`, `"3 adults"` → 2, 2, 3),
/// 0 when there is none, never negative
pub fn parse_count(value: &str) -> i32 {
    let value = value.trim();
    let digits_start = usize::from(value.starts_with(['-', '+']));
    let digits_end = value[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(value.len(), |i| i + digits_start);

    value[..digits_end].parse::<i32>().unwrap_or(0).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_format_from_file_name() {
        assert_eq!(SheetFormat::from_file_name("guests.XLSX"), Some(SheetFormat::Xlsx));
        assert_eq!(SheetFormat::from_file_name("old.xls"), Some(SheetFormat::Xls));
        assert_eq!(SheetFormat::from_file_name("list.csv"), Some(SheetFormat::Csv));
        assert_eq!(SheetFormat::from_file_name("notes.txt"), None);
        assert_eq!(SheetFormat::from_file_name("xlsx"), None);
    }

    #[test]
    fn test_accepts_content_type() {
        assert!(SheetFormat::Csv.accepts_content_type("text/csv; charset=utf-8"));
        assert!(SheetFormat::Csv.accepts_content_type("application/vnd.ms-excel"));
        assert!(SheetFormat::Xlsx.accepts_content_type("application/octet-stream"));
        assert!(!SheetFormat::Xlsx.accepts_content_type("image/png"));
        assert!(!SheetFormat::Xls.accepts_content_type("text/csv"));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("2"), 2);
        assert_eq!(parse_count(" 2.7 "), 2);
        assert_eq!(parse_count("3 adults"), 3);
        assert_eq!(parse_count("-4"), 0);
        assert_eq!(parse_count("many"), 0);
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("+5"), 5);
    }

    #[test]
    fn test_guest_rows() {
        let rows = guest_rows(vec![
            row(&[" Name ", "Ladies", "GENTS", "children"]),
            row(&["Jane Doe", "2", "1", ""]),
            row(&["", "", "", ""]),
            row(&["  ", "1", "0", "0"]),
            row(&["Ali"]),
        ]);
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            GuestRow {
                name: Some("Jane Doe".into()),
                ladies: 2,
                gents: 1,
                children: 0
            }
        );
        assert_eq!(rows[1].name, None);
        assert_eq!(rows[1].ladies, 1);
        assert_eq!(rows[2].name.as_deref(), Some("Ali"));
        assert_eq!(rows[2].gents, 0);
    }

    #[test]
    fn test_guest_rows_without_name_column() {
        let rows = guest_rows(vec![row(&["guest", "ladies"]), row(&["Jane", "1"])]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, None);
    }

    #[test]
    fn test_read_csv() {
        let data = b"name,ladies,gents,children\nJane,1,1,0\n\"Doe, John\",0,2,1\n";
        let cells = read_cells(SheetFormat::Csv, data).unwrap();
        assert_eq!(cells.len(), 3);
        let rows = guest_rows(cells);
        assert_eq!(rows[1].name.as_deref(), Some("Doe, John"));
        assert_eq!(rows[1].children, 1);
    }

    #[test]
    fn test_read_invalid_workbook() {
        assert!(read_cells(SheetFormat::Xlsx, b"not a workbook").is_err());
    }

    #[test]
    fn test_empty_input() {
        assert!(guest_rows(Vec::new()).is_empty());
        assert!(read_cells(SheetFormat::Csv, b"").unwrap().is_empty());
    }
}
