//! Reading tables from disk. The reader is picked by file extension.

use crate::error::{Error, Result};
use crate::table::{ColumnRules, NormalizedTable, RawTable, normalize_table_with_rules};
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    /// `.xlsx`, `.xlsm`, `.xls`, `.ods`: the first sheet is read.
    Spreadsheet,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(SourceFormat::Spreadsheet),
            _ => Err(Error::UnsupportedFormat { extension: ext }),
        }
    }
}

pub fn load_table(path: impl AsRef<Path>) -> Result<NormalizedTable> {
    load_table_with_rules(path, &ColumnRules::default())
}

pub fn load_table_with_rules(
    path: impl AsRef<Path>,
    rules: &ColumnRules,
) -> Result<NormalizedTable> {
    let path = path.as_ref();
    let raw = load_raw_table(path)?;
    let table = normalize_table_with_rules(&raw, rules)?;
    tracing::info!(path = %path.display(), rows = table.len(), "table loaded");
    Ok(table)
}

pub fn load_raw_table(path: impl AsRef<Path>) -> Result<RawTable> {
    let path = path.as_ref();
    match SourceFormat::from_path(path)? {
        SourceFormat::Csv => {
            let bytes = std::fs::read(path).map_err(|source| Error::Io {
                path: path.display().to_string(),
                source,
            })?;
            read_csv(bytes.as_slice())
        }
        SourceFormat::Spreadsheet => read_spreadsheet(path),
    }
}

/// Reads CSV text with a header row. The delimiter is `;` when the header line has more
/// semicolons than commas (common for spreadsheet exports in comma-decimal locales), else `,`.
pub fn read_csv(mut reader: impl Read) -> Result<RawTable> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data).map_err(|source| Error::Io {
        path: "<csv>".to_string(),
        source,
    })?;
    let delimiter = sniff_delimiter(&data);

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .from_reader(data.as_slice());

    let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(RawTable { columns, rows })
}

fn sniff_delimiter(data: &[u8]) -> u8 {
    let header = data.split(|b| *b == b'\n').next().unwrap_or_default();
    let commas = header.iter().filter(|b| **b == b',').count();
    let semis = header.iter().filter(|b| **b == b';').count();
    if semis > commas { b';' } else { b',' }
}

#[cfg(feature = "spreadsheet")]
fn read_spreadsheet(path: &Path) -> Result<RawTable> {
    use calamine::Reader;

    let spreadsheet_err = |message: String| Error::Spreadsheet {
        path: path.display().to_string(),
        message,
    };

    let mut workbook =
        calamine::open_workbook_auto(path).map_err(|e| spreadsheet_err(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| spreadsheet_err("workbook has no sheets".to_string()))?
        .map_err(|e| spreadsheet_err(e.to_string()))?;

    let mut rows = range
        .rows()
        .map(|cells| cells.iter().map(|c| c.to_string()).collect::<Vec<String>>());
    let columns = rows
        .next()
        .ok_or_else(|| spreadsheet_err("first sheet is empty".to_string()))?;
    Ok(RawTable {
        columns,
        rows: rows.collect(),
    })
}

#[cfg(not(feature = "spreadsheet"))]
fn read_spreadsheet(path: &Path) -> Result<RawTable> {
    Err(Error::Spreadsheet {
        path: path.display().to_string(),
        message: "spreadsheet support disabled (enable the `spreadsheet` feature)".to_string(),
    })
}
