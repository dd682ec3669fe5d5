//! Table I/O - Loading exports into a `Table` and writing cleaned tables back out
//!
//! CSV exports are read as raw text cells so the numeric filter decides what
//! counts as a number. Files that are not valid UTF-8 are decoded as
//! Windows-1252, which covers the Latin-1 exports some tools produce.
//! Excel workbooks (xlsx/xls) are read from their first sheet with calamine.
//! Parquet goes through polars, as does all output.

use crate::error::{CleanerError, Result};
use crate::table::{Cell, Column, Table};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use encoding_rs::WINDOWS_1252;
use polars::prelude::*;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Default file name for cleaned output
pub const DEFAULT_OUTPUT_NAME: &str = "cleaned_gsc_data.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Excel,
    Parquet,
}

impl FileFormat {
    /// Format from the file extension, case-insensitive
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" | "xls" => Ok(FileFormat::Excel),
            "parquet" => Ok(FileFormat::Parquet),
            "" => Err(CleanerError::UnsupportedFormat(format!(
                "{} has no file extension",
                path.display()
            ))),
            other => Err(CleanerError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Load an export file into a table
pub fn load_table(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let format = FileFormat::from_path(path)?;
    info!("Loading {:?} as {:?}", path, format);

    let table = match format {
        FileFormat::Csv => {
            let bytes = std::fs::read(path)?;
            read_csv_bytes(&bytes)?
        }
        FileFormat::Excel => read_excel(path)?,
        FileFormat::Parquet => {
            let file = File::open(path)?;
            let df = ParquetReader::new(file).finish()?;
            dataframe_to_table(&df)?
        }
    };

    info!(
        "Loaded {} rows x {} columns",
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}

fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(&UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            warn!("Input is not valid UTF-8, decoding as Windows-1252");
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
            text
        }
    }
}

/// Parse CSV bytes with a header row. Short records are padded with empty
/// cells; records with more fields than the header are skipped.
pub fn read_csv_bytes(bytes: &[u8]) -> Result<Table> {
    let text = decode_text(bytes);
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let mut cells: Vec<Vec<Cell>> = vec![Vec::new(); headers.len()];

    let mut skipped = 0usize;

    for result in rdr.records() {
        let record = result?;
        if record.len() > headers.len() {
            skipped += 1;
            continue;
        }
        for (idx, column) in cells.iter_mut().enumerate() {
            column.push(Cell::from_raw(record.get(idx).unwrap_or("")));
        }
    }

    if skipped > 0 {
        warn!(
            "Skipped {} CSV rows with more than {} fields",
            skipped,
            headers.len()
        );
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, cells)| Column::new(name, cells))
        .collect();
    Table::new(columns)
}

fn read_excel(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CleanerError::Excel("workbook has no worksheets".to_string()))??;
    let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();
    excel_rows_to_table(&rows)
}

fn excel_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::String(s) => Cell::from_raw(s),
        other => Cell::from_raw(&other.to_string()),
    }
}

/// Build a table from worksheet rows; the first row holds the headers
pub fn excel_rows_to_table(rows: &[Vec<Data>]) -> Result<Table> {
    let (header_row, data_rows) = match rows.split_first() {
        Some(split) => split,
        None => return Table::new(Vec::new()),
    };

    let columns = header_row
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let name = match header {
                Data::String(s) => s.clone(),
                other => other.to_string(),
            };
            let cells = data_rows
                .iter()
                .map(|row| row.get(idx).map_or(Cell::Empty, excel_cell))
                .collect();
            Column::new(name, cells)
        })
        .collect();

    Table::new(columns)
}

/// Convert a polars frame into a table, column by column
pub fn dataframe_to_table(df: &DataFrame) -> Result<Table> {
    let mut columns = Vec::with_capacity(df.width());

    for series in df.get_columns() {
        let dtype = series.dtype();
        let cells: Vec<Cell> = if dtype.is_integer() {
            let casted = series.cast(&DataType::Int64)?;
            casted
                .i64()?
                .into_iter()
                .map(|v| v.map_or(Cell::Empty, Cell::Int))
                .collect()
        } else if dtype.is_float() {
            let casted = series.cast(&DataType::Float64)?;
            casted
                .f64()?
                .into_iter()
                .map(|v| v.map_or(Cell::Empty, Cell::Float))
                .collect()
        } else {
            let casted = series.cast(&DataType::String)?;
            casted
                .str()?
                .into_iter()
                .map(|v| v.map_or(Cell::Empty, Cell::from_raw))
                .collect()
        };
        columns.push(Column::new(series.name(), cells));
    }

    Table::new(columns)
}

fn column_to_series(column: &Column, name: &str) -> Series {
    let filled = column.cells.iter().filter(|c| !c.is_empty());
    let all_int = filled.clone().all(|c| matches!(c, Cell::Int(_)));
    let all_numeric = filled.clone().all(Cell::is_numeric);
    let any_filled = filled.clone().next().is_some();

    if any_filled && all_int {
        let values: Vec<Option<i64>> = column
            .cells
            .iter()
            .map(|c| match c {
                Cell::Int(i) => Some(*i),
                _ => None,
            })
            .collect();
        Series::new(name, values)
    } else if any_filled && all_numeric {
        let values: Vec<Option<f64>> = column
            .cells
            .iter()
            .map(|c| match c {
                Cell::Int(i) => Some(*i as f64),
                Cell::Float(f) => Some(*f),
                _ => None,
            })
            .collect();
        Series::new(name, values)
    } else {
        let values: Vec<Option<String>> = column
            .cells
            .iter()
            .map(|c| if c.is_empty() { None } else { Some(c.to_string()) })
            .collect();
        let values: Vec<Option<&str>> = values.iter().map(|v| v.as_deref()).collect();
        Series::new(name, values)
    }
}

/// Convert a table into a typed polars frame.
///
/// Columns holding only integers become Int64, only numbers become Float64,
/// anything else is String. Empty cells become nulls. Repeated headers get a
/// `.1`, `.2`, ... suffix since frame column names must be unique.
pub fn table_to_dataframe(table: &Table) -> Result<DataFrame> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut series = Vec::with_capacity(table.column_count());

    for column in table.columns() {
        let count = seen.entry(column.name.as_str()).or_insert(0);
        let name = if *count == 0 {
            column.name.clone()
        } else {
            format!("{}.{}", column.name, count)
        };
        *count += 1;
        series.push(column_to_series(column, &name));
    }

    Ok(DataFrame::new(series)?)
}

/// Write a table as CSV or Parquet, chosen by the output extension
pub fn write_table(table: &Table, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let format = FileFormat::from_path(path)?;
    if format == FileFormat::Excel {
        return Err(CleanerError::UnsupportedFormat(
            "writing Excel workbooks is not supported".to_string(),
        ));
    }
    let mut df = table_to_dataframe(table)?;
    let mut file = File::create(path)?;

    match format {
        FileFormat::Csv => {
            CsvWriter::new(&mut file)
                .include_header(true)
                .finish(&mut df)?;
        }
        FileFormat::Parquet => {
            ParquetWriter::new(&mut file).finish(&mut df)?;
        }
        FileFormat::Excel => unreachable!("rejected above"),
    }

    info!("Wrote {} rows to {:?}", table.row_count(), path);
    Ok(())
}

/// `cleaned_gsc_data.csv` next to the input file
pub fn default_output_path(input: &Path) -> PathBuf {
    input
        .parent()
        .map(|dir| dir.join(DEFAULT_OUTPUT_NAME))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_NAME))
}
