//! # File I/O Module
//!
//! Handles spreadsheet and text file operations:
//! - **Parameter sheets**: read `Variable`/`Value` rows into [`Parameters`]
//! - **Result sheets**: one header row plus one data row, in key order
//! - **Atomic saves**: write to a temp sibling, sync, rename, so readers never
//!   observe a partial file
//!
//! ## Parameter Sheet Layout
//!
//! ```text
//! | Variable | Value  | Unit  |
//! |----------|--------|-------|
//! | SPAN     | 20     | m     |
//! | LOAD     | 15     | kN/m  |
//! ```
//!
//! Column names are case-sensitive; extra columns are ignored.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gad_core::calculations::beam::{summarize, DEFAULT_E, DEFAULT_I};
//! use gad_core::file_io::{read_results, write_results};
//! use std::path::Path;
//!
//! let results = summarize(20.0, 15.0, DEFAULT_E, DEFAULT_I)?;
//! write_results(&results, Path::new("results.xlsx"))?;
//! assert_eq!(read_results(Path::new("results.xlsx"))?, results);
//! # Ok::<(), gad_core::errors::GadError>(())
//! ```

use std::fs;
use std::io::Write;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use rust_xlsxwriter::Workbook;

use crate::errors::{GadError, GadResult};
use crate::values::{Parameters, Results};

/// Header of the name column in a parameter sheet
pub const VARIABLE_COLUMN: &str = "Variable";

/// Header of the value column in a parameter sheet
pub const VALUE_COLUMN: &str = "Value";

/// Read a parameter sheet into a [`Parameters`] mapping.
///
/// Rows with an empty name are skipped. Rows whose value is empty or not
/// numeric are skipped with a warning. Duplicate names take the last
/// occurrence.
///
/// # Returns
///
/// * `Err(GadError::InputFormat)` - unreadable workbook, empty first sheet,
///   or a missing `Variable`/`Value` column
pub fn read_parameters(path: &Path) -> GadResult<Parameters> {
    let range = first_sheet(path)?;
    let mut rows = range.rows();

    let header = rows
        .next()
        .ok_or_else(|| GadError::input_format(path.display().to_string(), "sheet is empty"))?;
    let name_col = column_index(header, VARIABLE_COLUMN, path)?;
    let value_col = column_index(header, VALUE_COLUMN, path)?;

    let mut params = Parameters::new();
    for (offset, row) in rows.enumerate() {
        let name = row.get(name_col).map(cell_text).unwrap_or_default();
        if name.is_empty() {
            continue;
        }

        match row.get(value_col).and_then(cell_number) {
            Some(value) => {
                if params.insert(name.clone(), value).is_some() {
                    tracing::debug!(variable = %name, row = offset + 2, "duplicate variable, keeping last value");
                }
            }
            None => {
                tracing::warn!(
                    variable = %name,
                    row = offset + 2,
                    path = %path.display(),
                    "skipping variable without a numeric value"
                );
            }
        }
    }

    Ok(params)
}

/// Write a parameter sheet in the `Variable`/`Value` layout.
///
/// Useful for producing input templates; [`read_parameters`] reads it back.
pub fn write_parameters(params: &Parameters, path: &Path) -> GadResult<()> {
    let out = |e: rust_xlsxwriter::XlsxError| GadError::output(path.display().to_string(), e.to_string());

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Parameters").map_err(out)?;
    sheet.write_string(0, 0, VARIABLE_COLUMN).map_err(out)?;
    sheet.write_string(0, 1, VALUE_COLUMN).map_err(out)?;
    for (row, (name, value)) in params.iter().enumerate() {
        let row = u32::try_from(row + 1)
            .map_err(|_| GadError::output(path.display().to_string(), "too many parameter rows"))?;
        sheet.write_string(row, 0, name).map_err(out)?;
        sheet.write_number(row, 1, value).map_err(out)?;
    }

    save_workbook(&mut workbook, path)
}

/// Write results as a single-row sheet.
///
/// The header row is the mapping's key order and the one data row holds
/// the values. Overwrites unconditionally.
///
/// # Returns
///
/// * `Err(GadError::Output)` - the workbook could not be built or written
pub fn write_results(results: &Results, path: &Path) -> GadResult<()> {
    let out = |e: rust_xlsxwriter::XlsxError| GadError::output(path.display().to_string(), e.to_string());

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Results").map_err(out)?;
    for (col, (name, value)) in results.iter().enumerate() {
        let col = u16::try_from(col)
            .map_err(|_| GadError::output(path.display().to_string(), "too many result columns"))?;
        sheet.write_string(0, col, name).map_err(out)?;
        sheet.write_number(1, col, value).map_err(out)?;
    }

    save_workbook(&mut workbook, path)
}

/// Read a single-row result sheet written by [`write_results`].
pub fn read_results(path: &Path) -> GadResult<Results> {
    let range = first_sheet(path)?;
    let mut rows = range.rows();

    let header = rows
        .next()
        .ok_or_else(|| GadError::input_format(path.display().to_string(), "sheet is empty"))?;
    let data = rows
        .next()
        .ok_or_else(|| GadError::input_format(path.display().to_string(), "missing data row"))?;

    let mut results = Results::new();
    for (col, cell) in header.iter().enumerate() {
        let name = cell_text(cell);
        if name.is_empty() {
            continue;
        }
        let value = data.get(col).and_then(cell_number).ok_or_else(|| {
            GadError::input_format(path.display().to_string(), format!("no numeric value for '{}'", name))
        })?;
        results.insert(name, value);
    }
    Ok(results)
}

/// Write text to a file with atomic replace semantics.
///
/// The save process:
/// 1. Write to a uniquely named temporary sibling
/// 2. Sync to disk (fsync)
/// 3. Rename over the target (atomic on most filesystems)
///
/// Concurrent writers each use their own temp file; the last rename wins.
pub fn write_atomic(path: &Path, contents: &str) -> GadResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".gad-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| GadError::file_error("create temp file", dir.display().to_string(), e.to_string()))?;

    tmp.write_all(contents.as_bytes()).map_err(|e| {
        GadError::file_error("write temp file", tmp.path().display().to_string(), e.to_string())
    })?;

    tmp.as_file().sync_all().map_err(|e| {
        GadError::file_error("sync temp file", tmp.path().display().to_string(), e.to_string())
    })?;

    // The temp file is removed if the rename fails
    tmp.persist(path)
        .map_err(|e| GadError::file_error("rename to final", path.display().to_string(), e.error.to_string()))?;

    Ok(())
}

fn save_workbook(workbook: &mut Workbook, path: &Path) -> GadResult<()> {
    let buffer = workbook
        .save_to_buffer()
        .map_err(|e| GadError::output(path.display().to_string(), e.to_string()))?;
    fs::write(path, buffer).map_err(|e| GadError::output(path.display().to_string(), e.to_string()))
}

fn first_sheet(path: &Path) -> GadResult<Range<Data>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| GadError::input_format(path.display().to_string(), e.to_string()))?;

    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| GadError::input_format(path.display().to_string(), "workbook has no sheets"))?
        .map_err(|e| GadError::input_format(path.display().to_string(), e.to_string()))
}

fn column_index(header: &[Data], column: &str, path: &Path) -> GadResult<usize> {
    header
        .iter()
        .position(|cell| cell_text(cell) == column)
        .ok_or_else(|| GadError::input_format(path.display().to_string(), format!("missing required column '{}'", column)))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

fn cell_number(cell: &Data) -> Option<f64> {
    let value = match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}
