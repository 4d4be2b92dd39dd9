//! Seam for reading computed cell values.
//!
//! Dates and predicted hours in the budgeting file are usually formulas, so
//! their raw content is useless; what matters is the result. Everything the
//! engine needs goes through [`FormulaEvaluator`] so the mechanism can be
//! swapped without touching the reconciliation code.
//!
//! [`EngineEvaluator`] computes formulas with an embedded formualizer
//! workbook and is what sessions use. [`CachedResultEvaluator`] only reads
//! the results Excel stored on its last save.

use std::collections::HashSet;
use std::path::Path;

use calamine::{Data, Range, Reader};
use chrono::Timelike;
use formualizer_common::LiteralValue;
use formualizer_workbook::Workbook;
use log::{debug, warn};

use crate::error::LoadError;
use crate::excel::io::{CellRef, CellValue, SheetGrid, excel_serial_to_datetime, read_sheet_from};
use crate::excel::loader::{file_name_of, open_calamine};
use crate::excel::style::shows_date;

pub trait FormulaEvaluator {
    /// Computed values of the given cells, in the same order.
    fn evaluate_cells(&self, path: &Path, sheet: &str, cells: &[CellRef]) -> Result<Vec<CellValue>, LoadError>;

    /// Computed values from `start` downwards, stopping before the first
    /// empty cell. Returns (row, value) pairs.
    fn evaluate_column_down(&self, path: &Path, sheet: &str, start: CellRef) -> Result<Vec<(u32, CellValue)>, LoadError>;

    fn evaluate_cell(&self, path: &Path, sheet: &str, cell: CellRef) -> Result<CellValue, LoadError> {
        Ok(self
            .evaluate_cells(path, sheet, &[cell])?
            .into_iter()
            .next()
            .unwrap_or_default())
    }
}

/// Reads the results Excel stored the last time it calculated the workbook.
///
/// Each call opens its own read-only context and drops it before returning.
#[derive(Debug, Default, Clone, Copy)]
pub struct CachedResultEvaluator;

impl FormulaEvaluator for CachedResultEvaluator {
    fn evaluate_cells(&self, path: &Path, sheet: &str, cells: &[CellRef]) -> Result<Vec<CellValue>, LoadError> {
        let mut workbook = open_calamine(path)?;
        let grid = read_sheet_from(&mut workbook, &file_name_of(path), sheet)?;
        debug!("Read {} stored results of {}", cells.len(), sheet);
        Ok(cells.iter().map(|c| grid.cell(*c).clone()).collect())
    }

    fn evaluate_column_down(&self, path: &Path, sheet: &str, start: CellRef) -> Result<Vec<(u32, CellValue)>, LoadError> {
        let mut workbook = open_calamine(path)?;
        let grid = read_sheet_from(&mut workbook, &file_name_of(path), sheet)?;
        Ok(column_down(start, grid.last_row(), |at| grid.cell(at).clone()))
    }
}

/// Computes formula cells with an embedded formualizer workbook engine.
///
/// Every call loads the values and formulas of all worksheets (formulas may
/// reach across sheets), evaluates what was asked for and drops the engine.
/// Cells without a formula are returned as stored. A formula result is
/// typed as a date when the cell carries a date number format.
#[derive(Debug, Default, Clone, Copy)]
pub struct EngineEvaluator;

impl FormulaEvaluator for EngineEvaluator {
    fn evaluate_cells(&self, path: &Path, sheet: &str, cells: &[CellRef]) -> Result<Vec<CellValue>, LoadError> {
        let mut computed = ComputedSheet::load(path, sheet)?;
        let values: Vec<CellValue> = cells.iter().map(|c| computed.value(*c)).collect();
        debug!("Evaluated {} cells of {}", values.len(), sheet);
        Ok(values)
    }

    fn evaluate_column_down(&self, path: &Path, sheet: &str, start: CellRef) -> Result<Vec<(u32, CellValue)>, LoadError> {
        let mut computed = ComputedSheet::load(path, sheet)?;
        let last_row = computed.last_row;
        Ok(column_down(start, last_row, |at| computed.value(at)))
    }
}

/// Walks down from `start` until the first empty cell or past `last_row`.
/// A lone empty start cell still belongs to the expanded range.
fn column_down<F>(start: CellRef, last_row: u32, mut value_at: F) -> Vec<(u32, CellValue)>
where
    F: FnMut(CellRef) -> CellValue,
{
    let mut out = Vec::new();
    for row in start.row..=last_row {
        let value = value_at(start.with_row(row));
        if value.is_empty() {
            break;
        }
        out.push((row, value));
    }
    if out.is_empty() {
        out.push((start.row, CellValue::Empty));
    }
    out
}

/// Values and formulas of one worksheet pulled out of a workbook, plus an
/// engine able to compute them.
struct ComputedSheet {
    sheet: String,
    stored: SheetGrid,
    formulas: HashSet<CellRef>,
    date_formatted: HashSet<CellRef>,
    engine: Option<Workbook>,
    last_row: u32,
}

struct SheetContent {
    name: String,
    values: Range<Data>,
    formulas: Range<String>,
}

impl ComputedSheet {
    fn load(path: &Path, sheet: &str) -> Result<ComputedSheet, LoadError> {
        let file_name = file_name_of(path);
        let mut workbook = open_calamine(path)?;
        let stored = read_sheet_from(&mut workbook, &file_name, sheet)?;

        let corrupted = |e: calamine::XlsxError| LoadError::Corrupted {
            file_name: file_name.clone(),
            reason: e.to_string(),
        };
        let mut contents = Vec::new();
        for name in workbook.sheet_names().to_owned() {
            let values = workbook.worksheet_range(&name).map_err(corrupted)?;
            let formulas = workbook.worksheet_formula(&name).map_err(corrupted)?;
            contents.push(SheetContent { name, values, formulas });
        }

        let formulas: HashSet<CellRef> = contents
            .iter()
            .filter(|c| c.name == sheet)
            .flat_map(|c| formula_cells(&c.formulas).map(|(at, _)| at))
            .collect();
        let last_row = formulas.iter().map(|at| at.row).max().unwrap_or(0).max(stored.last_row());

        if formulas.is_empty() {
            return Ok(ComputedSheet {
                sheet: sheet.to_string(),
                stored,
                formulas,
                date_formatted: HashSet::new(),
                engine: None,
                last_row,
            });
        }

        let date_formatted = date_formatted_cells(path, &file_name, sheet, &formulas)?;
        let engine = match build_engine(&contents) {
            Ok(engine) => Some(engine),
            Err(reason) => {
                warn!(
                    "Formulas in {} could not be loaded ({}); using stored results",
                    file_name, reason
                );
                None
            }
        };
        debug!("{} [{}]: {} formula cells", file_name, sheet, formulas.len());
        Ok(ComputedSheet {
            sheet: sheet.to_string(),
            stored,
            formulas,
            date_formatted,
            engine,
            last_row,
        })
    }

    fn value(&mut self, at: CellRef) -> CellValue {
        if !self.formulas.contains(&at) {
            return self.stored.cell(at).clone();
        }
        let Some(engine) = self.engine.as_mut() else {
            return self.stored.cell(at).clone();
        };
        match engine.evaluate_cell(&self.sheet, at.row, at.col) {
            Ok(value) => from_literal(value, self.date_formatted.contains(&at)),
            Err(e) => {
                warn!("{} [{}]: {}, using the stored result", at, self.sheet, e);
                self.stored.cell(at).clone()
            }
        }
    }
}

/// Non-empty formula texts of a calamine formula range, by absolute cell.
fn formula_cells(range: &Range<String>) -> impl Iterator<Item = (CellRef, &String)> {
    let (r0, c0) = range.start().unwrap_or((0, 0));
    range
        .used_cells()
        .filter(|(_, _, text)| !text.trim().is_empty())
        .map(move |(r, c, text)| (CellRef::new(c0 + c as u32 + 1, r0 + r as u32 + 1), text))
}

fn build_engine(contents: &[SheetContent]) -> Result<Workbook, String> {
    let mut engine = Workbook::new();
    for content in contents {
        engine.add_sheet(&content.name);
        let (r0, c0) = content.values.start().unwrap_or((0, 0));
        for (r, c, data) in content.values.used_cells() {
            if let Some(value) = literal_of(data) {
                let (row, col) = (r0 + r as u32 + 1, c0 + c as u32 + 1);
                engine
                    .set_value(&content.name, row, col, value)
                    .map_err(|e| e.to_string())?;
            }
        }
        for (at, text) in formula_cells(&content.formulas) {
            let text = if text.starts_with('=') {
                text.clone()
            } else {
                format!("={}", text)
            };
            engine
                .set_formula(&content.name, at.row, at.col, &text)
                .map_err(|e| e.to_string())?;
        }
    }
    engine.prepare_graph_all().map_err(|e| e.to_string())?;
    Ok(engine)
}

/// Stored cell content as an engine input. Dates go in as serial numbers,
/// the way Excel itself holds them.
fn literal_of(data: &Data) -> Option<LiteralValue> {
    let value = match data {
        Data::Int(i) => LiteralValue::Int(*i),
        Data::Float(f) => LiteralValue::Number(*f),
        Data::String(s) => LiteralValue::Text(s.clone()),
        Data::Bool(b) => LiteralValue::Boolean(*b),
        Data::DateTime(dt) => LiteralValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => LiteralValue::Text(s.clone()),
        Data::Error(_) | Data::Empty => return None,
    };
    Some(value)
}

fn from_literal(value: LiteralValue, date_formatted: bool) -> CellValue {
    match value {
        LiteralValue::Empty | LiteralValue::Pending => CellValue::Empty,
        LiteralValue::Int(i) => serial_or_number(i as f64, date_formatted),
        LiteralValue::Number(n) => serial_or_number(n, date_formatted),
        LiteralValue::Text(s) => CellValue::String(s),
        LiteralValue::Boolean(b) => CellValue::Bool(b),
        LiteralValue::Date(d) => CellValue::from(d),
        LiteralValue::DateTime(dt) => CellValue::Date(dt),
        LiteralValue::Time(t) => CellValue::Number(t.num_seconds_from_midnight() as f64 / 86_400.0),
        LiteralValue::Duration(d) => CellValue::Number(d.num_seconds() as f64 / 86_400.0),
        LiteralValue::Error(e) => CellValue::Error(e.to_string()),
        other => {
            debug!("Unsupported formula result {:?}", other);
            CellValue::Empty
        }
    }
}

fn serial_or_number(n: f64, date_formatted: bool) -> CellValue {
    if date_formatted {
        if let Some(dt) = excel_serial_to_datetime(n) {
            return CellValue::Date(dt);
        }
    }
    CellValue::Number(n)
}

/// Formula cells of `sheet` whose number format shows a date.
fn date_formatted_cells(
    path: &Path,
    file_name: &str,
    sheet: &str,
    cells: &HashSet<CellRef>,
) -> Result<HashSet<CellRef>, LoadError> {
    let book = umya_spreadsheet::reader::xlsx::read(path).map_err(|e| LoadError::Corrupted {
        file_name: file_name.to_string(),
        reason: e.to_string(),
    })?;
    let Some(worksheet) = book.get_sheet_by_name(sheet) else {
        return Ok(HashSet::new());
    };
    Ok(cells
        .iter()
        .copied()
        .filter(|at| {
            worksheet
                .get_cell((at.col, at.row))
                .and_then(|cell| cell.get_style().get_number_format())
                .map(shows_date)
                .unwrap_or(false)
        })
        .collect())
}
