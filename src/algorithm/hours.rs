//! Hours accumulation across input timesheets and predicted hours lookup.

use std::collections::{BTreeSet, HashMap};

use chrono::Datelike;
use log::{debug, info, warn};

use crate::algorithm::headers::FilterColumns;
use crate::algorithm::registry::EmployeeRegistry;
use crate::error::LoadError;
use crate::excel::evaluate::FormulaEvaluator;
use crate::excel::io::{CellRef, CellValue, SheetGrid, cell_to_string, value_at};
use crate::excel::loader::SpreadsheetHandle;
use crate::excel::style::hours_look_recorded;
use crate::models::{ProjectCatalog, SelectedDate};

/// Minimum Jaro-Winkler similarity for a name to be offered as a suggestion.
pub const SUGGESTION_THRESHOLD: f64 = 0.85;

/// One loaded input worksheet, borrowed for the duration of a run.
#[derive(Debug, Clone, Copy)]
pub struct InputSheet<'a> {
    pub file_name: &'a str,
    pub grid: &'a SheetGrid,
    pub columns: FilterColumns,
    pub catalog: &'a ProjectCatalog,
    pub selected_projects: &'a BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NameSuggestion {
    pub employee: String,
    /// Closest name seen in the inputs, if any is similar enough.
    pub closest: Option<String>,
    pub similarity: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccumulationSummary {
    /// (file name, rows that contributed hours)
    pub matched_rows: Vec<(String, usize)>,
    /// Selected employees found in no input row.
    pub unmatched: Vec<NameSuggestion>,
}

impl AccumulationSummary {
    pub fn total_matched_rows(&self) -> usize {
        self.matched_rows.iter().map(|(_, n)| n).sum()
    }
}

/// Sums the hours of every selected employee over all inputs for the
/// selected period and projects.
///
/// Previous results are cleared first, so running twice gives the same
/// totals. An employee matched by no row keeps `accumulated == None`; a match
/// with zero hours gives `Some(0.0)`.
pub fn accumulate_hours(
    registry: &mut EmployeeRegistry,
    inputs: &[InputSheet<'_>],
    date: &SelectedDate,
) -> AccumulationSummary {
    registry.reset_accumulation();

    let mut summary = AccumulationSummary::default();
    let mut seen_names: BTreeSet<String> = BTreeSet::new();

    for input in inputs {
        let cols = input.columns;
        let mut matched = 0usize;
        for (row_no, row) in input.grid.rows_from(2) {
            let name = value_at(row, cols.name);
            let project = value_at(row, cols.proj_id);
            let hours = value_at(row, cols.hours);
            let when = value_at(row, cols.date);
            if !(name.is_present() && project.is_present() && hours.is_present() && when.is_present()) {
                continue;
            }
            let name = cell_to_string(name);
            seen_names.insert(name.clone());

            let Some(day) = when.as_date_lenient() else {
                debug!("{} row {}: {:?} is not a date", input.file_name, row_no, when);
                continue;
            };
            if day.month() != date.month || day.year() != date.year {
                continue;
            }
            let project = cell_to_string(project);
            if !input.selected_projects.contains(&project) {
                continue;
            }
            let Some(hours) = hours.as_number() else {
                warn!("{} row {}: hours {:?} are not a number, row skipped", input.file_name, row_no, hours);
                continue;
            };

            for employee in registry.selected_mut().filter(|e| e.name == name) {
                let descriptions = input.catalog.descriptions(&project).unwrap_or(&[]);
                employee.found_projects.merge(&project, descriptions);
                employee.hours.accumulated = Some(employee.hours.accumulated.unwrap_or(0.0) + hours);
                matched += 1;
            }
        }
        debug!("{}: {} matching rows", input.file_name, matched);
        summary.matched_rows.push((input.file_name.to_string(), matched));
    }

    for employee in registry.selected() {
        if employee.hours.accumulated.is_some() {
            continue;
        }
        let suggestion = closest_name(&employee.name, &seen_names);
        match &suggestion.closest {
            Some(closest) => warn!(
                "{} not found in any input; did you mean {} ({:.2})?",
                employee.name, closest, suggestion.similarity
            ),
            None => warn!("{} not found in any input", employee.name),
        }
        summary.unmatched.push(suggestion);
    }

    info!(
        "Accumulated hours for {:02}/{}: {} rows from {} inputs, {} employees missing",
        date.month,
        date.year,
        summary.total_matched_rows(),
        inputs.len(),
        summary.unmatched.len()
    );
    summary
}

fn closest_name(name: &str, candidates: &BTreeSet<String>) -> NameSuggestion {
    let best = candidates
        .iter()
        .map(|c| (c, strsim::jaro_winkler(name, c)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1));
    NameSuggestion {
        employee: name.to_string(),
        closest: best.map(|(c, _)| c.clone()),
        similarity: best.map(|(_, s)| s).unwrap_or(0.0),
    }
}

/// Reads each selected employee's predicted hours at (employee column,
/// budgeting row) and whether that cell already looks recorded.
///
/// Blank cells give `None`. Values that are not numbers are taken as 0.
pub fn compute_predicted_hours(
    registry: &mut EmployeeRegistry,
    handle: &SpreadsheetHandle,
    sheet: &str,
    date: &SelectedDate,
    evaluator: &dyn FormulaEvaluator,
) -> Result<(), LoadError> {
    let coords: Vec<CellRef> = registry.selected().map(|e| e.anchor.with_row(date.row)).collect();
    let values = evaluator.evaluate_cells(handle.path(), sheet, &coords)?;
    let worksheet = handle
        .book()
        .get_sheet_by_name(sheet)
        .ok_or_else(|| LoadError::MissingSheet {
            file_name: handle.file_name().to_string(),
            sheet: sheet.to_string(),
        })?;

    let mut by_coord: HashMap<CellRef, CellValue> = coords.iter().copied().zip(values).collect();
    for employee in registry.selected_mut() {
        let coord = employee.anchor.with_row(date.row);
        let value = by_coord.remove(&coord).unwrap_or_default();
        employee.hours.predicted = match &value {
            CellValue::Empty => None,
            other => Some(other.as_number().unwrap_or_else(|| {
                warn!("Predicted hours {:?} at {} are not a number, using 0", other, coord);
                0.0
            })),
        };
        employee.hours.predicted_already_recorded = hours_look_recorded(worksheet, coord);
        employee.hours.hours_coord = Some(coord);
    }
    Ok(())
}
