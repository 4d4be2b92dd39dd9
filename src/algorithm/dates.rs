//! Budgeting period lookup in the output worksheet.
//!
//! The date column usually holds formulas (`=EDATE(A8;1)` and the like), so
//! values go through the [`FormulaEvaluator`] rather than the loaded grid.

use std::path::Path;

use log::{debug, info};

use crate::config::BudgetingDateColumn;
use crate::error::{DateNotFoundError, Error, LoadError};
use crate::excel::evaluate::FormulaEvaluator;
use crate::excel::io::{CellRef, month_year};
use crate::excel::loader::file_name_of;
use crate::models::SelectedDate;
use crate::months::MonthLanguage;

/// (month, year, row) of every date-typed cell from the configured start
/// cell down to the first empty cell, top to bottom.
pub fn scan_budgeting_dates(
    evaluator: &dyn FormulaEvaluator,
    path: &Path,
    sheet: &str,
    column: &BudgetingDateColumn,
) -> Result<Vec<SelectedDate>, LoadError> {
    let col = crate::excel::column_letters_to_index(&column.column) as u32;
    let start = CellRef::new(col, column.start_row);
    let dates: Vec<SelectedDate> = evaluator
        .evaluate_column_down(path, sheet, start)?
        .into_iter()
        .filter_map(|(row, value)| {
            let (month, year) = month_year(value.as_datetime()?.date());
            Some(SelectedDate { month, year, row })
        })
        .collect();
    debug!("{} budgeting dates below {} in {}", dates.len(), start, sheet);
    Ok(dates)
}

/// First scanned date matching the requested month abbreviation and year.
///
/// An unknown month name or a year that is not a number can never match and
/// fails the same way as a missing row.
pub fn match_budgeting_date(
    dates: &[SelectedDate],
    month: &str,
    year: &str,
    language: MonthLanguage,
    sheet: &str,
    file_name: &str,
) -> Result<SelectedDate, DateNotFoundError> {
    let wanted_month = language.month_from_abbr(month);
    let wanted_year = year.trim().parse::<i32>().ok();
    if let (Some(m), Some(y)) = (wanted_month, wanted_year) {
        if let Some(found) = dates.iter().find(|d| d.month == m && d.year == y) {
            return Ok(*found);
        }
    }
    Err(DateNotFoundError {
        month: month.to_string(),
        year: year.to_string(),
        sheet: sheet.to_string(),
        file_name: file_name.to_string(),
    })
}

/// Scans the date column of `sheet` and resolves the row of `month`/`year`.
pub fn resolve_budgeting_row(
    evaluator: &dyn FormulaEvaluator,
    path: &Path,
    sheet: &str,
    column: &BudgetingDateColumn,
    month: &str,
    year: &str,
    language: MonthLanguage,
) -> Result<SelectedDate, Error> {
    let dates = scan_budgeting_dates(evaluator, path, sheet, column)?;
    let selected = match_budgeting_date(&dates, month, year, language, sheet, &file_name_of(path))?;
    info!("Budgeting date {} {} is row {} of {}", month, year, selected.row, sheet);
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates() -> Vec<SelectedDate> {
        vec![
            SelectedDate { month: 1, year: 2025, row: 8 },
            SelectedDate { month: 2, year: 2025, row: 9 },
            SelectedDate { month: 3, year: 2025, row: 10 },
            SelectedDate { month: 3, year: 2025, row: 11 },
        ]
    }

    #[test]
    fn first_match_top_to_bottom() {
        let found = match_budgeting_date(&dates(), "Mar", "2025", MonthLanguage::En, "Budget", "b.xlsx").unwrap();
        assert_eq!(found.row, 10);
        let found = match_budgeting_date(&dates(), "März", "2025", MonthLanguage::De, "Budget", "b.xlsx").unwrap();
        assert_eq!(found.row, 10);
    }

    #[test]
    fn missing_period_names_request() {
        let err = match_budgeting_date(&dates(), "Mar", "2031", MonthLanguage::En, "Budget", "b.xlsx").unwrap_err();
        assert_eq!(err.year, "2031");
        assert_eq!(err.sheet, "Budget");
        assert!(match_budgeting_date(&dates(), "Foo", "2025", MonthLanguage::En, "Budget", "b.xlsx").is_err());
        assert!(match_budgeting_date(&dates(), "Jan", "twenty", MonthLanguage::En, "Budget", "b.xlsx").is_err());
    }
}
