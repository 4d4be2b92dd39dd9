mod common;

use project_hours_budgeting::algorithm::{
    EmployeeRegistry, employees_in_anchor_row, locate_employee_anchors, resolve_budgeting_row,
};
use project_hours_budgeting::config::BudgetingDateColumn;
use project_hours_budgeting::error::{Error, LoadError};
use project_hours_budgeting::excel::evaluate::{CachedResultEvaluator, EngineEvaluator, FormulaEvaluator};
use project_hours_budgeting::excel::{CellRef, CellValue, SpreadsheetHandle, read_sheet, write_accumulated_hours};
use project_hours_budgeting::months::MonthLanguage;

#[test]
fn anchors_found_in_written_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::budget_workbook(dir.path());
    let grid = read_sheet(&path, "Budget").unwrap();
    let config = common::config();
    let range = locate_employee_anchors(&grid, &config.row_anchors).unwrap();
    assert_eq!(range.start, CellRef::new(2, 5));
    assert_eq!(range.end, CellRef::new(6, 5));
    assert_eq!(employees_in_anchor_row(&grid, &range).len(), 3);
}

#[test]
fn budgeting_row_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::budget_workbook(dir.path());
    let evaluator = CachedResultEvaluator;
    let column = BudgetingDateColumn::default();

    let dec = resolve_budgeting_row(&evaluator, &path, "Budget", &column, "Dez", "2025", MonthLanguage::De).unwrap();
    assert_eq!((dec.month, dec.year, dec.row), (12, 2025, 19));

    match resolve_budgeting_row(&evaluator, &path, "Budget", &column, "Jan", "2024", MonthLanguage::En) {
        Err(Error::DateNotFound(e)) => {
            assert_eq!(e.to_string(), "Jan or 2024 not found in sheet Budget of file budget_2025.xlsx.");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn evaluator_reads_stored_results() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::budget_workbook(dir.path());
    let evaluator = CachedResultEvaluator;
    let values = evaluator
        .evaluate_cells(&path, "Budget", &[CellRef::new(3, 10), CellRef::new(5, 10)])
        .unwrap();
    assert_eq!(values, vec![CellValue::Number(8.0), CellValue::Empty]);

    let column = evaluator.evaluate_column_down(&path, "Budget", CellRef::new(1, 8)).unwrap();
    assert_eq!(column.len(), 12);
    assert!(column.iter().all(|(_, v)| v.as_datetime().is_some()));

    let below = evaluator.evaluate_column_down(&path, "Budget", CellRef::new(1, 30)).unwrap();
    assert_eq!(below, vec![(30, CellValue::Empty)]);
}

#[test]
fn formula_dates_are_computed() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::formula_budget_workbook(dir.path());
    let column = BudgetingDateColumn::default();

    let feb = resolve_budgeting_row(&EngineEvaluator, &path, "Budget", &column, "Feb", "2025", MonthLanguage::En).unwrap();
    assert_eq!((feb.month, feb.year, feb.row), (2, 2025, 9));
    let dec = resolve_budgeting_row(&EngineEvaluator, &path, "Budget", &column, "Dec", "2025", MonthLanguage::En).unwrap();
    assert_eq!(dec.row, 19);

    // Nothing was stored for the formulas, so reading stored results fails.
    assert!(matches!(
        resolve_budgeting_row(&CachedResultEvaluator, &path, "Budget", &column, "Feb", "2025", MonthLanguage::En),
        Err(Error::DateNotFound(_))
    ));
}

#[test]
fn formula_hours_are_computed() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::formula_budget_workbook(dir.path());
    let values = EngineEvaluator
        .evaluate_cells(&path, "Budget", &[CellRef::new(3, 10), CellRef::new(4, 10), CellRef::new(5, 10)])
        .unwrap();
    assert_eq!(values, vec![CellValue::Number(8.0), CellValue::Number(2.0), CellValue::Empty]);

    let column = EngineEvaluator.evaluate_column_down(&path, "Budget", CellRef::new(1, 8)).unwrap();
    assert_eq!(column.len(), 12);
    assert!(column.iter().all(|(_, v)| v.as_datetime().is_some()));
}

#[test]
fn engine_reads_plain_values_as_stored() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::budget_workbook(dir.path());
    let values = EngineEvaluator
        .evaluate_cells(&path, "Budget", &[CellRef::new(3, 10), CellRef::new(3, 5)])
        .unwrap();
    assert_eq!(values, vec![CellValue::Number(8.0), CellValue::from("Jasmin Hindersmann")]);
    assert!(matches!(
        EngineEvaluator.evaluate_cells(&path, "Missing", &[CellRef::new(1, 1)]),
        Err(LoadError::MissingSheet { .. })
    ));
}

#[test]
fn writing_twice_gives_the_same_cell() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::budget_workbook(dir.path());
    let mut handle = SpreadsheetHandle::open(&path).unwrap();
    let mut registry = EmployeeRegistry::new("Budget", vec![("Jasmin Hindersmann".to_string(), CellRef::new(3, 5))]);
    registry.select("Jasmin Hindersmann").unwrap().hours.accumulated = Some(7.25);

    assert_eq!(write_accumulated_hours(&mut handle, "Budget", &registry, 10).unwrap(), 1);
    assert_eq!(write_accumulated_hours(&mut handle, "Budget", &registry, 10).unwrap(), 1);

    let grid = read_sheet(&path, "Budget").unwrap();
    assert_eq!(grid.cell(CellRef::new(3, 10)).as_number(), Some(7.25));
    assert!(grid.cell(CellRef::new(1, 10)).as_datetime().is_some());
}
