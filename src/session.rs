//! The reconciliation session: the one object a front end talks to.
//!
//! It owns the configuration, every tracked workbook, the formula evaluator
//! and the scan caches. Calls are synchronous and happen in wizard order:
//! add files, pick the output worksheet and date, pick projects and
//! employees, compute, commit.

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::algorithm::anchors::{employees_in_anchor_row, locate_employee_anchors};
use crate::algorithm::dates::{match_budgeting_date, scan_budgeting_dates};
use crate::algorithm::deviation::classify_registry;
use crate::algorithm::hours::{AccumulationSummary, InputSheet, accumulate_hours, compute_predicted_hours};
use crate::algorithm::registry::EmployeeRegistry;
use crate::config::Config;
use crate::error::{LoadError, Result, StructureError};
use crate::excel::cache::{ScanKey, SingleEntryCache};
use crate::excel::evaluate::{CachedResultEvaluator, EngineEvaluator, FormulaEvaluator};
use crate::excel::io::CellRef;
use crate::excel::writer::write_accumulated_hours;
use crate::models::{AnchorRange, Employee, SelectedDate};
use crate::report::{ReportMeta, ReportRow, write_report};
use crate::workbooks::{InputWorkbook, ManagedWorkbook, OutputWorkbook, WorkbookId, WorkbookManager};

/// Outcome of [`ReconciliationSession::commit`].
#[derive(Debug, Clone, PartialEq)]
pub struct CommitOutcome {
    pub cells_written: usize,
    pub report_path: PathBuf,
}

pub struct ReconciliationSession {
    config: Config,
    manager: WorkbookManager,
    evaluator: Box<dyn FormulaEvaluator>,
    anchor_cache: SingleEntryCache<AnchorRange>,
    date_cache: SingleEntryCache<Vec<SelectedDate>>,
}

impl ReconciliationSession {
    pub fn new(config: Config, evaluator: Box<dyn FormulaEvaluator>) -> Self {
        ReconciliationSession {
            config,
            manager: WorkbookManager::new(),
            evaluator,
            anchor_cache: SingleEntryCache::new(),
            date_cache: SingleEntryCache::new(),
        }
    }

    /// Session computing formula cells with the embedded engine.
    pub fn with_formula_engine(config: Config) -> Self {
        Self::new(config, Box::new(EngineEvaluator))
    }

    /// Session reading only the formula results stored in the workbooks.
    pub fn with_cached_results(config: Config) -> Self {
        Self::new(config, Box::new(CachedResultEvaluator))
    }

    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::with_formula_engine(Config::load(path)?))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn workbooks(&self) -> &WorkbookManager {
        &self.manager
    }

    /// Adds an input timesheet. The locale comes from the file name.
    pub fn open_input<P: AsRef<Path>>(&mut self, path: P) -> Result<WorkbookId> {
        let path = path.as_ref();
        self.manager.check_can_add(path, false)?;
        let input = InputWorkbook::open(path, &self.config)?;
        Ok(self.manager.add(ManagedWorkbook::Input(input))?)
    }

    pub fn input(&self, id: WorkbookId) -> Result<&InputWorkbook> {
        match self.manager.get(id) {
            Some(ManagedWorkbook::Input(input)) => Ok(input),
            _ => Err(StructureError::UnknownWorkbook(id.0).into()),
        }
    }

    /// Adds the budgeting workbook. Only one may be tracked at a time.
    pub fn open_output<P: AsRef<Path>>(&mut self, path: P) -> Result<WorkbookId> {
        let path = path.as_ref();
        self.manager.check_can_add(path, true)?;
        let output = OutputWorkbook::open(path)?;
        Ok(self.manager.add(ManagedWorkbook::Output(output))?)
    }

    pub fn output(&self) -> Result<&OutputWorkbook> {
        self.manager
            .output()
            .map(|(_, output)| output)
            .ok_or_else(|| StructureError::NoOutputWorkbook.into())
    }

    /// Stops tracking a workbook and drops every cached scan of it.
    pub fn remove(&mut self, id: WorkbookId) -> Result<()> {
        let removed = self.manager.remove(id)?;
        self.anchor_cache.invalidate_path(removed.path());
        self.date_cache.invalidate_path(removed.path());
        Ok(())
    }

    /// Selects the output worksheet, locates its employee row and lists the
    /// employees found there. Earlier date and employee choices are dropped.
    pub fn select_output_sheet(&mut self, sheet: &str) -> Result<&[(String, CellRef)]> {
        let anchors = &self.config.row_anchors;
        let output = self.manager.output_mut()?;
        if output.selected_sheet.as_deref() != Some(sheet) {
            self.anchor_cache.invalidate();
            self.date_cache.invalidate();
        }
        output.clear_selection();
        if !output.handle.has_sheet(sheet) {
            return Err(LoadError::MissingSheet {
                file_name: output.handle.file_name().to_string(),
                sheet: sheet.to_string(),
            }
            .into());
        }

        let grid = output.handle.load_grid(sheet)?;
        let key = ScanKey::new(
            output.handle.path().to_path_buf(),
            sheet,
            &[anchors.start_anchor.as_str(), anchors.end_anchor.as_str()],
        );
        let range = self
            .anchor_cache
            .get_or_try_insert_with(key, || locate_employee_anchors(&grid, anchors))?;
        let employees = employees_in_anchor_row(&grid, &range);
        info!(
            "{} [{}]: {} employees between {} and {}",
            output.handle.file_name(),
            sheet,
            employees.len(),
            range.start,
            range.end
        );

        output.registry = EmployeeRegistry::new(sheet, employees);
        output.anchor_range = Some(range);
        output.grid = Some(grid);
        output.selected_sheet = Some(sheet.to_string());
        Ok(output.registry.available())
    }

    /// Resolves the row of the budgeting period in the selected worksheet.
    /// `month` is a short month name, `year` as typed by the user.
    pub fn select_budgeting_date(&mut self, month: &str, year: &str) -> Result<SelectedDate> {
        let column = &self.config.budgeting_dates;
        let language = self.config.month_language;
        let evaluator = &*self.evaluator;
        let output = self.manager.output_mut()?;
        let sheet = output.require_sheet()?.to_string();
        let path = output.handle.path().to_path_buf();
        let start_row = column.start_row.to_string();
        output.selected_date = None;

        let key = ScanKey::new(path.clone(), &sheet, &[column.column.as_str(), start_row.as_str()]);
        let dates = self
            .date_cache
            .get_or_try_insert_with(key, || scan_budgeting_dates(evaluator, &path, &sheet, column))?;
        let selected = match_budgeting_date(&dates, month, year, language, &sheet, output.handle.file_name())?;
        info!("Budgeting date {} {} is row {} of {}", month, year, selected.row, sheet);
        output.selected_date = Some(selected);
        Ok(selected)
    }

    pub fn select_projects<I, S>(&mut self, id: WorkbookId, project_ids: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(self.manager.input_mut(id)?.select_projects(project_ids)?)
    }

    pub fn select_all_projects(&mut self, id: WorkbookId) -> Result<()> {
        self.manager.input_mut(id)?.select_all_projects();
        Ok(())
    }

    pub fn available_employees(&self) -> Result<&[(String, CellRef)]> {
        Ok(self.output()?.registry.available())
    }

    pub fn select_employee(&mut self, name: &str) -> Result<()> {
        let output = self.manager.output_mut()?;
        output.require_sheet()?;
        output.registry.select(name)?;
        Ok(())
    }

    /// Selects the employee named in cell `anchor` of the employee row. Needed
    /// when the same name appears in more than one column.
    pub fn select_employee_at(&mut self, anchor: CellRef) -> Result<()> {
        let output = self.manager.output_mut()?;
        output.require_sheet()?;
        output.registry.select_at(anchor)?;
        Ok(())
    }

    pub fn deselect_employee(&mut self, name: &str) -> Result<bool> {
        Ok(self.manager.output_mut()?.registry.deselect(name))
    }

    pub fn deselect_employee_at(&mut self, anchor: CellRef) -> Result<bool> {
        Ok(self.manager.output_mut()?.registry.deselect_at(anchor))
    }

    pub fn selected_employees(&self) -> Result<Vec<&Employee>> {
        Ok(self.output()?.registry.selected().collect())
    }

    /// Reads predicted hours, accumulates hours from every input and
    /// classifies the deviation of each selected employee. Safe to repeat.
    pub fn compute(&mut self) -> Result<AccumulationSummary> {
        let (output, inputs) = self.manager.split_mut()?;
        let sheet = output.require_sheet()?.to_string();
        let date = output.require_date()?;

        compute_predicted_hours(&mut output.registry, &output.handle, &sheet, &date, &*self.evaluator)?;
        let sheets: Vec<InputSheet<'_>> = inputs.iter().map(|input| input.as_input_sheet()).collect();
        let summary = accumulate_hours(&mut output.registry, &sheets, &date);
        classify_registry(&mut output.registry, &self.config.deviations);
        debug!("Computed {} employees", output.registry.selected().count());
        Ok(summary)
    }

    /// The summary table as it will appear in the report.
    pub fn summary_rows(&self) -> Result<Vec<ReportRow>> {
        Ok(self
            .output()?
            .registry
            .selected()
            .map(ReportRow::from_employee)
            .collect())
    }

    /// Writes the accumulated hours into the output workbook, saves it and
    /// writes the text report next to it.
    pub fn commit(&mut self) -> Result<CommitOutcome> {
        let input_workbooks: Vec<String> = self
            .manager
            .inputs()
            .map(|(_, input)| input.file_name.clone())
            .collect();
        let language = self.config.month_language;
        let output = self.manager.output_mut()?;
        let sheet = output.require_sheet()?.to_string();
        let date = output.require_date()?;

        let cells_written = write_accumulated_hours(&mut output.handle, &sheet, &output.registry, date.row)?;
        self.date_cache.invalidate_path(output.handle.path());

        let meta = ReportMeta {
            selected_date: date,
            language,
            input_workbooks,
            output_file_name: output.handle.file_name().to_string(),
            output_worksheet: sheet,
        };
        let dir = output
            .handle
            .path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let report_path = write_report(&dir, &meta, output.registry.selected())?;
        Ok(CommitOutcome {
            cells_written,
            report_path,
        })
    }
}

impl std::fmt::Debug for ReconciliationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationSession")
            .field("workbooks", &self.manager.len())
            .field("anchor_cache", &self.anchor_cache.stats())
            .field("date_cache", &self.date_cache.stats())
            .finish()
    }
}
