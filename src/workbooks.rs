//! Workbooks tracked by a reconciliation session.
//!
//! Inputs and the output share an id space and a duplicate check, but carry
//! different state, so they are one tagged union rather than a hierarchy.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::algorithm::headers::{FilterColumns, WorksheetIndex, index_headers};
use crate::algorithm::hours::InputSheet;
use crate::algorithm::projects::build_project_catalog;
use crate::algorithm::registry::EmployeeRegistry;
use crate::config::{Config, LocaleProfile};
use crate::error::{Error, LoadError, StructureError};
use crate::excel::io::{SheetGrid, read_sheet_from};
use crate::excel::loader::{SpreadsheetHandle, file_name_of, open_calamine};
use crate::models::{AnchorRange, ProjectCatalog, SelectedDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkbookId(pub u64);

impl fmt::Display for WorkbookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A timesheet from one country, read once and kept in memory.
#[derive(Debug, Clone)]
pub struct InputWorkbook {
    pub path: PathBuf,
    pub file_name: String,
    pub locale: LocaleProfile,
    pub sheet_names: Vec<String>,
    pub grid: SheetGrid,
    pub index: WorksheetIndex,
    pub columns: FilterColumns,
    pub catalog: ProjectCatalog,
    /// Keys into `catalog`.
    pub selected_projects: BTreeSet<String>,
}

impl InputWorkbook {
    /// Identifies the locale from the file name, picks the worksheet and
    /// indexes it. A workbook with a single worksheet uses that one,
    /// otherwise the locale's expected worksheet name must exist.
    pub fn open(path: &Path, config: &Config) -> Result<InputWorkbook, Error> {
        let file_name = file_name_of(path);
        let locale = config.origin_from_file_name(&file_name)?.clone();
        let mut workbook = open_calamine(path)?;
        let sheet_names = calamine::Reader::sheet_names(&workbook).to_owned();
        let sheet = match sheet_names.as_slice() {
            [only] => only.clone(),
            _ => locale.exp_sheet_name.clone(),
        };
        let grid = read_sheet_from(&mut workbook, &file_name, &sheet)?;
        let index = index_headers(&grid);
        let columns = index.resolve(&locale.filter_headers, &file_name)?;
        let catalog = build_project_catalog(&grid, &columns);
        info!(
            "Opened input {} ({}, sheet {}, {} projects)",
            file_name,
            locale.country,
            sheet,
            catalog.len()
        );
        Ok(InputWorkbook {
            path: path.to_path_buf(),
            file_name,
            locale,
            sheet_names,
            grid,
            index,
            columns,
            catalog,
            selected_projects: BTreeSet::new(),
        })
    }

    /// Replaces the project selection. Nothing changes if any id is unknown.
    pub fn select_projects<I, S>(&mut self, project_ids: I) -> Result<(), StructureError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selection = BTreeSet::new();
        for id in project_ids {
            let id = id.as_ref();
            if !self.catalog.contains(id) {
                return Err(StructureError::UnknownProject {
                    project_id: id.to_string(),
                    file_name: self.file_name.clone(),
                });
            }
            selection.insert(id.to_string());
        }
        debug!("{}: {} projects selected", self.file_name, selection.len());
        self.selected_projects = selection;
        Ok(())
    }

    pub fn select_all_projects(&mut self) {
        self.selected_projects = self.catalog.project_ids().map(str::to_string).collect();
    }

    pub fn as_input_sheet(&self) -> InputSheet<'_> {
        InputSheet {
            file_name: &self.file_name,
            grid: &self.grid,
            columns: self.columns,
            catalog: &self.catalog,
            selected_projects: &self.selected_projects,
        }
    }
}

/// The budgeting workbook. Selection state is filled in step by step:
/// worksheet, then anchors and employees, then the budgeting date.
#[derive(Debug)]
pub struct OutputWorkbook {
    pub handle: SpreadsheetHandle,
    pub selected_sheet: Option<String>,
    pub grid: Option<SheetGrid>,
    pub anchor_range: Option<AnchorRange>,
    pub selected_date: Option<SelectedDate>,
    pub registry: EmployeeRegistry,
}

impl OutputWorkbook {
    pub fn open(path: &Path) -> Result<OutputWorkbook, LoadError> {
        Ok(OutputWorkbook {
            handle: SpreadsheetHandle::open(path)?,
            selected_sheet: None,
            grid: None,
            anchor_range: None,
            selected_date: None,
            registry: EmployeeRegistry::default(),
        })
    }

    /// Forgets everything derived from the previously selected worksheet.
    pub fn clear_selection(&mut self) {
        self.selected_sheet = None;
        self.grid = None;
        self.anchor_range = None;
        self.selected_date = None;
        self.registry = EmployeeRegistry::default();
    }

    pub fn require_sheet(&self) -> Result<&str, StructureError> {
        self.selected_sheet
            .as_deref()
            .ok_or_else(|| StructureError::NoOutputSheet(self.handle.file_name().to_string()))
    }

    pub fn require_date(&self) -> Result<SelectedDate, StructureError> {
        self.selected_date
            .ok_or_else(|| StructureError::NoBudgetingDate(self.handle.file_name().to_string()))
    }
}

#[derive(Debug)]
pub enum ManagedWorkbook {
    Input(InputWorkbook),
    Output(OutputWorkbook),
}

impl ManagedWorkbook {
    pub fn path(&self) -> &Path {
        match self {
            ManagedWorkbook::Input(input) => &input.path,
            ManagedWorkbook::Output(output) => output.handle.path(),
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            ManagedWorkbook::Input(input) => &input.file_name,
            ManagedWorkbook::Output(output) => output.handle.file_name(),
        }
    }

    pub fn is_output(&self) -> bool {
        matches!(self, ManagedWorkbook::Output(_))
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[derive(Debug, Default)]
pub struct WorkbookManager {
    next_id: u64,
    workbooks: BTreeMap<WorkbookId, ManagedWorkbook>,
}

impl WorkbookManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks that a file may be added before it is opened.
    pub fn check_can_add(&self, path: &Path, as_output: bool) -> Result<(), StructureError> {
        if self.workbooks.values().any(|w| same_file(w.path(), path)) {
            return Err(StructureError::FileAlreadySelected(file_name_of(path)));
        }
        if as_output && self.output().is_some() {
            return Err(StructureError::TooManyOutputFiles);
        }
        Ok(())
    }

    /// Tracks a workbook under a fresh id.
    pub fn add(&mut self, workbook: ManagedWorkbook) -> Result<WorkbookId, StructureError> {
        let id = WorkbookId(self.next_id);
        self.insert_at(id, workbook)?;
        Ok(id)
    }

    /// Tracks a workbook under a given id, e.g. when a removed row is put back.
    pub fn insert_at(&mut self, id: WorkbookId, workbook: ManagedWorkbook) -> Result<(), StructureError> {
        if self.workbooks.contains_key(&id) {
            return Err(StructureError::WorkbookAlreadyTracked(workbook.file_name().to_string()));
        }
        self.check_can_add(workbook.path(), workbook.is_output())?;
        debug!("Tracking {} as {}", workbook.file_name(), id);
        self.workbooks.insert(id, workbook);
        self.next_id = self.next_id.max(id.0 + 1);
        Ok(())
    }

    pub fn remove(&mut self, id: WorkbookId) -> Result<ManagedWorkbook, StructureError> {
        let removed = self
            .workbooks
            .remove(&id)
            .ok_or(StructureError::UnknownWorkbook(id.0))?;
        info!("Released {}", removed.file_name());
        Ok(removed)
    }

    pub fn get(&self, id: WorkbookId) -> Option<&ManagedWorkbook> {
        self.workbooks.get(&id)
    }

    pub fn len(&self) -> usize {
        self.workbooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workbooks.is_empty()
    }

    pub fn inputs(&self) -> impl Iterator<Item = (WorkbookId, &InputWorkbook)> {
        self.workbooks.iter().filter_map(|(id, w)| match w {
            ManagedWorkbook::Input(input) => Some((*id, input)),
            ManagedWorkbook::Output(_) => None,
        })
    }

    pub fn input_mut(&mut self, id: WorkbookId) -> Result<&mut InputWorkbook, StructureError> {
        match self.workbooks.get_mut(&id) {
            Some(ManagedWorkbook::Input(input)) => Ok(input),
            _ => Err(StructureError::UnknownWorkbook(id.0)),
        }
    }

    pub fn output(&self) -> Option<(WorkbookId, &OutputWorkbook)> {
        self.workbooks.iter().find_map(|(id, w)| match w {
            ManagedWorkbook::Output(output) => Some((*id, output)),
            ManagedWorkbook::Input(_) => None,
        })
    }

    pub fn output_mut(&mut self) -> Result<&mut OutputWorkbook, StructureError> {
        self.workbooks
            .values_mut()
            .find_map(|w| match w {
                ManagedWorkbook::Output(output) => Some(output),
                ManagedWorkbook::Input(_) => None,
            })
            .ok_or(StructureError::NoOutputWorkbook)
    }

    /// Output workbook and all inputs at once, for runs that read the inputs
    /// while updating the output's registry.
    pub fn split_mut(&mut self) -> Result<(&mut OutputWorkbook, Vec<&InputWorkbook>), StructureError> {
        let mut output = None;
        let mut inputs = Vec::new();
        for workbook in self.workbooks.values_mut() {
            match workbook {
                ManagedWorkbook::Output(o) => output = Some(o),
                ManagedWorkbook::Input(i) => inputs.push(&*i),
            }
        }
        Ok((output.ok_or(StructureError::NoOutputWorkbook)?, inputs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(path: &str) -> ManagedWorkbook {
        ManagedWorkbook::Input(InputWorkbook {
            path: PathBuf::from(path),
            file_name: file_name_of(Path::new(path)),
            locale: LocaleProfile {
                file_type: "timesheet".to_string(),
                file_patterns: vec!["zeiten".to_string()],
                country: "Germany".to_string(),
                exp_sheet_name: "Zeiten".to_string(),
                filter_headers: crate::config::FilterHeaders {
                    name: "Mitarbeiter".to_string(),
                    proj_id: "PSP-Element".to_string(),
                    description: "Bezeichnung".to_string(),
                    hours: "Stunden".to_string(),
                    date: "Datum".to_string(),
                },
            },
            sheet_names: vec!["Zeiten".to_string()],
            grid: SheetGrid::default(),
            index: WorksheetIndex::default(),
            columns: FilterColumns {
                name: 0,
                proj_id: 1,
                description: 2,
                hours: 3,
                date: 4,
            },
            catalog: {
                let mut c = ProjectCatalog::new();
                c.add("PSP1", "Kickoff");
                c
            },
            selected_projects: BTreeSet::new(),
        })
    }

    #[test]
    fn duplicate_paths_and_ids_are_rejected() {
        let mut manager = WorkbookManager::new();
        let id = manager.add(input("/data/zeiten_de_a.xlsx")).unwrap();
        assert_eq!(
            manager.add(input("/data/zeiten_de_a.xlsx")).unwrap_err(),
            StructureError::FileAlreadySelected("zeiten_de_a.xlsx".to_string())
        );
        assert_eq!(
            manager.insert_at(id, input("/data/zeiten_de_b.xlsx")).unwrap_err(),
            StructureError::WorkbookAlreadyTracked("zeiten_de_b.xlsx".to_string())
        );
        let second = manager.add(input("/data/zeiten_de_b.xlsx")).unwrap();
        assert_ne!(id, second);
        assert_eq!(manager.inputs().count(), 2);
    }

    #[test]
    fn remove_releases_the_path() {
        let mut manager = WorkbookManager::new();
        let id = manager.add(input("/data/zeiten_de.xlsx")).unwrap();
        manager.remove(id).unwrap();
        assert_eq!(manager.remove(id).unwrap_err(), StructureError::UnknownWorkbook(id.0));
        assert!(manager.add(input("/data/zeiten_de.xlsx")).is_ok());
        assert!(matches!(manager.output_mut(), Err(StructureError::NoOutputWorkbook)));
    }

    #[test]
    fn project_selection_is_validated() {
        let ManagedWorkbook::Input(mut wb) = input("/data/zeiten_de.xlsx") else {
            unreachable!()
        };
        wb.select_projects(["PSP1"]).unwrap();
        assert!(wb.selected_projects.contains("PSP1"));
        assert!(matches!(
            wb.select_projects(["PSP1", "PSP7"]),
            Err(StructureError::UnknownProject { .. })
        ));
        assert_eq!(wb.selected_projects.len(), 1);
        wb.select_projects(Vec::<String>::new()).unwrap();
        assert!(wb.selected_projects.is_empty());
        wb.select_all_projects();
        assert_eq!(wb.as_input_sheet().selected_projects.len(), 1);
    }
}
