// Core data structures

use std::collections::HashMap;

use crate::excel::io::CellRef;

/// Coordinates of the start and end anchor cells of the employee row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl AnchorRange {
    pub fn row(&self) -> u32 {
        self.start.row
    }
}

/// Budgeting period and the output worksheet row that holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedDate {
    pub month: u32,
    pub year: i32,
    pub row: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deviation {
    /// Both predicted and accumulated are zero.
    NotApplicable,
    Negligible,
    Weak,
    Strong,
}

impl Deviation {
    pub fn label(self) -> &'static str {
        match self {
            Deviation::NotApplicable => " ",
            Deviation::Negligible => "Negligible",
            Deviation::Weak => "Weak deviation",
            Deviation::Strong => "Warning! Strong deviation!",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeHours {
    pub predicted: Option<f64>,
    /// The predicted hours cell is already in the "booked" font colour.
    pub predicted_already_recorded: bool,
    /// `None` means the employee was found in no input row.
    pub accumulated: Option<f64>,
    pub hours_coord: Option<CellRef>,
    pub deviation: Option<Deviation>,
}

/// An employee selected from the output worksheet's employee row.
#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    pub name: String,
    pub anchor: CellRef,
    /// Projects that contributed hours, with their descriptions.
    pub found_projects: ProjectCatalog,
    pub hours: EmployeeHours,
}

impl Employee {
    pub fn new(name: &str, anchor: CellRef) -> Self {
        Employee {
            name: name.to_string(),
            anchor,
            found_projects: ProjectCatalog::default(),
            hours: EmployeeHours::default(),
        }
    }

    /// Clears everything derived from the inputs so accumulation can start
    /// over.
    pub fn reset_accumulation(&mut self) {
        self.found_projects = ProjectCatalog::default();
        self.hours.accumulated = None;
        self.hours.deviation = None;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectCatalogEntry {
    pub project_id: String,
    pub descriptions: Vec<String>,
}

/// Project id -> unique descriptions, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectCatalog {
    entries: Vec<ProjectCatalogEntry>,
    index: HashMap<String, usize>,
}

impl ProjectCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a description under a project id, skipping duplicates.
    pub fn add(&mut self, project_id: &str, description: &str) {
        let idx = match self.index.get(project_id) {
            Some(idx) => *idx,
            None => {
                self.entries.push(ProjectCatalogEntry {
                    project_id: project_id.to_string(),
                    descriptions: Vec::new(),
                });
                self.index.insert(project_id.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        let descriptions = &mut self.entries[idx].descriptions;
        if !descriptions.iter().any(|d| d == description) {
            descriptions.push(description.to_string());
        }
    }

    /// Merges all descriptions of `project_id`.
    pub fn merge(&mut self, project_id: &str, descriptions: &[String]) {
        if descriptions.is_empty() && !self.contains(project_id) {
            self.entries.push(ProjectCatalogEntry {
                project_id: project_id.to_string(),
                descriptions: Vec::new(),
            });
            self.index.insert(project_id.to_string(), self.entries.len() - 1);
        }
        for description in descriptions {
            self.add(project_id, description);
        }
    }

    pub fn contains(&self, project_id: &str) -> bool {
        self.index.contains_key(project_id)
    }

    pub fn descriptions(&self, project_id: &str) -> Option<&[String]> {
        self.index
            .get(project_id)
            .map(|idx| self.entries[*idx].descriptions.as_slice())
    }

    pub fn project_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.project_id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
