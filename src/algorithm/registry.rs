use log::debug;

use crate::error::StructureError;
use crate::excel::io::CellRef;
use crate::models::Employee;

/// Employees of one output worksheet: everyone in the anchor row, and the
/// subset the user selected for reconciliation.
#[derive(Debug, Clone, Default)]
pub struct EmployeeRegistry {
    sheet_name: String,
    available: Vec<(String, CellRef)>,
    selected: Vec<Employee>,
}

impl EmployeeRegistry {
    pub fn new(sheet_name: &str, available: Vec<(String, CellRef)>) -> Self {
        EmployeeRegistry {
            sheet_name: sheet_name.to_string(),
            available,
            selected: Vec::new(),
        }
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Names found in the anchor row, left to right.
    pub fn available(&self) -> &[(String, CellRef)] {
        &self.available
    }

    /// Selects an employee by name. When the name appears more than once in
    /// the anchor row, the leftmost column is taken; use [`Self::select_at`]
    /// for the others. Selecting twice keeps the existing state.
    pub fn select(&mut self, name: &str) -> Result<&mut Employee, StructureError> {
        let anchor = self
            .available
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, anchor)| *anchor)
            .ok_or_else(|| StructureError::EmployeeNotFound {
                name: name.to_string(),
                sheet: self.sheet_name.clone(),
            })?;
        self.select_at(anchor)
    }

    /// Selects the employee whose name sits in cell `anchor` of the anchor
    /// row.
    pub fn select_at(&mut self, anchor: CellRef) -> Result<&mut Employee, StructureError> {
        if let Some(idx) = self.selected.iter().position(|e| e.anchor == anchor) {
            return Ok(&mut self.selected[idx]);
        }
        let (name, _) = self
            .available
            .iter()
            .find(|(_, candidate)| *candidate == anchor)
            .ok_or_else(|| StructureError::EmployeeNotFound {
                name: anchor.to_string(),
                sheet: self.sheet_name.clone(),
            })?;
        debug!("Selected {} at {}", name, anchor);
        self.selected.push(Employee::new(name, anchor));
        let last = self.selected.len() - 1;
        Ok(&mut self.selected[last])
    }

    pub fn select_all(&mut self) {
        let anchors: Vec<CellRef> = self.available.iter().map(|(_, a)| *a).collect();
        for anchor in anchors {
            // every anchor comes from `available`, so this cannot fail
            let _ = self.select_at(anchor);
        }
    }

    /// Drops every selected employee with this name and everything computed
    /// for them.
    pub fn deselect(&mut self, name: &str) -> bool {
        let before = self.selected.len();
        self.selected.retain(|e| e.name != name);
        before != self.selected.len()
    }

    pub fn deselect_at(&mut self, anchor: CellRef) -> bool {
        let before = self.selected.len();
        self.selected.retain(|e| e.anchor != anchor);
        before != self.selected.len()
    }

    pub fn get(&self, name: &str) -> Option<&Employee> {
        self.selected.iter().find(|e| e.name == name)
    }

    pub fn selected(&self) -> impl Iterator<Item = &Employee> {
        self.selected.iter()
    }

    pub fn selected_mut(&mut self) -> impl Iterator<Item = &mut Employee> {
        self.selected.iter_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn reset_accumulation(&mut self) {
        for employee in &mut self.selected {
            employee.reset_accumulation();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> EmployeeRegistry {
        EmployeeRegistry::new(
            "Budget",
            vec![
                ("Jasmin Hindersmann".to_string(), CellRef::new(3, 5)),
                ("Ion Popescu".to_string(), CellRef::new(4, 5)),
            ],
        )
    }

    #[test]
    fn select_and_deselect() {
        let mut reg = registry();
        reg.select("Ion Popescu").unwrap().hours.accumulated = Some(3.0);
        assert_eq!(reg.select("Ion Popescu").unwrap().hours.accumulated, Some(3.0));
        assert_eq!(reg.selected().count(), 1);
        assert!(reg.deselect("Ion Popescu"));
        assert!(!reg.deselect("Ion Popescu"));
        assert!(reg.is_empty());
    }

    #[test]
    fn unknown_employee_is_an_error() {
        let mut reg = registry();
        assert_eq!(
            reg.select("Nobody").unwrap_err(),
            StructureError::EmployeeNotFound {
                name: "Nobody".to_string(),
                sheet: "Budget".to_string(),
            }
        );
        reg.select_all();
        assert_eq!(reg.selected().count(), 2);
        assert_eq!(reg.get("Jasmin Hindersmann").unwrap().anchor, CellRef::new(3, 5));
    }

    #[test]
    fn repeated_names_are_selected_by_cell() {
        let mut reg = EmployeeRegistry::new(
            "Budget",
            vec![
                ("Ion Popescu".to_string(), CellRef::new(3, 5)),
                ("Ion Popescu".to_string(), CellRef::new(4, 5)),
            ],
        );
        assert_eq!(reg.select("Ion Popescu").unwrap().anchor, CellRef::new(3, 5));
        assert_eq!(reg.select_at(CellRef::new(4, 5)).unwrap().anchor, CellRef::new(4, 5));
        assert_eq!(reg.selected().count(), 2);

        assert!(reg.deselect_at(CellRef::new(3, 5)));
        let left: Vec<CellRef> = reg.selected().map(|e| e.anchor).collect();
        assert_eq!(left, vec![CellRef::new(4, 5)]);

        assert_eq!(
            reg.select_at(CellRef::new(9, 5)).unwrap_err(),
            StructureError::EmployeeNotFound {
                name: "I5".to_string(),
                sheet: "Budget".to_string(),
            }
        );
        reg.select_all();
        assert_eq!(reg.selected().count(), 2);
    }
}
