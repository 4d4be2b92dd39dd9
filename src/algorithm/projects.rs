use log::debug;

use crate::algorithm::headers::FilterColumns;
use crate::excel::io::{SheetGrid, cell_to_string, value_at};
use crate::models::ProjectCatalog;

/// Collects project id -> descriptions from the data rows (row 2 onward).
///
/// Only rows carrying a project id, a description and an employee name
/// count; a project nobody booked on is not selectable.
pub fn build_project_catalog(grid: &SheetGrid, columns: &FilterColumns) -> ProjectCatalog {
    let mut catalog = ProjectCatalog::new();
    for (_, row) in grid.rows_from(2) {
        let project = value_at(row, columns.proj_id);
        let description = value_at(row, columns.description);
        let name = value_at(row, columns.name);
        if !(project.is_present() && description.is_present() && name.is_present()) {
            continue;
        }
        catalog.add(&cell_to_string(project), &cell_to_string(description));
    }
    debug!("{} projects in worksheet {}", catalog.len(), grid.name);
    catalog
}
