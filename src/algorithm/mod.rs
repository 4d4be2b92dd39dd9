// Reconciliation engine: everything between the loaded worksheets and the
// values written back.
pub mod anchors;
pub mod dates;
pub mod deviation;
pub mod headers;
pub mod hours;
pub mod projects;
pub mod registry;

pub use anchors::{employees_in_anchor_row, locate_employee_anchors};
pub use dates::{match_budgeting_date, resolve_budgeting_row, scan_budgeting_dates};
pub use deviation::{classify_deviation, classify_registry};
pub use headers::{FilterColumns, WorksheetIndex, index_headers};
pub use hours::{AccumulationSummary, InputSheet, NameSuggestion, accumulate_hours, compute_predicted_hours};
pub use projects::build_project_catalog;
pub use registry::EmployeeRegistry;
