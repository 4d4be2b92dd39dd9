//! Reconciliation of employee project hours between country timesheets and
//! a budgeting workbook.
//!
//! Input timesheets (one layout per country, see [`config`]) are scanned for
//! the hours booked on selected projects in a selected month. The totals are
//! compared with the hours predicted in the budgeting workbook, classified by
//! deviation and written back into it. [`ReconciliationSession`] drives the
//! whole flow; the modules below can also be used on their own.
pub mod algorithm;
pub mod config;
pub mod error;
pub mod excel;
pub mod models;
pub mod months;
pub mod report;
pub mod session;
pub mod workbooks;

pub use config::Config;
pub use error::{Error, Result};
pub use session::{CommitOutcome, ReconciliationSession};
pub use workbooks::WorkbookId;
