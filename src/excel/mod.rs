//! Spreadsheet access, split into submodules.
//!
//! Submodules:
//! - `io`: cell values, coordinates and worksheet grids read through calamine
//! - `loader`: opening workbooks, lock detection, the output `SpreadsheetHandle`
//! - `evaluate`: the `FormulaEvaluator` seam and the formula engine behind it
//! - `style`: hours font/number format and "already recorded" detection
//! - `writer`: writing accumulated hours back into the output worksheet
//! - `cache`: single-entry scan cache

pub mod cache;
pub mod evaluate;
pub mod io;
pub mod loader;
pub mod style;
pub mod writer;

pub use cache::{ScanKey, SingleEntryCache};
pub use evaluate::{CachedResultEvaluator, EngineEvaluator, FormulaEvaluator};
pub use io::{CellRef, CellValue, SheetGrid, SheetRow, cell_to_string, column_index_to_letters, column_letters_to_index, read_sheet};
pub use loader::{SpreadsheetHandle, file_name_of, open_calamine};
pub use writer::write_accumulated_hours;
