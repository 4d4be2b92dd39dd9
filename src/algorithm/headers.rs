use std::collections::HashMap;

use crate::config::FilterHeaders;
use crate::error::StructureError;
use crate::excel::io::{CellValue, SheetGrid};

/// Header text -> zero-based column index, built from row 1 of a worksheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorksheetIndex {
    pub sheet_name: String,
    pub columns: HashMap<String, usize>,
}

/// Resolved columns of the five filter headers of a locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterColumns {
    pub name: usize,
    pub proj_id: usize,
    pub description: usize,
    pub hours: usize,
    pub date: usize,
}

/// Reads row 1 and records every string cell. Other cells are skipped. When
/// a header repeats, the rightmost column wins.
pub fn index_headers(grid: &SheetGrid) -> WorksheetIndex {
    let mut columns = HashMap::new();
    for (idx, value) in grid.row(1).iter() {
        if let CellValue::String(text) = value {
            columns.insert(text.clone(), idx);
        }
    }
    WorksheetIndex {
        sheet_name: grid.name.clone(),
        columns,
    }
}

impl WorksheetIndex {
    pub fn column(&self, header: &str) -> Option<usize> {
        self.columns.get(header).copied()
    }

    fn require(&self, header: &str, file_name: &str) -> Result<usize, StructureError> {
        self.column(header).ok_or_else(|| StructureError::MissingHeader {
            header: header.to_string(),
            sheet: self.sheet_name.clone(),
            file_name: file_name.to_string(),
        })
    }

    /// Maps a locale's header aliases to columns; any missing header fails.
    pub fn resolve(&self, headers: &FilterHeaders, file_name: &str) -> Result<FilterColumns, StructureError> {
        Ok(FilterColumns {
            name: self.require(&headers.name, file_name)?,
            proj_id: self.require(&headers.proj_id, file_name)?,
            description: self.require(&headers.description, file_name)?,
            hours: self.require(&headers.hours, file_name)?,
            date: self.require(&headers.date, file_name)?,
        })
    }
}
