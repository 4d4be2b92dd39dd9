// Locating the employee row of the budgeting worksheet.
//
// The output worksheet is free-form: the only landmark is a row containing a
// start and an end marker cell with the employee names between them.

use log::debug;

use crate::config::RowAnchors;
use crate::error::AnchorError;
use crate::excel::io::{CellRef, CellValue, SheetGrid, cell_to_string};
use crate::models::AnchorRange;

/// Scans the whole worksheet for the two anchor markers.
///
/// Every cell is visited row by row; for each marker the last matching cell
/// in that order wins. A cell matching the start marker is not checked
/// against the end marker.
pub fn locate_employee_anchors(grid: &SheetGrid, anchors: &RowAnchors) -> Result<AnchorRange, AnchorError> {
    let mut start: Option<CellRef> = None;
    let mut end: Option<CellRef> = None;

    for (row, cells) in grid.rows_from(1) {
        for (idx, value) in cells.iter() {
            let CellValue::String(text) = value else {
                continue;
            };
            let at = CellRef::new(idx as u32 + 1, row);
            if *text == anchors.start_anchor {
                start = Some(at);
            } else if *text == anchors.end_anchor {
                end = Some(at);
            }
        }
    }

    match (start, end) {
        (None, None) => Err(AnchorError::MissingBoth {
            start: anchors.start_anchor.clone(),
            end: anchors.end_anchor.clone(),
        }),
        (None, Some(_)) => Err(AnchorError::MissingOne(anchors.start_anchor.clone())),
        (Some(_), None) => Err(AnchorError::MissingOne(anchors.end_anchor.clone())),
        (Some(start), Some(end)) if start.row != end.row => Err(AnchorError::Misalignment {
            start: anchors.start_anchor.clone(),
            end: anchors.end_anchor.clone(),
        }),
        (Some(start), Some(end)) => {
            debug!("Employee row of {} found at {}..{}", grid.name, start, end);
            Ok(AnchorRange { start, end })
        }
    }
}

/// Non-empty cells of the anchor row strictly between the two anchors, as
/// (name, coordinate). Works whichever anchor sits further left.
pub fn employees_in_anchor_row(grid: &SheetGrid, range: &AnchorRange) -> Vec<(String, CellRef)> {
    let (lo, hi) = if range.start.col <= range.end.col {
        (range.start.col, range.end.col)
    } else {
        (range.end.col, range.start.col)
    };
    ((lo + 1)..hi)
        .map(|col| CellRef::new(col, range.row()))
        .filter_map(|at| {
            let name = cell_to_string(grid.cell(at));
            (!name.is_empty()).then_some((name, at))
        })
        .collect()
}
