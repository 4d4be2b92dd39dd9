use log::{debug, info};

use crate::algorithm::registry::EmployeeRegistry;
use crate::error::SaveError;
use crate::excel::loader::SpreadsheetHandle;
use crate::excel::style::apply_hours_style;

/// Writes every non-null accumulated total into the output worksheet and
/// saves the workbook. Employees without a total are left untouched.
///
/// The hours cell shares the employee's column and sits on `date_row`.
/// Returns the number of cells written.
pub fn write_accumulated_hours(
    handle: &mut SpreadsheetHandle,
    sheet_name: &str,
    employees: &EmployeeRegistry,
    date_row: u32,
) -> Result<usize, SaveError> {
    let file_name = handle.file_name().to_string();
    let sheet = handle
        .book_mut()
        .get_sheet_by_name_mut(sheet_name)
        .ok_or_else(|| SaveError::MissingSheet {
            file_name: file_name.clone(),
            sheet: sheet_name.to_string(),
        })?;

    let mut written = 0;
    for employee in employees.selected() {
        let Some(hours) = employee.hours.accumulated else {
            debug!("{} is missing in the inputs, nothing written", employee.name);
            continue;
        };
        let target = employee.anchor.with_row(date_row);
        sheet.get_cell_mut((target.col, target.row)).set_value_number(hours);
        apply_hours_style(sheet, target);
        debug!("{} <- {:.2} h ({})", target, hours, employee.name);
        written += 1;
    }

    handle.save()?;
    info!("Wrote {} hours cells to {} [{}]", written, file_name, sheet_name);
    Ok(written)
}
