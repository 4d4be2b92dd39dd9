//! Plain-text summary written next to the output workbook after a commit.

use std::path::{Path, PathBuf};

use chrono::Local;
use log::info;

use crate::error::Error;
use crate::models::{Employee, SelectedDate};
use crate::months::MonthLanguage;

pub const HEADERS: [&str; 6] = [
    "Employee",
    "Predicted Hours",
    "Accumulated Hours",
    "Deviation",
    "Project ID",
    "Coordinate",
];
pub const PADDING: usize = 5;
pub const TIMESTAMP_FORMAT: &str = "%Y_%m_%d_-_%H-%M-%S";

const ZERO_HOURS: &str = "0.00";
const MISSING: &str = "Missing";

/// What the report header says about the run.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub selected_date: SelectedDate,
    pub language: MonthLanguage,
    pub input_workbooks: Vec<String>,
    pub output_file_name: String,
    pub output_worksheet: String,
}

/// One employee line, already rendered to text.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub employee: String,
    pub predicted: String,
    pub accumulated: String,
    pub deviation: String,
    pub project_ids: String,
    pub coordinate: String,
}

impl ReportRow {
    pub fn from_employee(employee: &Employee) -> Self {
        let ids: Vec<&str> = employee.found_projects.project_ids().collect();
        ReportRow {
            employee: employee.name.clone(),
            predicted: format_hours(
                employee.hours.predicted,
                employee.hours.predicted_already_recorded,
                ZERO_HOURS,
            ),
            accumulated: format_hours(employee.hours.accumulated, false, MISSING),
            deviation: employee
                .hours
                .deviation
                .map(|d| d.label().to_string())
                .unwrap_or_default(),
            project_ids: if ids.is_empty() { " ".to_string() } else { ids.join(", ") },
            coordinate: employee
                .hours
                .hours_coord
                .map(|c| c.to_string())
                .unwrap_or_default(),
        }
    }

    fn cells(&self) -> [&str; 6] {
        [
            &self.employee,
            &self.predicted,
            &self.accumulated,
            &self.deviation,
            &self.project_ids,
            &self.coordinate,
        ]
    }
}

/// Two decimals; `missing` for no value; flagged values in asterisks.
pub fn format_hours(hours: Option<f64>, flagged: bool, missing: &str) -> String {
    match hours {
        None => missing.to_string(),
        Some(h) if flagged => format!("*{:.2}*", h),
        Some(h) => format!("{:.2}", h),
    }
}

pub fn log_file_name(month_abbr: &str, year: i32, timestamp: &str) -> String {
    format!("log_output_for_{}_{}__{}.txt", month_abbr, year, timestamp)
}

/// Widest of header and contents, plus padding.
pub fn column_widths(rows: &[ReportRow]) -> [usize; 6] {
    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.chars().count());
        }
    }
    widths.map(|w| w + PADDING)
}

fn right_justify(cells: [&str; 6], widths: &[usize; 6]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:>width$}", cell, width = *width))
        .collect()
}

pub fn render_report(meta: &ReportMeta, rows: &[ReportRow], created: &str) -> String {
    let month = meta.language.abbr(meta.selected_date.month);
    let widths = column_widths(rows);
    let header_line = right_justify(HEADERS, &widths);

    let mut out = String::new();
    out.push_str(&format!(
        "* Selected date: {} {}; Log created: {}\n\n",
        month, meta.selected_date.year, created
    ));
    out.push_str(&format!("* Input workbook(s): {}\n", meta.input_workbooks.join("\n")));
    out.push_str(&format!("* Output workbook: {}\n", meta.output_file_name));
    out.push_str(&format!("* Output worksheet: {}\n\n", meta.output_worksheet));
    out.push_str(&header_line);
    out.push('\n');
    out.push_str(&"-".repeat(header_line.chars().count()));
    out.push('\n');
    for row in rows {
        out.push_str(&right_justify(row.cells(), &widths));
        out.push('\n');
    }
    out
}

/// Renders the report for `employees` and writes it into `dir`. Returns the
/// path of the new file.
pub fn write_report<'a, I>(dir: &Path, meta: &ReportMeta, employees: I) -> Result<PathBuf, Error>
where
    I: IntoIterator<Item = &'a Employee>,
{
    let rows: Vec<ReportRow> = employees.into_iter().map(ReportRow::from_employee).collect();
    let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
    let name = log_file_name(
        meta.language.abbr(meta.selected_date.month),
        meta.selected_date.year,
        &timestamp,
    );
    let path = dir.join(name);
    std::fs::write(&path, render_report(meta, &rows, &timestamp)).map_err(|source| Error::Report {
        path: path.display().to_string(),
        source,
    })?;
    info!("Report written to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::io::CellRef;
    use crate::models::Deviation;

    fn employee(name: &str, predicted: Option<f64>, accumulated: Option<f64>) -> Employee {
        let mut e = Employee::new(name, CellRef::new(3, 5));
        e.hours.predicted = predicted;
        e.hours.accumulated = accumulated;
        e.hours.hours_coord = Some(CellRef::new(3, 10));
        e
    }

    fn meta() -> ReportMeta {
        ReportMeta {
            selected_date: SelectedDate {
                month: 3,
                year: 2025,
                row: 10,
            },
            language: MonthLanguage::En,
            input_workbooks: vec!["zeiten_de.xlsx".to_string(), "pontaj_ro.xlsx".to_string()],
            output_file_name: "budget.xlsx".to_string(),
            output_worksheet: "Budget".to_string(),
        }
    }

    #[test]
    fn hours_rendering() {
        assert_eq!(format_hours(None, false, ZERO_HOURS), "0.00");
        assert_eq!(format_hours(None, false, MISSING), "Missing");
        assert_eq!(format_hours(Some(8.0), true, ZERO_HOURS), "*8.00*");
        assert_eq!(format_hours(Some(7.456), false, MISSING), "7.46");
    }

    #[test]
    fn rows_are_right_justified_to_shared_widths() {
        let mut found = employee("Jasmin Hindersmann", Some(8.0), Some(11.5));
        found.found_projects.add("PSP1", "Kickoff");
        found.found_projects.add("PSP2", "Review");
        found.hours.deviation = Some(Deviation::Strong);
        let missing = employee("Ion Popescu", None, None);
        let rows = vec![ReportRow::from_employee(&found), ReportRow::from_employee(&missing)];
        assert_eq!(rows[0].project_ids, "PSP1, PSP2");
        assert_eq!(rows[1].project_ids, " ");
        assert_eq!(rows[1].predicted, "0.00");
        assert_eq!(rows[1].accumulated, "Missing");

        let widths = column_widths(&rows);
        assert_eq!(widths[0], "Jasmin Hindersmann".len() + PADDING);
        assert_eq!(widths[3], "Warning! Strong deviation!".len() + PADDING);

        let text = render_report(&meta(), &rows, "2025_04_01_-_09-00-00");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "* Selected date: Mar 2025; Log created: 2025_04_01_-_09-00-00");
        assert_eq!(lines[2], "* Input workbook(s): zeiten_de.xlsx");
        assert_eq!(lines[3], "pontaj_ro.xlsx");
        let header = lines[7];
        assert!(lines[8].chars().all(|c| c == '-'));
        assert_eq!(lines[8].len(), header.len());
        assert_eq!(lines[9].len(), header.len());
        assert!(lines[9].ends_with("C10"));
    }

    #[test]
    fn report_file_lands_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let e = employee("Jasmin Hindersmann", Some(8.0), Some(8.0));
        let path = write_report(dir.path(), &meta(), [&e]).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("log_output_for_Mar_2025__"));
        assert!(name.ends_with(".txt"));
        assert!(std::fs::read_to_string(&path).unwrap().contains("Jasmin Hindersmann"));
    }
}
