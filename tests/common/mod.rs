// Shared fixtures: a config and real .xlsx files written with umya.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use project_hours_budgeting::Config;
use umya_spreadsheet::Worksheet;

pub const CONFIG_YAML: &str = r#"
countries:
  - file_type: timesheet
    file_patterns: ["zeiten", "de"]
    country: Germany
    exp_sheet_name: Zeiten
    filter_headers:
      name: Mitarbeiter
      proj_id: PSP-Element
      description: Bezeichnung
      hours: Stunden
      date: Datum
  - file_type: timesheet
    file_patterns: ["pontaj", "ro"]
    country: Romania
    exp_sheet_name: Pontaj
    filter_headers:
      name: Angajat
      proj_id: ID Proiect
      description: Descriere
      hours: Ore
      date: Data
deviations:
  strong_dev: 0.2
  weak_dev: 0.05
row_anchors:
  start_anchor: "MA Name\nStartdatum"
  end_anchor: "Anzahl\nMA"
"#;

pub const START_ANCHOR: &str = "MA Name\nStartdatum";
pub const END_ANCHOR: &str = "Anzahl\nMA";
pub const BLUE: &str = "FF0070C0";

pub fn config() -> Config {
    Config::from_yaml_str(CONFIG_YAML).unwrap()
}

/// Excel serial number of a calendar date.
pub fn serial(y: i32, m: u32, d: u32) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();
    (NaiveDate::from_ymd_opt(y, m, d).unwrap() - epoch).num_days() as f64
}

fn put_date(sheet: &mut Worksheet, col: u32, row: u32, (y, m, d): (i32, u32, u32)) {
    sheet.get_cell_mut((col, row)).set_value_number(serial(y, m, d));
    sheet
        .get_style_mut((col, row))
        .get_number_format_mut()
        .set_format_code("yyyy-mm-dd");
}

/// One timesheet row, in logical order.
pub struct Booking<'a> {
    pub name: &'a str,
    pub project: &'a str,
    pub description: &'a str,
    pub hours: f64,
    pub date: (i32, u32, u32),
}

/// Writes a single-sheet timesheet. `headers` are in logical order (name,
/// project, description, hours, date); `layout` gives each one's column.
pub fn write_timesheet(
    dir: &Path,
    file_name: &str,
    sheet_name: &str,
    headers: [&str; 5],
    layout: [u32; 5],
    bookings: &[Booking<'_>],
) -> PathBuf {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    let sheet = book.new_sheet(sheet_name).unwrap();
    for (header, col) in headers.iter().zip(layout) {
        sheet.get_cell_mut((col, 1)).set_value(*header);
    }
    for (i, b) in bookings.iter().enumerate() {
        let row = i as u32 + 2;
        sheet.get_cell_mut((layout[0], row)).set_value(b.name);
        sheet.get_cell_mut((layout[1], row)).set_value(b.project);
        sheet.get_cell_mut((layout[2], row)).set_value(b.description);
        sheet.get_cell_mut((layout[3], row)).set_value_number(b.hours);
        put_date(sheet, layout[4], row, b.date);
    }
    let path = dir.join(file_name);
    umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();
    path
}

pub fn german_timesheet(dir: &Path) -> PathBuf {
    write_timesheet(
        dir,
        "zeiten_de_2025.xlsx",
        "Zeiten",
        ["Mitarbeiter", "PSP-Element", "Bezeichnung", "Stunden", "Datum"],
        [2, 3, 4, 5, 1],
        &[
            Booking { name: "Jasmin Hindersmann", project: "PSP1", description: "Kickoff", hours: 4.0, date: (2025, 3, 3) },
            Booking { name: "Jasmin Hindersmann", project: "PSP1", description: "Review", hours: 2.5, date: (2025, 3, 10) },
            Booking { name: "Ion Popescu", project: "PSP2", description: "Integration", hours: 6.0, date: (2025, 3, 11) },
            Booking { name: "Jasmin Hindersmann", project: "PSP1", description: "Kickoff", hours: 9.0, date: (2025, 4, 1) },
        ],
    )
}

pub fn romanian_timesheet(dir: &Path) -> PathBuf {
    write_timesheet(
        dir,
        "pontaj_ro_2025.xlsx",
        "Pontaj",
        ["Angajat", "ID Proiect", "Descriere", "Ore", "Data"],
        [1, 2, 3, 4, 5],
        &[
            Booking { name: "Jasmin Hindersmann", project: "PSP1", description: "Kickoff", hours: 3.0, date: (2025, 3, 5) },
            Booking { name: "Jasmin Hindersmann", project: "PSP1", description: "Testing", hours: 1.5, date: (2025, 3, 6) },
            Booking { name: "Ion Popescu", project: "PSP1", description: "Testing", hours: 2.0, date: (2025, 3, 6) },
        ],
    )
}

/// Budgeting workbook with a `Budget` worksheet and an unrelated `Notes`
/// worksheet.
///
/// Employee row 5: B5 start anchor, C5..E5 employees, F5 end anchor.
/// A8..A19 hold the first of each month of 2025, so March is row 10.
/// Predicted March hours: C10 = 8 in blue (forecast), D10 = 2 in the default
/// font (already recorded), E10 blank.
pub fn budget_workbook(dir: &Path) -> PathBuf {
    write_budget(dir, "budget_2025.xlsx", false)
}

/// Same layout as [`budget_workbook`], but A9..A19 are `EDATE` formulas
/// counting on from A8, C10 is `=4+4` and D10 is `=1+1`. No formula has a
/// stored result, so only an evaluating reader sees the values.
pub fn formula_budget_workbook(dir: &Path) -> PathBuf {
    write_budget(dir, "budget_formulas_2025.xlsx", true)
}

fn write_budget(dir: &Path, file_name: &str, formulas: bool) -> PathBuf {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    let sheet = book.new_sheet("Budget").unwrap();
    sheet.get_cell_mut((1, 1)).set_value("Projektbudget 2025");
    sheet.get_cell_mut((2, 5)).set_value(START_ANCHOR);
    sheet.get_cell_mut((3, 5)).set_value("Jasmin Hindersmann");
    sheet.get_cell_mut((4, 5)).set_value("Ion Popescu");
    sheet.get_cell_mut((5, 5)).set_value("Maria Ionescu");
    sheet.get_cell_mut((6, 5)).set_value(END_ANCHOR);
    put_date(sheet, 1, 8, (2025, 1, 1));
    for month in 2..=12u32 {
        let row = 7 + month;
        if formulas {
            sheet.get_cell_mut((1, row)).set_formula(format!("EDATE(A{},1)", row - 1));
            sheet
                .get_style_mut((1, row))
                .get_number_format_mut()
                .set_format_code("yyyy-mm-dd");
        } else {
            put_date(sheet, 1, row, (2025, month, 1));
        }
    }
    if formulas {
        sheet.get_cell_mut((3, 10)).set_formula("4+4");
        sheet.get_cell_mut((4, 10)).set_formula("1+1");
    } else {
        sheet.get_cell_mut((3, 10)).set_value_number(8.0);
        sheet.get_cell_mut((4, 10)).set_value_number(2.0);
    }
    sheet
        .get_style_mut((3, 10))
        .get_font_mut()
        .get_color_mut()
        .set_argb(BLUE);

    let notes = book.new_sheet("Notes").unwrap();
    notes.get_cell_mut((1, 1)).set_value("nothing to see");

    let path = dir.join(file_name);
    umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();
    path
}
