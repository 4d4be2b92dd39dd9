use std::fmt;
use std::path::Path;

use calamine::{Data, Reader, Xlsx};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::error::LoadError;
use crate::excel::loader::{file_name_of, open_calamine};

/// Cell content as the reconciliation engine sees it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    String(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
    Error(String),
}

impl CellValue {
    /// Converts a calamine cell. Date-formatted numbers become `Date`.
    pub fn from_data(d: &Data) -> CellValue {
        match d {
            Data::String(s) => CellValue::String(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::Empty => CellValue::Empty,
            Data::Error(e) => CellValue::Error(e.to_string()),
            Data::DateTime(dt) => match excel_serial_to_datetime(dt.as_f64()) {
                Some(value) => CellValue::Date(value),
                None => CellValue::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) => match parse_date_text(s) {
                Some(value) => CellValue::Date(value),
                None => CellValue::String(s.clone()),
            },
            Data::DurationIso(s) => CellValue::String(s.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Mirrors how a spreadsheet user reads "has a value": empty text, zero
    /// and `FALSE` count as missing.
    pub fn is_present(&self) -> bool {
        match self {
            CellValue::Empty => false,
            CellValue::String(s) => !s.is_empty(),
            CellValue::Number(n) => *n != 0.0,
            CellValue::Bool(b) => *b,
            CellValue::Date(_) | CellValue::Error(_) => true,
        }
    }

    /// Numeric value; text is accepted when it parses (comma decimals allowed).
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Strict date: only date-typed cells.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Lenient date for timesheet columns: date cells, Excel serial numbers
    /// and date text all qualify.
    pub fn as_date_lenient(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(d.date()),
            CellValue::Number(n) => excel_serial_to_datetime(*n).map(|d| d.date()),
            CellValue::String(s) => parse_date_text(s).map(|d| d.date()),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d.and_hms_opt(0, 0, 0).unwrap_or_default())
    }
}

/// Renders a cell as text, integral numbers without a decimal part.
pub fn cell_to_string(c: &CellValue) -> String {
    match c {
        CellValue::String(s) => s.trim().to_string(),
        CellValue::Number(f) => {
            if (f.floor() - f).abs() < f64::EPSILON {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        CellValue::Bool(b) => format!("{}", b),
        CellValue::Empty => String::new(),
        CellValue::Error(_) => String::new(),
        CellValue::Date(d) => {
            if d.time() == chrono::NaiveTime::MIN {
                d.date().format("%Y-%m-%d").to_string()
            } else {
                d.format("%Y-%m-%d %H:%M:%S").to_string()
            }
        }
    }
}

/// Excel serial date (1900 system) to a calendar date-time.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    // 1899-12-30 absorbs the phantom 1900-02-29.
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

fn parse_date_text(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Returns (month, year) of a date cell.
pub fn month_year(d: NaiveDate) -> (u32, i32) {
    (d.month(), d.year())
}

/// Converts column letters (e.g. "AB") to a 1-based index (A=1).
pub fn column_letters_to_index(s: &str) -> usize {
    let mut acc = 0usize;
    for ch in s.chars() {
        if ch.is_ascii_alphabetic() {
            acc = acc * 26 + ((ch.to_ascii_uppercase() as u8 - b'A') as usize + 1);
        }
    }
    acc
}

/// Converts a 1-based column index to letters (1 = "A", 28 = "AB").
pub fn column_index_to_letters(mut index: u32) -> String {
    let mut letters = Vec::new();
    while index > 0 {
        let rem = ((index - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        index = (index - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// A1-style cell coordinate, both parts 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    pub col: u32,
    pub row: u32,
}

impl CellRef {
    pub fn new(col: u32, row: u32) -> Self {
        CellRef { col, row }
    }

    /// Parses "B12"; `None` for anything that is not letters followed by digits.
    pub fn parse(text: &str) -> Option<CellRef> {
        let text = text.trim();
        let split = text.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = text.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        let row = digits.parse::<u32>().ok().filter(|r| *r > 0)?;
        let col = u32::try_from(column_letters_to_index(letters)).ok()?;
        Some(CellRef { col, row })
    }

    /// Same column, another row.
    pub fn with_row(self, row: u32) -> CellRef {
        CellRef { col: self.col, row }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_index_to_letters(self.col), self.row)
    }
}

/// Values of one worksheet. Only the used range is stored; lookups take
/// absolute 1-based coordinates and anything outside the range is empty.
#[derive(Debug, Clone, Default)]
pub struct SheetGrid {
    pub name: String,
    first_row: u32,
    first_col: u32,
    rows: Vec<Vec<CellValue>>,
}

/// One row of a [`SheetGrid`], indexed by absolute column.
#[derive(Debug, Clone, Copy)]
pub struct SheetRow<'a> {
    first_col: u32,
    cells: &'a [CellValue],
}

impl<'a> SheetRow<'a> {
    /// Cell at a 0-based absolute column (A = 0).
    pub fn get(&self, col: usize) -> &'a CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        let offset = self.first_col.saturating_sub(1) as usize;
        col.checked_sub(offset)
            .and_then(|idx| self.cells.get(idx))
            .unwrap_or(&EMPTY)
    }

    /// (0-based absolute column, value) of every stored cell.
    pub fn iter(self) -> impl Iterator<Item = (usize, &'a CellValue)> {
        let offset = self.first_col.saturating_sub(1) as usize;
        self.cells
            .iter().enumerate().map(move |(idx, value)| (offset + idx, value))
    }
}

impl SheetGrid {
    /// Grid whose first row and column are A1.
    pub fn from_rows(name: &str, rows: Vec<Vec<CellValue>>) -> Self {
        SheetGrid {
            name: name.to_string(),
            first_row: 1,
            first_col: 1,
            rows,
        }
    }

    pub fn from_range(name: &str, range: &calamine::Range<Data>) -> Self {
        let (Some((r0, c0)), Some((r1, c1))) = (range.start(), range.end()) else {
            return SheetGrid::from_rows(name, Vec::new());
        };
        let height = (r1 - r0) as usize + 1;
        let width = (c1 - c0) as usize + 1;
        let mut rows = vec![vec![CellValue::Empty; width]; height];
        for (r, c, data) in range.used_cells() {
            rows[r][c] = CellValue::from_data(data);
        }
        SheetGrid {
            name: name.to_string(),
            first_row: r0 + 1,
            first_col: c0 + 1,
            rows,
        }
    }

    /// Cell by 1-based coordinate; out-of-range cells are empty.
    pub fn cell(&self, at: CellRef) -> &CellValue {
        self.row(at.row).get(at.col.saturating_sub(1) as usize)
    }

    /// Row by 1-based number.
    pub fn row(&self, row: u32) -> SheetRow<'_> {
        let cells = row
            .checked_sub(self.first_row)
            .and_then(|idx| self.rows.get(idx as usize))
            .map(|r| r.as_slice())
            .unwrap_or(&[]);
        SheetRow {
            first_col: self.first_col,
            cells,
        }
    }

    /// Last row of the used range, 0 for an empty sheet.
    pub fn last_row(&self) -> u32 {
        if self.rows.is_empty() {
            0
        } else {
            self.first_row + self.rows.len() as u32 - 1
        }
    }

    /// Iterates (1-based row number, cells) starting at `min_row`.
    pub fn rows_from(&self, min_row: u32) -> impl Iterator<Item = (u32, SheetRow<'_>)> {
        let first_row = self.first_row;
        let first_col = self.first_col;
        let skip = min_row.saturating_sub(first_row) as usize;
        self.rows.iter().enumerate().skip(skip).map(move |(i, r)| {
            (
                first_row + i as u32,
                SheetRow {
                    first_col,
                    cells: r.as_slice(),
                },
            )
        })
    }
}

/// Value at a 0-based column of a row, empty if the row is shorter.
pub fn value_at<'a>(row: SheetRow<'a>, col: usize) -> &'a CellValue {
    row.get(col)
}

/// Reads the stored (or last computed) values of one worksheet.
pub fn read_sheet<P: AsRef<Path>>(path: P, sheet_name: &str) -> Result<SheetGrid, LoadError> {
    let path = path.as_ref();
    let mut workbook = open_calamine(path)?;
    read_sheet_from(&mut workbook, &file_name_of(path), sheet_name)
}

pub fn read_sheet_from<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    file_name: &str,
    sheet_name: &str,
) -> Result<SheetGrid, LoadError> {
    if !workbook.sheet_names().iter().any(|s| s == sheet_name) {
        return Err(LoadError::MissingSheet {
            file_name: file_name.to_string(),
            sheet: sheet_name.to_string(),
        });
    }
    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| LoadError::Corrupted {
            file_name: file_name.to_string(),
            reason: e.to_string(),
        })?;
    Ok(SheetGrid::from_range(sheet_name, &range))
}
