//! Fonts and number formats of the hours cells in the budgeting worksheet.

use umya_spreadsheet::{Color, NumberingFormat, Worksheet};

use crate::excel::io::CellRef;

pub const HOURS_FONT_NAME: &str = "Arial";
pub const HOURS_FONT_SIZE: f64 = 12.0;
pub const BLACK_ARGB: &str = "FF000000";
pub const HOURS_NUMBER_FORMAT: &str = "0.00 \"h\"";

/// Theme slot of the default text colour. Slot 0 is the light background.
const THEME_TEXT_DARK: u32 = 1;

/// True when a font colour reads as plain black: no colour information at
/// all, the dark text theme colour without tint, or explicit black.
pub fn is_black(color: &Color) -> bool {
    if *color == Color::default() {
        return true;
    }
    let argb = color.get_argb();
    if argb.is_empty() {
        return *color.get_theme_index() == THEME_TEXT_DARK && *color.get_tint() == 0.0;
    }
    argb.eq_ignore_ascii_case(BLACK_ARGB)
}

/// Whether a number format code shows a date or time. Quoted literals,
/// escaped characters and bracketed sections (colours, locales) are ignored.
pub fn is_date_format(code: &str) -> bool {
    let mut in_quotes = false;
    let mut in_brackets = false;
    let mut skip_next = false;
    for ch in code.chars() {
        if skip_next {
            skip_next = false;
            continue;
        }
        match ch {
            '"' => in_quotes = !in_quotes,
            _ if in_quotes => {}
            '\\' | '_' | '*' => skip_next = true,
            '[' => in_brackets = true,
            ']' => in_brackets = false,
            _ if in_brackets => {}
            'd' | 'D' | 'm' | 'M' | 'y' | 'Y' | 'h' | 'H' | 's' | 'S' => return true,
            _ => {}
        }
    }
    false
}

/// Date check for a cell's number format, built-in date ids included.
pub fn shows_date(format: &NumberingFormat) -> bool {
    matches!(*format.get_number_format_id(), 14..=22 | 45..=47) || is_date_format(format.get_format_code())
}

/// Whether the hours in `cell` already look committed: black (or default)
/// font. Forecast hours are kept in a coloured font until they are booked.
pub fn hours_look_recorded(sheet: &Worksheet, cell: CellRef) -> bool {
    let Some(found) = sheet.get_cell((cell.col, cell.row)) else {
        return true;
    };
    match found.get_style().get_font() {
        Some(font) => is_black(font.get_color()),
        None => true,
    }
}

/// Applies the fixed hours font and number format to a cell.
pub fn apply_hours_style(sheet: &mut Worksheet, cell: CellRef) {
    let style = sheet.get_style_mut((cell.col, cell.row));
    style
        .get_font_mut()
        .set_name(HOURS_FONT_NAME)
        .set_size(HOURS_FONT_SIZE)
        .get_color_mut()
        .set_argb(BLACK_ARGB);
    style.get_number_format_mut().set_format_code(HOURS_NUMBER_FORMAT);
}
