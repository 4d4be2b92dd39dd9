//! Opening workbooks and mapping every failure to a typed [`LoadError`].

use std::fs::{File, OpenOptions};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{Reader, Xlsx, XlsxError, open_workbook};
use log::{debug, info};
use umya_spreadsheet::Spreadsheet;

use crate::error::{LoadError, SaveError};
use crate::excel::io::{SheetGrid, read_sheet};

/// File name component of a path, or the whole path when it has none.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Excel keeps an owner file `~$<name>` next to a workbook it has open.
pub fn owner_lock_file(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    let lock = path.with_file_name(format!("~${}", name));
    lock.exists().then_some(lock)
}

fn check_xlsx(path: &Path, file_name: &str) -> Result<(), LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound {
            file_name: file_name.to_string(),
        });
    }
    let is_xlsx = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false);
    if !is_xlsx {
        return Err(LoadError::Invalid {
            file_name: file_name.to_string(),
            reason: "only .xlsx workbooks are supported".to_string(),
        });
    }
    Ok(())
}

/// Fails when the workbook is open in another application. Only the output
/// workbook needs this since inputs are never written.
pub fn ensure_writable(path: &Path) -> Result<(), LoadError> {
    let file_name = file_name_of(path);
    if let Some(lock) = owner_lock_file(path) {
        return Err(LoadError::Locked {
            file_name,
            lock_file: file_name_of(&lock),
        });
    }
    match OpenOptions::new().read(true).write(true).open(path) {
        Ok(_) => Ok(()),
        Err(e) => Err(match e.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound { file_name },
            std::io::ErrorKind::PermissionDenied => {
                if std::fs::metadata(path)
                    .map(|m| m.permissions().readonly())
                    .unwrap_or(false)
                {
                    LoadError::ReadOnly {
                        file_name,
                        reason: "the file is marked read-only".to_string(),
                    }
                } else {
                    LoadError::PermissionDenied { file_name }
                }
            }
            _ => LoadError::Invalid {
                file_name,
                reason: e.to_string(),
            },
        }),
    }
}

/// Opens a workbook for value reading.
pub fn open_calamine(path: &Path) -> Result<Xlsx<BufReader<File>>, LoadError> {
    let file_name = file_name_of(path);
    check_xlsx(path, &file_name)?;
    open_workbook::<Xlsx<_>, _>(path).map_err(|e| map_xlsx_error(e, &file_name))
}

fn map_xlsx_error(e: XlsxError, file_name: &str) -> LoadError {
    let file_name = file_name.to_string();
    match e {
        XlsxError::Io(io) => match io.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound { file_name },
            std::io::ErrorKind::PermissionDenied => LoadError::PermissionDenied { file_name },
            _ => LoadError::Corrupted {
                file_name,
                reason: io.to_string(),
            },
        },
        XlsxError::Zip(z) => LoadError::Corrupted {
            file_name,
            reason: z.to_string(),
        },
        other => LoadError::Invalid {
            file_name,
            reason: other.to_string(),
        },
    }
}

/// The output workbook, held in memory for writing.
///
/// Owning the handle means owning the file: the session never creates a
/// second handle for the same path.
pub struct SpreadsheetHandle {
    path: PathBuf,
    file_name: String,
    sheet_names: Vec<String>,
    book: Spreadsheet,
}

impl SpreadsheetHandle {
    /// Opens the output workbook. The file must be writable and not open
    /// elsewhere.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SpreadsheetHandle, LoadError> {
        let path = path.as_ref().to_path_buf();
        let file_name = file_name_of(&path);
        check_xlsx(&path, &file_name)?;
        ensure_writable(&path)?;
        // calamine validates the container and gives sheet order.
        let workbook = open_calamine(&path)?;
        let sheet_names = workbook.sheet_names().to_owned();
        let book = umya_spreadsheet::reader::xlsx::read(&path).map_err(|e| LoadError::Corrupted {
            file_name: file_name.clone(),
            reason: e.to_string(),
        })?;
        info!("Opened output workbook {} ({} sheets)", file_name, sheet_names.len());
        Ok(SpreadsheetHandle {
            path,
            file_name,
            sheet_names,
            book,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    pub fn book(&self) -> &Spreadsheet {
        &self.book
    }

    pub fn book_mut(&mut self) -> &mut Spreadsheet {
        &mut self.book
    }

    pub fn has_sheet(&self, sheet: &str) -> bool {
        self.sheet_names.iter().any(|s| s == sheet)
    }

    /// Reads the stored values of one worksheet from disk.
    pub fn load_grid(&self, sheet: &str) -> Result<SheetGrid, LoadError> {
        if !self.has_sheet(sheet) {
            return Err(LoadError::MissingSheet {
                file_name: self.file_name.clone(),
                sheet: sheet.to_string(),
            });
        }
        read_sheet(&self.path, sheet)
    }

    /// Writes the in-memory workbook back to its file.
    pub fn save(&self) -> Result<(), SaveError> {
        ensure_writable(&self.path).map_err(|e| match e {
            LoadError::Locked { file_name, lock_file } => SaveError::Locked { file_name, lock_file },
            LoadError::PermissionDenied { file_name } | LoadError::ReadOnly { file_name, .. } => {
                SaveError::PermissionDenied { file_name }
            }
            other => SaveError::Write {
                file_name: self.file_name.clone(),
                reason: other.to_string(),
            },
        })?;
        umya_spreadsheet::writer::xlsx::write(&self.book, &self.path).map_err(|e| SaveError::Write {
            file_name: self.file_name.clone(),
            reason: e.to_string(),
        })?;
        debug!("Saved {}", self.path.display());
        Ok(())
    }
}

impl std::fmt::Debug for SpreadsheetHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpreadsheetHandle")
            .field("path", &self.path)
            .field("sheet_names", &self.sheet_names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_found() {
        let err = open_calamine(Path::new("/nope/Zeiten_DE.xlsx")).err().unwrap();
        assert!(matches!(err, LoadError::NotFound { ref file_name } if file_name == "Zeiten_DE.xlsx"));
    }

    #[test]
    fn non_xlsx_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hours.csv");
        std::fs::write(&path, "a,b\n").unwrap();
        assert!(matches!(open_calamine(&path), Err(LoadError::Invalid { .. })));
    }

    #[test]
    fn garbage_xlsx_is_corrupted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a zip archive").unwrap();
        assert!(matches!(
            open_calamine(&path),
            Err(LoadError::Corrupted { .. }) | Err(LoadError::Invalid { .. })
        ));
    }

    #[test]
    fn owner_file_marks_workbook_locked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("budget.xlsx");
        std::fs::write(&path, b"x").unwrap();
        std::fs::write(dir.path().join("~$budget.xlsx"), b"owner").unwrap();
        assert!(matches!(ensure_writable(&path), Err(LoadError::Locked { .. })));
    }
}
