//! Error taxonomy of the reconciliation core.
//!
//! Every failure is typed and carries the file, worksheet or marker it is
//! about, so the presentation layer can show it next to the offending row.

use thiserror::Error;

/// Problems with the YAML configuration. Always fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("The config file could not be found: {0}")]
    NotFound(String),

    #[error("The config file {path} could not be read: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("The config file {0} is not valid UTF-8")]
    Encoding(String),

    #[error("The config file could not be parsed: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Failures while opening a workbook.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("File '{file_name}' not found.")]
    NotFound { file_name: String },

    #[error("Permission denied: Close '{file_name}' if open.")]
    PermissionDenied { file_name: String },

    #[error("Workbook '{file_name}' is locked by another application (found '{lock_file}').")]
    Locked { file_name: String, lock_file: String },

    #[error("Workbook '{file_name}' is read-only: {reason}.")]
    ReadOnly { file_name: String, reason: String },

    #[error("Invalid Excel file '{file_name}': {reason}.")]
    Invalid { file_name: String, reason: String },

    #[error("Corrupted Excel file '{file_name}': {reason}")]
    Corrupted { file_name: String, reason: String },

    #[error("Worksheet '{sheet}' not found in workbook '{file_name}'.")]
    MissingSheet { file_name: String, sheet: String },

    #[error("Formulas in '{file_name}' could not be evaluated: {reason}")]
    Evaluation { file_name: String, reason: String },
}

/// Failures while saving the output workbook.
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Permission denied: Close '{file_name}' if open.")]
    PermissionDenied { file_name: String },

    #[error("Workbook '{file_name}' is locked by another application (found '{lock_file}').")]
    Locked { file_name: String, lock_file: String },

    #[error("Worksheet '{sheet}' not found in workbook '{file_name}'.")]
    MissingSheet { file_name: String, sheet: String },

    #[error("Workbook '{file_name}' could not be written: {reason}")]
    Write { file_name: String, reason: String },
}

/// The employee row of the output worksheet could not be located.
///
/// Markers are shown with escapes preserved (`"MA Name\nStartdatum"`).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnchorError {
    #[error("The selected worksheet contains neither {start:?} nor {end:?}.")]
    MissingBoth { start: String, end: String },

    #[error("The selected worksheet does not contain {0:?}.")]
    MissingOne(String),

    #[error("Both {start:?} and {end:?} are present, but not in the same row.")]
    Misalignment { start: String, end: String },
}

/// The requested budgeting period has no row in the output worksheet.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{month} or {year} not found in sheet {sheet} of file {file_name}.")]
pub struct DateNotFoundError {
    pub month: String,
    pub year: String,
    pub sheet: String,
    pub file_name: String,
}

/// Structural problems reported against a single file or selection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructureError {
    #[error(
        "Workbook {0} does not contain the required patterns in its file name to identify its country of origin."
    )]
    CountryIdentifiersNotInFilename(String),

    #[error("Only one output file may be selected!")]
    TooManyOutputFiles,

    #[error("Workbook {0} has already been selected.")]
    FileAlreadySelected(String),

    #[error("Workbook {0} is already being tracked.")]
    WorkbookAlreadyTracked(String),

    #[error("Column {header:?} not found in worksheet {sheet} of file {file_name}.")]
    MissingHeader {
        header: String,
        sheet: String,
        file_name: String,
    },

    #[error("No tracked workbook with id {0}.")]
    UnknownWorkbook(u64),

    #[error("No output workbook has been selected.")]
    NoOutputWorkbook,

    #[error("No worksheet has been selected in output file {0}.")]
    NoOutputSheet(String),

    #[error("No budgeting date has been selected in output file {0}.")]
    NoBudgetingDate(String),

    #[error("Employee {name} not found in the employee row of worksheet {sheet}.")]
    EmployeeNotFound { name: String, sheet: String },

    #[error("Project ID {project_id} not found in workbook {file_name}.")]
    UnknownProject {
        project_id: String,
        file_name: String,
    },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error(transparent)]
    Anchor(#[from] AnchorError),

    #[error(transparent)]
    DateNotFound(#[from] DateNotFoundError),

    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error("Report file {path} could not be written: {source}")]
    Report {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
