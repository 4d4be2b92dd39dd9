//! YAML configuration: locale catalog, deviation thresholds and row anchors.
//!
//! The file is loaded once at startup and never mutated afterwards.

use std::path::Path;

use log::{debug, info};
use serde::Deserialize;

use crate::error::{ConfigError, StructureError};
use crate::months::MonthLanguage;

/// Worksheet header names used to find the filter columns of one locale.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FilterHeaders {
    pub name: String,
    pub proj_id: String,
    pub description: String,
    pub hours: String,
    pub date: String,
}

/// File naming and worksheet vocabulary of one country's timesheets.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocaleProfile {
    pub file_type: String,
    pub file_patterns: Vec<String>,
    pub country: String,
    pub exp_sheet_name: String,
    pub filter_headers: FilterHeaders,
}

impl LocaleProfile {
    /// True when every file pattern occurs in the lower-cased file name.
    pub fn matches_file_name(&self, file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        self.file_patterns
            .iter()
            .all(|pattern| lower.contains(&pattern.to_lowercase()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DeviationThresholds {
    pub strong_dev: f64,
    pub weak_dev: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RowAnchors {
    pub start_anchor: String,
    pub end_anchor: String,
}

/// Where the budgeting dates of the output worksheet start.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BudgetingDateColumn {
    pub column: String,
    pub start_row: u32,
}

impl Default for BudgetingDateColumn {
    fn default() -> Self {
        BudgetingDateColumn {
            column: "A".to_string(),
            start_row: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub countries: Vec<LocaleProfile>,
    pub deviations: DeviationThresholds,
    pub row_anchors: RowAnchors,
    #[serde(default)]
    pub budgeting_dates: BudgetingDateColumn,
    #[serde(default)]
    pub month_language: MonthLanguage,
}

impl Config {
    /// Loads and validates the config file. A missing file or a file that is
    /// not UTF-8 is fatal.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::NotFound(shown.clone()),
            _ => ConfigError::Io {
                path: shown.clone(),
                source: e,
            },
        })?;
        let text = String::from_utf8(bytes).map_err(|_| ConfigError::Encoding(shown.clone()))?;
        let config = Config::from_yaml_str(&text)?;
        info!(
            "Loaded config {} ({} locale profiles)",
            shown,
            config.countries.len()
        );
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("deviations.strong_dev", self.deviations.strong_dev),
            ("deviations.weak_dev", self.deviations.weak_dev),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    key: key.to_string(),
                    reason: format!("{} is outside [0, 1]", value),
                });
            }
        }
        if self.row_anchors.start_anchor.is_empty() || self.row_anchors.end_anchor.is_empty() {
            return Err(ConfigError::Invalid {
                key: "row_anchors".to_string(),
                reason: "anchors must not be empty".to_string(),
            });
        }
        if self.budgeting_dates.start_row == 0
            || crate::excel::column_letters_to_index(&self.budgeting_dates.column) == 0
        {
            return Err(ConfigError::Invalid {
                key: "budgeting_dates".to_string(),
                reason: format!(
                    "{}{} is not a cell reference",
                    self.budgeting_dates.column, self.budgeting_dates.start_row
                ),
            });
        }
        for locale in &self.countries {
            if locale.file_patterns.is_empty() {
                return Err(ConfigError::Invalid {
                    key: format!("countries.{}.file_patterns", locale.country),
                    reason: "at least one pattern is required".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Case-insensitive lookup by country name.
    pub fn locale_by_country(&self, country: &str) -> Option<&LocaleProfile> {
        self.countries
            .iter()
            .find(|locale| locale.country.to_lowercase() == country.to_lowercase())
    }

    /// Identifies the country of origin of an input file from its name.
    pub fn origin_from_file_name(&self, file_name: &str) -> Result<&LocaleProfile, StructureError> {
        let locale = self
            .countries
            .iter()
            .find(|locale| locale.matches_file_name(file_name))
            .ok_or_else(|| StructureError::CountryIdentifiersNotInFilename(file_name.to_string()))?;
        debug!("{} identified as {}", file_name, locale.country);
        Ok(locale)
    }
}
