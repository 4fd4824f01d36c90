use crate::error::Result;
use crate::presets::STUDENT_DIMENSIONS;
use crate::summary;
use crate::types::{DimensionSpec, Granularity};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_CONFIG_FILE: &str = "report.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub students_path: PathBuf,
    pub enquiries_path: PathBuf,
    pub output_dir: PathBuf,
    pub enquiry_granularity: Granularity,
    pub preview_rows: usize,
    /// Additional student dimensions, reported after the built-in sections.
    pub extra_dimensions: Vec<DimensionSpec>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            students_path: PathBuf::from("students.json"),
            enquiries_path: PathBuf::from("enquiry_desk.json"),
            output_dir: PathBuf::from("reports"),
            enquiry_granularity: Granularity::Month,
            preview_rows: 5,
            extra_dimensions: Vec::new(),
        }
    }
}

impl ReportConfig {
    /// Load from `path`, or `report.toml` in the working directory. A missing
    /// file yields the defaults; an unreadable or invalid one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        if !path.exists() {
            info!(path = %path.display(), "no config file, using defaults");
            return Ok(ReportConfig::default());
        }
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    /// Parse and validate. Extra dimensions are checked together with the
    /// built-in student set so name clashes are caught here.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ReportConfig = toml::from_str(text)?;
        let mut all = STUDENT_DIMENSIONS.clone();
        all.extend_from_slice(&config.extra_dimensions);
        summary::validate(&all)?;
        Ok(config)
    }
}
