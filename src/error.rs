use std::path::PathBuf;
use thiserror::Error as ThisError;

/// A field could not be resolved or coerced for one record.
///
/// Aggregators handle this locally by leaving the record out of the affected
/// dimension; it never aborts a computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
#[error("field is absent or could not be coerced")]
pub struct Absent;

/// A malformed dimension or section description. These are programming or
/// configuration mistakes and reject the whole call.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum SpecError {
    #[error("dimension name is empty")]
    EmptyName,

    #[error("dimension '{0}' is declared more than once")]
    DuplicateDimension(String),

    #[error("dimension '{0}' has no source field")]
    EmptyField(String),

    #[error("dimension '{0}' has an empty fixed label set")]
    EmptyLabelSet(String),

    #[error("dimension '{0}' has no buckets")]
    EmptyBuckets(String),

    #[error("dimension '{dimension}' repeats label '{label}'")]
    DuplicateLabel { dimension: String, label: String },

    #[error("bucket '{label}' of dimension '{dimension}' has an invalid range")]
    InvalidRange { dimension: String, label: String },

    #[error("unknown granularity '{0}' (expected day, isoWeek or month)")]
    UnknownGranularity(String),

    #[error("section '{section}' refers to unknown dimension '{dimension}'")]
    UnknownDimension { section: String, dimension: String },
}

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error("unsupported record file '{}' (expected .json or .csv)", .0.display())]
    UnsupportedFormat(PathBuf),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
