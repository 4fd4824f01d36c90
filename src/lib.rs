//! Aggregation and reporting over loosely-typed student and enquiry records.
//!
//! Records go through the field accessor into per-dimension aggregators
//! (categorical, numeric bucket, calendar). The resulting [`Summary`] feeds
//! chart rendering directly and is assembled into ordered [`ReportSection`]s
//! for document export, so both consumers always see the same numbers.
//! Everything here is a pure function of its input snapshot.

pub mod accessor;
pub mod bucket;
pub mod calendar;
pub mod categorical;
pub mod config;
pub mod error;
pub mod listing;
pub mod loader;
pub mod output;
pub mod presets;
pub mod reports;
pub mod summary;
pub mod types;
pub mod util;

pub use error::{Absent, Error, SpecError};
pub use reports::assemble;
pub use summary::build;
pub use types::{
    Bucket, BucketMode, Cell, DimensionKind, DimensionSpec, Field, FieldKind, Granularity,
    LabelMapping, LabelSet, OverviewItem, Predicate, Record, Report, ReportSection,
    SectionSource, SectionSpec, Summary, SummaryResult,
};
