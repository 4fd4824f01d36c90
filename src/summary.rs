use crate::error::SpecError;
use crate::types::{
    DimensionKind, DimensionSpec, Granularity, LabelMapping, LabelSet, Predicate, Record, Summary,
    SummaryResult,
};
use crate::{bucket, calendar, categorical};
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;
use tracing::{debug, warn};

impl FromStr for Granularity {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Granularity::Day),
            "isoweek" | "week" => Ok(Granularity::IsoWeek),
            "month" => Ok(Granularity::Month),
            _ => Err(SpecError::UnknownGranularity(s.to_string())),
        }
    }
}

/// Compute every dimension over one snapshot of records.
///
/// All specs are validated before any aggregation; a malformed spec rejects
/// the whole call. Bad data never does: each dimension excludes the records
/// it cannot use and the other dimensions are unaffected.
pub fn build(records: &[Record], specs: &[DimensionSpec]) -> Result<Summary, SpecError> {
    validate(specs)?;
    let dimensions: BTreeMap<String, SummaryResult> = specs
        .iter()
        .map(|spec| (spec.name.clone(), aggregate_dimension(records, spec)))
        .collect();
    Ok(Summary {
        record_count: records.len(),
        dimensions,
    })
}

/// Route one dimension to its aggregator.
pub fn aggregate_dimension(records: &[Record], spec: &DimensionSpec) -> SummaryResult {
    let field = spec.source_field.as_str();
    let result = match &spec.kind {
        DimensionKind::Categorical { labels, mapping } => {
            categorical::aggregate(records, &spec.name, field, labels, mapping)
        }
        DimensionKind::Bucket { mode, buckets } => {
            bucket::aggregate(records, &spec.name, field, *mode, buckets)
        }
        DimensionKind::Calendar { granularity } => {
            calendar::aggregate(records, &spec.name, field, *granularity)
        }
    };

    debug!(
        dimension = %spec.name,
        total = result.total,
        excluded = result.excluded,
        "aggregated dimension"
    );
    if !records.is_empty() && result.total == 0 {
        warn!(
            dimension = %spec.name,
            field = %field,
            "no record had a usable value"
        );
    }
    result
}

/// Check a set of dimension specs for configuration mistakes.
pub fn validate(specs: &[DimensionSpec]) -> Result<(), SpecError> {
    let mut names = HashSet::new();
    for spec in specs {
        if spec.name.trim().is_empty() {
            return Err(SpecError::EmptyName);
        }
        if !names.insert(spec.name.as_str()) {
            return Err(SpecError::DuplicateDimension(spec.name.clone()));
        }
        if spec.source_field.trim().is_empty() {
            return Err(SpecError::EmptyField(spec.name.clone()));
        }
        match &spec.kind {
            DimensionKind::Categorical { labels, mapping } => match mapping {
                LabelMapping::Flag {
                    when_true,
                    when_false,
                } => unique_labels(&spec.name, [when_true, when_false])?,
                _ => {
                    if let LabelSet::Fixed(fixed) = labels {
                        if fixed.is_empty() {
                            return Err(SpecError::EmptyLabelSet(spec.name.clone()));
                        }
                        unique_labels(&spec.name, fixed)?;
                    }
                }
            },
            DimensionKind::Bucket { buckets, .. } => {
                if buckets.is_empty() {
                    return Err(SpecError::EmptyBuckets(spec.name.clone()));
                }
                unique_labels(&spec.name, buckets.iter().map(|b| &b.label))?;
                for bucket in buckets {
                    if !valid_predicate(&bucket.predicate) {
                        return Err(SpecError::InvalidRange {
                            dimension: spec.name.clone(),
                            label: bucket.label.clone(),
                        });
                    }
                }
            }
            DimensionKind::Calendar { .. } => {}
        }
    }
    Ok(())
}

fn unique_labels<'a, I>(dimension: &str, labels: I) -> Result<(), SpecError>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut seen = HashSet::new();
    for label in labels {
        if !seen.insert(label.as_str()) {
            return Err(SpecError::DuplicateLabel {
                dimension: dimension.to_string(),
                label: label.clone(),
            });
        }
    }
    Ok(())
}

fn valid_predicate(predicate: &Predicate) -> bool {
    match *predicate {
        Predicate::LessThan(v)
        | Predicate::AtMost(v)
        | Predicate::AtLeast(v)
        | Predicate::GreaterThan(v) => v.is_finite(),
        Predicate::Between { low, high } => low.is_finite() && high.is_finite() && low <= high,
        Predicate::Always => true,
    }
}
