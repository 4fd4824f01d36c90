use crate::accessor;
use crate::types::{LabelMapping, LabelSet, Record, SummaryResult, Tally};

/// Count records into labels derived from one field.
///
/// Records whose value is missing, or maps to a label outside a fixed set,
/// are excluded from this dimension only.
pub fn aggregate(
    records: &[Record],
    name: &str,
    field: &str,
    labels: &LabelSet,
    mapping: &LabelMapping,
) -> SummaryResult {
    let mut tally = match (mapping, labels) {
        (LabelMapping::Flag { when_true, when_false }, _) => {
            Tally::fixed([when_true.clone(), when_false.clone()])
        }
        (_, LabelSet::Fixed(fixed)) => Tally::fixed(fixed.iter().cloned()),
        (_, LabelSet::Discover) => Tally::discover(),
    };

    let mut total = 0usize;
    let mut excluded = 0usize;
    for record in records {
        match resolve_label(record, field, mapping) {
            Some(label) if tally.bump(&label) => total += 1,
            _ => excluded += 1,
        }
    }
    tally.into_result(name, total, excluded)
}

fn resolve_label(record: &Record, field: &str, mapping: &LabelMapping) -> Option<String> {
    match mapping {
        LabelMapping::Identity => accessor::text(record, field).ok(),
        LabelMapping::Table { entries } => {
            let raw = accessor::text(record, field).ok()?;
            let mapped = entries.get(&raw).or_else(|| {
                entries
                    .iter()
                    .find(|(from, _)| from.eq_ignore_ascii_case(&raw))
                    .map(|(_, to)| to)
            });
            Some(mapped.cloned().unwrap_or(raw))
        }
        LabelMapping::Flag { when_true, when_false } => {
            let label = if accessor::flag(record, field) {
                when_true
            } else {
                when_false
            };
            Some(label.clone())
        }
    }
}
