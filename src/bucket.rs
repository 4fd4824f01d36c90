use crate::accessor;
use crate::types::{Bucket, BucketMode, Record, SummaryResult, Tally};

/// Count records into numeric buckets.
///
/// In `Partition` mode predicates are tried in order and the first match
/// wins. In `Cumulative` mode every predicate is evaluated independently, so
/// one record may increment several buckets and the counts do not sum to the
/// total. A record with an uncoercible value, or one matching no bucket, is
/// excluded from the dimension.
pub fn aggregate(
    records: &[Record],
    name: &str,
    field: &str,
    mode: BucketMode,
    buckets: &[Bucket],
) -> SummaryResult {
    let mut tally = Tally::fixed(buckets.iter().map(|b| b.label.clone()));
    let mut total = 0usize;
    let mut excluded = 0usize;

    for record in records {
        let Ok(value) = accessor::number(record, field) else {
            excluded += 1;
            continue;
        };
        let matched = match mode {
            BucketMode::Partition => match buckets.iter().find(|b| b.predicate.matches(value)) {
                Some(bucket) => tally.bump(&bucket.label),
                None => false,
            },
            BucketMode::Cumulative => {
                let mut any = false;
                for bucket in buckets.iter().filter(|b| b.predicate.matches(value)) {
                    any |= tally.bump(&bucket.label);
                }
                any
            }
        };
        if matched {
            total += 1;
        } else {
            excluded += 1;
        }
    }
    tally.into_result(name, total, excluded)
}
