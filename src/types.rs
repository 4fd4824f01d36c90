use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tabled::Tabled;

/// A single loosely-typed entity record (student, enquiry) as handed over by
/// the data store. Any field may be missing or hold an unexpected type.
pub type Record = serde_json::Map<String, Value>;

/// The shape a caller expects a field to coerce into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Flag,
    Date,
}

/// A successfully coerced field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Text(String),
    Number(f64),
    Flag(bool),
    Date(NaiveDate),
}

/// Calendar bucketing period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Granularity {
    Day,
    IsoWeek,
    #[default]
    Month,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Granularity::Day => "day",
            Granularity::IsoWeek => "isoWeek",
            Granularity::Month => "month",
        };
        f.write_str(s)
    }
}

/// Which labels a categorical dimension reports.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LabelSet {
    /// Labels appear in first-seen order among the processed records.
    #[default]
    Discover,
    /// Every label is always present, with a zero count if nothing matched.
    /// Values mapping to a label outside the set are excluded.
    Fixed(Vec<String>),
}

/// How a raw field value turns into a label.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LabelMapping {
    /// The trimmed text value is the label.
    #[default]
    Identity,
    /// Raw values are looked up in the table; unmatched values keep their raw text.
    Table { entries: BTreeMap<String, String> },
    /// Boolean coercion picks one of two labels. The pair acts as a fixed
    /// label set regardless of [`LabelSet`].
    #[serde(rename_all = "camelCase")]
    Flag { when_true: String, when_false: String },
}

/// Numeric test a bucket applies to a coerced value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Predicate {
    LessThan(f64),
    AtMost(f64),
    AtLeast(f64),
    GreaterThan(f64),
    /// Inclusive on both ends.
    Between { low: f64, high: f64 },
    Always,
}

impl Predicate {
    pub fn matches(&self, value: f64) -> bool {
        match *self {
            Predicate::LessThan(limit) => value < limit,
            Predicate::AtMost(limit) => value <= limit,
            Predicate::AtLeast(limit) => value >= limit,
            Predicate::GreaterThan(limit) => value > limit,
            Predicate::Between { low, high } => value >= low && value <= high,
            Predicate::Always => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub label: String,
    pub predicate: Predicate,
}

impl Bucket {
    pub fn new(label: &str, predicate: Predicate) -> Self {
        Bucket {
            label: label.to_string(),
            predicate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketMode {
    /// First matching bucket wins; each record lands in at most one bucket.
    Partition,
    /// Every matching bucket is incremented; buckets overlap.
    Cumulative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DimensionKind {
    Categorical {
        #[serde(default)]
        labels: LabelSet,
        #[serde(default)]
        mapping: LabelMapping,
    },
    Bucket {
        mode: BucketMode,
        buckets: Vec<Bucket>,
    },
    Calendar {
        granularity: Granularity,
    },
}

/// One summary to compute over a record collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionSpec {
    pub name: String,
    pub source_field: String,
    #[serde(flatten)]
    pub kind: DimensionKind,
}

impl DimensionSpec {
    pub fn categorical(name: &str, field: &str, labels: LabelSet, mapping: LabelMapping) -> Self {
        DimensionSpec {
            name: name.to_string(),
            source_field: field.to_string(),
            kind: DimensionKind::Categorical { labels, mapping },
        }
    }

    pub fn flag(name: &str, field: &str, when_true: &str, when_false: &str) -> Self {
        Self::categorical(
            name,
            field,
            LabelSet::Discover,
            LabelMapping::Flag {
                when_true: when_true.to_string(),
                when_false: when_false.to_string(),
            },
        )
    }

    pub fn bucket(name: &str, field: &str, mode: BucketMode, buckets: Vec<Bucket>) -> Self {
        DimensionSpec {
            name: name.to_string(),
            source_field: field.to_string(),
            kind: DimensionKind::Bucket { mode, buckets },
        }
    }

    pub fn calendar(name: &str, field: &str, granularity: Granularity) -> Self {
        DimensionSpec {
            name: name.to_string(),
            source_field: field.to_string(),
            kind: DimensionKind::Calendar { granularity },
        }
    }
}

/// Normalized result of one dimension.
///
/// `labels` carries the display order; `counts` holds one entry per label.
/// For partition and categorical dimensions `total` equals the sum of the
/// counts. Cumulative dimensions count a record once in `total` even when it
/// lands in several buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResult {
    pub dimension_name: String,
    pub labels: Vec<String>,
    pub counts: BTreeMap<String, usize>,
    pub total: usize,
    /// Records whose source value was missing, uncoercible or matched nothing.
    pub excluded: usize,
    pub peak_label: Option<String>,
}

impl SummaryResult {
    pub fn count(&self, label: &str) -> usize {
        self.counts.get(label).copied().unwrap_or(0)
    }

    /// Percentage of `total` that landed under `label`.
    pub fn share(&self, label: &str) -> f64 {
        crate::util::percentage(self.count(label), self.total)
    }

    pub fn peak_count(&self) -> Option<usize> {
        self.peak_label.as_deref().map(|label| self.count(label))
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// `(label, count)` pairs in label order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.labels
            .iter()
            .map(move |label| (label.as_str(), self.count(label)))
    }
}

/// Ordered label counter shared by the aggregators.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    labels: Vec<String>,
    counts: HashMap<String, usize>,
    open: bool,
}

impl Tally {
    pub(crate) fn discover() -> Self {
        Tally {
            open: true,
            ..Default::default()
        }
    }

    pub(crate) fn fixed<I>(labels: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut tally = Tally::default();
        for label in labels {
            if !tally.counts.contains_key(&label) {
                tally.counts.insert(label.clone(), 0);
                tally.labels.push(label);
            }
        }
        tally
    }

    /// Adds `n` under `label`. Returns false when a fixed tally rejects the label.
    pub(crate) fn add(&mut self, label: &str, n: usize) -> bool {
        if let Some(count) = self.counts.get_mut(label) {
            *count += n;
            return true;
        }
        if !self.open {
            return false;
        }
        self.labels.push(label.to_string());
        self.counts.insert(label.to_string(), n);
        true
    }

    pub(crate) fn bump(&mut self, label: &str) -> bool {
        self.add(label, 1)
    }

    /// Strictly greatest count wins; ties go to the earliest label.
    fn peak(&self) -> Option<String> {
        let mut best: Option<(&String, usize)> = None;
        for label in &self.labels {
            let count = self.counts.get(label).copied().unwrap_or(0);
            if count == 0 {
                continue;
            }
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((label, count)),
            }
        }
        best.map(|(label, _)| label.clone())
    }

    pub(crate) fn into_result(self, name: &str, total: usize, excluded: usize) -> SummaryResult {
        let peak_label = self.peak();
        SummaryResult {
            dimension_name: name.to_string(),
            counts: self.counts.into_iter().collect(),
            labels: self.labels,
            total,
            excluded,
            peak_label,
        }
    }
}

/// Every dimension computed over one snapshot of records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub record_count: usize,
    pub dimensions: BTreeMap<String, SummaryResult>,
}

impl Summary {
    pub fn get(&self, name: &str) -> Option<&SummaryResult> {
        self.dimensions.get(name)
    }
}

/// One table cell in an exported section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Count(usize),
    Number(f64),
    Empty,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Count(n) => write!(f, "{}", n),
            Cell::Number(n) if n.fract() == 0.0 => write!(f, "{:.0}", n),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Empty => Ok(()),
        }
    }
}

impl From<Field> for Cell {
    fn from(field: Field) -> Self {
        match field {
            Field::Text(s) => Cell::Text(s),
            Field::Number(n) => Cell::Number(n),
            Field::Flag(true) => Cell::Text("Yes".to_string()),
            Field::Flag(false) => Cell::Text("No".to_string()),
            Field::Date(d) => Cell::Text(d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// A titled table in the export document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// A row of the overview table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverviewItem {
    /// Size of the record snapshot.
    Total { label: String },
    /// Every label of a dimension with its count and share.
    Breakdown { dimension: String },
    /// Number of labels with at least one record.
    Distinct { label: String, dimension: String },
    /// Peak label with its count.
    Peak { label: String, dimension: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionSource {
    Overview(Vec<OverviewItem>),
    Dimension(String),
}

/// Where a report section comes from and how it is headed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSpec {
    pub title: String,
    pub columns: Vec<String>,
    pub source: SectionSource,
}

impl SectionSpec {
    pub fn dimension(title: &str, dimension: &str, label_header: &str, count_header: &str) -> Self {
        SectionSpec {
            title: title.to_string(),
            columns: vec![label_header.to_string(), count_header.to_string()],
            source: SectionSource::Dimension(dimension.to_string()),
        }
    }

    pub fn overview(title: &str, items: Vec<OverviewItem>) -> Self {
        SectionSpec {
            title: title.to_string(),
            columns: vec!["Metric".to_string(), "Value".to_string()],
            source: SectionSource::Overview(items),
        }
    }
}

/// Summary mapping for the chart layer plus the sections for the document layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub summary: Summary,
    pub sections: Vec<ReportSection>,
}

/// Console row for a single dimension's chart data.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct SummaryRow {
    #[serde(rename = "Label")]
    #[tabled(rename = "Label")]
    pub label: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
    #[serde(rename = "Share")]
    #[tabled(rename = "Share")]
    pub share: String,
}

impl SummaryRow {
    pub fn from_result(result: &SummaryResult) -> Vec<SummaryRow> {
        result
            .rows()
            .map(|(label, count)| SummaryRow {
                label: label.to_string(),
                count,
                share: crate::util::format_share(result.share(label)),
            })
            .collect()
    }
}
