use crate::accessor;
use crate::types::{Cell, FieldKind, Record, ReportSection};

/// One column of a per-record listing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub header: String,
    pub field: String,
    pub kind: FieldKind,
}

impl Column {
    pub fn new(header: &str, field: &str, kind: FieldKind) -> Self {
        Column {
            header: header.to_string(),
            field: field.to_string(),
            kind,
        }
    }
}

/// Project records into a listing table, one row per record.
///
/// Values that are missing or fail coercion become empty cells. Returns
/// `None` when there is nothing to list.
pub fn project<'a, I>(records: I, title: &str, columns: &[Column]) -> Option<ReportSection>
where
    I: IntoIterator<Item = &'a Record>,
{
    let rows: Vec<Vec<Cell>> = records
        .into_iter()
        .map(|record| {
            columns
                .iter()
                .map(|col| {
                    accessor::get(record, &col.field, col.kind)
                        .map(Cell::from)
                        .unwrap_or(Cell::Empty)
                })
                .collect()
        })
        .collect();
    if rows.is_empty() {
        return None;
    }
    Some(ReportSection {
        title: title.to_string(),
        columns: columns.iter().map(|c| c.header.clone()).collect(),
        rows,
    })
}

/// Case-insensitive substring search over the given text fields.
/// An empty query matches everything.
pub fn search<'a>(records: &'a [Record], query: &str, fields: &[&str]) -> Vec<&'a Record> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return records.iter().collect();
    }
    records
        .iter()
        .filter(|record| {
            fields.iter().any(|field| {
                accessor::text(record, field)
                    .map(|value| value.to_lowercase().contains(&query))
                    .unwrap_or(false)
            })
        })
        .collect()
}
