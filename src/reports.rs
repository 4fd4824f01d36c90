use crate::error::SpecError;
use crate::types::{
    Cell, OverviewItem, ReportSection, SectionSource, SectionSpec, Summary, SummaryResult,
};
use crate::util::{format_share, percentage};
use tracing::debug;

/// Turn a summary into export sections in the given order.
///
/// A section whose dimension has no counted records is left out entirely, as
/// is the overview when the snapshot is empty. Rows keep the summary's own
/// label order. A section naming a dimension the summary does not have is a
/// configuration error.
pub fn assemble(summary: &Summary, order: &[SectionSpec]) -> Result<Vec<ReportSection>, SpecError> {
    let mut sections = Vec::with_capacity(order.len());
    for spec in order {
        let section = match &spec.source {
            SectionSource::Dimension(name) => {
                let result = lookup(summary, &spec.title, name)?;
                dimension_section(spec, result)
            }
            SectionSource::Overview(items) => overview_section(summary, spec, items)?,
        };
        match section {
            Some(section) if !section.rows.is_empty() => sections.push(section),
            _ => debug!(section = %spec.title, "omitting empty section"),
        }
    }
    Ok(sections)
}

/// One-line text for a chart card, e.g. `Peak: March 2025 (4 registrations)`.
pub fn caption(result: &SummaryResult, lead: &str, noun: &str) -> String {
    match (&result.peak_label, result.peak_count()) {
        (Some(label), Some(count)) => format!("{}: {} ({} {})", lead, label, count, noun),
        _ => "No data".to_string(),
    }
}

/// `Male: 12 (40.0%) • Female: 18 (60.0%)` style breakdown line.
pub fn breakdown_line(result: &SummaryResult) -> String {
    result
        .rows()
        .map(|(label, count)| {
            format!(
                "{}: {} ({})",
                label,
                count,
                format_share(result.share(label))
            )
        })
        .collect::<Vec<_>>()
        .join(" • ")
}

fn lookup<'a>(
    summary: &'a Summary,
    section: &str,
    dimension: &str,
) -> Result<&'a SummaryResult, SpecError> {
    summary
        .get(dimension)
        .ok_or_else(|| SpecError::UnknownDimension {
            section: section.to_string(),
            dimension: dimension.to_string(),
        })
}

fn dimension_section(spec: &SectionSpec, result: &SummaryResult) -> Option<ReportSection> {
    if result.is_empty() {
        return None;
    }
    let rows = result
        .rows()
        .map(|(label, count)| vec![Cell::Text(label.to_string()), Cell::Count(count)])
        .collect();
    Some(ReportSection {
        title: spec.title.clone(),
        columns: spec.columns.clone(),
        rows,
    })
}

fn overview_section(
    summary: &Summary,
    spec: &SectionSpec,
    items: &[OverviewItem],
) -> Result<Option<ReportSection>, SpecError> {
    let mut rows = Vec::new();
    for item in items {
        match item {
            OverviewItem::Total { label } => {
                rows.push(vec![
                    Cell::Text(label.clone()),
                    Cell::Count(summary.record_count),
                ]);
            }
            OverviewItem::Breakdown { dimension } => {
                let result = lookup(summary, &spec.title, dimension)?;
                for (label, count) in result.rows() {
                    let pct = percentage(count, result.total);
                    rows.push(vec![
                        Cell::Text(label.to_string()),
                        Cell::Text(format!("{} ({})", count, format_share(pct))),
                    ]);
                }
            }
            OverviewItem::Distinct { label, dimension } => {
                let result = lookup(summary, &spec.title, dimension)?;
                let distinct = result.counts.values().filter(|c| **c > 0).count();
                rows.push(vec![Cell::Text(label.clone()), Cell::Count(distinct)]);
            }
            OverviewItem::Peak { label, dimension } => {
                let result = lookup(summary, &spec.title, dimension)?;
                if let (Some(peak), Some(count)) = (&result.peak_label, result.peak_count()) {
                    rows.push(vec![
                        Cell::Text(label.clone()),
                        Cell::Text(format!("{} ({})", peak, count)),
                    ]);
                }
            }
        }
    }

    if summary.record_count == 0 {
        return Ok(None);
    }
    Ok(Some(ReportSection {
        title: spec.title.clone(),
        columns: spec.columns.clone(),
        rows,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn result(name: &str, pairs: &[(&str, usize)], total: usize) -> SummaryResult {
        let mut peak: Option<(&str, usize)> = None;
        for (label, count) in pairs {
            if *count > 0 && peak.map_or(true, |(_, best)| *count > best) {
                peak = Some((*label, *count));
            }
        }
        SummaryResult {
            dimension_name: name.to_string(),
            labels: pairs.iter().map(|(l, _)| l.to_string()).collect(),
            counts: pairs.iter().map(|(l, c)| (l.to_string(), *c)).collect(),
            total,
            excluded: 0,
            peak_label: peak.map(|(l, _)| l.to_string()),
        }
    }

    fn summary() -> Summary {
        let mut dimensions = BTreeMap::new();
        dimensions.insert(
            "gender".to_string(),
            result("gender", &[("Male", 2), ("Female", 3)], 5),
        );
        dimensions.insert(
            "course".to_string(),
            result("course", &[("Welding", 1), ("Tailoring", 4)], 5),
        );
        dimensions.insert("income".to_string(), result("income", &[("<2L", 0)], 0));
        Summary {
            record_count: 5,
            dimensions,
        }
    }

    #[test]
    fn test_sections_follow_order_and_skip_empty() {
        let order = vec![
            SectionSpec::dimension("Family Income", "income", "Band", "Students"),
            SectionSpec::dimension("Students per Course", "course", "Course", "Students"),
            SectionSpec::dimension("Gender", "gender", "Gender", "Students"),
        ];
        let sections = assemble(&summary(), &order).unwrap();
        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Students per Course", "Gender"]);
        assert_eq!(sections[0].columns, vec!["Course", "Students"]);
        assert_eq!(
            sections[0].rows,
            vec![
                vec![Cell::Text("Welding".to_string()), Cell::Count(1)],
                vec![Cell::Text("Tailoring".to_string()), Cell::Count(4)],
            ]
        );
    }

    #[test]
    fn test_unknown_dimension_is_rejected() {
        let order = vec![SectionSpec::dimension("Centers", "center", "Center", "Students")];
        assert_eq!(
            assemble(&summary(), &order),
            Err(SpecError::UnknownDimension {
                section: "Centers".to_string(),
                dimension: "center".to_string(),
            })
        );
    }

    #[test]
    fn test_overview_rows() {
        let order = vec![SectionSpec::overview(
            "Overview",
            vec![
                OverviewItem::Total {
                    label: "Total Students".to_string(),
                },
                OverviewItem::Breakdown {
                    dimension: "gender".to_string(),
                },
                OverviewItem::Distinct {
                    label: "Courses".to_string(),
                    dimension: "course".to_string(),
                },
                OverviewItem::Peak {
                    label: "Most Popular Course".to_string(),
                    dimension: "course".to_string(),
                },
                OverviewItem::Peak {
                    label: "Top Income Band".to_string(),
                    dimension: "income".to_string(),
                },
            ],
        )];
        let sections = assemble(&summary(), &order).unwrap();
        assert_eq!(sections.len(), 1);
        let rows: Vec<Vec<String>> = sections[0]
            .rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        assert_eq!(
            rows,
            vec![
                vec!["Total Students", "5"],
                vec!["Male", "2 (40.0%)"],
                vec!["Female", "3 (60.0%)"],
                vec!["Courses", "2"],
                vec!["Most Popular Course", "Tailoring (4)"],
            ]
        );
    }

    #[test]
    fn test_overview_omitted_for_empty_snapshot() {
        let empty = Summary {
            record_count: 0,
            dimensions: BTreeMap::new(),
        };
        let order = vec![SectionSpec::overview(
            "Overview",
            vec![OverviewItem::Total {
                label: "Total".to_string(),
            }],
        )];
        assert!(assemble(&empty, &order).unwrap().is_empty());
    }

    #[test]
    fn test_caption_and_breakdown() {
        let s = summary();
        assert_eq!(
            caption(s.get("course").unwrap(), "Most popular", "students"),
            "Most popular: Tailoring (4 students)"
        );
        assert_eq!(caption(s.get("income").unwrap(), "Peak", "students"), "No data");
        assert_eq!(
            breakdown_line(s.get("gender").unwrap()),
            "Male: 2 (40.0%) • Female: 3 (60.0%)"
        );
    }
}
