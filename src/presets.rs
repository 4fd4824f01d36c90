//! Built-in dimension and section sets for the student and enquiry desks.

use crate::error::SpecError;
use crate::listing::{self, Column};
use crate::reports;
use crate::summary;
use crate::types::{
    Bucket, BucketMode, DimensionSpec, FieldKind, Granularity, LabelMapping, LabelSet,
    OverviewItem, Predicate, Record, Report, SectionSpec,
};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

pub const GENDER: &str = "gender";
pub const MONTHLY_REGISTRATIONS: &str = "monthly_registrations";
pub const COURSE: &str = "course";
pub const CENTER: &str = "center";
pub const FAMILY_INCOME: &str = "family_income";
pub const AGE_GROUPS: &str = "age_groups";
pub const JOB_REQUIREMENT: &str = "job_requirement";
pub const WORKING_STATUS: &str = "working_status";

pub const ENQUIRY_TIMELINE: &str = "enquiry_timeline";
pub const INTERESTED_COURSE: &str = "interested_course";
pub const LOCATION: &str = "location";
pub const PLACEMENT_INTEREST: &str = "placement_interest";

/// Fields the student table search looks at.
pub const STUDENT_SEARCH_FIELDS: [&str; 3] = ["full_name", "aadhar_no", "course_name"];

pub static STUDENT_DIMENSIONS: Lazy<Vec<DimensionSpec>> = Lazy::new(|| {
    let gender_map: BTreeMap<String, String> = [("M", "Male"), ("F", "Female"), ("O", "Other")]
        .into_iter()
        .map(|(raw, label)| (raw.to_string(), label.to_string()))
        .collect();

    vec![
        DimensionSpec::categorical(
            GENDER,
            "gender",
            LabelSet::Fixed(vec![
                "Male".to_string(),
                "Female".to_string(),
                "Other".to_string(),
            ]),
            LabelMapping::Table {
                entries: gender_map,
            },
        ),
        DimensionSpec::calendar(
            MONTHLY_REGISTRATIONS,
            "date_of_registration",
            Granularity::Month,
        ),
        DimensionSpec::categorical(
            COURSE,
            "course_name",
            LabelSet::Discover,
            LabelMapping::Identity,
        ),
        DimensionSpec::categorical(
            CENTER,
            "center_name",
            LabelSet::Discover,
            LabelMapping::Identity,
        ),
        DimensionSpec::bucket(
            FAMILY_INCOME,
            "family_income",
            BucketMode::Partition,
            vec![
                Bucket::new("<2L", Predicate::LessThan(200_000.0)),
                Bucket::new(
                    "2L-4L",
                    Predicate::Between {
                        low: 200_000.0,
                        high: 400_000.0,
                    },
                ),
                Bucket::new("4L+", Predicate::GreaterThan(400_000.0)),
            ],
        ),
        DimensionSpec::bucket(
            AGE_GROUPS,
            "age",
            BucketMode::Cumulative,
            vec![
                Bucket::new("16+", Predicate::AtLeast(16.0)),
                Bucket::new("18+", Predicate::AtLeast(18.0)),
                Bucket::new("22+", Predicate::AtLeast(22.0)),
                Bucket::new("24+", Predicate::AtLeast(24.0)),
            ],
        ),
        DimensionSpec::flag(JOB_REQUIREMENT, "job_required", "Job Required", "Not Required"),
        DimensionSpec::flag(WORKING_STATUS, "working_status", "Working", "Non-Working"),
    ]
});

pub static STUDENT_SECTIONS: Lazy<Vec<SectionSpec>> = Lazy::new(|| {
    vec![
        SectionSpec::overview(
            "Overview",
            vec![
                OverviewItem::Total {
                    label: "Total Students".to_string(),
                },
                OverviewItem::Breakdown {
                    dimension: GENDER.to_string(),
                },
                OverviewItem::Distinct {
                    label: "Courses Enrolled".to_string(),
                    dimension: COURSE.to_string(),
                },
                OverviewItem::Peak {
                    label: "Most Popular Course".to_string(),
                    dimension: COURSE.to_string(),
                },
                OverviewItem::Peak {
                    label: "Peak Registration Month".to_string(),
                    dimension: MONTHLY_REGISTRATIONS.to_string(),
                },
            ],
        ),
        SectionSpec::dimension("Students per Course", COURSE, "Course", "Students"),
        SectionSpec::dimension("Students per Center", CENTER, "Center", "Students"),
        SectionSpec::dimension(
            "Monthly Registrations",
            MONTHLY_REGISTRATIONS,
            "Month",
            "Registrations",
        ),
        SectionSpec::dimension("Family Income", FAMILY_INCOME, "Income Band", "Students"),
        SectionSpec::dimension("Age Groups", AGE_GROUPS, "Age Group", "Students"),
        SectionSpec::dimension("Job Requirement", JOB_REQUIREMENT, "Requirement", "Students"),
        SectionSpec::dimension("Working Status", WORKING_STATUS, "Status", "Students"),
    ]
});

pub static STUDENT_LISTING: Lazy<Vec<Column>> = Lazy::new(|| {
    vec![
        Column::new("Student Name", "full_name", FieldKind::Text),
        Column::new("Aadhar Number", "aadhar_no", FieldKind::Text),
        Column::new("Course", "course_name", FieldKind::Text),
        Column::new("Age", "age", FieldKind::Number),
    ]
});

pub static ENQUIRY_LISTING: Lazy<Vec<Column>> = Lazy::new(|| {
    vec![
        Column::new("Candidate", "candidate_name", FieldKind::Text),
        Column::new("Course", "interested_course", FieldKind::Text),
        Column::new("Location", "location", FieldKind::Text),
        Column::new("Placement", "interest_in_placement", FieldKind::Flag),
        Column::new("Enquiry Date", "enquiry_date", FieldKind::Date),
    ]
});

pub fn enquiry_dimensions(granularity: Granularity) -> Vec<DimensionSpec> {
    vec![
        DimensionSpec::calendar(ENQUIRY_TIMELINE, "enquiry_date", granularity),
        DimensionSpec::categorical(
            INTERESTED_COURSE,
            "interested_course",
            LabelSet::Discover,
            LabelMapping::Identity,
        ),
        DimensionSpec::categorical(
            LOCATION,
            "location",
            LabelSet::Discover,
            LabelMapping::Identity,
        ),
        DimensionSpec::flag(
            PLACEMENT_INTEREST,
            "interest_in_placement",
            "Interested",
            "Not Interested",
        ),
    ]
}

pub fn enquiry_sections(granularity: Granularity) -> Vec<SectionSpec> {
    let (title, period) = match granularity {
        Granularity::Day => ("Daily Enquiries", "Day"),
        Granularity::IsoWeek => ("Weekly Enquiries", "Week"),
        Granularity::Month => ("Monthly Enquiries", "Month"),
    };
    vec![
        SectionSpec::overview(
            "Overview",
            vec![
                OverviewItem::Total {
                    label: "Total Enquiries".to_string(),
                },
                OverviewItem::Peak {
                    label: "Busiest Period".to_string(),
                    dimension: ENQUIRY_TIMELINE.to_string(),
                },
                OverviewItem::Peak {
                    label: "Most Requested Course".to_string(),
                    dimension: INTERESTED_COURSE.to_string(),
                },
                OverviewItem::Breakdown {
                    dimension: PLACEMENT_INTEREST.to_string(),
                },
            ],
        ),
        SectionSpec::dimension(title, ENQUIRY_TIMELINE, period, "Enquiries"),
        SectionSpec::dimension("Enquiries per Course", INTERESTED_COURSE, "Course", "Enquiries"),
        SectionSpec::dimension("Enquiries per Location", LOCATION, "Location", "Enquiries"),
        SectionSpec::dimension(
            "Placement Interest",
            PLACEMENT_INTEREST,
            "Interest",
            "Enquiries",
        ),
    ]
}

/// Student summary and export document. `extra` dimensions are computed and
/// reported after the built-in sections.
pub fn student_report(records: &[Record], extra: &[DimensionSpec]) -> Result<Report, SpecError> {
    let mut dimensions = STUDENT_DIMENSIONS.clone();
    dimensions.extend_from_slice(extra);
    let summary = summary::build(records, &dimensions)?;

    let mut order = STUDENT_SECTIONS.clone();
    order.extend(
        extra
            .iter()
            .map(|spec| SectionSpec::dimension(&spec.name, &spec.name, "Label", "Students")),
    );
    let mut sections = reports::assemble(&summary, &order)?;
    sections.extend(listing::project(records, "Student Listing", &STUDENT_LISTING));
    Ok(Report { summary, sections })
}

/// Enquiry summary and export document, bucketing enquiry dates at the
/// caller's granularity.
pub fn enquiry_report(records: &[Record], granularity: Granularity) -> Result<Report, SpecError> {
    let summary = summary::build(records, &enquiry_dimensions(granularity))?;
    let mut sections = reports::assemble(&summary, &enquiry_sections(granularity))?;
    sections.extend(listing::project(records, "Enquiry Listing", &ENQUIRY_LISTING));
    Ok(Report { summary, sections })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(summary::validate(&STUDENT_DIMENSIONS).is_ok());
        for granularity in [Granularity::Day, Granularity::IsoWeek, Granularity::Month] {
            assert!(summary::validate(&enquiry_dimensions(granularity)).is_ok());
        }
    }

    #[test]
    fn test_student_report_on_empty_snapshot_has_no_sections() {
        let report = student_report(&[], &[]).unwrap();
        assert_eq!(report.summary.record_count, 0);
        assert_eq!(report.summary.dimensions.len(), STUDENT_DIMENSIONS.len());
        assert!(report.sections.is_empty());
    }

    #[test]
    fn test_extra_dimension_name_clash_is_rejected() {
        let extra = vec![DimensionSpec::calendar(GENDER, "date_of_birth", Granularity::Month)];
        assert_eq!(
            student_report(&[], &extra),
            Err(SpecError::DuplicateDimension(GENDER.to_string()))
        );
    }

    #[test]
    fn test_student_overview_rows() {
        let records: Vec<Record> = [
            ("F", "Tailoring", "2025-03-02"),
            ("M", "Tailoring", "2025-03-20"),
            ("F", "Welding", "2025-04-01"),
        ]
        .iter()
        .map(|(gender, course, joined)| {
            let mut record = Record::new();
            record.insert("gender".to_string(), (*gender).into());
            record.insert("course_name".to_string(), (*course).into());
            record.insert("date_of_registration".to_string(), (*joined).into());
            record
        })
        .collect();
        let report = student_report(&records, &[]).unwrap();
        let overview = &report.sections[0];
        assert_eq!(overview.title, "Overview");
        let rows: Vec<Vec<String>> = overview
            .rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        assert_eq!(
            rows,
            vec![
                vec!["Total Students", "3"],
                vec!["Male", "1 (33.3%)"],
                vec!["Female", "2 (66.7%)"],
                vec!["Other", "0 (0.0%)"],
                vec!["Courses Enrolled", "2"],
                vec!["Most Popular Course", "Tailoring (2)"],
                vec!["Peak Registration Month", "March 2025 (2)"],
            ]
        );
    }

    #[test]
    fn test_enquiry_section_titles_follow_granularity() {
        let weekly = enquiry_sections(Granularity::IsoWeek);
        assert_eq!(weekly[1].title, "Weekly Enquiries");
        assert_eq!(weekly[1].columns, vec!["Week", "Enquiries"]);
    }
}
