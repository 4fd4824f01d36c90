use crate::error::Result;
use crate::types::{ReportSection, SummaryResult, SummaryRow};
use crate::util::slug;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style, Table};

/// Write one CSV per section into `dir`, numbered in section order.
pub fn write_sections_csv(dir: &Path, sections: &[ReportSection]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut paths = Vec::with_capacity(sections.len());
    for (idx, section) in sections.iter().enumerate() {
        let path = dir.join(format!("{:02}_{}.csv", idx + 1, slug(&section.title)));
        let mut wtr = csv::Writer::from_path(&path)?;
        wtr.write_record(&section.columns)?;
        for row in &section.rows {
            wtr.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
        wtr.flush()?;
        paths.push(path);
    }
    Ok(paths)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    fs::write(path, s)?;
    Ok(())
}

/// Markdown table of the first `max_rows` rows of a section.
pub fn render_section(section: &ReportSection, max_rows: usize) -> String {
    let mut data: Vec<Vec<String>> = Vec::with_capacity(max_rows.min(section.rows.len()) + 1);
    data.push(section.columns.clone());
    data.extend(
        section
            .rows
            .iter()
            .take(max_rows)
            .map(|row| row.iter().map(|cell| cell.to_string()).collect()),
    );
    Builder::from(data).build().with(Style::markdown()).to_string()
}

pub fn preview_section(section: &ReportSection, max_rows: usize) {
    println!("{}", section.title);
    println!();
    if section.rows.is_empty() {
        println!("(no rows)\n");
        return;
    }
    println!("{}", render_section(section, max_rows));
    if section.rows.len() > max_rows {
        println!("({} more rows in export)", section.rows.len() - max_rows);
    }
    println!();
}

/// Chart data of one dimension with shares, as a markdown table.
pub fn render_summary(result: &SummaryResult) -> String {
    let rows = SummaryRow::from_result(result);
    if rows.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(rows).with(Style::markdown()).to_string()
}
