// Entry point and interactive menu.
//
// - Options [1] and [2] load the student and enquiry snapshots named in the
//   config, printing load diagnostics.
// - Option [3] builds both reports, prints chart captions and table previews,
//   and exports every section as CSV plus the summary mapping as JSON.
// - Option [4] filters loaded students by name, Aadhaar number or course.
use cohort_report::config::ReportConfig;
use cohort_report::types::{Granularity, Record, Report};
use cohort_report::{listing, loader, output, presets, reports, util};
use once_cell::sync::Lazy;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing_subscriber::EnvFilter;

// Loaded snapshots, so reports can be regenerated without reloading.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        students: None,
        enquiries: None,
    })
});

struct AppState {
    students: Option<Vec<Record>>,
    enquiries: Option<Vec<Record>>,
}

#[derive(Clone, Copy)]
enum Dataset {
    Students,
    Enquiries,
}

/// One trimmed line from `input`; `None` at end of input or on a read error.
fn read_answer<R: BufRead>(input: &mut R) -> Option<String> {
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn prompt(label: &str) -> Option<String> {
    print!("{}", label);
    let _ = io::stdout().flush();
    read_answer(&mut io::stdin().lock())
}

/// Ask for the enquiry granularity; an empty answer keeps the configured one.
fn prompt_granularity(default: Granularity) -> Option<Granularity> {
    let answer = prompt(&format!(
        "Enquiry granularity (day/isoWeek/month) [{}]: ",
        default
    ))?;
    if answer.is_empty() {
        return Some(default);
    }
    match answer.parse() {
        Ok(g) => Some(g),
        Err(e) => {
            println!("{}\n", e);
            None
        }
    }
}

fn prompt_back_to_menu() -> bool {
    loop {
        let Some(answer) = prompt("Back to Report Selection (Y/N): ") else {
            return false;
        };
        match answer.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn handle_load(path: &Path, dataset: Dataset) {
    match loader::load_records(path) {
        Ok((records, report)) => {
            println!(
                "Processing {}... ({} rows read, {} loaded)",
                path.display(),
                util::format_int(report.total_rows),
                util::format_int(report.loaded_rows)
            );
            if report.skipped_rows > 0 {
                println!(
                    "Note: {} rows skipped because they were not records.",
                    util::format_int(report.skipped_rows)
                );
            }
            println!();
            let mut state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
            match dataset {
                Dataset::Students => state.students = Some(records),
                Dataset::Enquiries => state.enquiries = Some(records),
            }
        }
        Err(e) => eprintln!("Failed to load {}: {}\n", path.display(), e),
    }
}

fn handle_search() {
    let state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(students) = state.students.as_ref() else {
        println!("Error: No student records loaded. Please load them first (option 1).\n");
        return;
    };
    let Some(query) = prompt("Search by name, Aadhaar or course: ") else {
        return;
    };
    let matches = listing::search(students, &query, &presets::STUDENT_SEARCH_FIELDS);
    match listing::project(matches, "Search Results", &presets::STUDENT_LISTING) {
        Some(section) => println!("{}\n", output::render_section(&section, section.rows.len())),
        None => println!("No students match \"{}\".\n", query),
    }
}

fn print_captions(report: &Report, captions: &[(&str, &str, &str)]) {
    for (dimension, lead, noun) in captions {
        if let Some(result) = report.summary.get(dimension) {
            println!("  {}", reports::caption(result, lead, noun));
        }
    }
    println!();
}

fn export(report: &Report, dir: &Path, preview_rows: usize) {
    for section in &report.sections {
        output::preview_section(section, preview_rows);
    }
    match output::write_sections_csv(dir, &report.sections) {
        Ok(paths) => println!(
            "({} tables exported to {})",
            util::format_int(paths.len()),
            dir.display()
        ),
        Err(e) => eprintln!("Write error: {}", e),
    }
    if let Err(e) = output::write_json(&dir.join("summary.json"), &report.summary) {
        eprintln!("Write error: {}", e);
    }
    println!();
}

fn handle_generate_reports(config: &ReportConfig) {
    let (students, enquiries) = {
        let state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
        (state.students.clone(), state.enquiries.clone())
    };
    if students.is_none() && enquiries.is_none() {
        println!("Error: No data loaded. Please load a record file first (option 1 or 2).\n");
        return;
    }

    if let Some(records) = students {
        match presets::student_report(&records, &config.extra_dimensions) {
            Ok(report) => {
                println!("Student Report ({} students)\n", util::format_int(records.len()));
                if let Some(gender) = report.summary.get(presets::GENDER) {
                    println!("  {}", reports::breakdown_line(gender));
                }
                print_captions(
                    &report,
                    &[
                        (presets::MONTHLY_REGISTRATIONS, "Peak", "registrations"),
                        (presets::COURSE, "Most popular", "students"),
                        (presets::CENTER, "Busiest center", "students"),
                    ],
                );
                export(&report, &config.output_dir.join("students"), config.preview_rows);
            }
            Err(e) => eprintln!("Student report rejected: {}\n", e),
        }
    }

    if let Some(records) = enquiries {
        let Some(granularity) = prompt_granularity(config.enquiry_granularity) else {
            return;
        };
        match presets::enquiry_report(&records, granularity) {
            Ok(report) => {
                println!("Enquiry Report ({} enquiries)\n", util::format_int(records.len()));
                if let Some(timeline) = report.summary.get(presets::ENQUIRY_TIMELINE) {
                    println!("{}\n", output::render_summary(timeline));
                }
                print_captions(
                    &report,
                    &[
                        (presets::ENQUIRY_TIMELINE, "Peak", "enquiries"),
                        (presets::INTERESTED_COURSE, "Most requested", "enquiries"),
                    ],
                );
                export(&report, &config.output_dir.join("enquiries"), config.preview_rows);
            }
            Err(e) => eprintln!("Enquiry report rejected: {}\n", e),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match ReportConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    loop {
        println!("Select an option:");
        println!("[1] Load student records");
        println!("[2] Load enquiry records");
        println!("[3] Generate Reports");
        println!("[4] Search students\n");
        let Some(choice) = prompt("Enter choice: ") else {
            println!("\nExiting the program.");
            break;
        };
        match choice.as_str() {
            "1" => handle_load(&config.students_path, Dataset::Students),
            "2" => handle_load(&config.enquiries_path, Dataset::Enquiries),
            "3" => {
                println!();
                handle_generate_reports(&config);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "4" => handle_search(),
            _ => println!("Invalid choice. Please enter 1, 2, 3 or 4.\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_answer_trims_each_line() {
        let mut input: &[u8] = b" 3 \nisoWeek\r\n";
        assert_eq!(read_answer(&mut input), Some("3".to_string()));
        assert_eq!(read_answer(&mut input), Some("isoWeek".to_string()));
    }

    #[test]
    fn test_read_answer_ends_at_closed_input() {
        let mut input: &[u8] = b"\n";
        assert_eq!(read_answer(&mut input), Some(String::new()));
        assert_eq!(read_answer(&mut input), None);
        assert_eq!(read_answer(&mut io::empty()), None);
    }
}
