// Entry point and interactive console flow.
//
// - Option [1] reads the previous / current CSV exports, reconciles them
//   and prints per-file diagnostics.
// - Option [2] writes the page diff CSV, the report payload JSON and the
//   Markdown digest, previewing the tables on the console.
use chrono::{Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use tracing::error;
use tracing_subscriber::EnvFilter;
use traffic_diff::generator::{report_filename, MarkdownDigest, ReportGenerator};
use traffic_diff::reports::{build_report, page_rows, summary_rows, Analysis, ReportLabels};
use traffic_diff::types::LoadReport;
use traffic_diff::util::format_int;
use traffic_diff::{output, ReportConfig, ReportError};

const CONFIG_FILE: &str = "report_config.json";

// Keep the last reconciled run so reports can be regenerated without
// reloading the CSV files.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { analysis: None }));

struct AppState {
    analysis: Option<Analysis>,
}

/// Print `label` (with the default in brackets, if any) and read one line.
/// An empty answer falls back to the default. End of input quits.
fn prompt(label: &str, default: Option<&str>) -> String {
    match default {
        Some(d) => print!("{} [{}]: ", label, d),
        None => print!("{}: ", label),
    }
    let _ = io::stdout().flush();
    let mut buf = String::new();
    if matches!(io::stdin().read_line(&mut buf), Ok(0)) {
        println!("\nExiting the program.");
        std::process::exit(0);
    }
    let answer = buf.trim();
    if answer.is_empty() {
        default.unwrap_or_default().to_string()
    } else {
        answer.to_string()
    }
}

fn prompt_back_to_menu() -> bool {
    loop {
        let resp = prompt("Back to menu (Y/N)", None).to_uppercase();
        match resp.as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// `(previous, current)` month labels as `YYYY-MM`, relative to today.
fn default_months(today: NaiveDate) -> (String, String) {
    let first = today.with_day(1).unwrap_or(today);
    let prev = first.pred_opt().unwrap_or(first);
    (prev.format("%Y-%m").to_string(), first.format("%Y-%m").to_string())
}

fn load_config() -> ReportConfig {
    if !Path::new(CONFIG_FILE).exists() {
        return ReportConfig::default();
    }
    match ReportConfig::from_json_file(CONFIG_FILE) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "ignoring unreadable {}", CONFIG_FILE);
            ReportConfig::default()
        }
    }
}

fn print_load_report(label: &str, path: &str, report: &LoadReport) {
    println!(
        "{} ({}): {} rows read, {} used, encoding {}",
        label,
        path,
        format_int(report.rows.total_rows),
        format_int(report.rows.used_rows),
        report.encoding.label()
    );
    if report.rows.dropped_rows() > 0 {
        println!(
            "Note: {} rows skipped (missing URL: {}, missing traffic: {}, invalid traffic: {}, malformed: {}).",
            format_int(report.rows.dropped_rows()),
            report.rows.skipped_missing_url,
            report.rows.skipped_missing_traffic,
            report.rows.skipped_invalid_traffic,
            report.rows.malformed_rows
        );
    }
}

/// Handle option [1]: read both CSV files and reconcile them.
fn handle_load(config: &ReportConfig) -> Result<(), ReportError> {
    let prev_path = prompt("Previous month CSV path", None);
    let curr_path = prompt("Current month CSV path", None);
    let target = prompt("Target site (e.g. https://example.com)", None);
    let (month_prev_default, month_current_default) = default_months(Local::now().date_naive());
    let month_prev = prompt("Previous month label", Some(month_prev_default.as_str()));
    let month_current = prompt("Current month label", Some(month_current_default.as_str()));
    let markers_default = config.blog_markers.join(",");
    let markers = prompt("Blog path markers (comma-separated)", Some(markers_default.as_str()));

    let config = config.clone().with_blog_markers(&markers);
    let prev_bytes = std::fs::read(&prev_path)?;
    let curr_bytes = std::fs::read(&curr_path)?;
    let labels = ReportLabels {
        target,
        month_prev,
        month_current,
    };

    println!("Processing CSV files...");
    let analysis = build_report(&prev_bytes, &curr_bytes, &labels, &config)?;
    print_load_report("Previous", &prev_path, &analysis.prev_load);
    print_load_report("Current", &curr_path, &analysis.current_load);
    println!(
        "Reconciled {} URLs ({} blog pages).\n",
        format_int(analysis.input.summary.all.page_count),
        format_int(analysis.input.summary.blog_only.page_count)
    );

    let mut state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
    state.analysis = Some(analysis);
    Ok(())
}

/// Handle option [2]: write the diff CSV, payload JSON and Markdown digest.
fn handle_generate_report() -> Result<(), ReportError> {
    let analysis = {
        let state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
        state.analysis.clone()
    };
    let Some(analysis) = analysis else {
        println!("Error: No data loaded. Please load the CSV files first (option 1).\n");
        return Ok(());
    };
    let input = &analysis.input;

    let rows = page_rows(&input.pages);
    let pages_file = format!("pages_{}.csv", input.month_current);
    output::write_csv(&pages_file, &rows)?;
    output::preview_table_rows("Summary", &summary_rows(&input.summary), 2);
    output::preview_table_rows("Pages", &rows, 5);
    println!("(Full table exported to {})\n", pages_file);

    let payload_file = format!("report_input_{}.json", input.month_current);
    output::write_json(&payload_file, input)?;
    println!("Report payload saved to {}", payload_file);

    let report = MarkdownDigest::default().generate(input)?;
    let report_file = report_filename(&input.target, &input.month_current);
    output::write_text(&report_file, &report)?;
    println!("Report saved to {}\n", report_file);
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let config = load_config();
    loop {
        println!("Organic Traffic Diff Report");
        println!("[1] Load CSV files");
        println!("[2] Generate report\n");
        match prompt("Enter choice", None).as_str() {
            "1" => {
                if let Err(e) = handle_load(&config) {
                    eprintln!("Failed to load CSV files: {}\n", e);
                }
            }
            "2" => {
                println!();
                if let Err(e) = handle_generate_report() {
                    eprintln!("Failed to generate report: {}\n", e);
                }
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1 or 2.\n");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_months_cross_year_boundary() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 18).unwrap();
        assert_eq!(
            default_months(today),
            ("2025-12".to_string(), "2026-01".to_string())
        );
    }
}
