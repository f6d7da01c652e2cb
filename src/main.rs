// Entry point and high-level CLI flow.
//
// - Option [1] synthesizes the visit dataset for the trailing window and
//   exports it to visits.csv.
// - Option [2] loads and cleans an external visits CSV, printing diagnostics.
// - Option [3] generates the monthly report files and a JSON KPI summary.
// - After generating reports, the user can choose to go back to the
//   selection menu or exit.
mod config;
mod generator;
mod loader;
mod output;
mod reports;
mod types;
mod util;

use chrono::Local;
use config::GeneratorConfig;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::Mutex;
use types::{VisitCsvRow, VisitRecord};

// Simple in-memory app state: the dataset is built once and reused across
// report runs, so repeated runs always observe the same immutable table.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<Vec<VisitRecord>>,
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask the user whether to go back to the report selection menu after
/// generating reports.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        let resp = buf.trim().to_uppercase();
        match resp.as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: synthesize the dataset and export it.
fn handle_generate_dataset() {
    let config = GeneratorConfig::default();
    // The only wall-clock read: establishing "now" as the window's end.
    let end_date = Local::now().date_naive();
    match generator::generate(&config, end_date) {
        Ok(data) => {
            println!(
                "Generated {} visit records over the trailing {}-month window (seed {}).",
                util::format_int(data.len() as i64),
                config.months_back,
                config.seed
            );
            let rows: Vec<VisitCsvRow> = data.iter().map(VisitCsvRow::from_record).collect();
            match output::write_csv("visits.csv", &rows) {
                Ok(()) => println!("Dataset exported to visits.csv\n"),
                Err(e) => eprintln!("Write error: {}\n", e),
            }
            let mut state = APP_STATE.lock().unwrap();
            state.data = Some(data);
        }
        Err(e) => {
            eprintln!("Failed to generate dataset: {}\n", e);
        }
    }
}

/// Handle option [2]: load and clean an external visits CSV.
fn handle_load() {
    let path = "visits.csv";
    let config = GeneratorConfig::default();
    match loader::load_and_clean(path, &config) {
        Ok((data, load_report)) => {
            println!(
                "Processing dataset... ({} rows read, {} kept)",
                util::format_int(load_report.total_rows as i64),
                util::format_int(load_report.kept_rows as i64)
            );
            println!(
                "Note: {} rows skipped due to parse/validation errors.",
                util::format_int(load_report.parse_errors as i64)
            );
            if load_report.dropped_closed_day > 0 {
                println!(
                    "Info: Dropped {} rows dated on the closed weekday.",
                    util::format_int(load_report.dropped_closed_day as i64)
                );
            }
            if load_report.dropped_off_slot > 0 {
                println!(
                    "Info: Dropped {} checkup rows outside the designated slot.",
                    util::format_int(load_report.dropped_off_slot as i64)
                );
            }
            println!("");
            let mut state = APP_STATE.lock().unwrap();
            state.data = Some(data);
        }
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

/// Handle option [3]: generate all report files and the JSON summary.
///
/// This function is intentionally side-effectful:
/// - writes three CSV report files,
/// - writes the KPI summary JSON,
/// - and prints Markdown previews of each report to the console.
fn handle_generate_reports() {
    let data = {
        let state = APP_STATE.lock().unwrap();
        state.data.clone()
    };
    let Some(data) = data else {
        println!("Error: No dataset in memory. Generate or load one first (option 1 or 2).\n");
        return;
    };
    let Some(latest) = data.iter().map(|r| r.date).max() else {
        println!("Error: The dataset is empty; nothing to report on.\n");
        return;
    };

    let config = GeneratorConfig::default();
    // Report on the month of the latest record, so historical CSV data
    // produces a populated report too.
    let period = reports::Period::of(latest);

    println!("Generating reports for {}...", period);
    println!("Outputs saved to individual files...\n");

    let trend = reports::daily_trend(&data, period);
    let trend_file = "report_daily_trend.csv";
    if let Err(e) = output::write_csv(trend_file, &trend) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 1: Daily Revenue & Visit Trend\n");
    output::preview_table_rows(&trend, 5);
    println!("(Full table exported to {})\n", trend_file);

    let grid = reports::hourly_load(&data, period, &config.opening_hour_list());
    let grid_file = "report_hourly_load.csv";
    if let Err(e) = output::write_csv(grid_file, &grid) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 2: Hour-by-Weekday Congestion Grid\n");
    output::preview_table_rows(&grid, 8);
    println!("(Full table exported to {})\n", grid_file);

    let mix = reports::segment_distribution(&data, period);
    let mix_file = "report_segment_mix.csv";
    if let Err(e) = output::write_csv(mix_file, &mix) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 3: Case-Mix Distribution\n");
    output::preview_table_rows(&mix, 3);
    println!("(Full table exported to {})\n", mix_file);

    let summary = reports::monthly_summary(&data, period);
    if let Err(e) = output::write_json("summary.json", &summary) {
        eprintln!("Write error: {}", e);
    }
    println!("Monthly KPIs ({}, vs prior month):", period);
    println!(
        "  Revenue:          {} ({}%)",
        util::format_number(summary.revenue.value, 0),
        util::format_number(summary.revenue.delta, 1)
    );
    println!(
        "  Visits:           {} ({}%)",
        util::format_number(summary.visits.value, 0),
        util::format_number(summary.visits.delta, 1)
    );
    println!(
        "  Avg wait (min):   {} ({}%)",
        util::format_number(summary.wait_time.value, 0),
        util::format_number(summary.wait_time.delta, 1)
    );
    println!(
        "  First-visit rate: {}% ({}%)",
        util::format_number(summary.first_visit_rate.value, 1),
        util::format_number(summary.first_visit_rate.delta, 1)
    );
    println!("(Summary exported to summary.json)\n");
}

fn main() {
    loop {
        println!("Select an option:");
        println!("[1] Generate synthetic dataset");
        println!("[2] Load visits CSV");
        println!("[3] Generate monthly reports\n");
        match read_choice().as_str() {
            "1" => {
                handle_generate_dataset();
            }
            "2" => {
                handle_load();
            }
            "3" => {
                println!("");
                handle_generate_reports();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1, 2 or 3.\n");
            }
        }
    }
}
