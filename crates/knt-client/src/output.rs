//! Terminal output for the client
//!
//! Coloured status lines and the direct-check failure table.

use std::io::Write;

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use tabled::settings::{Style, Width};
use tabled::{Table, Tabled};

use knt_model::DirectCheckResultItem;

use crate::run::RunReport;

#[derive(Tabled)]
struct FailureRow {
    #[tabled(rename = "SOURCE")]
    source: String,
    #[tabled(rename = "DESTINATION")]
    destination: String,
    #[tabled(rename = "ADDRESS")]
    addr: String,
    #[tabled(rename = "ERROR")]
    error: String,
}

/// Format direct-check failures as a table
pub fn format_failures(failures: &[DirectCheckResultItem]) -> String {
    if failures.is_empty() {
        return "No failed probes".to_string();
    }

    let mut rows: Vec<FailureRow> = failures
        .iter()
        .map(|f| FailureRow {
            source: f.source_host.clone(),
            destination: f.dest_host.clone(),
            addr: f.addr.clone(),
            error: f.error.clone(),
        })
        .collect();
    // Failures arrive in completion order
    rows.sort_by(|a, b| (&a.source, &a.destination, &a.addr).cmp(&(&b.source, &b.destination, &b.addr)));

    Table::new(rows)
        .with(Style::rounded())
        .with(Width::wrap(120))
        .to_string()
}

/// Print the outcome of both checks
pub fn print_report(report: &RunReport) {
    match &report.service {
        Ok(response) if response.is_clean() => print_success(&format!(
            "Service check: {}/{} probes from {} succeeded",
            report.plan.service.count, report.plan.service.count, response.source_host
        )),
        Ok(response) => print_error(&format!(
            "Service check: {}/{} probes from {} failed",
            response.error_count, report.plan.service.count, response.source_host
        )),
        Err(e) => print_error(&format!("Service check request failed: {}", e)),
    }

    match &report.direct {
        Ok(failures) if failures.is_empty() => print_success(&format!(
            "Direct check: {} probes across {} pods succeeded",
            report.direct_probes(),
            report.plan.direct.len()
        )),
        Ok(failures) => {
            print_error(&format!(
                "Direct check: {}/{} probes failed",
                failures.len(),
                report.direct_probes()
            ));
            println!("{}", format_failures(failures));
        }
        Err(e) => print_error(&format!("Direct check request failed: {}", e)),
    }
}

fn print_status(mut out: impl Write, color: Color, symbol: &str, msg: &str) {
    let _ = crossterm::execute!(
        out,
        SetForegroundColor(color),
        Print(symbol),
        Print(" "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a success line to stdout
pub fn print_success(msg: &str) {
    print_status(std::io::stdout(), Color::Green, "✓", msg);
}

/// Print an error line to stderr
pub fn print_error(msg: &str) {
    print_status(std::io::stderr(), Color::Red, "✗", msg);
}

/// Print a warning line to stderr
pub fn print_warning(msg: &str) {
    print_status(std::io::stderr(), Color::Yellow, "⚠", msg);
}

/// Print an informational line to stdout
pub fn print_info(msg: &str) {
    print_status(std::io::stdout(), Color::Cyan, "ℹ", msg);
}
