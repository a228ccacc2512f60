// ABOUTME: Terminal formatting for run reports, repair attempts, and render results
// ABOUTME: Colored status lines built on the colored crate

use colored::*;

use adapt_core::{RepairAttempt, RuntimeReport, SessionStatus};

pub fn status_label(status: Option<SessionStatus>) -> ColoredString {
    match status {
        Some(SessionStatus::Succeeded) => "succeeded".green().bold(),
        Some(SessionStatus::Failed) => "failed".red().bold(),
        Some(other) => other.to_string().yellow(),
        None => "superseded".yellow(),
    }
}

/// One line per repair cycle: what went in, whether code came out
pub fn attempt_line(attempt: &RepairAttempt) -> String {
    let cause = match attempt.runtime_error.as_deref() {
        Some(error) => format!("runtime error: {}", error),
        None => format!("{} issue(s)", attempt.issues.len()),
    };
    let result = match &attempt.output_code {
        Some(code) => format!("{} bytes", code.len()).normal(),
        None => "repairer failed".red(),
    };
    format!(
        "  {} {} -> {}",
        format!("#{}", attempt.attempt_index).bold(),
        cause,
        result
    )
}

pub fn report_line(report: &RuntimeReport) -> String {
    if report.is_ok() {
        format!("{} rendered", "ok".green())
    } else {
        format!(
            "{} {}",
            "error".red(),
            report.message.as_deref().unwrap_or("Runtime error")
        )
    }
}
