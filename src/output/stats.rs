//! Run summary reporting.

use console::style;

use crate::ingest::{PipelineReport, RunOutcome, Status};

/// Print the summary of a single pipeline run.
pub fn print_report(file_name: &str, report: &PipelineReport) {
    println!();
    println!("{}", style(format!("Summary for {}:", file_name)).bold());

    for status in &report.statuses {
        let line = match status {
            Status::Failed { .. } => style(status.to_string()).red(),
            _ => style(status.to_string()).green(),
        };
        println!("  {}", line);
    }

    let outcome = match report.outcome {
        RunOutcome::Ignored => style("ignored (not a PDF)".to_string()).yellow(),
        RunOutcome::Delivered => style("delivered".to_string()).green(),
        RunOutcome::Failed(stage) => style(format!("failed at {} stage", stage)).red(),
    };
    println!("  Outcome:  {}", outcome);
    println!("  Cleanup:  {} staged file(s) removed", report.removed_files);
}
