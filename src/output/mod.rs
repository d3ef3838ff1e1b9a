use anyhow::Result;
use console::style;

use crate::batch::BatchReport;
use crate::utils::format_duration;

/// Print the batch report as a human-readable summary table
pub fn print_report(report: &BatchReport) {
    println!();
    println!("{}", style("Batch summary").bold());
    println!(
        "  {} of {} downloads succeeded in {}",
        report.succeeded,
        report.total,
        format_duration(report.elapsed_secs)
    );

    for result in &report.results {
        if result.success {
            println!("  {} {}", style("ok").green(), result.url);
        }
    }

    if !report.all_succeeded() {
        println!();
        println!("{}", style("Failed items").red().bold());
        for result in report.failed() {
            println!("  {} {}", style("failed").red(), result.url);
            if let Some(error) = &result.error {
                println!("         {}", error);
            }
        }
    }
}

/// Print the batch report as JSON for scripting consumers
pub fn print_report_json(report: &BatchReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::batch::{BatchReport, DownloadResult};

    #[test]
    fn test_report_serializes() {
        let report = BatchReport {
            succeeded: 1,
            total: 2,
            elapsed_secs: 1.5,
            results: vec![
                DownloadResult {
                    url: "https://youtu.be/a".to_string(),
                    success: true,
                    error: None,
                },
                DownloadResult {
                    url: "https://youtu.be/b".to_string(),
                    success: false,
                    error: Some("boom".to_string()),
                },
            ],
        };

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"succeeded\":1"));
        assert!(json.contains("boom"));
        // Successful entries omit the error field entirely.
        assert!(!json.contains("null"));
    }
}
