/*!
 * Reporting functionality for wixgen
 *
 * Prints a summary of the generated project using the tabled library.
 */

use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::project::GenerationReport;
use crate::utils::format_file_size;
use crate::writer::WriteOutcome;

/// Format of the report output
pub enum ReportFormat {
    /// Console table output
    ConsoleTable,
}

/// Report generator for generation results
pub struct Reporter {
    format: ReportFormat,
}

impl Reporter {
    /// Create a new reporter
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Generate a report string
    pub fn generate_report(&self, report: &GenerationReport) -> String {
        match self.format {
            ReportFormat::ConsoleTable => self.generate_console_report(report),
        }
    }

    /// Print the report to stdout
    pub fn print_report(&self, report: &GenerationReport) {
        println!("\n{}", self.generate_report(report));
    }

    fn create_artifacts_table(&self, report: &GenerationReport) -> String {
        #[derive(Tabled)]
        struct ArtifactRow {
            #[tabled(rename = "Artifact")]
            kind: String,

            #[tabled(rename = "Path")]
            path: String,

            #[tabled(rename = "Status")]
            status: String,
        }

        let mut rows: Vec<ArtifactRow> = report
            .artifacts
            .iter()
            .map(|artifact| {
                let (path, status) = match &artifact.outcome {
                    Ok(WriteOutcome::Written(path)) => (path.display().to_string(), "written".to_string()),
                    Ok(WriteOutcome::LeftAtTemp { temp, .. }) => {
                        (temp.display().to_string(), "target in use, kept temp file".to_string())
                    }
                    Err(e) => (artifact.target.display().to_string(), format!("failed: {}", e)),
                };
                ArtifactRow {
                    kind: artifact.kind.to_string(),
                    path,
                    status,
                }
            })
            .collect();

        if let Some(license) = &report.license_file {
            rows.push(ArtifactRow {
                kind: "license".to_string(),
                path: license.display().to_string(),
                status: "written".to_string(),
            });
        }

        styled(Table::new(rows))
    }

    fn create_summary_table(&self, report: &GenerationReport) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: String,

            #[tabled(rename = "Value")]
            value: String,
        }

        let rows = vec![
            SummaryRow {
                key: "Output Directory".to_string(),
                value: report.output_dir.display().to_string(),
            },
            SummaryRow {
                key: "Files Packaged".to_string(),
                value: report.files.to_string(),
            },
            SummaryRow {
                key: "Directories".to_string(),
                value: report.directories.to_string(),
            },
            SummaryRow {
                key: "Payload Size".to_string(),
                value: format_file_size(report.total_size),
            },
            SummaryRow {
                key: "Main Executable".to_string(),
                value: report
                    .main_executable
                    .clone()
                    .unwrap_or_else(|| "none found".to_string()),
            },
        ];

        styled(Table::new(rows))
    }

    fn generate_console_report(&self, report: &GenerationReport) -> String {
        let title = if report.all_written() {
            "INSTALLER PROJECT GENERATED"
        } else {
            "INSTALLER PROJECT GENERATED WITH WARNINGS"
        };

        format!(
            "ARTIFACTS\n{}\n\n{}\n{}",
            self.create_artifacts_table(report),
            title,
            self.create_summary_table(report)
        )
    }
}

fn styled(mut table: Table) -> String {
    table
        .with(Style::rounded())
        .with(Padding::new(1, 1, 0, 0))
        .with(Modify::new(Columns::new(..)).with(Alignment::left()));
    table.to_string()
}
