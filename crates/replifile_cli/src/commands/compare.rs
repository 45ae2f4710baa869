//! Compare command implementation.

use super::{CliError, CliResult, OutputFormat};
use replifile_core::{Comparator, Comparison, Config};
use serde::Serialize;
use std::path::Path;

/// Comparison report.
#[derive(Debug, Serialize)]
pub struct CompareReport {
    /// First file.
    pub left: String,
    /// Second file.
    pub right: String,
    /// Length of both files.
    pub length: u64,
    /// Number of differing byte positions.
    pub differing: u64,
    /// The first differences found.
    pub differences: Vec<DifferenceReport>,
}

/// One differing byte.
#[derive(Debug, Serialize)]
pub struct DifferenceReport {
    /// Offset from the start.
    pub offset: u64,
    /// Byte in the first file.
    pub left: u8,
    /// Byte in the second file.
    pub right: u8,
}

impl CompareReport {
    fn new(left: &Path, right: &Path, comparison: &Comparison) -> Self {
        Self {
            left: left.display().to_string(),
            right: right.display().to_string(),
            length: comparison.length,
            differing: comparison.differing,
            differences: comparison
                .differences
                .iter()
                .map(|d| DifferenceReport {
                    offset: d.offset,
                    left: d.left,
                    right: d.right,
                })
                .collect(),
        }
    }
}

/// Runs the compare command.
pub fn run(
    config: &Config,
    left: &Path,
    right: &Path,
    limit: usize,
    format: OutputFormat,
) -> CliResult<()> {
    let comparison = Comparator::from_config(config).compare_detailed(left, right, limit)?;
    let report = CompareReport::new(left, right, &comparison);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => print_text_output(&report),
    }

    if comparison.is_identical() {
        Ok(())
    } else {
        Err(CliError::Check(format!(
            "{} byte(s) differ",
            comparison.differing
        )))
    }
}

fn print_text_output(report: &CompareReport) {
    println!("{} vs {}", report.left, report.right);
    println!("  Length:    {} bytes", report.length);
    println!("  Differing: {} byte(s)", report.differing);
    for d in &report.differences {
        println!(
            "    offset {:>10}: {:#04x} != {:#04x}",
            d.offset, d.left, d.right
        );
    }
}
