//! Tabular (CSV) report — the machine-parseable sibling of the narrative.
//!
//! Long schema: one row per retained (k, instance) pair x metric x test,
//! with the raw statistic and p-value at full precision. The file is
//! truncated and rewritten on every invocation.

use std::path::Path;

use super::{PairSummary, ReportError};

pub const TABULAR_HEADER: [&str; 7] = [
    "num_tours",
    "instance",
    "metric",
    "test",
    "statistic",
    "significant",
    "p_value",
];

/// Render the per-instance results as CSV text.
pub fn render_tabular(per_instance: &[PairSummary]) -> Result<String, ReportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(TABULAR_HEADER)?;

    for pair in per_instance {
        let num_tours = pair.num_tours.to_string();
        for comparison in &pair.metrics {
            for test in &comparison.tests {
                let statistic = test.statistic.to_string();
                let p_value = test.p_value.to_string();
                let marker = if test.significant { "[X]" } else { "[ ]" };
                wtr.write_record([
                    num_tours.as_str(),
                    pair.instance.as_str(),
                    comparison.metric.label(),
                    test.kind.as_str(),
                    statistic.as_str(),
                    marker,
                    p_value.as_str(),
                ])?;
            }
        }
    }

    let data = wtr
        .into_inner()
        .map_err(|e| ReportError::Io(e.into_error()))?;
    String::from_utf8(data).map_err(|e| {
        ReportError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

/// Overwrite the tabular report file.
pub fn write_tabular(path: &Path, csv_text: &str) -> std::io::Result<()> {
    std::fs::write(path, csv_text)
}
