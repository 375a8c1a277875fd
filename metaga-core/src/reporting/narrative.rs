//! Narrative markdown report.
//!
//! Two sections, one per aggregation level the narrative covers: the overall
//! comparison and the per-k-value comparison. Each metric gets a list item
//! with one checkbox line per test, p-values rounded to three decimals. The
//! file is opened in append mode so successive invocations accumulate.

use std::io::Write;
use std::path::Path;

use super::{SummaryReport, TestRow};

/// Render the full narrative text for one invocation.
pub fn render_narrative(report: &SummaryReport) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str("## Overall Summary\n");
    md.push_str(
        "Comparing heuristic group RR vs MMMR on all k-values, all instances and all runs:\n",
    );
    for comparison in &report.overall {
        md.push_str(&format!(" - {}:\n", comparison.metric));
        for test in &comparison.tests {
            md.push_str(&test_line(test, 5));
        }
    }

    md.push_str("## Per k-value\n");
    md.push_str(
        "Comparing heuristic group RR vs MMMR on individual k-values, all instances and all runs:\n",
    );
    for k_summary in &report.per_k {
        md.push_str(&format!(" - k={}\n", k_summary.num_tours));
        for comparison in &k_summary.metrics {
            md.push_str(&format!("     - {}:\n", comparison.metric));
            for test in &comparison.tests {
                md.push_str(&test_line(test, 9));
            }
        }
    }

    md
}

fn test_line(test: &TestRow, indent: usize) -> String {
    let (marker, verdict) = if test.significant {
        ("[X]", "a significant difference")
    } else {
        ("[ ]", "no significant difference")
    };
    format!(
        "{:indent$}- {} {} test indicates {} (p-value: {:.3})\n",
        "", marker, test.kind, verdict, test.p_value
    )
}

/// Append the narrative text to the report file, creating it if absent.
pub fn append_narrative(path: &Path, text: &str) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    file.write_all(text.as_bytes())
}
