//! Report rendering: plain text, Markdown and JSON.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::counts::ResourceCountResult;
use crate::error::Result;
use crate::report::ValidationReport;
use crate::score::{DIMENSION_MAX, MAX_SCORE};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Markdown,
    Json,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Text => "text",
            ReportFormat::Markdown => "markdown",
            ReportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!(
                "unknown report format '{}' (expected text, markdown or json)",
                other
            )),
        }
    }
}

fn mark(passed: bool) -> &'static str {
    if passed {
        "✓"
    } else {
        "✗"
    }
}

fn md_mark(passed: bool) -> &'static str {
    if passed {
        "✅"
    } else {
        "❌"
    }
}

fn bounds(result: &ResourceCountResult) -> String {
    if result.max == 0 {
        format!("min {}, no max", result.min)
    } else {
        format!("min {}, max {}", result.min, result.max)
    }
}

fn verdict(passed: bool) -> &'static str {
    if passed {
        "PASSED"
    } else {
        "FAILED"
    }
}

/// Escape a Markdown table cell so a `|` in free text stays inside it.
fn md_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn join_paths(paths: &[std::path::PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Section-by-section plain text with ✓/✗ markers.
pub fn render_text(report: &ValidationReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Validation report: {}\n", report.scenario));
    out.push_str(&format!("Validated at: {}\n", report.validated_at.to_rfc3339()));
    if !report.execution_order.is_empty() {
        out.push_str(&format!(
            "Execution order: {}\n",
            report.execution_order.join(" -> ")
        ));
    }

    out.push_str("\nResource counts\n");
    if report.resource_counts.is_empty() {
        out.push_str("  (none)\n");
    }
    for r in report.count_results() {
        out.push_str(&format!(
            "  {} {}/{}: found {} ({})",
            mark(r.passed),
            r.domain,
            r.resource_type,
            r.found,
            bounds(r)
        ));
        if let Some(reason) = &r.reason {
            out.push_str(&format!(" - {}", reason));
        }
        out.push('\n');
    }

    out.push_str("\nCross-domain references\n");
    if report.cross_domain_refs.is_empty() {
        out.push_str("  (none)\n");
    }
    for rel in &report.cross_domain_refs {
        out.push_str(&format!(
            "  {} {} -> {} ({})\n",
            mark(rel.passed),
            rel.from,
            rel.to,
            rel.kind
        ));
        for r in &rel.refs {
            if r.found {
                let location = if r.files.is_empty() {
                    "manifest".to_string()
                } else {
                    join_paths(&r.files)
                };
                out.push_str(&format!("      ✓ {} in {}\n", r.reference, location));
            } else {
                match &r.error {
                    Some(e) => out.push_str(&format!("      ✗ {}: {}\n", r.reference, e)),
                    None => out.push_str(&format!("      ✗ {} not found\n", r.reference)),
                }
            }
        }
    }

    out.push_str("\nFile comparisons\n");
    if report.file_comparisons.is_empty() {
        out.push_str("  (none)\n");
    }
    for c in &report.file_comparisons {
        if c.missing {
            out.push_str(&format!(
                "  {} {}: missing\n",
                mark(false),
                c.expected_file.display()
            ));
            continue;
        }
        let generated = c
            .generated_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        out.push_str(&format!(
            "  {} {} -> {}: {} differences ({} missing keys or mismatches)\n",
            mark(c.passed),
            c.expected_file.display(),
            generated,
            c.differences.len(),
            c.violation_count()
        ));
        for d in c.differences.iter().filter(|d| d.is_violation()) {
            out.push_str(&format!("      - {}: {}\n", d.path, d.message));
        }
    }

    if !report.errors.is_empty() {
        out.push_str("\nErrors\n");
        for e in &report.errors {
            out.push_str(&format!("  - {}\n", e));
        }
    }

    let b = &report.score_breakdown;
    out.push_str(&format!(
        "\nCompleteness {c}/{m}, lint quality {l}/{m}, output validity {o}/{m}, structural fidelity {s}/{m}\n",
        c = b.completeness,
        l = b.lint_quality,
        o = b.output_validity,
        s = b.structural_fidelity,
        m = DIMENSION_MAX
    ));
    out.push_str(&format!("Score: {}/{}\n", report.score, MAX_SCORE));
    out.push_str(verdict(report.passed));
    out.push('\n');
    out
}

/// Markdown with one table per section.
pub fn render_markdown(report: &ValidationReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Validation Report: {}\n\n", report.scenario));
    out.push_str(&format!(
        "- **Result:** {} {}\n- **Score:** {}/{}\n- **Validated at:** {}\n",
        md_mark(report.passed),
        verdict(report.passed),
        report.score,
        MAX_SCORE,
        report.validated_at.to_rfc3339()
    ));
    if !report.execution_order.is_empty() {
        out.push_str(&format!(
            "- **Execution order:** {}\n",
            report
                .execution_order
                .iter()
                .map(|d| format!("`{}`", d))
                .collect::<Vec<_>>()
                .join(" → ")
        ));
    }
    out.push('\n');

    if !report.resource_counts.is_empty() {
        out.push_str("## Resource Counts\n\n");
        out.push_str("| | Domain | Type | Found | Min | Max | Notes |\n");
        out.push_str("|---|---|---|---|---|---|---|\n");
        for r in report.count_results() {
            let max = if r.max == 0 {
                "-".to_string()
            } else {
                r.max.to_string()
            };
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} |\n",
                md_mark(r.passed),
                r.domain,
                r.resource_type,
                r.found,
                r.min,
                max,
                md_cell(r.reason.as_deref().unwrap_or(""))
            ));
        }
        out.push('\n');
    }

    if !report.cross_domain_refs.is_empty() {
        out.push_str("## Cross-Domain References\n\n");
        out.push_str("| | From | To | Reference | Found in |\n");
        out.push_str("|---|---|---|---|---|\n");
        for rel in &report.cross_domain_refs {
            for r in &rel.refs {
                let found_in = if r.found {
                    join_paths(&r.files)
                } else {
                    r.error.clone().unwrap_or_else(|| "not found".to_string())
                };
                out.push_str(&format!(
                    "| {} | {} | {} | `{}` | {} |\n",
                    md_mark(r.found),
                    md_cell(&rel.from),
                    md_cell(&rel.to),
                    md_cell(&r.reference),
                    md_cell(&found_in)
                ));
            }
        }
        out.push('\n');
    }

    if !report.file_comparisons.is_empty() {
        out.push_str("## File Comparisons\n\n");
        out.push_str("| | Expected | Generated | Differences |\n");
        out.push_str("|---|---|---|---|\n");
        for c in &report.file_comparisons {
            let icon = if c.missing {
                "❌"
            } else if c.violation_count() > 0 || c.error.is_some() {
                "⚠️"
            } else {
                "✅"
            };
            let generated = match &c.generated_file {
                Some(p) => format!("`{}`", md_cell(&p.display().to_string())),
                None => "missing".to_string(),
            };
            out.push_str(&format!(
                "| {} | `{}` | {} | {} |\n",
                icon,
                md_cell(&c.expected_file.display().to_string()),
                generated,
                c.differences.len()
            ));
        }
        out.push('\n');
    }

    out.push_str("## Score\n\n");
    out.push_str("| Dimension | Points |\n|---|---|\n");
    let b = &report.score_breakdown;
    for (name, points) in [
        ("Completeness", b.completeness),
        ("Lint quality", b.lint_quality),
        ("Output validity", b.output_validity),
        ("Structural fidelity", b.structural_fidelity),
    ] {
        out.push_str(&format!("| {} | {}/{} |\n", name, points, DIMENSION_MAX));
    }
    out.push_str(&format!("| **Total** | **{}/{}** |\n", report.score, MAX_SCORE));

    if !report.errors.is_empty() {
        out.push_str("\n## Errors\n\n");
        for e in &report.errors {
            out.push_str(&format!("- ⚠️ {}\n", e));
        }
    }
    out
}

/// Direct pretty-JSON serialization of the report.
pub fn render_json(report: &ValidationReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn render(report: &ValidationReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(report)),
        ReportFormat::Markdown => Ok(render_markdown(report)),
        ReportFormat::Json => render_json(report),
    }
}

/// Render and write the report, creating parent directories.
pub fn write_report(path: &Path, report: &ValidationReport, format: ReportFormat) -> Result<()> {
    let content = render(report, format)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content)?;
    Ok(())
}
