use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::TOOL_NAME;
use crate::diff::model::{ClassCounts, DiffTables, Presence, SymbolDigest};
use crate::report::model::{ArtifactOutcome, ComparisonResult};

/// Output form of a rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Plain text with fixed section order.
    Human,
    /// Pretty-printed JSON of the full `ComparisonResult`.
    Machine,
}

const UNAVAILABLE: &str = "  not available: artifact introspection failed\n";

pub fn render(result: &ComparisonResult, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Human => Ok(render_text(result)),
        ReportFormat::Machine => render_json(result),
    }
}

pub fn render_json(result: &ComparisonResult) -> Result<String> {
    let mut out = serde_json::to_string_pretty(result).context("failed to serialize report")?;
    out.push('\n');
    Ok(out)
}

/// Write a rendered report to `path`, creating parent directories.
pub fn write_report(result: &ComparisonResult, format: ReportFormat, path: &Path) -> Result<()> {
    let output = render(result, format)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, output)
        .with_context(|| format!("failed to write report: {}", path.display()))?;
    debug!(path = %path.display(), ?format, "wrote report");
    Ok(())
}

pub fn render_text(result: &ComparisonResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {} build-equivalence report\n",
        TOOL_NAME, result.tool.version
    ));

    heading(&mut out, "File Information");
    file_info(&mut out, "baseline", &result.baseline);
    file_info(&mut out, "candidate", &result.candidate);

    let diff = result.diff.as_ref();

    heading(&mut out, "Size Comparison");
    with_diff(&mut out, diff, size_comparison);

    heading(&mut out, "Symbol Comparison");
    with_diff(&mut out, diff, symbol_comparison);

    heading(&mut out, "Section Comparison");
    with_diff(&mut out, diff, section_comparison);

    heading(&mut out, "Category Breakdown");
    with_diff(&mut out, diff, category_breakdown);

    heading(&mut out, "Per-Class Breakdown");
    with_diff(&mut out, diff, class_breakdown);

    if !result.config.search_terms.is_empty() {
        heading(&mut out, "Search Results");
        with_diff(&mut out, diff, search_results);
    }

    heading(&mut out, "Overall Assessment");
    let a = &result.assessment;
    out.push_str(&format!("  Rating:      {}\n", a.rating));
    out.push_str(&format!("  Reason:      {}\n", a.reason));
    out.push_str(&format!("  Exit status: {}\n", a.exit_code));
    out.push_str("  Findings:\n");
    for f in &a.findings {
        out.push_str(&format!("    - {} {}\n", f.id, f.title));
        out.push_str(&format!("      {}\n", f.message));
    }

    out
}

fn heading(out: &mut String, title: &str) {
    out.push_str(&format!("\n== {title} ==\n"));
}

fn with_diff(out: &mut String, diff: Option<&DiffTables>, section: fn(&mut String, &DiffTables)) {
    match diff {
        Some(d) => section(out, d),
        None => out.push_str(UNAVAILABLE),
    }
}

fn file_info(out: &mut String, side: &str, outcome: &ArtifactOutcome) {
    match outcome {
        ArtifactOutcome::Introspected { metadata } => {
            out.push_str(&format!("  {side:<10} {}\n", metadata.path));
            out.push_str(&format!(
                "             format: {}  size: {} bytes  symbols: {}  sections: {}\n",
                metadata.format,
                metadata.size_bytes,
                metadata.symbols.len(),
                metadata.sections.len()
            ));
            out.push_str(&format!("             sha256: {}\n", metadata.sha256));
        }
        ArtifactOutcome::Failed {
            path, kind, error, ..
        } => {
            out.push_str(&format!("  {side:<10} {path}\n"));
            out.push_str(&format!("             FAILED ({kind}): {error}\n"));
        }
    }
}

fn size_comparison(out: &mut String, d: &DiffTables) {
    out.push_str(&format!("  baseline:  {} bytes\n", d.size.baseline_bytes));
    out.push_str(&format!("  candidate: {} bytes\n", d.size.candidate_bytes));
    out.push_str(&format!(
        "  delta:     {:+} bytes ({:+.2}%)\n",
        d.size.delta_bytes, d.size.delta_percent
    ));
}

fn symbol_comparison(out: &mut String, d: &DiffTables) {
    let s = &d.symbols;
    out.push_str(&format!("  baseline total:  {}\n", s.baseline_total));
    out.push_str(&format!("  candidate total: {}\n", s.candidate_total));
    out.push_str(&format!("  common:          {}\n", s.common.len()));
    digest_list(out, "only in baseline", &s.unique_to_baseline);
    digest_list(out, "only in candidate", &s.unique_to_candidate);
}

fn digest_list(out: &mut String, label: &str, digests: &[SymbolDigest]) {
    out.push_str(&format!("  {label} ({}):\n", digests.len()));
    for s in digests {
        out.push_str(&format!("    - {} [{}]", s.demangled_name, s.category));
        if s.demangled_name != s.raw_name {
            out.push_str(&format!(" ({})", s.raw_name));
        }
        out.push('\n');
    }
}

fn section_comparison(out: &mut String, d: &DiffTables) {
    if d.sections.is_empty() {
        out.push_str("  no sections\n");
        return;
    }
    out.push_str(&format!(
        "  {:<24} {:<14} {:>12} {:>12} {:>12}  flags\n",
        "name", "presence", "baseline", "candidate", "delta"
    ));
    for s in &d.sections {
        let presence = match s.presence {
            Presence::Both => "both",
            Presence::BaselineOnly => "baseline only",
            Presence::CandidateOnly => "candidate only",
        };
        out.push_str(&format!(
            "  {:<24} {:<14} {:>12} {:>12} {:>+12}  {}\n",
            s.name,
            presence,
            s.baseline_bytes,
            s.candidate_bytes,
            s.delta_bytes,
            if s.flags_differ { "differ" } else { "same" }
        ));
    }
}

fn category_breakdown(out: &mut String, d: &DiffTables) {
    out.push_str(&format!(
        "  {:<16} {:>10} {:>10} {:>8}\n",
        "category", "baseline", "candidate", "delta"
    ));
    for c in &d.categories {
        out.push_str(&format!(
            "  {:<16} {:>10} {:>10} {:>+8}\n",
            c.category.as_str(),
            c.baseline,
            c.candidate,
            c.delta
        ));
    }
}

fn class_breakdown(out: &mut String, d: &DiffTables) {
    if d.classes.is_empty() {
        out.push_str("  no watched classes\n");
        return;
    }
    for c in &d.classes {
        out.push_str(&format!("  {}\n", c.class));
        class_counts(out, "baseline", &c.baseline);
        class_counts(out, "candidate", &c.candidate);
    }
}

fn class_counts(out: &mut String, side: &str, c: &ClassCounts) {
    out.push_str(&format!(
        "    {side:<10} total: {}  constructors: {}  destructors: {}  other: {}\n",
        c.total, c.constructors, c.destructors, c.other
    ));
}

fn search_results(out: &mut String, d: &DiffTables) {
    for m in &d.search {
        out.push_str(&format!(
            "  \"{}\": baseline {}, candidate {}\n",
            m.term,
            m.baseline.len(),
            m.candidate.len()
        ));
        for name in &m.baseline {
            out.push_str(&format!("    baseline:  {name}\n"));
        }
        for name in &m.candidate {
            out.push_str(&format!("    candidate: {name}\n"));
        }
    }
}
