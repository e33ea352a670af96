//! Assessment grader.
//!
//! Derives a single `Rating` plus the findings that justify it from a
//! baseline/candidate outcome pair and their diff tables.
//!
//! Decision procedure, first applicable terminal wins:
//!
//!   1. Either artifact unreadable                  → CRITICAL
//!   2. Baseline symbols missing from the candidate:
//!        - any owned by a watched class            → WARNING
//!        - share below `size_critical_ratio` %     → GOOD
//!        - otherwise                               → WARNING
//!   3. `|size delta %| < size_tolerance_percent`   → PERFECT
//!   4. `|size delta %| < size_warn_percent`        → EXCELLENT
//!   5. otherwise                                   → GOOD (size divergence)
//!
//! Informational findings (candidate-only symbols, one-sided sections) are
//! appended after the deciding finding and never change the rating.

use serde_json::json;
use tracing::debug;

use crate::config::CompareConfig;
use crate::diff::model::{DiffTables, Presence, SymbolDigest};
use crate::report::model::{ArtifactOutcome, Assessment};
use crate::rules::catalog::{Finding, FindingId, Rating};

/// Names listed inline in a finding message before truncating.
const MAX_NAMED: usize = 10;

pub fn grade(
    baseline: &ArtifactOutcome,
    candidate: &ArtifactOutcome,
    diff: Option<&DiffTables>,
    config: &CompareConfig,
) -> Assessment {
    let failures: Vec<Finding> = [baseline, candidate]
        .into_iter()
        .filter_map(unreadable_finding)
        .collect();

    let assessment = match diff {
        Some(diff) if failures.is_empty() => {
            let (rating, mut findings) = decide(diff, config);
            findings.extend(informational(diff));
            Assessment::new(rating, findings)
        }
        _ => Assessment::new(Rating::Critical, failures),
    };

    debug!(rating = %assessment.rating, findings = assessment.findings.len(), "graded comparison");
    assessment
}

fn unreadable_finding(outcome: &ArtifactOutcome) -> Option<Finding> {
    let ArtifactOutcome::Failed {
        path,
        label,
        kind,
        error,
    } = outcome
    else {
        return None;
    };
    Some(Finding {
        id: FindingId::ArtifactUnreadable,
        title: "artifact missing or unreadable".into(),
        message: format!("{label} artifact could not be introspected: {error}"),
        evidence: json!({ "side": label, "path": path, "kind": kind }),
    })
}

fn decide(diff: &DiffTables, config: &CompareConfig) -> (Rating, Vec<Finding>) {
    let missing = &diff.symbols.unique_to_baseline;

    if !missing.is_empty() {
        let watched: Vec<&SymbolDigest> = missing
            .iter()
            .filter(|s| s.owner_class.as_deref().is_some_and(|c| config.watches(c)))
            .collect();

        if !watched.is_empty() {
            return (Rating::Warning, vec![missing_watched(&watched, diff)]);
        }

        let ratio = missing_ratio_percent(missing.len(), diff.symbols.baseline_total);
        let evidence = json!({
            "missing": missing.len(),
            "baseline_total": diff.symbols.baseline_total,
            "missing_percent": ratio,
            "threshold_percent": config.size_critical_ratio,
            "symbols": digest_names(missing),
        });

        return if ratio < config.size_critical_ratio {
            (
                Rating::Good,
                vec![Finding {
                    id: FindingId::MinorSymbolDrift,
                    title: "minor symbol differences, no critical-class impact".into(),
                    message: format!(
                        "{} of {} baseline symbols ({ratio:.2}%) are missing from the candidate; none belong to a watched class: {}",
                        missing.len(),
                        diff.symbols.baseline_total,
                        name_list(missing.iter())
                    ),
                    evidence,
                }],
            )
        } else {
            (
                Rating::Warning,
                vec![Finding {
                    id: FindingId::SymbolDivergence,
                    title: "substantial symbol-set divergence".into(),
                    message: format!(
                        "{} of {} baseline symbols ({ratio:.2}%) are missing from the candidate, at or above the {:.2}% threshold: {}",
                        missing.len(),
                        diff.symbols.baseline_total,
                        config.size_critical_ratio,
                        name_list(missing.iter())
                    ),
                    evidence,
                }],
            )
        };
    }

    let pct = diff.size.delta_percent;
    let evidence = json!({
        "baseline_bytes": diff.size.baseline_bytes,
        "candidate_bytes": diff.size.candidate_bytes,
        "delta_bytes": diff.size.delta_bytes,
        "delta_percent": pct,
    });

    if pct.abs() < config.size_tolerance_percent {
        (
            Rating::Perfect,
            vec![Finding {
                id: FindingId::SizeMatch,
                title: "identical symbol set, size within tolerance".into(),
                message: format!(
                    "all {} baseline symbols present; size delta {:+} bytes ({pct:+.2}%) is below {:.2}%",
                    diff.symbols.baseline_total,
                    diff.size.delta_bytes,
                    config.size_tolerance_percent
                ),
                evidence,
            }],
        )
    } else if pct.abs() < config.size_warn_percent {
        (
            Rating::Excellent,
            vec![Finding {
                id: FindingId::SizeWithinTolerance,
                title: "identical symbol set, small size difference".into(),
                message: format!(
                    "all {} baseline symbols present; size delta {:+} bytes ({pct:+.2}%) is below {:.2}%",
                    diff.symbols.baseline_total, diff.size.delta_bytes, config.size_warn_percent
                ),
                evidence,
            }],
        )
    } else {
        (
            Rating::Good,
            vec![Finding {
                id: FindingId::SizeDivergence,
                title: "size divergence requires manual review".into(),
                message: format!(
                    "all {} baseline symbols present, but size delta {:+} bytes ({pct:+.2}%) reaches the {:.2}% review threshold",
                    diff.symbols.baseline_total, diff.size.delta_bytes, config.size_warn_percent
                ),
                evidence,
            }],
        )
    }
}

fn missing_watched(watched: &[&SymbolDigest], diff: &DiffTables) -> Finding {
    let mut classes: Vec<&str> = watched
        .iter()
        .filter_map(|s| s.owner_class.as_deref())
        .collect();
    classes.sort_unstable();
    classes.dedup();

    let described: Vec<String> = watched
        .iter()
        .take(MAX_NAMED)
        .map(|s| {
            format!(
                "{} [{} of {}]",
                s.demangled_name,
                s.category,
                s.owner_class.as_deref().unwrap_or("?")
            )
        })
        .collect();
    let more = watched.len().saturating_sub(MAX_NAMED);

    Finding {
        id: FindingId::MissingWatchedSymbols,
        title: "missing symbols required by known API surface".into(),
        message: format!(
            "{} symbol(s) of watched class(es) {} missing from candidate: {}{}",
            watched.len(),
            classes.join(", "),
            described.join("; "),
            if more > 0 {
                format!("; and {more} more")
            } else {
                String::new()
            }
        ),
        evidence: json!({
            "classes": classes,
            "missing_watched": watched
                .iter()
                .map(|s| json!({
                    "class": s.owner_class,
                    "raw_name": s.raw_name,
                    "demangled_name": s.demangled_name,
                    "category": s.category,
                }))
                .collect::<Vec<_>>(),
            "missing_total": diff.symbols.unique_to_baseline.len(),
            "baseline_total": diff.symbols.baseline_total,
        }),
    }
}

fn informational(diff: &DiffTables) -> Vec<Finding> {
    let mut out = Vec::new();

    let added = &diff.symbols.unique_to_candidate;
    if !added.is_empty() {
        out.push(Finding {
            id: FindingId::CandidateOnlySymbols,
            title: "symbols present only in candidate".into(),
            message: format!(
                "{} symbol(s) appear only in the candidate: {}",
                added.len(),
                name_list(added.iter())
            ),
            evidence: json!({ "count": added.len(), "symbols": digest_names(added) }),
        });
    }

    let one_sided: Vec<_> = diff
        .sections
        .iter()
        .filter(|s| s.presence != Presence::Both)
        .collect();
    if !one_sided.is_empty() {
        let baseline_only: Vec<&str> = one_sided
            .iter()
            .filter(|s| s.presence == Presence::BaselineOnly)
            .map(|s| s.name.as_str())
            .collect();
        let candidate_only: Vec<&str> = one_sided
            .iter()
            .filter(|s| s.presence == Presence::CandidateOnly)
            .map(|s| s.name.as_str())
            .collect();
        out.push(Finding {
            id: FindingId::OneSidedSections,
            title: "sections present on only one side".into(),
            message: format!(
                "baseline only: [{}]; candidate only: [{}]",
                baseline_only.join(", "),
                candidate_only.join(", ")
            ),
            evidence: json!({
                "baseline_only": baseline_only,
                "candidate_only": candidate_only,
            }),
        });
    }

    out
}

fn missing_ratio_percent(missing: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        missing as f64 * 100.0 / total as f64
    }
}

fn digest_names(digests: &[SymbolDigest]) -> Vec<&str> {
    digests.iter().map(|s| s.demangled_name.as_str()).collect()
}

fn name_list<'a>(digests: impl ExactSizeIterator<Item = &'a SymbolDigest>) -> String {
    let total = digests.len();
    let names: Vec<&str> = digests
        .take(MAX_NAMED)
        .map(|s| s.demangled_name.as_str())
        .collect();
    let more = total.saturating_sub(names.len());
    let mut out = names.join(", ");
    if more > 0 {
        out.push_str(&format!(", and {more} more"));
    }
    out
}
