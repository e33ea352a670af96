//! Structural diff of two introspected artifacts.
//!
//! Total: any pair of `ArtifactMetadata` values, including structurally
//! empty ones, yields a full set of tables. All tables are built from
//! ordered maps so output order never depends on extraction order.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::CompareConfig;
use crate::diff::model::*;
use crate::symbols::model::{ArtifactMetadata, Section, Symbol, SymbolCategory};
use crate::util::deterministic::{sort_digests, sort_unique};

pub fn diff(
    baseline: &ArtifactMetadata,
    candidate: &ArtifactMetadata,
    config: &CompareConfig,
) -> DiffTables {
    DiffTables {
        size: size_delta(baseline.size_bytes, candidate.size_bytes),
        symbols: symbol_diff(&baseline.symbols, &candidate.symbols),
        sections: section_diff(&baseline.sections, &candidate.sections),
        categories: category_counts(&baseline.symbols, &candidate.symbols),
        classes: class_breakdown(
            &baseline.symbols,
            &candidate.symbols,
            &config.class_watch_list,
        ),
        search: search_matches(&baseline.symbols, &candidate.symbols, &config.search_terms),
    }
}

pub fn size_delta(baseline: u64, candidate: u64) -> SizeDelta {
    let delta_bytes = signed_delta(baseline, candidate);
    let delta_percent = if baseline == 0 {
        0.0
    } else {
        delta_bytes as f64 * 100.0 / baseline as f64
    };
    SizeDelta {
        baseline_bytes: baseline,
        candidate_bytes: candidate,
        delta_bytes,
        delta_percent,
    }
}

fn signed_delta(baseline: u64, candidate: u64) -> i64 {
    let d = i128::from(candidate) - i128::from(baseline);
    d.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

/// Keyed by raw name; a later duplicate replaces an earlier one.
fn by_name(symbols: &[Symbol]) -> BTreeMap<&str, &Symbol> {
    symbols.iter().map(|s| (s.raw_name.as_str(), s)).collect()
}

pub fn symbol_diff(baseline: &[Symbol], candidate: &[Symbol]) -> SymbolDiff {
    let base = by_name(baseline);
    let cand = by_name(candidate);

    let mut diff = SymbolDiff {
        baseline_total: base.len(),
        candidate_total: cand.len(),
        ..Default::default()
    };

    for (name, sym) in &base {
        if cand.contains_key(name) {
            diff.common.push((*name).to_string());
        } else {
            diff.unique_to_baseline.push(SymbolDigest::from(*sym));
        }
    }
    for (name, sym) in &cand {
        if !base.contains_key(name) {
            diff.unique_to_candidate.push(SymbolDigest::from(*sym));
        }
    }

    sort_digests(&mut diff.unique_to_baseline);
    sort_digests(&mut diff.unique_to_candidate);
    diff
}

pub fn section_diff(baseline: &[Section], candidate: &[Section]) -> Vec<SectionDelta> {
    let base: BTreeMap<&str, &Section> = baseline.iter().map(|s| (s.name.as_str(), s)).collect();
    let cand: BTreeMap<&str, &Section> = candidate.iter().map(|s| (s.name.as_str(), s)).collect();
    let names: BTreeSet<&str> = base.keys().chain(cand.keys()).copied().collect();

    names
        .into_iter()
        .map(|name| {
            let b = base.get(name);
            let c = cand.get(name);
            let presence = match (b, c) {
                (Some(_), Some(_)) => Presence::Both,
                (Some(_), None) => Presence::BaselineOnly,
                _ => Presence::CandidateOnly,
            };
            let baseline_bytes = b.map_or(0, |s| s.size_bytes);
            let candidate_bytes = c.map_or(0, |s| s.size_bytes);
            SectionDelta {
                name: name.to_string(),
                presence,
                baseline_bytes,
                candidate_bytes,
                delta_bytes: signed_delta(baseline_bytes, candidate_bytes),
                flags_differ: matches!((b, c), (Some(b), Some(c)) if b.flags != c.flags),
            }
        })
        .collect()
}

pub fn category_counts(baseline: &[Symbol], candidate: &[Symbol]) -> Vec<CategoryCount> {
    let tally = |symbols: &[Symbol]| {
        let mut counts: BTreeMap<SymbolCategory, usize> = BTreeMap::new();
        for s in symbols {
            *counts.entry(s.category).or_default() += 1;
        }
        counts
    };
    let base = tally(baseline);
    let cand = tally(candidate);

    SymbolCategory::ALL
        .iter()
        .map(|cat| {
            let b = base.get(cat).copied().unwrap_or(0);
            let c = cand.get(cat).copied().unwrap_or(0);
            CategoryCount {
                category: *cat,
                baseline: b,
                candidate: c,
                delta: c as i64 - b as i64,
            }
        })
        .collect()
}

pub fn class_counts(symbols: &[Symbol], class: &str) -> ClassCounts {
    let mut counts = ClassCounts::default();
    for s in symbols
        .iter()
        .filter(|s| s.owner_class.as_deref() == Some(class))
    {
        counts.total += 1;
        match s.category {
            SymbolCategory::Constructor => counts.constructors += 1,
            SymbolCategory::Destructor => counts.destructors += 1,
            _ => counts.other += 1,
        }
    }
    counts
}

pub fn class_breakdown(
    baseline: &[Symbol],
    candidate: &[Symbol],
    watch_list: &[String],
) -> Vec<ClassBreakdown> {
    let mut seen = BTreeSet::new();
    watch_list
        .iter()
        .filter(|class| seen.insert(class.as_str()))
        .map(|class| ClassBreakdown {
            class: class.clone(),
            baseline: class_counts(baseline, class),
            candidate: class_counts(candidate, class),
        })
        .collect()
}

pub fn search_matches(
    baseline: &[Symbol],
    candidate: &[Symbol],
    terms: &[String],
) -> Vec<SearchMatch> {
    let find = |symbols: &[Symbol], needle: &str| {
        let mut hits: Vec<String> = symbols
            .iter()
            .filter(|s| s.demangled_name.to_lowercase().contains(needle))
            .map(|s| s.demangled_name.clone())
            .collect();
        sort_unique(&mut hits);
        hits
    };

    terms
        .iter()
        .map(|term| {
            let needle = term.to_lowercase();
            SearchMatch {
                term: term.clone(),
                baseline: find(baseline, &needle),
                candidate: find(candidate, &needle),
            }
        })
        .collect()
}
