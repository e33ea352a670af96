//! Deterministic ordering helpers.
//!
//! These utilities enforce the stable ordering guarantees of the comparison
//! report. Identical inputs must always produce byte-identical output, so
//! every list that reaches a report passes through one of these.

use crate::diff::model::SymbolDigest;

/// Sort symbol digests by raw name, then demangled name.
///
/// Raw names are unique per artifact, so the secondary key only matters for
/// lists assembled across artifacts.
pub fn sort_digests(digests: &mut [SymbolDigest]) {
    digests.sort_by(|a, b| {
        (a.raw_name.as_str(), a.demangled_name.as_str())
            .cmp(&(b.raw_name.as_str(), b.demangled_name.as_str()))
    });
}

/// Sort and remove duplicates.
pub fn sort_unique(values: &mut Vec<String>) {
    values.sort();
    values.dedup();
}
