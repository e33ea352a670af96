use serde::{Deserialize, Serialize};

use crate::symbols::model::{Symbol, SymbolCategory};

/// Every table derived from a baseline/candidate pair.
///
/// Absent from a `ComparisonResult` when either artifact could not be
/// introspected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiffTables {
    pub size: SizeDelta,
    pub symbols: SymbolDiff,
    pub sections: Vec<SectionDelta>,
    pub categories: Vec<CategoryCount>,
    pub classes: Vec<ClassBreakdown>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search: Vec<SearchMatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SizeDelta {
    pub baseline_bytes: u64,
    pub candidate_bytes: u64,
    /// `candidate - baseline`.
    pub delta_bytes: i64,
    /// Relative to the baseline; 0 when the baseline is empty.
    pub delta_percent: f64,
}

/// Partition of symbol names by side.
///
/// `common.len() + unique_to_baseline.len()` equals the number of distinct
/// baseline names; symmetrically for the candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SymbolDiff {
    pub baseline_total: usize,
    pub candidate_total: usize,
    /// Raw names, sorted.
    pub common: Vec<String>,
    pub unique_to_baseline: Vec<SymbolDigest>,
    pub unique_to_candidate: Vec<SymbolDigest>,
}

/// Enough of a symbol to name it in findings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SymbolDigest {
    pub raw_name: String,
    pub demangled_name: String,
    pub category: SymbolCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_class: Option<String>,
}

impl From<&Symbol> for SymbolDigest {
    fn from(s: &Symbol) -> Self {
        Self {
            raw_name: s.raw_name.clone(),
            demangled_name: s.demangled_name.clone(),
            category: s.category,
            owner_class: s.owner_class.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Both,
    BaselineOnly,
    CandidateOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectionDelta {
    pub name: String,
    pub presence: Presence,
    /// 0 when absent on this side.
    pub baseline_bytes: u64,
    pub candidate_bytes: u64,
    pub delta_bytes: i64,
    pub flags_differ: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: SymbolCategory,
    pub baseline: usize,
    pub candidate: usize,
    pub delta: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ClassCounts {
    pub total: usize,
    pub constructors: usize,
    pub destructors: usize,
    /// Everything owned by the class that is neither constructor nor destructor.
    pub other: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassBreakdown {
    pub class: String,
    pub baseline: ClassCounts,
    pub candidate: ClassCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchMatch {
    pub term: String,
    /// Demangled names, sorted and unique.
    pub baseline: Vec<String>,
    pub candidate: Vec<String>,
}
