use serde::{Deserialize, Serialize};

/// Overall equivalence verdict.
///
/// Ordering is semantic: `Critical < Warning < Good < Excellent < Perfect`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rating {
    Critical,
    Warning,
    Good,
    Excellent,
    Perfect,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Critical => "CRITICAL",
            Rating::Warning => "WARNING",
            Rating::Good => "GOOD",
            Rating::Excellent => "EXCELLENT",
            Rating::Perfect => "PERFECT",
        }
    }

    /// CI-compatible process status.
    ///
    /// - PERFECT / EXCELLENT / GOOD → 0
    /// - WARNING / CRITICAL         → 1
    pub fn exit_status(&self) -> i32 {
        match self {
            Rating::Perfect | Rating::Excellent | Rating::Good => 0,
            Rating::Warning | Rating::Critical => 1,
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identifiers for findings. External spelling is `F-<AREA>-<NN>`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FindingId {
    #[serde(rename = "F-ART-01")]
    ArtifactUnreadable,
    #[serde(rename = "F-SYM-01")]
    MissingWatchedSymbols,
    #[serde(rename = "F-SYM-02")]
    MinorSymbolDrift,
    #[serde(rename = "F-SYM-03")]
    SymbolDivergence,
    #[serde(rename = "F-SIZE-01")]
    SizeMatch,
    #[serde(rename = "F-SIZE-02")]
    SizeWithinTolerance,
    #[serde(rename = "F-SIZE-03")]
    SizeDivergence,
    #[serde(rename = "F-INFO-01")]
    CandidateOnlySymbols,
    #[serde(rename = "F-INFO-02")]
    OneSidedSections,
}

impl FindingId {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingId::ArtifactUnreadable => "F-ART-01",
            FindingId::MissingWatchedSymbols => "F-SYM-01",
            FindingId::MinorSymbolDrift => "F-SYM-02",
            FindingId::SymbolDivergence => "F-SYM-03",
            FindingId::SizeMatch => "F-SIZE-01",
            FindingId::SizeWithinTolerance => "F-SIZE-02",
            FindingId::SizeDivergence => "F-SIZE-03",
            FindingId::CandidateOnlySymbols => "F-INFO-01",
            FindingId::OneSidedSections => "F-INFO-02",
        }
    }

    /// Informational findings never influence the rating.
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            FindingId::CandidateOnlySymbols | FindingId::OneSidedSections
        )
    }
}

impl std::fmt::Display for FindingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-readable justification attached to an assessment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    pub id: FindingId,
    pub title: String,
    pub message: String,
    pub evidence: serde_json::Value,
}
