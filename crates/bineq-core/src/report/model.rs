use serde::{Deserialize, Serialize};

use crate::SCHEMA_VERSION;
use crate::config::CompareConfig;
use crate::diff::engine::diff;
use crate::diff::model::DiffTables;
use crate::error::ArtifactError;
use crate::rules::catalog::{Finding, FindingId, Rating};
use crate::rules::grade::grade;
use crate::symbols::model::{ArtifactMetadata, Side};

/// Complete outcome of comparing one baseline/candidate pair.
///
/// This struct is the stable JSON contract. It must remain deterministic
/// for identical input artifacts and configuration, so it carries no
/// timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonResult {
    pub schema_version: String,
    pub tool: ToolInfo,
    pub config: CompareConfig,
    pub baseline: ArtifactOutcome,
    pub candidate: ArtifactOutcome,
    /// Absent when either side failed introspection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<DiffTables>,
    pub assessment: Assessment,
}

impl ComparisonResult {
    /// Diff (when both sides were introspected) and grade.
    pub fn new(
        tool: ToolInfo,
        config: CompareConfig,
        baseline: ArtifactOutcome,
        candidate: ArtifactOutcome,
    ) -> Self {
        let diff = match (baseline.metadata(), candidate.metadata()) {
            (Some(b), Some(c)) => Some(diff(b, c, &config)),
            _ => None,
        };
        let assessment = grade(&baseline, &candidate, diff.as_ref(), &config);

        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            tool,
            config,
            baseline,
            candidate,
            diff,
            assessment,
        }
    }

    pub fn rating(&self) -> Rating {
        self.assessment.rating
    }

    pub fn exit_code(&self) -> i32 {
        self.assessment.exit_code
    }
}

/// Tool metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
    pub commit: Option<String>,
}

/// One side of a comparison: either full metadata or the reason it is
/// missing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArtifactOutcome {
    Introspected {
        metadata: ArtifactMetadata,
    },
    Failed {
        path: String,
        label: Side,
        /// `not_found`, `unreadable` or `timed_out`.
        kind: String,
        error: String,
    },
}

impl ArtifactOutcome {
    pub fn from_result(label: Side, result: Result<ArtifactMetadata, ArtifactError>) -> Self {
        match result {
            Ok(metadata) => ArtifactOutcome::Introspected { metadata },
            Err(err) => ArtifactOutcome::Failed {
                path: err.path().display().to_string(),
                label,
                kind: err.kind().to_string(),
                error: err.to_string(),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ArtifactOutcome::Introspected { .. })
    }

    pub fn metadata(&self) -> Option<&ArtifactMetadata> {
        match self {
            ArtifactOutcome::Introspected { metadata } => Some(metadata),
            ArtifactOutcome::Failed { .. } => None,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            ArtifactOutcome::Introspected { metadata } => &metadata.path,
            ArtifactOutcome::Failed { path, .. } => path,
        }
    }
}

/// Final verdict block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assessment {
    pub rating: Rating,
    /// Title of the deciding finding.
    pub reason: String,
    /// Deciding finding(s) first, informational findings after.
    pub findings: Vec<Finding>,
    pub exit_code: i32,
}

impl Assessment {
    pub fn new(rating: Rating, findings: Vec<Finding>) -> Self {
        let reason = findings
            .iter()
            .find(|f| !f.id.is_informational())
            .map(|f| f.title.clone())
            .unwrap_or_else(|| "no findings".into());

        Self {
            rating,
            reason,
            findings,
            exit_code: rating.exit_status(),
        }
    }

    pub fn finding_ids(&self) -> Vec<FindingId> {
        self.findings.iter().map(|f| f.id).collect()
    }
}
