pub mod batch;
pub mod binary;
pub mod config;
pub mod diff;
pub mod error;
pub mod report;
pub mod rules;
pub mod symbols;
pub mod util;

use std::path::Path;

use tracing::info;

use crate::binary::introspect::introspect;
use crate::config::CompareConfig;
use crate::error::ArtifactError;
use crate::report::model::{ArtifactOutcome, ComparisonResult, ToolInfo};
use crate::symbols::model::{ArtifactMetadata, Side};

pub const TOOL_NAME: &str = "bineq";

/// JSON schema version of comparison reports.
/// Bump only when the serialized `ComparisonResult` changes semantically.
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Compare two artifacts on disk.
///
/// Never fails: introspection errors are carried into the result and
/// grade CRITICAL.
pub fn compare(
    baseline: &Path,
    candidate: &Path,
    config: &CompareConfig,
    tool: ToolInfo,
) -> ComparisonResult {
    let timeout = config.introspect_timeout();
    let b = introspect(baseline, Side::Baseline, timeout);
    let c = introspect(candidate, Side::Candidate, timeout);
    compare_introspected(b, c, config, tool)
}

/// Compare already-introspected artifacts.
pub fn compare_introspected(
    baseline: Result<ArtifactMetadata, ArtifactError>,
    candidate: Result<ArtifactMetadata, ArtifactError>,
    config: &CompareConfig,
    tool: ToolInfo,
) -> ComparisonResult {
    let result = ComparisonResult::new(
        tool,
        config.clone(),
        ArtifactOutcome::from_result(Side::Baseline, baseline),
        ArtifactOutcome::from_result(Side::Candidate, candidate),
    );

    info!(
        baseline = %result.baseline.path(),
        candidate = %result.candidate.path(),
        rating = %result.rating(),
        "comparison finished"
    );
    result
}
