//! Multi-component batch execution.
//!
//! Every component comparison is independent. Jobs run on a bounded rayon
//! pool and share nothing except the read-only configuration and a
//! cancellation flag. Cancelling stops new comparisons from starting;
//! comparisons already running finish and are reported.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::compare;
use crate::config::CompareConfig;
use crate::report::model::{ComparisonResult, ToolInfo};
use crate::report::render::{ReportFormat, write_report};
use crate::rules::catalog::Rating;

/// One component to compare.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BatchJob {
    pub component: String,
    pub baseline: PathBuf,
    pub candidate: PathBuf,
}

/// Load a JSON manifest of `[{component, baseline, candidate}]`.
///
/// Relative artifact paths are resolved against the manifest's directory.
pub fn load_manifest(path: &Path) -> Result<Vec<BatchJob>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest: {}", path.display()))?;
    let mut jobs: Vec<BatchJob> = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse manifest: {}", path.display()))?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    for job in &mut jobs {
        if job.baseline.is_relative() {
            job.baseline = base.join(&job.baseline);
        }
        if job.candidate.is_relative() {
            job.candidate = base.join(&job.candidate);
        }
    }
    Ok(jobs)
}

/// Shared stop flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Concurrent comparisons. Zero means available parallelism.
    pub workers: usize,
    /// Cancel the batch after the first CRITICAL result.
    pub fail_fast: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum BatchOutcome {
    Completed(Box<ComparisonResult>),
    /// Never started because the batch was cancelled.
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchEntry {
    pub component: String,
    pub outcome: BatchOutcome,
}

impl BatchEntry {
    pub fn result(&self) -> Option<&ComparisonResult> {
        match &self.outcome {
            BatchOutcome::Completed(r) => Some(r),
            BatchOutcome::Skipped => None,
        }
    }
}

/// Run every job, returning entries in job order.
pub fn run_batch(
    jobs: &[BatchJob],
    config: &CompareConfig,
    tool: &ToolInfo,
    options: &BatchOptions,
    cancel: &CancellationToken,
) -> Result<Vec<BatchEntry>> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(options.workers)
        .thread_name(|i| format!("bineq-batch-{i}"))
        .build()
        .context("failed to build batch worker pool")?;

    info!(
        jobs = jobs.len(),
        workers = pool.current_num_threads(),
        fail_fast = options.fail_fast,
        "starting batch"
    );

    let entries: Vec<BatchEntry> = pool.install(|| {
        jobs.par_iter()
            .map(|job| BatchEntry {
                component: job.component.clone(),
                outcome: run_job(job, config, tool, options, cancel),
            })
            .collect()
    });

    let skipped = entries
        .iter()
        .filter(|e| e.outcome == BatchOutcome::Skipped)
        .count();
    info!(
        completed = entries.len() - skipped,
        skipped,
        exit_code = batch_exit_status(&entries),
        "batch finished"
    );
    Ok(entries)
}

fn run_job(
    job: &BatchJob,
    config: &CompareConfig,
    tool: &ToolInfo,
    options: &BatchOptions,
    cancel: &CancellationToken,
) -> BatchOutcome {
    if cancel.is_cancelled() {
        warn!(component = %job.component, "batch cancelled, skipping");
        return BatchOutcome::Skipped;
    }

    let result = compare(&job.baseline, &job.candidate, config, tool.clone());
    if options.fail_fast && result.rating() == Rating::Critical {
        warn!(component = %job.component, "critical result, cancelling remaining jobs");
        cancel.cancel();
    }
    BatchOutcome::Completed(Box::new(result))
}

/// Worst per-job exit status. A skipped job counts as a failure.
pub fn batch_exit_status(entries: &[BatchEntry]) -> i32 {
    entries
        .iter()
        .map(|e| match &e.outcome {
            BatchOutcome::Completed(r) => r.exit_code(),
            BatchOutcome::Skipped => 1,
        })
        .max()
        .unwrap_or(0)
}

/// Write `<component>.txt` and `<component>.json` for every completed job.
///
/// Components whose sanitised names collide (`lib/core` and `lib_core`)
/// keep the first stem; later ones get their manifest position appended.
pub fn write_batch_reports(entries: &[BatchEntry], out_dir: &Path) -> Result<()> {
    let mut taken = HashSet::new();
    for (index, entry) in entries.iter().enumerate() {
        let mut stem = file_stem(&entry.component);
        while !taken.insert(stem.to_ascii_lowercase()) {
            let renamed = format!("{stem}-{index}");
            warn!(component = %entry.component, from = %stem, to = %renamed, "report name collision");
            stem = renamed;
        }
        let Some(result) = entry.result() else {
            continue;
        };
        write_report(
            result,
            ReportFormat::Human,
            &out_dir.join(format!("{stem}.txt")),
        )?;
        write_report(
            result,
            ReportFormat::Machine,
            &out_dir.join(format!("{stem}.json")),
        )?;
    }
    Ok(())
}

fn file_stem(component: &str) -> String {
    component
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn tool() -> ToolInfo {
        ToolInfo {
            name: "bineq".into(),
            version: "0.1.0-test".into(),
            commit: None,
        }
    }

    fn missing_job(component: &str) -> BatchJob {
        BatchJob {
            component: component.into(),
            baseline: PathBuf::from("/nonexistent/bineq/base.so"),
            candidate: PathBuf::from("/nonexistent/bineq/cand.so"),
        }
    }

    #[test]
    fn missing_artifacts_are_isolated_per_component() {
        let jobs = vec![missing_job("a"), missing_job("b")];
        let entries = run_batch(
            &jobs,
            &CompareConfig::default(),
            &tool(),
            &BatchOptions::default(),
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].component, "a");
        assert_eq!(entries[1].component, "b");
        for e in &entries {
            assert_eq!(e.result().unwrap().rating(), Rating::Critical);
        }
        assert_eq!(batch_exit_status(&entries), 1);
    }

    #[test]
    fn pre_cancelled_batch_skips_everything() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let entries = run_batch(
            &[missing_job("a"), missing_job("b")],
            &CompareConfig::default(),
            &tool(),
            &BatchOptions::default(),
            &cancel,
        )
        .unwrap();

        assert!(entries.iter().all(|e| e.outcome == BatchOutcome::Skipped));
        assert_eq!(batch_exit_status(&entries), 1);
    }

    #[test]
    fn fail_fast_on_single_worker_skips_the_rest() {
        let cancel = CancellationToken::new();
        let entries = run_batch(
            &[missing_job("a"), missing_job("b"), missing_job("c")],
            &CompareConfig::default(),
            &tool(),
            &BatchOptions {
                workers: 1,
                fail_fast: true,
            },
            &cancel,
        )
        .unwrap();

        assert!(matches!(entries[0].outcome, BatchOutcome::Completed(_)));
        assert_eq!(entries[1].outcome, BatchOutcome::Skipped);
        assert_eq!(entries[2].outcome, BatchOutcome::Skipped);
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn empty_batch_exits_zero() {
        assert_eq!(batch_exit_status(&[]), 0);
    }

    #[test]
    fn manifest_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("jobs.json");
        std::fs::write(
            &manifest,
            r#"[{"component": "core", "baseline": "old/libcore.so", "candidate": "/abs/libcore.so"}]"#,
        )
        .unwrap();

        let jobs = load_manifest(&manifest).unwrap();

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].baseline, dir.path().join("old/libcore.so"));
        assert_eq!(jobs[0].candidate, PathBuf::from("/abs/libcore.so"));
    }

    #[test]
    fn manifest_rejects_unknown_fields() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"[{{"component": "x", "baseline": "a", "candidate": "b", "glob": "*.so"}}]"#
        )
        .unwrap();
        assert!(load_manifest(tmp.path()).is_err());
    }

    #[test]
    fn batch_reports_written_per_component() {
        let dir = tempfile::tempdir().unwrap();
        let entries = run_batch(
            &[missing_job("lib/core")],
            &CompareConfig::default(),
            &tool(),
            &BatchOptions::default(),
            &CancellationToken::new(),
        )
        .unwrap();

        write_batch_reports(&entries, dir.path()).unwrap();

        assert!(dir.path().join("lib_core.txt").exists());
        assert!(dir.path().join("lib_core.json").exists());
    }

    #[test]
    fn colliding_component_names_get_distinct_reports() {
        let dir = tempfile::tempdir().unwrap();
        let jobs: Vec<BatchJob> = ["lib/core", "lib_core", "lib core"]
            .iter()
            .enumerate()
            .map(|(i, component)| BatchJob {
                candidate: PathBuf::from(format!("/nonexistent/bineq/cand{i}.so")),
                ..missing_job(component)
            })
            .collect();
        let entries = run_batch(
            &jobs,
            &CompareConfig::default(),
            &tool(),
            &BatchOptions::default(),
            &CancellationToken::new(),
        )
        .unwrap();

        write_batch_reports(&entries, dir.path()).unwrap();

        let first = std::fs::read_to_string(dir.path().join("lib_core.json")).unwrap();
        let second = std::fs::read_to_string(dir.path().join("lib_core-1.json")).unwrap();
        assert!(dir.path().join("lib_core-2.txt").exists());
        assert!(first.contains("cand0.so"));
        assert!(second.contains("cand1.so"));
    }
}
