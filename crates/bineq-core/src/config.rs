use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Read-only configuration passed into every comparison.
///
/// Thresholds are percentages. Defaults mirror the documented grading
/// policy; none of them is load-bearing beyond that.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CompareConfig {
    /// Classes whose symbols are counted per side and whose missing
    /// symbols escalate the assessment.
    pub class_watch_list: Vec<String>,

    /// Case-insensitive substrings matched against demangled names.
    pub search_terms: Vec<String>,

    /// `|size delta %|` strictly below this rates PERFECT.
    pub size_tolerance_percent: f64,

    /// `|size delta %|` strictly below this rates EXCELLENT.
    pub size_warn_percent: f64,

    /// Share of baseline symbols (percent) that may vanish and still rate
    /// GOOD, provided no watched class is affected.
    #[serde(alias = "missing_symbol_ratio")]
    pub size_critical_ratio: f64,

    /// Upper bound on reading and parsing one artifact.
    pub introspect_timeout_secs: u64,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            class_watch_list: Vec::new(),
            search_terms: Vec::new(),
            size_tolerance_percent: 1.0,
            size_warn_percent: 5.0,
            size_critical_ratio: 1.0,
            introspect_timeout_secs: 30,
        }
    }
}

impl CompareConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config: {}", path.display()))?;
        Ok(config)
    }

    /// Reject settings under which no comparison can succeed.
    pub fn validate(&self) -> Result<()> {
        if self.introspect_timeout_secs == 0 {
            bail!("introspect_timeout_secs must be at least 1");
        }
        Ok(())
    }

    pub fn introspect_timeout(&self) -> Duration {
        Duration::from_secs(self.introspect_timeout_secs)
    }

    /// Whether `class` is on the watch list.
    pub fn watches(&self, class: &str) -> bool {
        self.class_watch_list.iter().any(|c| c == class)
    }
}
