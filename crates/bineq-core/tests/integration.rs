use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use bineq_core::batch::{
    BatchJob, BatchOptions, BatchOutcome, CancellationToken, batch_exit_status, run_batch,
};
use bineq_core::config::CompareConfig;
use bineq_core::report::model::{ArtifactOutcome, ComparisonResult, ToolInfo};
use bineq_core::report::render::{ReportFormat, render, render_json, render_text};
use bineq_core::rules::catalog::{FindingId, Rating};
use bineq_core::symbols::model::SymbolCategory;
use object::write::{Object as ObjectWriter, Symbol, SymbolSection};
use object::{
    Architecture, BinaryFormat, Endianness, SectionKind, SymbolFlags, SymbolKind, SymbolScope,
};
use tempfile::TempDir;

const CLASS_SYMBOLS: &[&str] = &[
    "_ZN3FooC1Ev",
    "_ZN3FooC2Ev",
    "_ZN3FooD1Ev",
    "_ZN3FooD2Ev",
    "_ZN3Foo3barEi",
    "_ZNK3Foo4sizeEv",
    "_ZN3FooplERKS_",
    "_ZTV3Foo",
    "_ZTI3Foo",
    "_ZTS3Foo",
    "_Z6helperv",
    "main",
];

/// Builds an x86-64 ELF relocatable exporting `symbols` from `.text`.
fn elf_bytes(symbols: &[&str]) -> Vec<u8> {
    let mut obj = ObjectWriter::new(BinaryFormat::Elf, Architecture::X86_64, Endianness::Little);
    let text = obj.add_section(Vec::new(), b".text".to_vec(), SectionKind::Text);
    obj.section_mut(text).append_data(&[0x90; 64], 16);
    let data = obj.add_section(Vec::new(), b".data".to_vec(), SectionKind::Data);
    obj.section_mut(data).append_data(&[0u8; 32], 8);

    for (i, name) in symbols.iter().enumerate() {
        obj.add_symbol(Symbol {
            name: name.as_bytes().to_vec(),
            value: (i % 64) as u64,
            size: 1,
            kind: SymbolKind::Text,
            scope: SymbolScope::Linkage,
            weak: false,
            section: SymbolSection::Section(text),
            flags: SymbolFlags::None,
        });
    }

    obj.write().expect("write object")
}

struct Fixtures {
    dir: TempDir,
}

impl Fixtures {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    fn write(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, bytes).expect("write fixture");
        path
    }

    fn elf(&self, name: &str, symbols: &[&str]) -> PathBuf {
        self.write(name, &elf_bytes(symbols))
    }

    /// ELF padded with trailing zeros to exactly `size` bytes.
    fn padded_elf(&self, name: &str, symbols: &[&str], size: usize) -> PathBuf {
        let mut bytes = elf_bytes(symbols);
        assert!(bytes.len() <= size, "fixture larger than requested size");
        bytes.resize(size, 0);
        self.write(name, &bytes)
    }
}

fn tool() -> ToolInfo {
    ToolInfo {
        name: "bineq".into(),
        version: "0.1.0-test".into(),
        commit: None,
    }
}

fn watching(classes: &[&str]) -> CompareConfig {
    CompareConfig {
        class_watch_list: classes.iter().map(|c| c.to_string()).collect(),
        ..Default::default()
    }
}

fn compare(baseline: &Path, candidate: &Path, config: &CompareConfig) -> ComparisonResult {
    bineq_core::compare(baseline, candidate, config, tool())
}

#[test]
fn identical_builds_are_perfect() {
    let fx = Fixtures::new();
    let base = fx.elf("base.o", CLASS_SYMBOLS);
    let cand = fx.elf("cand.o", CLASS_SYMBOLS);

    let result = compare(&base, &cand, &watching(&["Foo"]));

    assert_eq!(result.rating(), Rating::Perfect);
    assert_eq!(result.exit_code(), 0);
    let diff = result.diff.as_ref().expect("tables computed");
    assert_eq!(diff.size.delta_bytes, 0);
    assert!(diff.symbols.unique_to_baseline.is_empty());
    assert!(diff.symbols.unique_to_candidate.is_empty());
    assert_eq!(diff.symbols.common.len(), CLASS_SYMBOLS.len());
}

#[test]
fn symbols_are_demangled_and_classified() {
    let fx = Fixtures::new();
    let path = fx.elf("lib.o", CLASS_SYMBOLS);

    let result = compare(&path, &path, &CompareConfig::default());
    let meta = result.baseline.metadata().expect("introspected");

    let category = |raw: &str| {
        meta.symbols
            .iter()
            .find(|s| s.raw_name == raw)
            .unwrap_or_else(|| panic!("{raw} missing"))
            .category
    };

    assert_eq!(category("_ZN3FooC1Ev"), SymbolCategory::Constructor);
    assert_eq!(category("_ZN3FooD1Ev"), SymbolCategory::Destructor);
    assert_eq!(category("_ZTV3Foo"), SymbolCategory::Vtable);
    assert_eq!(category("_ZTI3Foo"), SymbolCategory::TypeInfoStruct);
    assert_eq!(category("_ZTS3Foo"), SymbolCategory::TypeInfoString);
    assert_eq!(category("_ZN3FooplERKS_"), SymbolCategory::Operator);
    assert_eq!(category("_ZN3Foo3barEi"), SymbolCategory::Method);
    assert_eq!(category("_Z6helperv"), SymbolCategory::GlobalFunction);
    assert_eq!(category("main"), SymbolCategory::Other);

    let dtor = meta
        .symbols
        .iter()
        .find(|s| s.raw_name == "_ZN3FooD1Ev")
        .unwrap();
    assert_eq!(dtor.demangled_name, "Foo::~Foo()");
    assert_eq!(dtor.owner_class.as_deref(), Some("Foo"));
    assert_eq!(dtor.kind_letter, 'T');

    assert_eq!(meta.format, "elf64");
    assert_eq!(meta.sha256.len(), 64);
    assert!(meta.sections.iter().any(|s| s.name == ".text"));
}

#[test]
fn missing_watched_destructor_is_warning() {
    let fx = Fixtures::new();
    let without: Vec<&str> = CLASS_SYMBOLS
        .iter()
        .copied()
        .filter(|s| *s != "_ZN3FooD1Ev")
        .collect();
    let base = fx.elf("base.o", CLASS_SYMBOLS);
    let cand = fx.elf("cand.o", &without);

    let result = compare(&base, &cand, &watching(&["Foo"]));

    assert_eq!(result.rating(), Rating::Warning);
    assert_eq!(result.exit_code(), 1);
    let finding = &result.assessment.findings[0];
    assert_eq!(finding.id, FindingId::MissingWatchedSymbols);
    assert!(finding.message.contains("Foo"));
    assert!(finding.message.contains("Foo::~Foo()"));

    let foo = &result.diff.as_ref().unwrap().classes[0];
    assert_eq!(foo.class, "Foo");
    assert_eq!(foo.baseline.destructors, 2);
    assert_eq!(foo.candidate.destructors, 1);
}

#[test]
fn size_at_five_percent_is_good() {
    let fx = Fixtures::new();
    let base = fx.padded_elf("base.o", CLASS_SYMBOLS, 1_000_000);
    let cand = fx.padded_elf("cand.o", CLASS_SYMBOLS, 1_050_000);

    let result = compare(&base, &cand, &CompareConfig::default());

    let diff = result.diff.as_ref().unwrap();
    assert_eq!(diff.size.delta_bytes, 50_000);
    assert_eq!(diff.size.delta_percent, 5.0);
    assert_eq!(result.rating(), Rating::Good);
    assert_eq!(result.exit_code(), 0);
    assert_eq!(result.assessment.findings[0].id, FindingId::SizeDivergence);
}

#[test]
fn small_size_growth_is_excellent() {
    let fx = Fixtures::new();
    let base = fx.padded_elf("base.o", CLASS_SYMBOLS, 100_000);
    let cand = fx.padded_elf("cand.o", CLASS_SYMBOLS, 102_000);

    let result = compare(&base, &cand, &CompareConfig::default());

    assert_eq!(result.rating(), Rating::Excellent);
}

#[test]
fn missing_candidate_is_critical_without_tables() {
    let fx = Fixtures::new();
    let base = fx.elf("base.o", CLASS_SYMBOLS);
    let cand = fx.dir.path().join("does-not-exist.o");

    let result = compare(&base, &cand, &CompareConfig::default());

    assert_eq!(result.rating(), Rating::Critical);
    assert_eq!(result.exit_code(), 1);
    assert!(result.diff.is_none());
    match &result.candidate {
        ArtifactOutcome::Failed { kind, .. } => assert_eq!(kind, "not_found"),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn garbage_candidate_is_unreadable() {
    let fx = Fixtures::new();
    let base = fx.elf("base.o", CLASS_SYMBOLS);
    let cand = fx.write("cand.o", b"definitely not an object file");

    let result = compare(&base, &cand, &CompareConfig::default());

    assert_eq!(result.rating(), Rating::Critical);
    match &result.candidate {
        ArtifactOutcome::Failed { kind, .. } => assert_eq!(kind, "unreadable"),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(result.baseline.is_ok());
}

#[test]
fn introspection_past_deadline_is_critical() {
    let fx = Fixtures::new();
    let base = fx.padded_elf("base.o", CLASS_SYMBOLS, 16 << 20);
    let cand = fx.padded_elf("cand.o", CLASS_SYMBOLS, 16 << 20);
    let config = CompareConfig {
        introspect_timeout_secs: 0,
        ..Default::default()
    };

    let result = compare(&base, &cand, &config);

    assert_eq!(result.rating(), Rating::Critical);
    assert_eq!(result.exit_code(), 1);
    assert!(result.diff.is_none());
    for outcome in [&result.baseline, &result.candidate] {
        match outcome {
            ArtifactOutcome::Failed { kind, .. } => assert_eq!(kind, "timed_out"),
            other => panic!("expected timeout, got {other:?}"),
        }
    }
    assert!(
        result
            .assessment
            .findings
            .iter()
            .any(|f| f.id == FindingId::ArtifactUnreadable)
    );
}

#[test]
fn comparison_is_deterministic() {
    let fx = Fixtures::new();
    let base = fx.elf("base.o", CLASS_SYMBOLS);
    let cand = fx.elf("cand.o", &CLASS_SYMBOLS[2..]);
    let config = CompareConfig {
        class_watch_list: vec!["Foo".into()],
        search_terms: vec!["foo".into(), "HELPER".into()],
        ..Default::default()
    };

    let first = compare(&base, &cand, &config);
    let second = compare(&base, &cand, &config);

    assert_eq!(first, second);
    assert_eq!(render_json(&first).unwrap(), render_json(&second).unwrap());
    assert_eq!(render_text(&first), render_text(&second));
}

#[test]
fn partition_and_symmetry_hold() {
    let fx = Fixtures::new();
    let a = fx.elf("a.o", &["_ZN3FooC1Ev", "_ZN3FooD1Ev", "shared", "only_a"]);
    let b = fx.padded_elf(
        "b.o",
        &["_ZN3FooC1Ev", "shared", "only_b", "_ZTV3Foo"],
        20_000,
    );
    let config = CompareConfig::default();

    let forward = compare(&a, &b, &config);
    let backward = compare(&b, &a, &config);
    let f = forward.diff.as_ref().unwrap();
    let r = backward.diff.as_ref().unwrap();

    let common: BTreeSet<&str> = f.symbols.common.iter().map(String::as_str).collect();
    for s in &f.symbols.unique_to_baseline {
        assert!(!common.contains(s.raw_name.as_str()));
    }
    for s in &f.symbols.unique_to_candidate {
        assert!(!common.contains(s.raw_name.as_str()));
    }
    assert_eq!(
        f.symbols.common.len() + f.symbols.unique_to_baseline.len(),
        f.symbols.baseline_total
    );

    assert_eq!(f.symbols.common, r.symbols.common);
    assert_eq!(f.symbols.unique_to_baseline, r.symbols.unique_to_candidate);
    assert_eq!(f.symbols.unique_to_candidate, r.symbols.unique_to_baseline);
    assert_eq!(f.size.delta_bytes, -r.size.delta_bytes);
}

#[test]
fn search_terms_match_case_insensitively() {
    let fx = Fixtures::new();
    let base = fx.elf("base.o", CLASS_SYMBOLS);
    let cand = fx.elf("cand.o", &CLASS_SYMBOLS[1..]);
    let config = CompareConfig {
        search_terms: vec!["FOO::~".into()],
        ..Default::default()
    };

    let result = compare(&base, &cand, &config);
    let search = &result.diff.as_ref().unwrap().search;

    assert_eq!(search.len(), 1);
    assert_eq!(search[0].term, "FOO::~");
    assert_eq!(search[0].baseline, vec!["Foo::~Foo()".to_string()]);
    assert_eq!(search[0].candidate, vec!["Foo::~Foo()".to_string()]);
}

#[test]
fn reports_render_every_section() {
    let fx = Fixtures::new();
    let base = fx.elf("base.o", CLASS_SYMBOLS);
    let cand = fx.elf("cand.o", &CLASS_SYMBOLS[..4]);
    let config = CompareConfig {
        class_watch_list: vec!["Foo".into()],
        search_terms: vec!["bar".into()],
        ..Default::default()
    };
    let result = compare(&base, &cand, &config);

    let text = render(&result, ReportFormat::Human).unwrap();
    for title in [
        "File Information",
        "Size Comparison",
        "Symbol Comparison",
        "Section Comparison",
        "Category Breakdown",
        "Per-Class Breakdown",
        "Search Results",
        "Overall Assessment",
    ] {
        assert!(text.contains(&format!("== {title} ==")), "missing {title}");
    }

    let json: serde_json::Value =
        serde_json::from_str(&render(&result, ReportFormat::Machine).unwrap()).unwrap();
    assert_eq!(json["assessment"]["rating"], "WARNING");
    assert_eq!(json["baseline"]["status"], "introspected");
    assert_eq!(
        json["diff"]["categories"].as_array().unwrap().len(),
        SymbolCategory::ALL.len()
    );
}

#[test]
fn batch_isolates_failures_and_keeps_order() {
    let fx = Fixtures::new();
    let good = fx.elf("good.o", CLASS_SYMBOLS);
    let jobs = vec![
        BatchJob {
            component: "ok".into(),
            baseline: good.clone(),
            candidate: good.clone(),
        },
        BatchJob {
            component: "gone".into(),
            baseline: good.clone(),
            candidate: fx.dir.path().join("gone.o"),
        },
        BatchJob {
            component: "ok-again".into(),
            baseline: good.clone(),
            candidate: good,
        },
    ];

    let entries = run_batch(
        &jobs,
        &CompareConfig::default(),
        &tool(),
        &BatchOptions {
            workers: 2,
            fail_fast: false,
        },
        &CancellationToken::new(),
    )
    .expect("pool builds");

    let names: Vec<&str> = entries.iter().map(|e| e.component.as_str()).collect();
    assert_eq!(names, vec!["ok", "gone", "ok-again"]);
    assert_eq!(entries[0].result().unwrap().rating(), Rating::Perfect);
    assert_eq!(entries[1].result().unwrap().rating(), Rating::Critical);
    assert_eq!(entries[2].result().unwrap().rating(), Rating::Perfect);
    assert_eq!(batch_exit_status(&entries), 1);
}

#[test]
fn cancelled_batch_reports_skips() {
    let fx = Fixtures::new();
    let good = fx.elf("good.o", CLASS_SYMBOLS);
    let jobs = vec![BatchJob {
        component: "ok".into(),
        baseline: good.clone(),
        candidate: good,
    }];
    let cancel = CancellationToken::new();
    cancel.cancel();

    let entries = run_batch(
        &jobs,
        &CompareConfig::default(),
        &tool(),
        &BatchOptions::default(),
        &cancel,
    )
    .unwrap();

    assert_eq!(entries[0].outcome, BatchOutcome::Skipped);
    assert_eq!(batch_exit_status(&entries), 1);
}
