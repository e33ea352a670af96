use std::fs;
use std::io;
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::binary::facts::ObjectFacts;
use crate::binary::parse::parse_object;
use crate::binary::read::{ArtifactContext, read_artifact};
use crate::error::ArtifactError;
use crate::symbols::classify::classify;
use crate::symbols::demangle::demangle;
use crate::symbols::model::{ArtifactMetadata, Section, Side, Symbol};

/// Produce normalised metadata for the artifact at `path`.
///
/// Reading, parsing, demangling and classification run on a dedicated
/// worker thread; the caller waits at most `timeout`. A worker that misses
/// the deadline is abandoned and finishes in the background, its result
/// discarded.
pub fn introspect(
    path: &Path,
    label: Side,
    timeout: Duration,
) -> Result<ArtifactMetadata, ArtifactError> {
    if let Err(err) = fs::metadata(path) {
        if err.kind() == io::ErrorKind::NotFound {
            warn!(path = %path.display(), %label, "artifact not found");
            return Err(ArtifactError::NotFound {
                path: path.to_path_buf(),
            });
        }
        warn!(path = %path.display(), %label, error = %err, "artifact not accessible");
        return Err(ArtifactError::unreadable(path, err.to_string()));
    }

    let (tx, rx) = mpsc::channel();
    let owned = path.to_path_buf();
    thread::Builder::new()
        .name(format!("bineq-introspect-{label}"))
        .spawn(move || {
            let result = read_artifact(&owned)
                .map_err(|e| ArtifactError::unreadable(&owned, format!("{e:#}")))
                .and_then(|ctx| introspect_context(ctx, label));
            // The receiver is gone after a timeout.
            let _ = tx.send(result);
        })
        .map_err(|e| ArtifactError::unreadable(path, format!("failed to spawn worker: {e}")))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            if let Err(err) = &result {
                warn!(%label, error = %err, "introspection failed");
            }
            result
        }
        Err(RecvTimeoutError::Timeout) => {
            warn!(path = %path.display(), %label, ?timeout, "introspection timed out");
            Err(ArtifactError::TimedOut {
                path: path.to_path_buf(),
                timeout,
            })
        }
        Err(RecvTimeoutError::Disconnected) => Err(ArtifactError::unreadable(
            path,
            "introspection worker terminated unexpectedly",
        )),
    }
}

/// Introspect bytes that are already in memory. No timeout applies.
pub fn introspect_bytes(
    path: impl Into<String>,
    bytes: Vec<u8>,
    label: Side,
) -> Result<ArtifactMetadata, ArtifactError> {
    introspect_context(ArtifactContext::from_bytes(path, bytes), label)
}

fn introspect_context(
    ctx: ArtifactContext,
    label: Side,
) -> Result<ArtifactMetadata, ArtifactError> {
    let facts = parse_object(&ctx.bytes)
        .map_err(|e| ArtifactError::unreadable(&ctx.path, format!("{e:#}")))?;

    let metadata = build_metadata(ctx, facts, label);
    debug!(
        path = %metadata.path,
        %label,
        format = %metadata.format,
        size_bytes = metadata.size_bytes,
        symbols = metadata.symbols.len(),
        sections = metadata.sections.len(),
        "introspected artifact"
    );
    Ok(metadata)
}

/// Demangle and classify raw tables into the public metadata record.
///
/// Drops the artifact bytes.
pub fn build_metadata(ctx: ArtifactContext, facts: ObjectFacts, label: Side) -> ArtifactMetadata {
    let symbols = facts
        .symbols
        .into_iter()
        .map(|raw| {
            let demangled = demangle(&raw.name);
            let class = classify(&raw.name, &demangled);
            Symbol {
                raw_name: raw.name,
                demangled_name: demangled,
                kind_letter: raw.kind,
                size_bytes: raw.size,
                category: class.category,
                owner_class: class.owner_class,
            }
        })
        .collect();

    let sections = facts
        .sections
        .into_iter()
        .map(|s| Section {
            name: s.name,
            size_bytes: s.size,
            flags: s.flags,
        })
        .collect();

    ArtifactMetadata {
        path: ctx.path,
        label,
        format: facts.format,
        size_bytes: ctx.size_bytes,
        sha256: ctx.sha256,
        symbols,
        sections,
    }
}
