use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::{fs, path::Path};

/// Raw artifact context used during introspection.
///
/// Holds the exact bytes analyzed and a cryptographic fingerprint
/// that uniquely identifies the artifact.
#[derive(Debug, Clone)]
pub struct ArtifactContext {
    /// Source path (informational only).
    pub path: String,

    /// Exact bytes read from disk.
    pub bytes: Vec<u8>,

    /// Size of the artifact in bytes.
    pub size_bytes: u64,

    /// Hex-encoded SHA-256 of the artifact bytes.
    pub sha256: String,
}

impl ArtifactContext {
    /// Wrap bytes that are already in memory.
    pub fn from_bytes(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        let digest = Sha256::digest(&bytes);
        Self {
            path: path.into(),
            size_bytes: bytes.len() as u64,
            bytes,
            sha256: hex::encode(digest),
        }
    }
}

/// Read a binary artifact and compute a stable cryptographic identity.
///
/// The identity depends **only** on the file bytes.
/// Filesystem metadata (timestamps, permissions, etc.) is ignored
/// to keep comparison results reproducible.
pub fn read_artifact(path: &Path) -> Result<ArtifactContext> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read artifact: {}", path.display()))?;

    Ok(ArtifactContext::from_bytes(
        path.display().to_string(),
        bytes,
    ))
}
