use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;

use monigate_core::error::{MonigateError, Result};

use super::Artifact;

/// Last `n` non-empty lines of `content`, oldest first.
pub fn tail_slice(content: &str, n: usize) -> Vec<&str> {
    let lines: Vec<&str> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .collect();
    let skip = lines.len().saturating_sub(n);
    lines[skip..].to_vec()
}

/// Reads artifacts from one directory. Reads go through `tokio::fs` (the
/// blocking pool) under a timeout so a stalled disk only holds up its own
/// request.
#[derive(Debug, Clone)]
pub struct TailReader {
    dir: PathBuf,
    audit_path: PathBuf,
    timeout: Duration,
}

impl TailReader {
    pub fn new(dir: impl Into<PathBuf>, audit_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            dir: dir.into(),
            audit_path: audit_path.into(),
            timeout,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, artifact: Artifact) -> PathBuf {
        match artifact {
            Artifact::Audit => self.audit_path.clone(),
            other => self.dir.join(other.file_name()),
        }
    }

    /// Whole file as text; `None` when the artifact does not exist. Invalid
    /// UTF-8 (a writer caught mid-character) decodes to U+FFFD.
    async fn read(&self, artifact: Artifact) -> Result<Option<String>> {
        let path = self.path_of(artifact);
        match tokio::time::timeout(self.timeout, tokio::fs::read(&path)).await {
            Ok(Ok(bytes)) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
            Ok(Err(e)) => Err(MonigateError::Io(format!("read {}: {e}", path.display()))),
            Err(_) => Err(MonigateError::Io(format!(
                "read {} timed out after {}ms",
                path.display(),
                self.timeout.as_millis()
            ))),
        }
    }

    /// Last `n` non-empty lines. Missing file yields an empty list.
    pub async fn tail_lines(&self, artifact: Artifact, n: usize) -> Result<Vec<String>> {
        let Some(content) = self.read(artifact).await? else {
            return Ok(Vec::new());
        };
        Ok(tail_slice(&content, n).into_iter().map(str::to_owned).collect())
    }

    /// Last `n` records of a JSON-lines artifact. Any kept line that fails to
    /// parse fails the whole read.
    pub async fn tail_json(&self, artifact: Artifact, n: usize) -> Result<Vec<Value>> {
        let Some(content) = self.read(artifact).await? else {
            return Ok(Vec::new());
        };
        let total = content.lines().filter(|l| !l.trim().is_empty()).count();
        let first = total.saturating_sub(n) + 1;

        tail_slice(&content, n)
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                serde_json::from_str(line).map_err(|e| MonigateError::MalformedArtifact {
                    artifact: artifact.file_name().to_string(),
                    line: first + i,
                    detail: e.to_string(),
                })
            })
            .collect()
    }

    /// Whole-file JSON document; `None` when the artifact does not exist.
    pub async fn read_json(&self, artifact: Artifact) -> Result<Option<Value>> {
        let Some(content) = self.read(artifact).await? else {
            return Ok(None);
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| MonigateError::MalformedArtifact {
                artifact: artifact.file_name().to_string(),
                line: e.line(),
                detail: e.to_string(),
            })
    }
}
