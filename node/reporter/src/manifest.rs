//! Report artifact writing with a SHA-256 checksum manifest.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    pub file: String,
    pub sha256: String,
    pub bytes: usize,
}

#[derive(Debug, Serialize)]
struct Manifest {
    generated_at: String,
    entries: Vec<ManifestEntry>,
}

/// Writes report artifacts under one directory and finishes with a
/// `manifest.json` covering everything written.
pub struct ReportWriter {
    out_dir: PathBuf,
    entries: Vec<ManifestEntry>,
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

impl ReportWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Result<Self> {
        let out_dir = out_dir.into();
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("creating report directory {}", out_dir.display()))?;
        Ok(Self {
            out_dir,
            entries: Vec::new(),
        })
    }

    pub fn write(&mut self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.out_dir.join(name);
        fs::write(&path, contents)
            .with_context(|| format!("writing report {}", path.display()))?;

        self.entries.push(ManifestEntry {
            file: name.to_owned(),
            sha256: sha256_hex(contents.as_bytes()),
            bytes: contents.len(),
        });
        info!(report = %path.display(), "report written");
        Ok(path)
    }

    /// Write `manifest.json` and return its path.
    pub fn finish(self) -> Result<PathBuf> {
        let manifest = Manifest {
            generated_at: Utc::now().to_rfc3339(),
            entries: self.entries,
        };
        let path = self.out_dir.join("manifest.json");
        fs::write(&path, serde_json::to_string_pretty(&manifest)?)
            .with_context(|| format!("writing manifest {}", path.display()))?;
        Ok(path)
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("agijobs-reports-{}-{}", tag, std::process::id()))
    }

    #[test]
    fn manifest_covers_written_reports() -> Result<()> {
        let dir = temp_dir("manifest");
        let mut writer = ReportWriter::new(&dir)?;
        writer.write("owner-surface.md", "# owner surface\n")?;
        writer.write("snapshot.json", "{\"chain_id\":31337}")?;
        let manifest_path = writer.finish()?;

        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&manifest_path)?)?;
        let entries = manifest["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["file"], "owner-surface.md");
        // Known digest of the exact bytes written
        assert_eq!(
            entries[0]["sha256"],
            sha256_hex(b"# owner surface\n")
        );

        fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn checksum_changes_with_content() {
        assert_ne!(sha256_hex(b"a"), sha256_hex(b"b"));
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
